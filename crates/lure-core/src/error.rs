//! Error types for grid construction and map composition.
//!
//! Only setup-time contract violations are errors. Reads never fail:
//! out-of-bounds coordinates are resolved by the map's edge handler.

use std::error::Error;
use std::fmt;

/// Errors arising from grid construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// Attempted to construct a grid with zero cells.
    EmptyGrid,
    /// A dimension does not fit the `i32` coordinate space.
    DimensionTooLarge {
        /// Which dimension (`"width"` or `"height"`).
        name: &'static str,
        /// The requested size.
        value: u32,
        /// The maximum supported size.
        max: u32,
    },
    /// The supplied cell buffer does not match `width * height`.
    LengthMismatch {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid must have at least one cell"),
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "{name} {value} exceeds maximum {max}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} cells, got {actual}")
            }
        }
    }
}

impl Error for GridError {}

/// Errors from composing maps into derived maps.
#[derive(Clone, Debug, PartialEq)]
pub enum MapError {
    /// A source map's dimensions differ from the derived map's.
    DimensionMismatch {
        /// `(width, height)` of the derived map.
        expected: (u32, u32),
        /// `(width, height)` of the rejected source.
        actual: (u32, u32),
    },
    /// A source with this name is already registered.
    DuplicateName {
        /// The contested name.
        name: String,
    },
    /// No source with this name (or instance) is registered.
    UnknownMap {
        /// The name that was looked up.
        name: String,
    },
    /// Adding the source would make the map depend on itself.
    CyclicDependency {
        /// Name under which the offending source was being added.
        name: String,
    },
    /// A source weight is NaN or infinite.
    InvalidWeight {
        /// Name of the source.
        name: String,
        /// The rejected weight.
        weight: f64,
    },
    /// A convolution kernel is malformed.
    InvalidKernel {
        /// What went wrong.
        reason: String,
    },
    /// A builder was finished without a required source map.
    MissingSource,
    /// Grid construction failed.
    Grid(GridError),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::DuplicateName { name } => write!(f, "map '{name}' is already registered"),
            Self::UnknownMap { name } => write!(f, "map '{name}' is not registered"),
            Self::CyclicDependency { name } => {
                write!(f, "adding '{name}' would create a dependency cycle")
            }
            Self::InvalidWeight { name, weight } => {
                write!(f, "weight for '{name}' must be finite, got {weight}")
            }
            Self::InvalidKernel { reason } => write!(f, "invalid kernel: {reason}"),
            Self::MissingSource => write!(f, "source map is required"),
            Self::Grid(e) => write!(f, "grid: {e}"),
        }
    }
}

impl Error for MapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for MapError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}
