//! Lure: incrementally recomputed guidance fields for grid-based agents.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Lure sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use lure::prelude::*;
//!
//! // Food at one cell, blurred into a gradient, turned into steering.
//! let mut grid = Grid::new(16, 16, 0.0).unwrap();
//! grid.set(12, 4, 10.0);
//! let food = SimplePotentialMap::new(grid);
//!
//! let smell = FilteringPotentialMap::builder()
//!     .source(food.clone())
//!     .kernel(Kernel::gaussian(2, 1.5).unwrap())
//!     .build()
//!     .unwrap();
//! let steer = FlowFromPotentialsMap::builder()
//!     .named_source("smell", smell, 1.0)
//!     .build()
//!     .unwrap();
//!
//! let d = steer.obtain_direction(11, 4);
//! assert!(d.x > 0.9);
//!
//! // Move the food; only cells near the old and new spots go stale.
//! food.set(12, 4, 0.0);
//! food.set(3, 4, 10.0);
//! assert!(steer.obtain_direction(4, 4).x < -0.9);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `lure-core` | Grids, directions, edge handling, capability traits, errors |
//! | [`maps`] | `lure-maps` | Leaf, filtering and flow maps, batched changes |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Grids, directions and the capability traits (`lure-core`).
///
/// The read contracts are [`types::PotentialMap`] and [`types::FlowMap`];
/// cached maps also implement [`types::DynamicMap`].
pub use lure_core as types;

/// Concrete maps and composition (`lure-maps`).
pub use lure_maps as maps;

/// Common imports for typical Lure usage.
///
/// ```rust
/// use lure::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use lure_core::{
        Direction, DynamicMap, EdgeHandler, FlowMap, Grid, MapListener, PathfindingMap,
        PotentialMap, UpdateMode,
    };

    // Errors
    pub use lure_core::{GridError, MapError};

    // Maps
    pub use lure_maps::{
        Changes, Combinator, FilteringPotentialMap, FlowFromFlowsMap, FlowFromPotentialsMap,
        Kernel, SimpleFlowMap, SimplePotentialMap, UpdateStats,
    };
}
