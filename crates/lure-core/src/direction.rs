//! Planar direction vectors for flow maps.

use std::iter::Sum;
use std::ops::{Add, Mul, Neg};

const DIAG: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Magnitudes at or below this are treated as the zero vector.
pub const NEUTRAL_EPSILON: f64 = 1e-12;

/// A 2D direction vector.
///
/// `x` grows toward higher column indices (east) and `y` toward higher row
/// indices (south), matching grid coordinates. Flow maps store either a
/// unit vector or [`Direction::NEUTRAL`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Direction {
    /// East-west component.
    pub x: f64,
    /// North-south component (positive is south).
    pub y: f64,
}

impl Direction {
    /// The zero vector: no preferred direction.
    pub const NEUTRAL: Self = Self::new(0.0, 0.0);
    /// Unit vector toward row `y - 1`.
    pub const NORTH: Self = Self::new(0.0, -1.0);
    /// Unit vector toward row `y + 1`.
    pub const SOUTH: Self = Self::new(0.0, 1.0);
    /// Unit vector toward column `x - 1`.
    pub const WEST: Self = Self::new(-1.0, 0.0);
    /// Unit vector toward column `x + 1`.
    pub const EAST: Self = Self::new(1.0, 0.0);
    /// Unit diagonal toward `(x - 1, y - 1)`.
    pub const NORTH_WEST: Self = Self::new(-DIAG, -DIAG);
    /// Unit diagonal toward `(x + 1, y - 1)`.
    pub const NORTH_EAST: Self = Self::new(DIAG, -DIAG);
    /// Unit diagonal toward `(x - 1, y + 1)`.
    pub const SOUTH_WEST: Self = Self::new(-DIAG, DIAG);
    /// Unit diagonal toward `(x + 1, y + 1)`.
    pub const SOUTH_EAST: Self = Self::new(DIAG, DIAG);

    /// The 8-neighbourhood: `(dx, dy, unit direction)` for N, S, W, E, NW, NE, SW, SE.
    pub const OFFSETS: [(i32, i32, Self); 8] = [
        (0, -1, Self::NORTH),
        (0, 1, Self::SOUTH),
        (-1, 0, Self::WEST),
        (1, 0, Self::EAST),
        (-1, -1, Self::NORTH_WEST),
        (1, -1, Self::NORTH_EAST),
        (-1, 1, Self::SOUTH_WEST),
        (1, 1, Self::SOUTH_EAST),
    ];

    /// Construct from raw components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Whether this is (numerically) the zero vector.
    pub fn is_neutral(self) -> bool {
        self.length() <= NEUTRAL_EPSILON
    }

    /// Unit vector with the same heading, or [`NEUTRAL`](Self::NEUTRAL)
    /// when the length is zero or not finite.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > NEUTRAL_EPSILON && len.is_finite() {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::NEUTRAL
        }
    }

    /// Unit vector with the same heading, judging "zero" against `scale`.
    ///
    /// `scale` is the total magnitude of the terms summed into `self`. The
    /// result is [`NEUTRAL`](Self::NEUTRAL) when the length is at most
    /// `NEUTRAL_EPSILON * scale` (cancellation residue) or not finite.
    /// Unlike [`normalized`](Self::normalized) this does not depend on the
    /// absolute size of the inputs.
    pub fn normalized_within(self, scale: f64) -> Self {
        let len = self.x.hypot(self.y);
        if len == 0.0 || !len.is_finite() || len <= NEUTRAL_EPSILON * scale {
            return Self::NEUTRAL;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for Direction {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<f64> for Direction {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Direction {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Sum for Direction {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::NEUTRAL, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compass_constants_are_unit_length() {
        for (_, _, d) in Direction::OFFSETS {
            assert!((d.length() - 1.0).abs() < 1e-12, "{d:?}");
        }
    }

    #[test]
    fn offsets_point_along_their_delta() {
        for (dx, dy, d) in Direction::OFFSETS {
            assert!(d.x * dx as f64 > 0.0 || (dx == 0 && d.x == 0.0), "{d:?}");
            assert!(d.y * dy as f64 > 0.0 || (dy == 0 && d.y == 0.0), "{d:?}");
        }
    }

    #[test]
    fn opposite_offsets_cancel_exactly() {
        let total: Direction = Direction::OFFSETS.iter().map(|&(_, _, d)| d).sum();
        assert_eq!(total, Direction::NEUTRAL);
    }

    #[test]
    fn normalized_zero_is_neutral() {
        assert_eq!(Direction::NEUTRAL.normalized(), Direction::NEUTRAL);
        assert!(Direction::new(1e-15, 0.0).normalized().is_neutral());
    }

    #[test]
    fn normalized_has_unit_length() {
        let d = Direction::new(3.0, -4.0).normalized();
        assert!((d.x - 0.6).abs() < 1e-12);
        assert!((d.y + 0.8).abs() < 1e-12);
    }

    #[test]
    fn non_finite_normalizes_to_neutral() {
        assert!(Direction::new(f64::NAN, 1.0).normalized().is_neutral());
        assert!(Direction::new(f64::INFINITY, 1.0).normalized().is_neutral());
    }

    #[test]
    fn normalized_within_ignores_absolute_size() {
        let tiny = Direction::new(3e-20, -4e-20).normalized_within(5e-20);
        assert!((tiny.x - 0.6).abs() < 1e-12);
        assert!((tiny.y + 0.8).abs() < 1e-12);
        assert_eq!(Direction::NEUTRAL.normalized_within(0.0), Direction::NEUTRAL);
    }

    #[test]
    fn normalized_within_treats_cancellation_residue_as_neutral() {
        assert!(Direction::new(1e-16, 0.0).normalized_within(8.0).is_neutral());
        assert!(Direction::new(f64::NAN, 0.0).normalized_within(1.0).is_neutral());
    }

    #[test]
    fn dot_measures_alignment() {
        assert_eq!(Direction::EAST.dot(Direction::EAST), 1.0);
        assert_eq!(Direction::EAST.dot(Direction::NORTH), 0.0);
        assert_eq!(Direction::EAST.dot(-Direction::EAST), -1.0);
        assert!((Direction::NORTH_EAST.dot(Direction::NORTH) - Direction::NORTH_EAST.x).abs() < 1e-15);
    }
}
