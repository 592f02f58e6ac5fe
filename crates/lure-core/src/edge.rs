//! Out-of-bounds read policy for maps.

use crate::grid::Grid;

/// How a map answers reads outside `[0, width) x [0, height)`.
///
/// Every map carries its own handler. Combinators that read a source
/// beyond the border go through *that source's* handler, so sources with
/// different edge semantics can be mixed in one combination.
///
/// # Examples
///
/// ```
/// use lure_core::{EdgeHandler, Grid};
///
/// let grid = Grid::from_fn(3, 3, |x, y| (x + 10 * y) as f64).unwrap();
///
/// // Extend: nearest in-bounds value.
/// assert_eq!(EdgeHandler::Extend.sample(&grid, -4, 1), 10.0);
/// assert_eq!(EdgeHandler::Extend.sample(&grid, 5, 9), 22.0);
///
/// // Custom: a fixed value for every out-of-bounds read.
/// let wall = EdgeHandler::Custom(-100.0);
/// assert_eq!(wall.sample(&grid, 3, 0), -100.0);
/// assert_eq!(wall.sample(&grid, 1, 1), 11.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum EdgeHandler<T> {
    /// Clamp each axis independently to the nearest in-bounds index.
    #[default]
    Extend,
    /// Return this value for any out-of-bounds coordinate.
    Custom(T),
}

/// Result of resolving a coordinate under an [`EdgeHandler`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeLookup<T> {
    /// Read the map at this in-bounds cell.
    Cell(i32, i32),
    /// Use this value without touching the map.
    Value(T),
}

impl<T: Copy> EdgeHandler<T> {
    /// Resolve `(x, y)` against a `width x height` area.
    ///
    /// In-bounds coordinates always resolve to themselves.
    pub fn resolve(&self, x: i32, y: i32, width: u32, height: u32) -> EdgeLookup<T> {
        let w = width as i32;
        let h = height as i32;
        if x >= 0 && x < w && y >= 0 && y < h {
            return EdgeLookup::Cell(x, y);
        }
        match self {
            Self::Extend => EdgeLookup::Cell(x.clamp(0, w - 1), y.clamp(0, h - 1)),
            Self::Custom(v) => EdgeLookup::Value(*v),
        }
    }

    /// Read `grid` at `(x, y)`, resolving out-of-bounds coordinates.
    pub fn sample(&self, grid: &Grid<T>, x: i32, y: i32) -> T {
        match self.resolve(x, y, grid.width(), grid.height()) {
            EdgeLookup::Cell(cx, cy) => grid.at(cx, cy),
            EdgeLookup::Value(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_bounds_resolves_to_self() {
        let h: EdgeHandler<f64> = EdgeHandler::Custom(7.0);
        assert_eq!(h.resolve(2, 3, 5, 5), EdgeLookup::Cell(2, 3));
    }

    #[test]
    fn extend_clamps_each_axis_independently() {
        let h: EdgeHandler<f64> = EdgeHandler::Extend;
        assert_eq!(h.resolve(-1, 2, 5, 4), EdgeLookup::Cell(0, 2));
        assert_eq!(h.resolve(2, 9, 5, 4), EdgeLookup::Cell(2, 3));
        assert_eq!(h.resolve(-3, -3, 5, 4), EdgeLookup::Cell(0, 0));
        assert_eq!(h.resolve(8, -1, 5, 4), EdgeLookup::Cell(4, 0));
    }

    #[test]
    fn custom_replaces_any_out_of_bounds() {
        let h = EdgeHandler::Custom(-1.5);
        assert_eq!(h.resolve(-1, 0, 3, 3), EdgeLookup::Value(-1.5));
        assert_eq!(h.resolve(0, 3, 3, 3), EdgeLookup::Value(-1.5));
    }

    #[test]
    fn default_is_extend() {
        assert_eq!(EdgeHandler::<f64>::default(), EdgeHandler::Extend);
    }
}
