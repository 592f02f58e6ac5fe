//! Fixed-size 2D value storage.

use crate::error::GridError;

/// A fixed-size, row-major 2D array of `T`.
///
/// Dimensions are immutable after construction. Coordinates are `i32` so
/// that callers can express out-of-bounds reads; [`get`](Self::get)
/// returns `None` for them and [`set`](Self::set) ignores them. Boundary
/// semantics belong to [`EdgeHandler`](crate::EdgeHandler), not to the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Maximum size of either dimension: coordinates use `i32`.
    pub const MAX_DIM: u32 = i32::MAX as u32;

    /// Create a `width * height` grid with every cell set to `fill`.
    ///
    /// Returns `Err(GridError::EmptyGrid)` if either dimension is 0, or
    /// `Err(GridError::DimensionTooLarge)` if either exceeds `i32::MAX`.
    pub fn new(width: u32, height: u32, fill: T) -> Result<Self, GridError> {
        check_dims(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![fill; width as usize * height as usize],
        })
    }

    /// Create a grid from row-major cell data.
    pub fn from_vec(width: u32, height: u32, cells: Vec<T>) -> Result<Self, GridError> {
        check_dims(width, height)?;
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(GridError::LengthMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Create a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(i32, i32) -> T,
    ) -> Result<Self, GridError> {
        check_dims(width, height)?;
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                cells.push(f(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`: construction rejects empty grids.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `(x, y)` lies inside `[0, width) x [0, height)`.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Whether `other` has the same dimensions as `self`.
    pub fn same_size<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Value at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<T> {
        if self.in_bounds(x, y) {
            Some(self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Value at an in-bounds `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn at(&self, x: i32, y: i32) -> T {
        assert!(
            self.in_bounds(x, y),
            "({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        self.cells[self.index(x, y)]
    }

    /// Store `value` at `(x, y)` and return the previous value.
    ///
    /// Out-of-bounds writes are ignored and return `None`.
    pub fn set(&mut self, x: i32, y: i32, value: T) -> Option<T> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let i = self.index(x, y);
        Some(std::mem::replace(&mut self.cells[i], value))
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// Row-major cell data.
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// Mutable row-major cell data.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Row-major iterator over every `(x, y)` coordinate.
    pub fn coords(&self) -> impl Iterator<Item = (i32, i32)> {
        let w = self.width as i32;
        let h = self.height as i32;
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }
}

fn check_dims(width: u32, height: u32) -> Result<(), GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::EmptyGrid);
    }
    let max = i32::MAX as u32;
    if width > max {
        return Err(GridError::DimensionTooLarge {
            name: "width",
            value: width,
            max,
        });
    }
    if height > max {
        return Err(GridError::DimensionTooLarge {
            name: "height",
            value: height,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_empty_dimensions() {
        assert_eq!(Grid::new(0, 3, 0.0).unwrap_err(), GridError::EmptyGrid);
        assert_eq!(Grid::new(3, 0, 0.0).unwrap_err(), GridError::EmptyGrid);
    }

    #[test]
    fn same_size_ignores_cell_type() {
        let scalars = Grid::new(4, 2, 0.0).unwrap();
        assert!(scalars.same_size(&Grid::new(4, 2, 'x').unwrap()));
        assert!(!scalars.same_size(&Grid::new(2, 4, 0.0).unwrap()));
        assert!(!scalars.same_size(&Grid::new(4, 3, 0.0).unwrap()));
    }

    #[test]
    fn from_vec_checks_length() {
        let err = Grid::from_vec(2, 2, vec![1.0; 3]).unwrap_err();
        assert_eq!(
            err,
            GridError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn set_returns_previous_and_ignores_out_of_bounds() {
        let mut g = Grid::new(3, 2, 0.0).unwrap();
        assert_eq!(g.set(2, 1, 5.0), Some(0.0));
        assert_eq!(g.get(2, 1), Some(5.0));
        assert_eq!(g.set(3, 0, 1.0), None);
        assert_eq!(g.set(-1, 0, 1.0), None);
        assert_eq!(g.get(0, 2), None);
    }

    #[test]
    fn row_major_layout() {
        let g = Grid::from_fn(3, 2, |x, y| (y * 10 + x) as f64).unwrap();
        assert_eq!(g.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        let coords: Vec<_> = g.coords().collect();
        assert_eq!(coords[0], (0, 0));
        assert_eq!(coords[3], (0, 1));
        assert_eq!(coords.len(), 6);
    }

    proptest! {
        #[test]
        fn get_matches_in_bounds(w in 1u32..12, h in 1u32..12, x in -3i32..15, y in -3i32..15) {
            let g = Grid::from_fn(w, h, |cx, cy| cx * 100 + cy).unwrap();
            match g.get(x, y) {
                Some(v) => {
                    prop_assert!(g.in_bounds(x, y));
                    prop_assert_eq!(v, x * 100 + y);
                }
                None => prop_assert!(!g.in_bounds(x, y)),
            }
        }
    }
}
