//! Per-cell staleness tracking.

/// The set of cells whose cached value no longer reflects source data.
///
/// Fixed to the `width x height` of its owning map; every member is in
/// bounds. Backed by a flag per cell plus a running count, so membership
/// tests and inserts are O(1) and [`is_empty`](Self::is_empty) does not
/// scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtySet {
    width: u32,
    height: u32,
    flags: Vec<bool>,
    count: usize,
}

impl DirtySet {
    /// An empty set over a `width x height` area.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            flags: vec![false; width as usize * height as usize],
            count: 0,
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Mark `(x, y)`. Returns `true` if it was not already dirty.
    /// Out-of-bounds cells are ignored.
    pub fn insert(&mut self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some(i) if !self.flags[i] => {
                self.flags[i] = true;
                self.count += 1;
                true
            }
            _ => false,
        }
    }

    /// Unmark `(x, y)`. Returns whether it was dirty.
    pub fn remove(&mut self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some(i) if self.flags[i] => {
                self.flags[i] = false;
                self.count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Whether `(x, y)` is dirty.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.flags[i])
    }

    /// Mark every cell within `ex` columns and `ey` rows of `(x, y)`,
    /// clipped to bounds. Returns the cells that were newly dirtied, in
    /// row-major order.
    pub fn mark_region(&mut self, x: i32, y: i32, ex: u32, ey: u32) -> Vec<(i32, i32)> {
        let mut fresh = Vec::new();
        for (cx, cy) in region(x, y, ex, ey, self.width, self.height) {
            if self.insert(cx, cy) {
                fresh.push((cx, cy));
            }
        }
        fresh
    }

    /// Mark every cell.
    pub fn mark_all(&mut self) {
        self.flags.fill(true);
        self.count = self.flags.len();
    }

    /// Unmark every cell.
    pub fn clear(&mut self) {
        self.flags.fill(false);
        self.count = 0;
    }

    /// Number of dirty cells.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no cell is dirty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Dirty cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let w = self.width as usize;
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, &dirty)| dirty)
            .map(move |(i, _)| ((i % w) as i32, (i / w) as i32))
    }

    /// Remove and return every dirty cell in row-major order.
    pub fn drain(&mut self) -> Vec<(i32, i32)> {
        let cells: Vec<_> = self.iter().collect();
        self.clear();
        cells
    }
}

/// In-bounds cells within `ex` columns and `ey` rows of `(x, y)`, row-major.
pub(crate) fn region(
    x: i32,
    y: i32,
    ex: u32,
    ey: u32,
    width: u32,
    height: u32,
) -> impl Iterator<Item = (i32, i32)> {
    let x0 = x.saturating_sub(ex as i32).max(0);
    let x1 = x.saturating_add(ex as i32).min(width as i32 - 1);
    let y0 = y.saturating_sub(ey as i32).max(0);
    let y1 = y.saturating_add(ey as i32).min(height as i32 - 1);
    (y0..=y1).flat_map(move |cy| (x0..=x1).map(move |cx| (cx, cy)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn insert_reports_fresh_marks_only() {
        let mut d = DirtySet::new(4, 4);
        assert!(d.insert(1, 2));
        assert!(!d.insert(1, 2));
        assert!(!d.insert(4, 0));
        assert_eq!(d.len(), 1);
        assert!(d.contains(1, 2));
        assert!(!d.contains(-1, 2));
    }

    #[test]
    fn remove_and_clear() {
        let mut d = DirtySet::new(3, 3);
        d.insert(0, 0);
        d.insert(2, 2);
        assert!(d.remove(0, 0));
        assert!(!d.remove(0, 0));
        assert_eq!(d.len(), 1);
        d.clear();
        assert!(d.is_empty());
    }

    #[test]
    fn mark_region_clips_to_bounds() {
        let mut d = DirtySet::new(5, 5);
        let fresh = d.mark_region(0, 0, 1, 1);
        assert_eq!(fresh, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        let again = d.mark_region(1, 0, 1, 0);
        assert_eq!(again, vec![(2, 0)]);
        assert_eq!(d.len(), 5);
    }

    #[test]
    fn mark_region_asymmetric_extent() {
        let mut d = DirtySet::new(7, 7);
        d.mark_region(3, 3, 2, 0);
        assert_eq!(d.iter().collect::<Vec<_>>(), vec![(1, 3), (2, 3), (3, 3), (4, 3), (5, 3)]);
    }

    #[test]
    fn drain_empties_in_row_major_order() {
        let mut d = DirtySet::new(3, 2);
        d.insert(2, 1);
        d.insert(0, 1);
        d.insert(1, 0);
        assert_eq!(d.drain(), vec![(1, 0), (0, 1), (2, 1)]);
        assert!(d.is_empty());
    }

    #[test]
    fn mark_all_counts_every_cell() {
        let mut d = DirtySet::new(4, 3);
        d.mark_all();
        assert_eq!(d.len(), 12);
        assert!(d.contains(3, 2));
    }

    proptest! {
        #[test]
        fn region_is_chebyshev_ball(
            w in 1u32..10, h in 1u32..10,
            x in 0i32..10, y in 0i32..10,
            r in 0u32..4,
        ) {
            let x = x % w as i32;
            let y = y % h as i32;
            let mut d = DirtySet::new(w, h);
            d.mark_region(x, y, r, r);
            for cy in 0..h as i32 {
                for cx in 0..w as i32 {
                    let inside = (cx - x).abs().max((cy - y).abs()) <= r as i32;
                    prop_assert_eq!(d.contains(cx, cy), inside);
                }
            }
        }
    }
}
