//! Leaf maps: raw grids exposed through the read contracts.
//!
//! Leaves hold the only mutable field state. They have nothing to
//! recompute, so their part of the [`DynamicMap`] protocol is forwarding
//! changes to listeners: every mutation through [`SimplePotentialMap::set`]
//! or [`SimplePotentialMap::modify`] notifies atomically, and callers that
//! batch edits with `modify_silently` report the touched cells with
//! [`mark_dirty`](DynamicMap::mark_dirty).

use lure_core::{
    ChangeNotifier, Direction, DynamicMap, EdgeHandler, FlowMap, Grid, MapId, PathfindingMap,
    PotentialMap, UpdateMode,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Storage and notification shared by both leaf kinds.
#[derive(Debug)]
struct Leaf<V> {
    id: MapId,
    grid: RefCell<Grid<V>>,
    edge: EdgeHandler<V>,
    notifier: ChangeNotifier,
}

impl<V: Copy> Leaf<V> {
    fn new(grid: Grid<V>, edge: EdgeHandler<V>) -> Self {
        Self {
            id: MapId::next(),
            grid: RefCell::new(grid),
            edge,
            notifier: ChangeNotifier::new(),
        }
    }

    fn width(&self) -> u32 {
        self.grid.borrow().width()
    }

    fn height(&self) -> u32 {
        self.grid.borrow().height()
    }

    fn read(&self, x: i32, y: i32) -> V {
        self.edge.sample(&self.grid.borrow(), x, y)
    }

    fn set(&self, x: i32, y: i32, value: V) {
        let written = self.grid.borrow_mut().set(x, y, value).is_some();
        if written {
            self.notifier.notify(x, y);
        }
    }

    fn modify<R>(&self, f: impl FnOnce(&mut Grid<V>) -> R) -> R {
        let out = self.modify_silently(f);
        self.notifier.notify_all();
        out
    }

    fn modify_silently<R>(&self, f: impl FnOnce(&mut Grid<V>) -> R) -> R {
        f(&mut *self.grid.borrow_mut())
    }

    fn mark_dirty(&self, x: i32, y: i32) {
        if self.grid.borrow().in_bounds(x, y) {
            self.notifier.notify(x, y);
        }
    }
}

macro_rules! leaf_protocol {
    ($ty:ty) => {
        impl PathfindingMap for $ty {
            fn width(&self) -> u32 {
                self.leaf.width()
            }

            fn height(&self) -> u32 {
                self.leaf.height()
            }

            fn map_id(&self) -> MapId {
                self.leaf.id
            }

            fn change_notifier(&self) -> Option<&ChangeNotifier> {
                Some(&self.leaf.notifier)
            }
        }

        impl DynamicMap for $ty {
            fn mark_dirty(&self, x: i32, y: i32) {
                self.leaf.mark_dirty(x, y);
            }

            fn mark_all_dirty(&self) {
                self.leaf.notifier.notify_all();
            }

            fn force_update(&self, x: i32, y: i32) {
                self.leaf.mark_dirty(x, y);
            }

            fn force_update_all(&self) {
                self.leaf.notifier.notify_all();
            }

            fn update_if_dirty(&self, _x: i32, _y: i32) {}

            fn update_if_dirty_all(&self) {}

            /// Leaves are never stale.
            fn update_mode(&self) -> UpdateMode {
                UpdateMode::Eager
            }
        }
    };
}

/// A scalar field backed directly by a [`Grid<f64>`].
#[derive(Debug)]
pub struct SimplePotentialMap {
    leaf: Leaf<f64>,
}

impl SimplePotentialMap {
    /// Wrap `grid`, extending border values for out-of-bounds reads.
    pub fn new(grid: Grid<f64>) -> Rc<Self> {
        Self::with_edge_handler(grid, EdgeHandler::Extend)
    }

    /// Wrap `grid` with an explicit out-of-bounds policy.
    pub fn with_edge_handler(grid: Grid<f64>, edge: EdgeHandler<f64>) -> Rc<Self> {
        Rc::new(Self {
            leaf: Leaf::new(grid, edge),
        })
    }

    /// Store `value` at `(x, y)` and notify listeners. Out-of-bounds
    /// writes are ignored.
    pub fn set(&self, x: i32, y: i32, value: f64) {
        self.leaf.set(x, y, value);
    }

    /// Edit the grid in bulk, then notify listeners that everything may
    /// have changed.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Grid<f64>) -> R) -> R {
        self.leaf.modify(f)
    }

    /// Edit the grid without notifying. Follow with
    /// [`mark_dirty`](DynamicMap::mark_dirty) for each touched cell.
    pub fn modify_silently<R>(&self, f: impl FnOnce(&mut Grid<f64>) -> R) -> R {
        self.leaf.modify_silently(f)
    }

    /// Copy of the current grid.
    pub fn snapshot(&self) -> Grid<f64> {
        self.leaf.grid.borrow().clone()
    }

    /// Out-of-bounds policy.
    pub fn edge_handler(&self) -> EdgeHandler<f64> {
        self.leaf.edge
    }
}

impl PotentialMap for SimplePotentialMap {
    fn obtain_potential(&self, x: i32, y: i32) -> f64 {
        self.leaf.read(x, y)
    }
}

leaf_protocol!(SimplePotentialMap);

/// A vector field backed directly by a [`Grid<Direction>`].
///
/// Stored directions are normalized on the way in, so every read returns
/// a unit vector or [`Direction::NEUTRAL`].
#[derive(Debug)]
pub struct SimpleFlowMap {
    leaf: Leaf<Direction>,
}

impl SimpleFlowMap {
    /// Wrap `grid`, extending border values for out-of-bounds reads.
    pub fn new(grid: Grid<Direction>) -> Rc<Self> {
        Self::with_edge_handler(grid, EdgeHandler::Extend)
    }

    /// Wrap `grid` with an explicit out-of-bounds policy.
    pub fn with_edge_handler(mut grid: Grid<Direction>, edge: EdgeHandler<Direction>) -> Rc<Self> {
        normalize_all(&mut grid);
        let edge = match edge {
            EdgeHandler::Custom(d) => EdgeHandler::Custom(d.normalized()),
            EdgeHandler::Extend => EdgeHandler::Extend,
        };
        Rc::new(Self {
            leaf: Leaf::new(grid, edge),
        })
    }

    /// Store the normalized `direction` at `(x, y)` and notify listeners.
    pub fn set(&self, x: i32, y: i32, direction: Direction) {
        self.leaf.set(x, y, direction.normalized());
    }

    /// Edit the grid in bulk, renormalize, then notify listeners that
    /// everything may have changed.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Grid<Direction>) -> R) -> R {
        self.leaf.modify(|grid| {
            let out = f(grid);
            normalize_all(grid);
            out
        })
    }

    /// Edit the grid without notifying. Directions are renormalized.
    pub fn modify_silently<R>(&self, f: impl FnOnce(&mut Grid<Direction>) -> R) -> R {
        self.leaf.modify_silently(|grid| {
            let out = f(grid);
            normalize_all(grid);
            out
        })
    }

    /// Copy of the current grid.
    pub fn snapshot(&self) -> Grid<Direction> {
        self.leaf.grid.borrow().clone()
    }
}

impl FlowMap for SimpleFlowMap {
    fn obtain_direction(&self, x: i32, y: i32) -> Direction {
        self.leaf.read(x, y)
    }
}

leaf_protocol!(SimpleFlowMap);

fn normalize_all(grid: &mut Grid<Direction>) {
    for d in grid.as_mut_slice() {
        *d = d.normalized();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lure_core::MapListener;
    use std::cell::RefCell as StdRefCell;
    use std::rc::Weak;

    #[derive(Default)]
    struct Log(StdRefCell<Vec<Option<(i32, i32)>>>);

    impl MapListener for Log {
        fn source_changed(&self, x: i32, y: i32) {
            self.0.borrow_mut().push(Some((x, y)));
        }

        fn source_changed_all(&self) {
            self.0.borrow_mut().push(None);
        }
    }

    fn listen(map: &dyn PathfindingMap) -> Rc<Log> {
        let log = Rc::new(Log::default());
        let weak: Weak<Log> = Rc::downgrade(&log);
        map.change_notifier()
            .unwrap()
            .subscribe(MapId::next(), weak);
        log
    }

    #[test]
    fn set_writes_and_notifies() {
        let map = SimplePotentialMap::new(Grid::new(4, 4, 0.0).unwrap());
        let log = listen(&*map);
        map.set(1, 2, 3.5);
        assert_eq!(map.obtain_potential(1, 2), 3.5);
        assert_eq!(*log.0.borrow(), vec![Some((1, 2))]);
    }

    #[test]
    fn out_of_bounds_set_is_silent() {
        let map = SimplePotentialMap::new(Grid::new(2, 2, 0.0).unwrap());
        let log = listen(&*map);
        map.set(2, 0, 1.0);
        assert!(log.0.borrow().is_empty());
    }

    #[test]
    fn modify_notifies_once_for_everything() {
        let map = SimplePotentialMap::new(Grid::new(3, 3, 0.0).unwrap());
        let log = listen(&*map);
        map.modify(|g| g.fill(1.0));
        assert_eq!(*log.0.borrow(), vec![None]);
        assert_eq!(map.obtain_potential(2, 2), 1.0);
    }

    #[test]
    fn silent_edit_then_mark_dirty() {
        let map = SimplePotentialMap::new(Grid::new(3, 3, 0.0).unwrap());
        let log = listen(&*map);
        map.modify_silently(|g| g.set(0, 1, 4.0));
        assert!(log.0.borrow().is_empty());
        map.mark_dirty(0, 1);
        assert_eq!(*log.0.borrow(), vec![Some((0, 1))]);
    }

    #[test]
    fn edge_handler_applies_to_reads() {
        let grid = Grid::from_fn(2, 2, |x, y| (x + 2 * y) as f64).unwrap();
        let extend = SimplePotentialMap::new(grid.clone());
        assert_eq!(extend.obtain_potential(-1, 5), 2.0);
        let wall = SimplePotentialMap::with_edge_handler(grid, EdgeHandler::Custom(-9.0));
        assert_eq!(wall.obtain_potential(-1, 5), -9.0);
        assert_eq!(wall.obtain_potential(1, 1), 3.0);
        assert_eq!(extend.edge_handler(), EdgeHandler::Extend);
        assert_eq!(wall.edge_handler(), EdgeHandler::Custom(-9.0));
    }

    #[test]
    fn flow_leaf_normalizes() {
        let grid = Grid::new(2, 2, Direction::new(0.0, 5.0)).unwrap();
        let map = SimpleFlowMap::new(grid);
        assert_eq!(map.obtain_direction(0, 0), Direction::SOUTH);
        map.set(1, 1, Direction::new(-2.0, 0.0));
        assert_eq!(map.obtain_direction(1, 1), Direction::WEST);
        map.set(1, 0, Direction::NEUTRAL);
        assert!(map.obtain_direction(1, 0).is_neutral());
    }
}
