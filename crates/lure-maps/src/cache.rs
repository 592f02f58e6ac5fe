//! Shared recompute driver for derived maps.
//!
//! Every derived map owns a [`CellCache`] and implements [`Cached`]; the
//! free functions here implement the [`DynamicMap`](lure_core::DynamicMap)
//! and [`MapListener`](lure_core::MapListener) protocol once on top of it.
//!
//! Propagation rules:
//! - a lazy map marks its extent dirty and forwards only newly dirtied
//!   cells (already-dirty ones were forwarded when they became dirty);
//! - an eager map recomputes its extent and forwards every recomputed cell;
//! - recomputing a cell because it was read does not forward, because the
//!   listeners were told when it went dirty.

use crate::dirty::{region, DirtySet};
use crate::stats::UpdateStats;
use lure_core::{ChangeNotifier, EdgeHandler, EdgeLookup, Grid, MapError, UpdateMode};
use std::cell::{Cell, RefCell};

/// Cached values, dirty flags and counters for one derived map.
#[derive(Debug)]
pub(crate) struct CellCache<V> {
    values: RefCell<Grid<V>>,
    dirty: RefCell<DirtySet>,
    stats: Cell<UpdateStats>,
}

impl<V: Copy> CellCache<V> {
    pub(crate) fn new(width: u32, height: u32, initial: V) -> Result<Self, MapError> {
        Ok(Self {
            values: RefCell::new(Grid::new(width, height, initial)?),
            dirty: RefCell::new(DirtySet::new(width, height)),
            stats: Cell::new(UpdateStats::default()),
        })
    }

    pub(crate) fn width(&self) -> u32 {
        self.values.borrow().width()
    }

    pub(crate) fn height(&self) -> u32 {
        self.values.borrow().height()
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.values.borrow().in_bounds(x, y)
    }

    fn store(&self, x: i32, y: i32, value: V) {
        self.values.borrow_mut().set(x, y, value);
        self.dirty.borrow_mut().remove(x, y);
        let mut stats = self.stats.get();
        stats.cell_recomputes += 1;
        self.stats.set(stats);
    }

    fn store_all(&self, values: &[V]) {
        self.values.borrow_mut().as_mut_slice().copy_from_slice(values);
        self.dirty.borrow_mut().clear();
        let mut stats = self.stats.get();
        stats.full_recomputes += 1;
        self.stats.set(stats);
    }

    pub(crate) fn is_dirty(&self, x: i32, y: i32) -> bool {
        self.dirty.borrow().contains(x, y)
    }

    pub(crate) fn dirty_cells(&self) -> Vec<(i32, i32)> {
        self.dirty.borrow().iter().collect()
    }

    pub(crate) fn stats(&self) -> UpdateStats {
        self.stats.get()
    }

    /// Cached value at an in-bounds cell, without refreshing it.
    pub(crate) fn peek(&self, x: i32, y: i32) -> V {
        self.values.borrow().at(x, y)
    }
}

/// A map whose values are computed per cell from its sources.
pub(crate) trait Cached {
    type Value: Copy;

    fn cache(&self) -> &CellCache<Self::Value>;

    fn notifier(&self) -> &ChangeNotifier;

    /// Compute the value at an in-bounds cell from current source data.
    ///
    /// Must not touch this map's own cache.
    fn compute(&self, x: i32, y: i32) -> Self::Value;

    fn extents(&self) -> (u32, u32);

    fn mode(&self) -> UpdateMode;
}

/// Recompute `(x, y)` without notifying listeners.
fn refresh<M: Cached + ?Sized>(map: &M, x: i32, y: i32) {
    let value = map.compute(x, y);
    map.cache().store(x, y, value);
}

pub(crate) fn mark_dirty<M: Cached + ?Sized>(map: &M, x: i32, y: i32) {
    let (ex, ey) = map.extents();
    let fresh = map.cache().dirty.borrow_mut().mark_region(x, y, ex, ey);
    for (cx, cy) in fresh {
        map.notifier().notify(cx, cy);
    }
}

pub(crate) fn mark_all_dirty<M: Cached + ?Sized>(map: &M) {
    map.cache().dirty.borrow_mut().mark_all();
    map.notifier().notify_all();
}

pub(crate) fn force_update<M: Cached + ?Sized>(map: &M, x: i32, y: i32) {
    if !map.cache().in_bounds(x, y) {
        return;
    }
    refresh(map, x, y);
    map.notifier().notify(x, y);
}

pub(crate) fn force_update_all<M: Cached + ?Sized>(map: &M) {
    let cache = map.cache();
    let (width, height) = (cache.width(), cache.height());
    let mut values = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            values.push(map.compute(x, y));
        }
    }
    cache.store_all(&values);
    tracing::trace!(width, height, "full recompute");
    map.notifier().notify_all();
}

pub(crate) fn update_if_dirty<M: Cached + ?Sized>(map: &M, x: i32, y: i32) {
    if map.cache().is_dirty(x, y) {
        refresh(map, x, y);
    }
}

pub(crate) fn update_if_dirty_all<M: Cached + ?Sized>(map: &M) {
    // Snapshot first: refreshing reads sources, which may clear other flags.
    for (x, y) in map.cache().dirty_cells() {
        update_if_dirty(map, x, y);
    }
}

pub(crate) fn source_changed<M: Cached + ?Sized>(map: &M, x: i32, y: i32) {
    match map.mode() {
        UpdateMode::Lazy => mark_dirty(map, x, y),
        UpdateMode::Eager => {
            let (ex, ey) = map.extents();
            let cache = map.cache();
            tracing::trace!(x, y, ex, ey, "eager fan-out");
            for (cx, cy) in region(x, y, ex, ey, cache.width(), cache.height()) {
                force_update(map, cx, cy);
            }
        }
    }
}

pub(crate) fn source_changed_all<M: Cached + ?Sized>(map: &M) {
    match map.mode() {
        UpdateMode::Lazy => mark_all_dirty(map),
        UpdateMode::Eager => force_update_all(map),
    }
}

/// Read `(x, y)` through `edge`, refreshing the resolved cell if dirty.
pub(crate) fn obtain<M: Cached + ?Sized>(
    map: &M,
    edge: &EdgeHandler<M::Value>,
    x: i32,
    y: i32,
) -> M::Value {
    let cache = map.cache();
    match edge.resolve(x, y, cache.width(), cache.height()) {
        EdgeLookup::Cell(cx, cy) => {
            update_if_dirty(map, cx, cy);
            cache.peek(cx, cy)
        }
        EdgeLookup::Value(v) => v,
    }
}
