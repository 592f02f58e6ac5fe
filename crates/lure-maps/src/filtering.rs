//! Kernel convolution over a single scalar source.

use crate::cache::{self, CellCache, Cached};
use crate::derived::Underlying;
use crate::graph::depends_on;
use crate::kernel::Kernel;
use crate::stats::UpdateStats;
use lure_core::{
    ChangeNotifier, DynamicMap, EdgeHandler, MapError, MapId, MapListener, PathfindingMap,
    PotentialMap, UpdateMode,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A potential map that smooths, spreads or sharpens one source.
///
/// Each cell holds `kernel.apply(source, x, y)`. A source change at
/// `(x, y)` can only affect cells within the kernel radii of it, so that
/// window is the map's extent.
///
/// # Examples
///
/// ```
/// use lure_core::{Grid, PotentialMap};
/// use lure_maps::{FilteringPotentialMap, Kernel, SimplePotentialMap};
///
/// let mut grid = Grid::new(5, 5, 0.0).unwrap();
/// grid.set(2, 2, 9.0);
/// let spike = SimplePotentialMap::new(grid);
///
/// let blur = FilteringPotentialMap::builder()
///     .source(spike.clone())
///     .kernel(Kernel::uniform(1, 1))
///     .build()
///     .unwrap();
/// assert!((blur.obtain_potential(1, 1) - 1.0).abs() < 1e-12);
/// assert_eq!(blur.obtain_potential(0, 0), 0.0);
///
/// spike.set(2, 2, 0.0);
/// assert_eq!(blur.obtain_potential(1, 1), 0.0);
/// ```
pub struct FilteringPotentialMap {
    id: MapId,
    name: String,
    mode: UpdateMode,
    kernel: Kernel,
    edge: EdgeHandler<f64>,
    source: RefCell<Rc<dyn PotentialMap>>,
    this: Weak<dyn MapListener>,
    cache: CellCache<f64>,
    notifier: ChangeNotifier,
}

/// Configures a [`FilteringPotentialMap`].
#[derive(Default)]
pub struct FilteringPotentialMapBuilder {
    source: Option<Rc<dyn PotentialMap>>,
    kernel: Option<Kernel>,
    edge: EdgeHandler<f64>,
    mode: UpdateMode,
    name: Option<String>,
}

impl FilteringPotentialMapBuilder {
    /// The map to filter. Required.
    pub fn source(mut self, source: Rc<dyn PotentialMap>) -> Self {
        self.source = Some(source);
        self
    }

    /// Convolution window. Defaults to the identity kernel (radius 0,
    /// weight 1).
    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = Some(kernel);
        self
    }

    /// How this map answers out-of-bounds reads. Defaults to `Extend`.
    pub fn edge_handler(mut self, edge: EdgeHandler<f64>) -> Self {
        self.edge = edge;
        self
    }

    /// Propagation discipline. Defaults to [`UpdateMode::Lazy`].
    pub fn mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    /// Name used in logs. Defaults to `map-<id>`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build, subscribe to the source and compute every cell once.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingSource`] without a source.
    pub fn build(self) -> Result<Rc<FilteringPotentialMap>, MapError> {
        let source = self.source.ok_or(MapError::MissingSource)?;
        let kernel = match self.kernel {
            Some(k) => k,
            None => Kernel::box_sum(0, 0),
        };
        let cache = CellCache::new(source.width(), source.height(), 0.0)?;
        let id = MapId::next();
        let name = self.name.unwrap_or_else(|| id.default_name());

        let map = Rc::new_cyclic(|weak: &Weak<FilteringPotentialMap>| {
            let this: Weak<dyn MapListener> = weak.clone();
            FilteringPotentialMap {
                id,
                name,
                mode: self.mode,
                kernel,
                edge: self.edge,
                source: RefCell::new(Rc::clone(&source)),
                this,
                cache,
                notifier: ChangeNotifier::new(),
            }
        });
        if let Some(n) = source.change_notifier() {
            n.subscribe(id, map.this.clone());
        }
        tracing::debug!(
            map = %map.name,
            source = %source.map_id(),
            radius_x = map.kernel.radius_x(),
            radius_y = map.kernel.radius_y(),
            mode = ?map.mode,
            "built filtering map"
        );
        cache::force_update_all(&*map);
        Ok(map)
    }
}

impl FilteringPotentialMap {
    /// Start configuring a new map.
    pub fn builder() -> FilteringPotentialMapBuilder {
        FilteringPotentialMapBuilder::default()
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The convolution window.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// The current source.
    pub fn source(&self) -> Rc<dyn PotentialMap> {
        Rc::clone(&self.source.borrow())
    }

    /// Replace the source and recompute every cell.
    ///
    /// # Errors
    ///
    /// [`MapError::DimensionMismatch`] if `source` has a different size,
    /// [`MapError::CyclicDependency`] if `source` reads from this map.
    /// The current source is kept on error.
    pub fn set_source(&self, source: Rc<dyn PotentialMap>) -> Result<(), MapError> {
        let (w, h) = (self.cache.width(), self.cache.height());
        if source.width() != w || source.height() != h {
            return Err(MapError::DimensionMismatch {
                expected: (w, h),
                actual: (source.width(), source.height()),
            });
        }
        if depends_on(source.as_pathfinding(), self.id) {
            return Err(MapError::CyclicDependency {
                name: source.map_id().default_name(),
            });
        }
        let old = self.source.replace(Rc::clone(&source));
        if let Some(n) = old.change_notifier() {
            n.unsubscribe(self.id);
        }
        if let Some(n) = source.change_notifier() {
            n.subscribe(self.id, self.this.clone());
        }
        tracing::debug!(map = %self.name, source = %source.map_id(), "replaced source");
        cache::force_update_all(self);
        Ok(())
    }

    /// Recompute counters.
    pub fn stats(&self) -> UpdateStats {
        self.cache.stats()
    }

    /// Cells awaiting recomputation, row-major.
    pub fn dirty_cells(&self) -> Vec<(i32, i32)> {
        self.cache.dirty_cells()
    }

    /// Whether `(x, y)` awaits recomputation.
    pub fn is_dirty(&self, x: i32, y: i32) -> bool {
        self.cache.is_dirty(x, y)
    }
}

impl Cached for FilteringPotentialMap {
    type Value = f64;

    fn cache(&self) -> &CellCache<f64> {
        &self.cache
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn compute(&self, x: i32, y: i32) -> f64 {
        self.kernel.apply(&**self.source.borrow(), x, y)
    }

    fn extents(&self) -> (u32, u32) {
        (self.kernel.radius_x(), self.kernel.radius_y())
    }

    fn mode(&self) -> UpdateMode {
        self.mode
    }
}

impl PathfindingMap for FilteringPotentialMap {
    fn width(&self) -> u32 {
        self.cache.width()
    }

    fn height(&self) -> u32 {
        self.cache.height()
    }

    fn map_id(&self) -> MapId {
        self.id
    }

    fn change_notifier(&self) -> Option<&ChangeNotifier> {
        Some(&self.notifier)
    }

    fn visit_dependencies(&self, visit: &mut dyn FnMut(&dyn PathfindingMap)) {
        let source = self.source();
        visit(source.as_pathfinding());
    }
}

impl PotentialMap for FilteringPotentialMap {
    fn obtain_potential(&self, x: i32, y: i32) -> f64 {
        cache::obtain(self, &self.edge, x, y)
    }
}

impl DynamicMap for FilteringPotentialMap {
    fn mark_dirty(&self, x: i32, y: i32) {
        cache::mark_dirty(self, x, y);
    }

    fn mark_all_dirty(&self) {
        cache::mark_all_dirty(self);
    }

    fn force_update(&self, x: i32, y: i32) {
        cache::force_update(self, x, y);
    }

    fn force_update_all(&self) {
        cache::force_update_all(self);
    }

    fn update_if_dirty(&self, x: i32, y: i32) {
        cache::update_if_dirty(self, x, y);
    }

    fn update_if_dirty_all(&self) {
        cache::update_if_dirty_all(self);
    }

    fn horizontal_extent(&self) -> u32 {
        self.kernel.radius_x()
    }

    fn vertical_extent(&self) -> u32 {
        self.kernel.radius_y()
    }

    fn update_mode(&self) -> UpdateMode {
        self.mode
    }
}

impl MapListener for FilteringPotentialMap {
    fn source_changed(&self, x: i32, y: i32) {
        cache::source_changed(self, x, y);
    }

    fn source_changed_all(&self) {
        cache::source_changed_all(self);
    }
}

impl Drop for FilteringPotentialMap {
    fn drop(&mut self) {
        if let Some(n) = self.source.get_mut().change_notifier() {
            n.unsubscribe(self.id);
        }
    }
}

impl fmt::Debug for FilteringPotentialMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteringPotentialMap")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("kernel", &self.kernel)
            .field("source", &self.source.borrow().map_id())
            .finish()
    }
}
