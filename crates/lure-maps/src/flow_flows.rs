//! Blending several vector fields into one.

use crate::cache::{self, CellCache, Cached};
use crate::derived::{Change, Changes, Combinator, DerivedMap};
use crate::stats::UpdateStats;
use lure_core::{
    ChangeNotifier, Direction, DynamicMap, EdgeHandler, FlowMap, MapError, MapId, MapListener,
    PathfindingMap, UpdateMode,
};
use std::fmt;
use std::rc::{Rc, Weak};

/// A flow map blending other flow maps.
///
/// Each cell holds the normalized weighted sum of the source directions at
/// the same cell. With a single positively weighted source the source's
/// direction is passed through unchanged; with no sources every cell is
/// [`Direction::NEUTRAL`].
///
/// Only the changed cell itself is affected by a source change, so both
/// extents are 0.
pub struct FlowFromFlowsMap {
    id: MapId,
    name: String,
    mode: UpdateMode,
    edge: EdgeHandler<Direction>,
    sources: DerivedMap<dyn FlowMap>,
    cache: CellCache<Direction>,
    notifier: ChangeNotifier,
}

/// Configures a [`FlowFromFlowsMap`].
#[derive(Default)]
pub struct FlowFromFlowsMapBuilder {
    size: Option<(u32, u32)>,
    edge: EdgeHandler<Direction>,
    mode: UpdateMode,
    name: Option<String>,
    initial: Changes<dyn FlowMap>,
}

impl FlowFromFlowsMapBuilder {
    /// Grid size. Taken from the first source when not set.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// How this map answers out-of-bounds reads. Defaults to `Extend`.
    pub fn edge_handler(mut self, edge: EdgeHandler<Direction>) -> Self {
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

    /// Register `map` with weight 1 when built.
    pub fn source(self, map: Rc<dyn FlowMap>) -> Self {
        self.weighted_source(map, 1.0)
    }

    /// Register `map` with `weight` when built.
    pub fn weighted_source(mut self, map: Rc<dyn FlowMap>, weight: f64) -> Self {
        self.initial = self.initial.add_weighted(map, weight);
        self
    }

    /// Register `map` with `weight` under `name` when built.
    pub fn named_source(
        mut self,
        name: impl Into<String>,
        map: Rc<dyn FlowMap>,
        weight: f64,
    ) -> Self {
        self.initial = self.initial.add_named(name, map, weight);
        self
    }

    /// Build and compute every cell once.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingSource`] when neither a size nor a source is
    /// given, otherwise any error from registering the initial sources.
    pub fn build(self) -> Result<Rc<FlowFromFlowsMap>, MapError> {
        let (width, height) = match self.size {
            Some(size) => size,
            None => first_size(&self.initial).ok_or(MapError::MissingSource)?,
        };
        let cache = CellCache::new(width, height, Direction::NEUTRAL)?;
        let id = MapId::next();
        let name = self.name.unwrap_or_else(|| id.default_name());
        let map = Rc::new_cyclic(|weak: &Weak<FlowFromFlowsMap>| {
            let owner: Weak<dyn MapListener> = weak.clone();
            FlowFromFlowsMap {
                id,
                name,
                mode: self.mode,
                edge: self.edge,
                sources: DerivedMap::new(id, owner, width, height),
                cache,
                notifier: ChangeNotifier::new(),
            }
        });
        tracing::debug!(map = %map.name, width, height, mode = ?map.mode, "built flow blend map");
        if self.initial.is_empty() {
            cache::force_update_all(&*map);
        } else {
            map.apply_changes(self.initial)?;
        }
        Ok(map)
    }
}

fn first_size(changes: &Changes<dyn FlowMap>) -> Option<(u32, u32)> {
    changes.iter().find_map(|op| match op {
        Change::Add { map, .. } => Some((map.width(), map.height())),
        _ => None,
    })
}

impl FlowFromFlowsMap {
    /// Start configuring a new map.
    pub fn builder() -> FlowFromFlowsMapBuilder {
        FlowFromFlowsMapBuilder::default()
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.name
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

impl Combinator for FlowFromFlowsMap {
    type Source = dyn FlowMap;

    fn sources(&self) -> &DerivedMap<dyn FlowMap> {
        &self.sources
    }

    fn rebuild(&self) {
        cache::force_update_all(self);
    }
}

impl Cached for FlowFromFlowsMap {
    type Value = Direction;

    fn cache(&self) -> &CellCache<Direction> {
        &self.cache
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn compute(&self, x: i32, y: i32) -> Direction {
        let passthrough = self.sources.with_sole(|only| {
            (only.weight() > 0.0).then(|| only.map().obtain_direction(x, y))
        });
        if let Some(Some(direction)) = passthrough {
            return direction;
        }
        let mut acc = Direction::NEUTRAL;
        let mut scale = 0.0;
        self.sources.for_each(|source| {
            let w = source.weight();
            if w != 0.0 {
                let term = source.map().obtain_direction(x, y) * w;
                scale += term.length();
                acc = acc + term;
            }
        });
        acc.normalized_within(scale)
    }

    fn extents(&self) -> (u32, u32) {
        (0, 0)
    }

    fn mode(&self) -> UpdateMode {
        self.mode
    }
}

impl PathfindingMap for FlowFromFlowsMap {
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
        self.sources.visit(visit);
    }
}

impl FlowMap for FlowFromFlowsMap {
    fn obtain_direction(&self, x: i32, y: i32) -> Direction {
        cache::obtain(self, &self.edge, x, y)
    }
}

impl DynamicMap for FlowFromFlowsMap {
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

    fn update_mode(&self) -> UpdateMode {
        self.mode
    }
}

impl MapListener for FlowFromFlowsMap {
    fn source_changed(&self, x: i32, y: i32) {
        cache::source_changed(self, x, y);
    }

    fn source_changed_all(&self) {
        cache::source_changed_all(self);
    }
}

impl fmt::Debug for FlowFromFlowsMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowFromFlowsMap")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("sources", &self.sources)
            .finish()
    }
}
