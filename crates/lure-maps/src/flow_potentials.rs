//! Steering directions derived from weighted scalar fields.

use crate::cache::{self, CellCache, Cached};
use crate::derived::{Change, Changes, Combinator, DerivedMap};
use crate::stats::UpdateStats;
use lure_core::{
    ChangeNotifier, Direction, DynamicMap, EdgeHandler, FlowMap, MapError, MapId, MapListener,
    PathfindingMap, PotentialMap, UpdateMode,
};
use std::fmt;
use std::rc::{Rc, Weak};

/// A flow map pointing toward higher combined potential.
///
/// At each cell the eight neighbours are scored by the weighted sum of the
/// source potentials there, and the result is the normalized sum of the
/// eight unit directions scaled by their scores. Negative weights turn an
/// attractor into a repeller. A flat neighbourhood yields
/// [`Direction::NEUTRAL`]; any other one yields a unit vector however small
/// the potentials or weights are.
///
/// A source change at `(x, y)` affects the cells whose neighbour ring
/// contains it, so both extents are 1.
pub struct FlowFromPotentialsMap {
    id: MapId,
    name: String,
    mode: UpdateMode,
    edge: EdgeHandler<Direction>,
    sources: DerivedMap<dyn PotentialMap>,
    cache: CellCache<Direction>,
    notifier: ChangeNotifier,
}

/// Configures a [`FlowFromPotentialsMap`].
#[derive(Default)]
pub struct FlowFromPotentialsMapBuilder {
    size: Option<(u32, u32)>,
    edge: EdgeHandler<Direction>,
    mode: UpdateMode,
    name: Option<String>,
    initial: Changes<dyn PotentialMap>,
}

impl FlowFromPotentialsMapBuilder {
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
    pub fn source(self, map: Rc<dyn PotentialMap>) -> Self {
        self.weighted_source(map, 1.0)
    }

    /// Register `map` with `weight` when built.
    pub fn weighted_source(mut self, map: Rc<dyn PotentialMap>, weight: f64) -> Self {
        self.initial = self.initial.add_weighted(map, weight);
        self
    }

    /// Register `map` with `weight` under `name` when built.
    pub fn named_source(
        mut self,
        name: impl Into<String>,
        map: Rc<dyn PotentialMap>,
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
    pub fn build(self) -> Result<Rc<FlowFromPotentialsMap>, MapError> {
        let (width, height) = match self.size {
            Some(size) => size,
            None => first_size(&self.initial).ok_or(MapError::MissingSource)?,
        };
        let cache = CellCache::new(width, height, Direction::NEUTRAL)?;
        let id = MapId::next();
        let name = self.name.unwrap_or_else(|| id.default_name());
        let map = Rc::new_cyclic(|weak: &Weak<FlowFromPotentialsMap>| {
            let owner: Weak<dyn MapListener> = weak.clone();
            FlowFromPotentialsMap {
                id,
                name,
                mode: self.mode,
                edge: self.edge,
                sources: DerivedMap::new(id, owner, width, height),
                cache,
                notifier: ChangeNotifier::new(),
            }
        });
        tracing::debug!(map = %map.name, width, height, mode = ?map.mode, "built potential flow map");
        if self.initial.is_empty() {
            cache::force_update_all(&*map);
        } else {
            map.apply_changes(self.initial)?;
        }
        Ok(map)
    }
}

fn first_size(changes: &Changes<dyn PotentialMap>) -> Option<(u32, u32)> {
    changes.iter().find_map(|op| match op {
        Change::Add { map, .. } => Some((map.width(), map.height())),
        _ => None,
    })
}

impl FlowFromPotentialsMap {
    /// Start configuring a new map.
    pub fn builder() -> FlowFromPotentialsMapBuilder {
        FlowFromPotentialsMapBuilder::default()
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

impl Combinator for FlowFromPotentialsMap {
    type Source = dyn PotentialMap;

    fn sources(&self) -> &DerivedMap<dyn PotentialMap> {
        &self.sources
    }

    fn rebuild(&self) {
        cache::force_update_all(self);
    }
}

impl Cached for FlowFromPotentialsMap {
    type Value = Direction;

    fn cache(&self) -> &CellCache<Direction> {
        &self.cache
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn compute(&self, x: i32, y: i32) -> Direction {
        let mut scores = [0.0; 8];
        self.sources.for_each(|source| {
            let w = source.weight();
            if w == 0.0 {
                return;
            }
            for (score, &(dx, dy, _)) in scores.iter_mut().zip(Direction::OFFSETS.iter()) {
                *score += w * source.map().obtain_potential(x + dx, y + dy);
            }
        });
        let scale: f64 = scores.iter().map(|s| s.abs()).sum();
        Direction::OFFSETS
            .iter()
            .zip(scores)
            .map(|(&(_, _, dir), score)| dir * score)
            .sum::<Direction>()
            .normalized_within(scale)
    }

    fn extents(&self) -> (u32, u32) {
        (1, 1)
    }

    fn mode(&self) -> UpdateMode {
        self.mode
    }
}

impl PathfindingMap for FlowFromPotentialsMap {
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

impl FlowMap for FlowFromPotentialsMap {
    fn obtain_direction(&self, x: i32, y: i32) -> Direction {
        cache::obtain(self, &self.edge, x, y)
    }
}

impl DynamicMap for FlowFromPotentialsMap {
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
        1
    }

    fn vertical_extent(&self) -> u32 {
        1
    }

    fn update_mode(&self) -> UpdateMode {
        self.mode
    }
}

impl MapListener for FlowFromPotentialsMap {
    fn source_changed(&self, x: i32, y: i32) {
        cache::source_changed(self, x, y);
    }

    fn source_changed_all(&self) {
        cache::source_changed_all(self);
    }
}

impl fmt::Debug for FlowFromPotentialsMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowFromPotentialsMap")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("sources", &self.sources)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::SimplePotentialMap;
    use lure_core::Grid;

    fn ramp() -> Rc<SimplePotentialMap> {
        SimplePotentialMap::new(Grid::from_fn(6, 4, |x, _| x as f64).unwrap())
    }

    #[test]
    fn no_sources_is_neutral_everywhere() {
        let flow = FlowFromPotentialsMap::builder().size(4, 4).build().unwrap();
        assert_eq!(flow.obtain_direction(1, 1), Direction::NEUTRAL);
        assert_eq!(flow.stats().full_recomputes, 1);
    }

    #[test]
    fn missing_size_and_source_is_an_error() {
        let err = FlowFromPotentialsMap::builder().build().unwrap_err();
        assert_eq!(err, MapError::MissingSource);
    }

    #[test]
    fn size_defaults_to_first_source() {
        let flow = FlowFromPotentialsMap::builder()
            .source(ramp())
            .build()
            .unwrap();
        assert_eq!((flow.width(), flow.height()), (6, 4));
        assert_eq!(flow.stats().full_recomputes, 1);
    }

    #[test]
    fn points_up_the_ramp_and_away_when_negated() {
        let ramp = ramp();
        let flow = FlowFromPotentialsMap::builder()
            .named_source("ramp", ramp.clone(), 1.0)
            .build()
            .unwrap();
        let d = flow.obtain_direction(2, 2);
        assert!((d.x - 1.0).abs() < 1e-12 && d.y.abs() < 1e-12);

        flow.set_weight("ramp", -1.0).unwrap();
        let d = flow.obtain_direction(2, 2);
        assert!((d.x + 1.0).abs() < 1e-12 && d.y.abs() < 1e-12);
    }

    #[test]
    fn subscribes_and_unsubscribes_with_the_source_set() {
        let ramp = ramp();
        let flow = FlowFromPotentialsMap::builder().size(6, 4).build().unwrap();
        let notifier = ramp.change_notifier().unwrap();

        flow.add_named_map("a", ramp.clone(), 1.0).unwrap();
        flow.add_named_map("b", ramp.clone(), 1.0).unwrap();
        assert!(notifier.is_subscribed(flow.map_id()));
        assert_eq!(notifier.listener_count(), 1);

        flow.remove_map("a").unwrap();
        assert!(notifier.is_subscribed(flow.map_id()));
        flow.remove_map("b").unwrap();
        assert!(!notifier.is_subscribed(flow.map_id()));
    }

    #[test]
    fn lazy_invalidation_covers_the_neighbour_ring() {
        let ramp = ramp();
        let flow = FlowFromPotentialsMap::builder()
            .source(ramp.clone())
            .build()
            .unwrap();
        ramp.set(3, 1, 50.0);
        assert_eq!(
            flow.dirty_cells(),
            vec![(2, 0), (3, 0), (4, 0), (2, 1), (3, 1), (4, 1), (2, 2), (3, 2), (4, 2)]
        );
        let d = flow.obtain_direction(2, 1);
        assert!(d.x > 0.9);
    }

    #[test]
    fn rejected_change_leaves_map_untouched() {
        let ramp = ramp();
        let flow = FlowFromPotentialsMap::builder()
            .named_source("ramp", ramp.clone(), 1.0)
            .build()
            .unwrap();
        let before = flow.stats();
        let err = flow.set_weight("missing", 2.0).unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownMap {
                name: "missing".into()
            }
        );
        assert_eq!(flow.stats(), before);
        assert_eq!(flow.sources().names(), vec!["ramp".to_string()]);
    }

    #[test]
    fn faint_ramp_still_points_uphill() {
        let faint = Grid::from_fn(6, 4, |x, _| x as f64 * 1e-14).unwrap();
        let flow = FlowFromPotentialsMap::builder()
            .source(SimplePotentialMap::new(faint))
            .build()
            .unwrap();
        for y in 0..4 {
            for x in 0..6 {
                let d = flow.obtain_direction(x, y);
                assert!((d.x - 1.0).abs() < 1e-9, "({x}, {y}) = {d:?}");
            }
        }
    }

    #[test]
    fn tiny_weight_keeps_direction() {
        let flow = FlowFromPotentialsMap::builder()
            .weighted_source(ramp(), 1e-13)
            .build()
            .unwrap();
        let d = flow.obtain_direction(2, 2);
        assert!(d.x > 0.0);
        assert!((d.length() - 1.0).abs() < 1e-12);
    }
}
