//! Dependency-graph checks run at composition time.

use lure_core::{MapId, PathfindingMap};

/// Whether `target` is `map` itself or any map it transitively reads.
///
/// Walks [`PathfindingMap::visit_dependencies`] depth-first. The graph is
/// acyclic whenever every edge was added through a checked operation, so
/// the walk terminates.
pub fn depends_on<M: PathfindingMap + ?Sized>(map: &M, target: MapId) -> bool {
    if map.map_id() == target {
        return true;
    }
    let mut found = false;
    map.visit_dependencies(&mut |dep: &dyn PathfindingMap| {
        if !found && depends_on(dep, target) {
            found = true;
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::SimplePotentialMap;
    use crate::{FilteringPotentialMap, Kernel};
    use lure_core::Grid;

    #[test]
    fn leaf_depends_only_on_itself() {
        let leaf = SimplePotentialMap::new(Grid::new(3, 3, 0.0).unwrap());
        assert!(depends_on(&*leaf, leaf.map_id()));
        assert!(!depends_on(&*leaf, MapId::next()));
    }

    #[test]
    fn chain_is_transitive() {
        let leaf = SimplePotentialMap::new(Grid::new(3, 3, 0.0).unwrap());
        let a = FilteringPotentialMap::builder()
            .source(leaf.clone())
            .kernel(Kernel::uniform(1, 1))
            .build()
            .unwrap();
        let b = FilteringPotentialMap::builder()
            .source(a.clone())
            .kernel(Kernel::uniform(1, 1))
            .build()
            .unwrap();
        assert!(depends_on(&*b, leaf.map_id()));
        assert!(depends_on(&*b, a.map_id()));
        assert!(!depends_on(&*a, b.map_id()));
    }
}
