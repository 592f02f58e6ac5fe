//! Strongly-typed map identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`MapId`] allocation.
static MAP_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a map.
///
/// Allocated from a monotonic atomic counter via [`MapId::next`]. Two
/// distinct maps always have different IDs, even if they wrap identical
/// grids. Used to key listener edges, to generate default source names
/// inside derived maps, and to detect dependency cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(u64);

impl MapId {
    /// Allocate a fresh, unique map ID.
    ///
    /// Each call returns a new ID that has never been returned before
    /// within this process.
    pub fn next() -> Self {
        Self(MAP_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Default source name used when a map is combined without an explicit name.
    pub fn default_name(self) -> String {
        format!("map-{}", self.0)
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = MapId::next();
        let b = MapId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn default_name_embeds_id() {
        let id = MapId::next();
        assert_eq!(id.default_name(), format!("map-{}", id.get()));
    }
}
