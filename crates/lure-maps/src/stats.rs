//! Recompute counters for derived maps.

/// Counts of recomputation work performed by one derived map.
///
/// Counters only; no timing. Read with `stats()` on the map and compare
/// snapshots before and after an operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Full passes over every cell (`force_update_all`).
    pub full_recomputes: u64,
    /// Single-cell recomputations, whether forced, eager or on read.
    pub cell_recomputes: u64,
}
