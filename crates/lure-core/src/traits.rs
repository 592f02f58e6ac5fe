//! Capability traits shared by every map.
//!
//! Scalar and vector fields are separate capabilities ([`PotentialMap`],
//! [`FlowMap`]) over a common [`PathfindingMap`] base. Maps that cache
//! derived values implement [`DynamicMap`]; maps that react to a source
//! changing implement [`MapListener`].
//!
//! Maps are shared through `Rc` and every method takes `&self`: the graph
//! is single-threaded and caches live behind interior mutability.

use crate::direction::Direction;
use crate::id::MapId;
use crate::notify::ChangeNotifier;

/// How a map reacts when one of its sources changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpdateMode {
    /// Mark the affected cells dirty and recompute them on the next read
    /// or sweep.
    #[default]
    Lazy,
    /// Recompute the affected cells before the mutating call returns.
    Eager,
}

/// Width/height capability shared by every field.
pub trait PathfindingMap {
    /// Number of columns.
    fn width(&self) -> u32;

    /// Number of rows.
    fn height(&self) -> u32;

    /// Unique identity of this map instance.
    fn map_id(&self) -> MapId;

    /// Notification hub, if this map reports changes to listeners.
    ///
    /// Static maps return `None`; combinators then skip subscribing.
    fn change_notifier(&self) -> Option<&ChangeNotifier> {
        None
    }

    /// Call `visit` once for every map this one reads from.
    ///
    /// Used to reject dependency cycles when composing maps.
    fn visit_dependencies(&self, _visit: &mut dyn FnMut(&dyn PathfindingMap)) {}
}

/// Read access to a scalar field.
///
/// Higher values attract, lower or negative values repel.
pub trait PotentialMap: PathfindingMap {
    /// Potential at `(x, y)`.
    ///
    /// Never stale: a dirty cell is recomputed before it is returned.
    /// Out-of-bounds coordinates go through the map's edge handler.
    fn obtain_potential(&self, x: i32, y: i32) -> f64;
}

/// Read access to a vector field.
pub trait FlowMap: PathfindingMap {
    /// Preferred direction at `(x, y)`: a unit vector or
    /// [`Direction::NEUTRAL`].
    ///
    /// Never stale. Out-of-bounds coordinates go through the map's edge
    /// handler.
    fn obtain_direction(&self, x: i32, y: i32) -> Direction;
}

/// The invalidation protocol for maps that cache values.
pub trait DynamicMap: PathfindingMap {
    /// Flag `(x, y)` and every cell within this map's extents of it as
    /// stale, and forward the change to listeners.
    fn mark_dirty(&self, x: i32, y: i32);

    /// Flag every cell as stale and forward to listeners.
    fn mark_all_dirty(&self);

    /// Recompute `(x, y)` unconditionally, clear its dirty flag and notify
    /// listeners.
    fn force_update(&self, x: i32, y: i32);

    /// Recompute every cell unconditionally and notify listeners.
    fn force_update_all(&self);

    /// Recompute `(x, y)` only if it is dirty.
    fn update_if_dirty(&self, x: i32, y: i32);

    /// Recompute every dirty cell.
    fn update_if_dirty_all(&self);

    /// How many columns away a source change can affect this map.
    fn horizontal_extent(&self) -> u32 {
        0
    }

    /// How many rows away a source change can affect this map.
    fn vertical_extent(&self) -> u32 {
        0
    }

    /// Propagation discipline for source changes.
    fn update_mode(&self) -> UpdateMode;
}

/// Receiver side of a listener edge.
///
/// Registered with a source's [`ChangeNotifier`]; the source calls these
/// after its value at a cell (or everywhere) may have changed.
pub trait MapListener {
    /// The source's value at `(x, y)` may have changed.
    fn source_changed(&self, x: i32, y: i32);

    /// Any of the source's values may have changed.
    fn source_changed_all(&self);
}
