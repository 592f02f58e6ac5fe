//! Listener registration and change fan-out.

use crate::id::MapId;
use crate::traits::MapListener;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// The set of listener edges leaving one map.
///
/// Holds weak handles so a source never keeps a dependent alive. Handles
/// are keyed by the dependent's [`MapId`]: subscribing twice is a no-op
/// and unsubscribing needs only the id. Notification order is
/// subscription order.
///
/// Listeners are snapshotted before any callback runs, so a callback may
/// subscribe or unsubscribe without invalidating the iteration.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: RefCell<IndexMap<MapId, Weak<dyn MapListener>>>,
}

type Snapshot = SmallVec<[Rc<dyn MapListener>; 4]>;

impl ChangeNotifier {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` under `id`. Returns `false` if `id` was already
    /// registered.
    pub fn subscribe(&self, id: MapId, listener: Weak<dyn MapListener>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.contains_key(&id) {
            return false;
        }
        listeners.insert(id, listener);
        true
    }

    /// Remove the listener registered under `id`. Returns whether one was
    /// present.
    pub fn unsubscribe(&self, id: MapId) -> bool {
        self.listeners.borrow_mut().shift_remove(&id).is_some()
    }

    /// Whether a listener is registered under `id`.
    pub fn is_subscribed(&self, id: MapId) -> bool {
        self.listeners.borrow().contains_key(&id)
    }

    /// Number of registered listeners that are still alive.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .values()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    /// Tell every listener that the value at `(x, y)` may have changed.
    pub fn notify(&self, x: i32, y: i32) {
        for listener in self.live_listeners() {
            listener.source_changed(x, y);
        }
    }

    /// Tell every listener that any value may have changed.
    pub fn notify_all(&self) {
        for listener in self.live_listeners() {
            listener.source_changed_all();
        }
    }

    fn live_listeners(&self) -> Snapshot {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|_, l| l.strong_count() > 0);
        listeners.values().filter_map(Weak::upgrade).collect()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
