//! Test fixtures and recording listeners for Lure development.
//!
//! Provides standard source grids ([`fixtures`]), a [`RecordingListener`]
//! for asserting on change notifications, and [`init_test_tracing`] for
//! routing log output through the test harness.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use lure_core::{Direction, MapId, MapListener, PathfindingMap};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing_subscriber::EnvFilter;

/// One notification received by a [`RecordingListener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Cell(i32, i32),
    All,
}

/// Listener that records every notification it receives.
///
/// Attach with [`RecordingListener::attach`]; the returned handle must be
/// kept alive for notifications to arrive.
#[derive(Debug)]
pub struct RecordingListener {
    id: MapId,
    events: RefCell<Vec<Event>>,
}

impl RecordingListener {
    /// Subscribe a fresh recorder to `map`'s notifier.
    ///
    /// # Panics
    ///
    /// If `map` has no change notifier.
    pub fn attach(map: &dyn PathfindingMap) -> Rc<Self> {
        let recorder = Rc::new(Self {
            id: MapId::next(),
            events: RefCell::new(Vec::new()),
        });
        let weak: Weak<dyn MapListener> = Rc::downgrade(&recorder) as Weak<dyn MapListener>;
        map.change_notifier()
            .expect("map has no change notifier")
            .subscribe(recorder.id, weak);
        recorder
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Cells reported individually, in arrival order.
    pub fn cells(&self) -> Vec<(i32, i32)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Cell(x, y) => Some((x, y)),
                Event::All => None,
            })
            .collect()
    }

    /// Number of whole-map notifications.
    pub fn all_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| **e == Event::All)
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl MapListener for RecordingListener {
    fn source_changed(&self, x: i32, y: i32) {
        self.events.borrow_mut().push(Event::Cell(x, y));
    }

    fn source_changed_all(&self) {
        self.events.borrow_mut().push(Event::All);
    }
}

/// Whether `a` and `b` agree to within `eps` in both components.
pub fn approx_eq(a: Direction, b: Direction, eps: f64) -> bool {
    (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
}

/// Install a test-writer subscriber filtered by `RUST_LOG`, with
/// `lure_maps=info` on top.
///
/// Safe to call repeatedly; only the first call installs.
pub fn init_test_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "lure_maps=info".parse() {
        filter = filter.add_directive(directive);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
