//! Core types and traits for Lure guidance maps.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! storage and capability vocabulary shared by every map in the workspace:
//! the fixed-size [`Grid`], the [`Direction`] vector, per-map
//! [`EdgeHandler`] policies, the read/invalidation traits, and the
//! [`ChangeNotifier`] that carries listener edges between maps.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod direction;
pub mod edge;
pub mod error;
pub mod grid;
pub mod id;
pub mod notify;
pub mod traits;

pub use direction::Direction;
pub use edge::{EdgeHandler, EdgeLookup};
pub use error::{GridError, MapError};
pub use grid::Grid;
pub use id::MapId;
pub use notify::ChangeNotifier;
pub use traits::{DynamicMap, FlowMap, MapListener, PathfindingMap, PotentialMap, UpdateMode};
