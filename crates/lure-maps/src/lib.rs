//! Incrementally recomputed guidance maps.
//!
//! Leaf maps ([`SimplePotentialMap`], [`SimpleFlowMap`]) expose raw grids.
//! Derived maps cache a value per cell and recompute only what a source
//! change can affect:
//!
//! - [`FilteringPotentialMap`]: kernel convolution of one scalar source.
//! - [`FlowFromPotentialsMap`]: direction toward the highest weighted
//!   neighbour across several scalar sources.
//! - [`FlowFromFlowsMap`]: normalized weighted sum of several vector sources.
//!
//! Changes travel along listener edges registered with each source's
//! [`ChangeNotifier`](lure_core::ChangeNotifier). Each derived map picks an
//! [`UpdateMode`](lure_core::UpdateMode): lazy maps mark cells dirty and
//! recompute on read, eager maps recompute before the mutating call
//! returns. Reads are never stale in either mode.
//!
//! # Composition
//!
//! Multi-source maps implement [`Combinator`]. Every structural change
//! (add, remove, reweight) costs one full recompute; bundle several with
//! [`Changes`] to pay it once.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod cache;
pub mod derived;
pub mod dirty;
pub mod filtering;
pub mod flow_flows;
pub mod flow_potentials;
pub mod graph;
pub mod kernel;
pub mod simple;
pub mod stats;

pub use derived::{Change, Changes, Combinator, DerivedMap, Underlying, UnderlyingMap};
pub use dirty::DirtySet;
pub use filtering::{FilteringPotentialMap, FilteringPotentialMapBuilder};
pub use flow_flows::{FlowFromFlowsMap, FlowFromFlowsMapBuilder};
pub use flow_potentials::{FlowFromPotentialsMap, FlowFromPotentialsMapBuilder};
pub use kernel::Kernel;
pub use simple::{SimpleFlowMap, SimplePotentialMap};
pub use stats::UpdateStats;
