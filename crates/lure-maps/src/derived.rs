//! Named, weighted source sets and batched structural changes.
//!
//! [`DerivedMap`] is the part every multi-source map shares: it owns the
//! `name -> (map, weight)` table, validates additions (dimensions, unique
//! names, finite weights, no cycles) and keeps listener edges in step with
//! the table. It never recomputes anything itself; the owning map does
//! that through [`Combinator::rebuild`] after each successful change.

use crate::graph::depends_on;
use indexmap::IndexMap;
use lure_core::{FlowMap, MapError, MapId, MapListener, PathfindingMap, PotentialMap};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A capability a [`DerivedMap`] can consume: scalar or vector sources.
pub trait Underlying: PathfindingMap {
    /// View as the shared base capability.
    fn as_pathfinding(&self) -> &dyn PathfindingMap;
}

impl Underlying for dyn PotentialMap {
    fn as_pathfinding(&self) -> &dyn PathfindingMap {
        self
    }
}

impl Underlying for dyn FlowMap {
    fn as_pathfinding(&self) -> &dyn PathfindingMap {
        self
    }
}

/// One registered source: name, shared map handle and weight.
pub struct UnderlyingMap<M: ?Sized> {
    name: String,
    map: Rc<M>,
    weight: f64,
}

impl<M: ?Sized> UnderlyingMap<M> {
    /// Unique name within the owning map.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source map.
    pub fn map(&self) -> &Rc<M> {
        &self.map
    }

    /// Scale applied to this source's contribution. May be negative.
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl<M: ?Sized> Clone for UnderlyingMap<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            map: Rc::clone(&self.map),
            weight: self.weight,
        }
    }
}

impl<M: Underlying + ?Sized> fmt::Debug for UnderlyingMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnderlyingMap")
            .field("name", &self.name)
            .field("map", &self.map.map_id())
            .field("weight", &self.weight)
            .finish()
    }
}

/// One structural operation inside a [`Changes`] bundle.
pub enum Change<M: ?Sized> {
    /// Register a source. `name: None` uses the source's default name.
    Add {
        /// Explicit name, if any.
        name: Option<String>,
        /// The source.
        map: Rc<M>,
        /// Its weight.
        weight: f64,
    },
    /// Unregister the source with this name.
    Remove {
        /// Name to remove.
        name: String,
    },
    /// Unregister every entry that refers to this map instance.
    RemoveInstance {
        /// Identity of the instance.
        id: MapId,
    },
    /// Change the weight of a registered source.
    SetWeight {
        /// Name of the source.
        name: String,
        /// New weight.
        weight: f64,
    },
}

impl<M: ?Sized> Clone for Change<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Add { name, map, weight } => Self::Add {
                name: name.clone(),
                map: Rc::clone(map),
                weight: *weight,
            },
            Self::Remove { name } => Self::Remove { name: name.clone() },
            Self::RemoveInstance { id } => Self::RemoveInstance { id: *id },
            Self::SetWeight { name, weight } => Self::SetWeight {
                name: name.clone(),
                weight: *weight,
            },
        }
    }
}

/// An immutable bundle of structural operations.
///
/// Each builder method consumes the bundle and returns a new one with the
/// operation appended. Applying the bundle through
/// [`Combinator::apply_changes`] validates every operation first, applies
/// all or nothing, and then recomputes the map once.
///
/// # Examples
///
/// ```
/// use lure_core::{Grid, PotentialMap};
/// use lure_maps::{Changes, Combinator, FlowFromPotentialsMap, SimplePotentialMap};
/// use std::rc::Rc;
///
/// let food = SimplePotentialMap::new(Grid::new(8, 8, 0.0).unwrap());
/// let danger = SimplePotentialMap::new(Grid::new(8, 8, 0.0).unwrap());
/// let flow = FlowFromPotentialsMap::builder().size(8, 8).build().unwrap();
///
/// let food: Rc<dyn PotentialMap> = food;
/// let danger: Rc<dyn PotentialMap> = danger;
/// let changes = Changes::new()
///     .add_named("food", food, 1.0)
///     .add_named("danger", danger, -2.0);
/// flow.apply_changes(changes).unwrap();
///
/// assert_eq!(flow.stats().full_recomputes, 1);
/// assert_eq!(flow.sources().weight("danger"), Some(-2.0));
/// ```
pub struct Changes<M: ?Sized> {
    ops: Vec<Change<M>>,
}

impl<M: ?Sized> Changes<M> {
    /// An empty bundle.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    fn with(mut self, op: Change<M>) -> Self {
        self.ops.push(op);
        self
    }

    /// Add `map` with weight 1 under its default name.
    pub fn add(self, map: Rc<M>) -> Self {
        self.add_weighted(map, 1.0)
    }

    /// Add `map` with `weight` under its default name.
    pub fn add_weighted(self, map: Rc<M>, weight: f64) -> Self {
        self.with(Change::Add {
            name: None,
            map,
            weight,
        })
    }

    /// Add `map` with `weight` under `name`.
    pub fn add_named(self, name: impl Into<String>, map: Rc<M>, weight: f64) -> Self {
        self.with(Change::Add {
            name: Some(name.into()),
            map,
            weight,
        })
    }

    /// Remove the source registered as `name`.
    pub fn remove(self, name: impl Into<String>) -> Self {
        self.with(Change::Remove { name: name.into() })
    }

    /// Remove every entry referring to the map with `id`.
    pub fn remove_instance(self, id: MapId) -> Self {
        self.with(Change::RemoveInstance { id })
    }

    /// Set the weight of the source registered as `name`.
    pub fn set_weight(self, name: impl Into<String>, weight: f64) -> Self {
        self.with(Change::SetWeight {
            name: name.into(),
            weight,
        })
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the bundle holds no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The operations in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Change<M>> {
        self.ops.iter()
    }
}

impl<M: ?Sized> Default for Changes<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ?Sized> Clone for Changes<M> {
    fn clone(&self) -> Self {
        Self {
            ops: self.ops.clone(),
        }
    }
}

impl<M: ?Sized> fmt::Debug for Changes<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Changes").field("len", &self.ops.len()).finish()
    }
}

type SourceTable<M> = IndexMap<String, UnderlyingMap<M>>;

/// The source table of a multi-source map.
///
/// Sources are kept in insertion order, so recomputation visits them
/// deterministically.
pub struct DerivedMap<M: Underlying + ?Sized> {
    owner_id: MapId,
    owner: Weak<dyn MapListener>,
    width: u32,
    height: u32,
    sources: RefCell<SourceTable<M>>,
}

impl<M: Underlying + ?Sized> DerivedMap<M> {
    /// An empty table for the map identified by `owner_id`.
    ///
    /// `owner` is the handle registered with each source's notifier.
    pub fn new(owner_id: MapId, owner: Weak<dyn MapListener>, width: u32, height: u32) -> Self {
        Self {
            owner_id,
            owner,
            width,
            height,
            sources: RefCell::new(IndexMap::new()),
        }
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.borrow().len()
    }

    /// Whether no source is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.borrow().is_empty()
    }

    /// Whether a source is registered as `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.sources.borrow().contains_key(name)
    }

    /// Source names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.sources.borrow().keys().cloned().collect()
    }

    /// Weight of the source registered as `name`.
    pub fn weight(&self, name: &str) -> Option<f64> {
        self.sources.borrow().get(name).map(|u| u.weight)
    }

    /// Snapshot of every entry in insertion order.
    pub fn entries(&self) -> Vec<UnderlyingMap<M>> {
        self.sources.borrow().values().cloned().collect()
    }

    /// Call `f` on the only entry, if exactly one is registered.
    ///
    /// `f` must not change this table.
    pub fn with_sole<R>(&self, f: impl FnOnce(&UnderlyingMap<M>) -> R) -> Option<R> {
        let sources = self.sources.borrow();
        match sources.len() {
            1 => sources.get_index(0).map(|(_, u)| f(u)),
            _ => None,
        }
    }

    /// Call `f` for each entry in insertion order.
    ///
    /// `f` must not change this table.
    pub fn for_each(&self, mut f: impl FnMut(&UnderlyingMap<M>)) {
        for entry in self.sources.borrow().values() {
            f(entry);
        }
    }

    /// Report each distinct source to `visit`.
    pub fn visit(&self, visit: &mut dyn FnMut(&dyn PathfindingMap)) {
        for (_, map) in distinct(&self.sources.borrow()) {
            visit(map.as_pathfinding());
        }
    }

    /// Validate and apply `changes`, returning the number of operations.
    ///
    /// Nothing is applied if any operation fails. Listener edges are added
    /// for new sources and dropped for sources no longer referenced.
    /// Does not recompute the owner.
    pub fn apply(&self, changes: Changes<M>) -> Result<usize, MapError> {
        let count = changes.len();
        let mut working = self.sources.borrow().clone();
        for op in changes.ops {
            self.apply_one(&mut working, op).inspect_err(|e| {
                tracing::warn!(map = %self.owner_id, error = %e, "rejected structural change");
            })?;
        }

        let before = distinct(&self.sources.borrow());
        let after = distinct(&working);
        for (id, map) in &before {
            if !after.contains_key(id) {
                if let Some(n) = map.change_notifier() {
                    n.unsubscribe(self.owner_id);
                }
            }
        }
        for (id, map) in &after {
            if !before.contains_key(id) {
                if let Some(n) = map.change_notifier() {
                    n.subscribe(self.owner_id, self.owner.clone());
                }
            }
        }
        *self.sources.borrow_mut() = working;

        tracing::debug!(
            map = %self.owner_id,
            operations = count,
            sources = after.len(),
            width = self.width,
            height = self.height,
            "applied structural changes"
        );
        Ok(count)
    }

    fn apply_one(&self, table: &mut SourceTable<M>, op: Change<M>) -> Result<(), MapError> {
        match op {
            Change::Add { name, map, weight } => {
                let name = name.unwrap_or_else(|| map.map_id().default_name());
                check_weight(&name, weight)?;
                if table.contains_key(&name) {
                    return Err(MapError::DuplicateName { name });
                }
                if map.width() != self.width || map.height() != self.height {
                    return Err(MapError::DimensionMismatch {
                        expected: (self.width, self.height),
                        actual: (map.width(), map.height()),
                    });
                }
                if depends_on(map.as_pathfinding(), self.owner_id) {
                    return Err(MapError::CyclicDependency { name });
                }
                table.insert(name.clone(), UnderlyingMap { name, map, weight });
            }
            Change::Remove { name } => {
                if table.shift_remove(&name).is_none() {
                    return Err(MapError::UnknownMap { name });
                }
            }
            Change::RemoveInstance { id } => {
                let before = table.len();
                table.retain(|_, u| u.map.map_id() != id);
                if table.len() == before {
                    return Err(MapError::UnknownMap {
                        name: id.default_name(),
                    });
                }
            }
            Change::SetWeight { name, weight } => {
                check_weight(&name, weight)?;
                match table.get_mut(&name) {
                    Some(entry) => entry.weight = weight,
                    None => return Err(MapError::UnknownMap { name }),
                }
            }
        }
        Ok(())
    }
}

impl<M: Underlying + ?Sized> Drop for DerivedMap<M> {
    fn drop(&mut self) {
        // Sources may outlive this map.
        for entry in self.sources.get_mut().values() {
            if let Some(n) = entry.map.change_notifier() {
                n.unsubscribe(self.owner_id);
            }
        }
    }
}

impl<M: Underlying + ?Sized> fmt::Debug for DerivedMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedMap")
            .field("owner", &self.owner_id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sources", &self.names())
            .finish()
    }
}

fn check_weight(name: &str, weight: f64) -> Result<(), MapError> {
    if weight.is_finite() {
        Ok(())
    } else {
        Err(MapError::InvalidWeight {
            name: name.to_string(),
            weight,
        })
    }
}

/// Distinct source instances in first-seen order.
fn distinct<M: Underlying + ?Sized>(table: &SourceTable<M>) -> IndexMap<MapId, Rc<M>> {
    let mut out = IndexMap::new();
    for entry in table.values() {
        out.entry(entry.map.map_id())
            .or_insert_with(|| Rc::clone(&entry.map));
    }
    out
}

/// Structural operations for maps built on a [`DerivedMap`].
///
/// Implementors supply the table and a full recompute; every operation
/// here then costs exactly one [`rebuild`](Self::rebuild) on success and
/// none on failure.
pub trait Combinator {
    /// The consumed capability (`dyn PotentialMap` or `dyn FlowMap`).
    type Source: Underlying + ?Sized;

    /// The source table.
    fn sources(&self) -> &DerivedMap<Self::Source>;

    /// Recompute every cell after the source set changed.
    fn rebuild(&self);

    /// Add `map` with weight 1.
    fn add_map(&self, map: Rc<Self::Source>) -> Result<(), MapError> {
        self.apply_changes(Changes::new().add(map))
    }

    /// Add `map` with `weight`.
    fn add_weighted_map(&self, map: Rc<Self::Source>, weight: f64) -> Result<(), MapError> {
        self.apply_changes(Changes::new().add_weighted(map, weight))
    }

    /// Add `map` with `weight` under `name`.
    fn add_named_map(
        &self,
        name: impl Into<String>,
        map: Rc<Self::Source>,
        weight: f64,
    ) -> Result<(), MapError> {
        self.apply_changes(Changes::new().add_named(name, map, weight))
    }

    /// Remove the source registered as `name`.
    fn remove_map(&self, name: &str) -> Result<(), MapError> {
        self.apply_changes(Changes::new().remove(name))
    }

    /// Remove every entry referring to `map`.
    fn remove_map_instance(&self, map: &Rc<Self::Source>) -> Result<(), MapError> {
        self.apply_changes(Changes::new().remove_instance(map.map_id()))
    }

    /// Set the weight of the source registered as `name`.
    fn set_weight(&self, name: &str, weight: f64) -> Result<(), MapError> {
        self.apply_changes(Changes::new().set_weight(name, weight))
    }

    /// Apply a bundle of operations with a single recompute.
    fn apply_changes(&self, changes: Changes<Self::Source>) -> Result<(), MapError> {
        self.sources().apply(changes)?;
        self.rebuild();
        Ok(())
    }
}
