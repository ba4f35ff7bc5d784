// ── Target store contract and graph loading ──
//
// The target is read in full before any diff is computed. Unlike the
// source side, a read failure here is fatal: diffing against a partial
// target would turn every unread record into a create.

pub mod memory;
pub mod rest;

use std::collections::HashSet;
use std::fmt;
use std::future::Future;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::graph::Graph;
use crate::model::{Entity, EntityKind, IdentityKey};

pub use memory::MemoryTarget;
pub use rest::RestTarget;

/// Handle on a persisted target record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub kind: EntityKind,
    pub id: String,
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Lookup, create and update on the canonical store. There is no delete.
pub trait TargetStore {
    /// Every persisted entity of `kind`.
    fn list(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<Entity>, CoreError>> + Send;

    /// Current state and reference of one entity, if it exists.
    fn lookup(
        &self,
        kind: EntityKind,
        key: &IdentityKey,
    ) -> impl Future<Output = Result<Option<(Entity, TargetRef)>, CoreError>> + Send;

    /// Persist a new entity, resolving or creating the minor records it
    /// references.
    fn create(
        &mut self,
        entity: &Entity,
    ) -> impl Future<Output = Result<TargetRef, CoreError>> + Send;

    /// Overwrite the attributes of an existing entity.
    fn update(
        &mut self,
        reference: &TargetRef,
        entity: &Entity,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Result of a target load.
#[derive(Debug, Clone, Default)]
pub struct TargetLoad {
    pub graph: Graph,
    pub counts: IndexMap<EntityKind, usize>,
}

/// Read the whole target into a graph, parents first.
///
/// Records sharing an identity key (the target's own uniqueness rules can
/// be looser than ours) keep the first occurrence and log the rest.
pub async fn load_target<T: TargetStore + Sync>(store: &T) -> Result<TargetLoad, CoreError> {
    let mut load = TargetLoad::default();

    for kind in EntityKind::ALL {
        let listed = store.list(kind).await?;
        let mut seen = HashSet::with_capacity(listed.len());
        let mut entities = Vec::with_capacity(listed.len());

        for mut entity in listed {
            entity.normalize_defaults();
            let key = entity.identity();
            if seen.insert(key.clone()) {
                entities.push(entity);
            } else {
                warn!(kind = %kind, %key, "duplicate identity in target, keeping first");
            }
        }

        let summary = load.graph.insert_batch(kind, entities)?;
        info!(kind = %kind, count = summary.inserted, "loaded target entities");
        load.counts.insert(kind, summary.inserted);
    }

    info!(total = load.graph.len(), "target load complete");
    Ok(load)
}
