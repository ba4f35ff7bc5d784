// ── Source graph loading ──
//
// One read per entity kind, parents first. Each kind loads or fails on
// its own: a failed query or a rejected batch leaves that kind empty and
// the remaining kinds still load.

pub mod memory;
pub mod postgres;
pub mod projection;

use std::future::Future;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::graph::Graph;
use crate::model::{Entity, EntityKind, FieldMap};

pub use memory::MemorySource;
pub use postgres::PgSource;
pub use projection::{Projection, ProjectionOverride, Projections};

/// Read-only access to the source system.
pub trait SourceStore {
    /// All rows of one projection, keyed by entity field name.
    fn fetch(
        &self,
        kind: EntityKind,
        projection: &Projection,
    ) -> impl Future<Output = Result<Vec<FieldMap>, CoreError>> + Send;
}

/// A kind that could not be loaded this run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub kind: EntityKind,
    pub message: String,
}

/// Result of a source load: the graph plus per-kind bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct SourceLoad {
    pub graph: Graph,
    pub counts: IndexMap<EntityKind, usize>,
    pub failures: Vec<LoadFailure>,
}

/// Populates a graph from a [`SourceStore`].
pub struct SourceLoader<'a> {
    projections: &'a Projections,
}

impl<'a> SourceLoader<'a> {
    pub fn new(projections: &'a Projections) -> Self {
        Self { projections }
    }

    pub async fn load<S: SourceStore + Sync>(&self, store: &S) -> SourceLoad {
        let mut load = SourceLoad::default();

        for kind in EntityKind::ALL {
            let projection = self.projections.get(kind);
            match Self::load_kind(store, kind, projection, &mut load.graph).await {
                Ok(count) => {
                    info!(kind = %kind, count, "loaded source entities");
                    load.counts.insert(kind, count);
                }
                Err(e) => {
                    warn!(kind = %kind, error = %e, "source load failed, leaving kind empty");
                    load.counts.insert(kind, 0);
                    load.failures.push(LoadFailure {
                        kind,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            total = load.graph.len(),
            failed_kinds = load.failures.len(),
            "source load complete"
        );
        load
    }

    async fn load_kind<S: SourceStore + Sync>(
        store: &S,
        kind: EntityKind,
        projection: &Projection,
        graph: &mut Graph,
    ) -> Result<usize, CoreError> {
        let rows = store.fetch(kind, projection).await?;
        let entities: Vec<Entity> = rows
            .iter()
            .map(|row| {
                let mut entity = Entity::from_fields(kind, row);
                entity.normalize_defaults();
                entity
            })
            .collect();

        let summary = graph.insert_batch(kind, entities).inspect_err(|e| {
            if let CoreError::DuplicateIdentity { key, .. } = e {
                warn!(kind = %kind, %key, "duplicate identity in source rows, rejecting kind");
            }
        })?;
        if summary.unparented > 0 {
            debug!(
                kind = %kind,
                unparented = summary.unparented,
                "entities loaded without a parent link"
            );
        }
        Ok(summary.inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{CanonicalStatus, IdentityKey};

    fn fixture() -> MemorySource {
        MemorySource::new()
            .with_rows(
                EntityKind::Location,
                vec![FieldMap::new().with("name", "NYC-DC1").with("status", "up")],
            )
            .with_rows(
                EntityKind::Device,
                vec![
                    FieldMap::new()
                        .with("name", "router01")
                        .with("location", "NYC-DC1")
                        .with("status", "down"),
                    FieldMap::new()
                        .with("name", "router02")
                        .with("location", "MISSING"),
                ],
            )
    }

    #[tokio::test]
    async fn loads_all_kinds_with_counts() {
        let projections = Projections::default();
        let load = SourceLoader::new(&projections).load(&fixture()).await;

        assert!(load.failures.is_empty());
        assert_eq!(load.counts[&EntityKind::Location], 1);
        assert_eq!(load.counts[&EntityKind::Device], 2);
        assert_eq!(load.counts[&EntityKind::Circuit], 0);

        let r1 = IdentityKey::single("router01");
        assert_eq!(
            load.graph.get(EntityKind::Device, &r1).unwrap().status(),
            CanonicalStatus::Failed
        );
        assert!(load.graph.parent_of(EntityKind::Device, &r1).is_some());
        let r2 = IdentityKey::single("router02");
        assert!(load.graph.parent_of(EntityKind::Device, &r2).is_none());
    }

    #[tokio::test]
    async fn failed_kind_does_not_abort_others() {
        let projections = Projections::default();
        let source = fixture().with_failure(EntityKind::Location, "relation does not exist");
        let load = SourceLoader::new(&projections).load(&source).await;

        assert_eq!(load.failures.len(), 1);
        assert_eq!(load.failures[0].kind, EntityKind::Location);
        assert_eq!(load.graph.count(EntityKind::Location), 0);
        assert_eq!(load.graph.count(EntityKind::Device), 2);
    }

    #[tokio::test]
    async fn duplicate_identity_empties_only_that_kind() {
        let projections = Projections::default();
        let source = fixture().with_rows(
            EntityKind::Circuit,
            vec![
                FieldMap::new().with("cid", "C-1").with("provider", "Lumen"),
                FieldMap::new().with("cid", "C-1").with("provider", "Lumen"),
            ],
        );
        let load = SourceLoader::new(&projections).load(&source).await;

        assert_eq!(load.graph.count(EntityKind::Circuit), 0);
        assert_eq!(load.failures.len(), 1);
        assert!(load.failures[0].message.contains("Duplicate"));
        assert!(load.failures[0].message.contains("C-1"), "{}", load.failures[0].message);
        assert_eq!(load.graph.count(EntityKind::Location), 1);
    }
}
