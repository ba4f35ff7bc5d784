// In-process target store.
//
// Behaves like the REST target where it matters to the engine: interfaces
// cannot be created for a device that does not exist, and individual
// reads or writes can be made to fail.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::{TargetRef, TargetStore};
use crate::error::CoreError;
use crate::model::{Entity, EntityKind, IdentityKey};

#[derive(Debug, Clone)]
struct Record {
    id: String,
    entity: Entity,
}

/// Target store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    records: IndexMap<EntityKind, Vec<Record>>,
    next_id: u64,
    read_failures: HashMap<EntityKind, String>,
    write_failures: HashMap<(EntityKind, IdentityKey), String>,
    creates: usize,
    updates: usize,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing the write counters.
    pub fn seed(&mut self, entity: Entity) -> TargetRef {
        self.insert(entity)
    }

    /// Make `list(kind)` fail.
    pub fn fail_reads(&mut self, kind: EntityKind, message: &str) {
        self.read_failures.insert(kind, message.to_owned());
    }

    /// Make create/update of one entity fail.
    pub fn fail_writes(&mut self, kind: EntityKind, key: IdentityKey, message: &str) {
        self.write_failures.insert((kind, key), message.to_owned());
    }

    /// First stored entity with this identity.
    pub fn get(&self, kind: EntityKind, key: &IdentityKey) -> Option<&Entity> {
        self.find(kind, key).map(|r| &r.entity)
    }

    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.records.get(&kind).into_iter().flatten().map(|r| &r.entity)
    }

    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates performed through the [`TargetStore`] interface.
    pub fn create_count(&self) -> usize {
        self.creates
    }

    /// Updates performed through the [`TargetStore`] interface.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    fn find(&self, kind: EntityKind, key: &IdentityKey) -> Option<&Record> {
        self.records
            .get(&kind)?
            .iter()
            .find(|r| r.entity.identity() == *key)
    }

    fn insert(&mut self, entity: Entity) -> TargetRef {
        self.next_id += 1;
        let reference = TargetRef {
            kind: entity.kind(),
            id: format!("mem-{}", self.next_id),
        };
        self.records.entry(entity.kind()).or_default().push(Record {
            id: reference.id.clone(),
            entity,
        });
        reference
    }

    fn check_write(&self, entity: &Entity) -> Result<(), CoreError> {
        let key = entity.identity();
        match self.write_failures.get(&(entity.kind(), key.clone())) {
            Some(message) => Err(CoreError::Materialization {
                kind: entity.kind(),
                key,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl TargetStore for MemoryTarget {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, CoreError> {
        if let Some(message) = self.read_failures.get(&kind) {
            return Err(CoreError::Api {
                message: message.clone(),
                status: None,
            });
        }
        Ok(self.entities(kind).cloned().collect())
    }

    async fn lookup(
        &self,
        kind: EntityKind,
        key: &IdentityKey,
    ) -> Result<Option<(Entity, TargetRef)>, CoreError> {
        Ok(self.find(kind, key).map(|r| {
            (
                r.entity.clone(),
                TargetRef {
                    kind,
                    id: r.id.clone(),
                },
            )
        }))
    }

    async fn create(&mut self, entity: &Entity) -> Result<TargetRef, CoreError> {
        self.check_write(entity)?;

        if let Entity::Interface(iface) = entity {
            let device = IdentityKey::single(&iface.device);
            if self.find(EntityKind::Device, &device).is_none() {
                return Err(CoreError::Materialization {
                    kind: EntityKind::Interface,
                    key: entity.identity(),
                    message: format!("device '{}' not found", iface.device),
                });
            }
        }

        self.creates += 1;
        Ok(self.insert(entity.clone()))
    }

    async fn update(&mut self, reference: &TargetRef, entity: &Entity) -> Result<(), CoreError> {
        self.check_write(entity)?;

        let record = self
            .records
            .get_mut(&reference.kind)
            .and_then(|records| records.iter_mut().find(|r| r.id == reference.id))
            .ok_or_else(|| CoreError::NotFound {
                kind: reference.kind,
                key: entity.identity(),
            })?;

        record.entity = entity.clone();
        self.updates += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::FieldMap;

    fn entity(kind: EntityKind, fields: &[(&str, &str)]) -> Entity {
        Entity::from_fields(kind, &fields.iter().copied().collect::<FieldMap>())
    }

    #[tokio::test]
    async fn create_then_lookup() {
        let mut target = MemoryTarget::new();
        let loc = entity(EntityKind::Location, &[("name", "NYC-DC1")]);

        let reference = target.create(&loc).await.unwrap();
        let (found, found_ref) = target
            .lookup(EntityKind::Location, &loc.identity())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found, loc);
        assert_eq!(found_ref, reference);
        assert_eq!(target.create_count(), 1);
    }

    #[tokio::test]
    async fn interface_requires_existing_device() {
        let mut target = MemoryTarget::new();
        let iface = entity(
            EntityKind::Interface,
            &[("device", "router01"), ("name", "Gi0/0")],
        );

        let err = target.create(&iface).await.unwrap_err();
        assert!(matches!(err, CoreError::Materialization { .. }));

        target.seed(entity(EntityKind::Device, &[("name", "router01")]));
        assert!(target.create(&iface).await.is_ok());
    }

    #[tokio::test]
    async fn injected_write_failure() {
        let mut target = MemoryTarget::new();
        let loc = entity(EntityKind::Location, &[("name", "BAD")]);
        target.fail_writes(EntityKind::Location, loc.identity(), "constraint violated");

        let err = target.create(&loc).await.unwrap_err();
        assert!(err.to_string().contains("constraint violated"));
        assert!(target.is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_reference_is_not_found() {
        let mut target = MemoryTarget::new();
        let loc = entity(EntityKind::Location, &[("name", "A")]);
        let reference = TargetRef {
            kind: EntityKind::Location,
            id: "mem-404".into(),
        };

        let err = target.update(&reference, &loc).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
