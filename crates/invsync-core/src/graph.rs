// ── Entity graph ──
//
// Arena of entities keyed by (kind, identity key), kept in insertion
// order, with containment recorded in a separate parent side-table.
// Containment is opportunistic: a child whose parent is missing is still
// stored, just without a parent link.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::model::{Entity, EntityKind, IdentityKey};

/// Address of one entity in a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeRef {
    pub kind: EntityKind,
    pub key: IdentityKey,
}

impl NodeRef {
    pub fn new(kind: EntityKind, key: IdentityKey) -> Self {
        Self { kind, key }
    }
}

/// Outcome of inserting one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub inserted: usize,
    /// Entities whose kind has a parent but whose parent was not found.
    pub unparented: usize,
}

/// All loaded entities for one side of a run.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    entities: IndexMap<EntityKind, IndexMap<IdentityKey, Entity>>,
    parents: HashMap<NodeRef, NodeRef>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every entity of one kind, or none of them.
    ///
    /// The batch is rejected whole if any entity has the wrong kind or an
    /// identity key that repeats within the batch or already exists in the
    /// graph. Accepted entities are attached to their parent when the
    /// parent is already present.
    pub fn insert_batch(
        &mut self,
        kind: EntityKind,
        batch: Vec<Entity>,
    ) -> Result<BatchSummary, CoreError> {
        let existing = self.entities.get(&kind);
        let mut seen = HashSet::with_capacity(batch.len());

        for entity in &batch {
            if entity.kind() != kind {
                return Err(CoreError::KindMismatch {
                    expected: kind,
                    actual: entity.kind(),
                });
            }
            let key = entity.identity();
            if existing.is_some_and(|m| m.contains_key(&key)) || !seen.insert(key.clone()) {
                return Err(CoreError::DuplicateIdentity { kind, key });
            }
        }

        let mut summary = BatchSummary::default();
        for entity in batch {
            let node = NodeRef::new(kind, entity.identity());
            if let Some((parent_kind, parent_key)) = entity.parent_ref() {
                let parent = NodeRef::new(parent_kind, parent_key);
                if self.contains(parent.kind, &parent.key) {
                    self.parents.insert(node.clone(), parent);
                } else {
                    summary.unparented += 1;
                }
            }
            self.entities.entry(kind).or_default().insert(node.key, entity);
            summary.inserted += 1;
        }

        Ok(summary)
    }

    pub fn get(&self, kind: EntityKind, key: &IdentityKey) -> Option<&Entity> {
        self.entities.get(&kind)?.get(key)
    }

    pub fn contains(&self, kind: EntityKind, key: &IdentityKey) -> bool {
        self.get(kind, key).is_some()
    }

    /// Entities of one kind in insertion order.
    pub fn iter_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.get(&kind).into_iter().flat_map(IndexMap::values)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.get(&kind).map_or(0, IndexMap::len)
    }

    pub fn len(&self) -> usize {
        self.entities.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent_of(&self, kind: EntityKind, key: &IdentityKey) -> Option<&NodeRef> {
        self.parents.get(&NodeRef::new(kind, key.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::FieldMap;

    fn location(name: &str) -> Entity {
        Entity::from_fields(EntityKind::Location, &FieldMap::new().with("name", name))
    }

    fn device(name: &str, location: &str) -> Entity {
        Entity::from_fields(
            EntityKind::Device,
            &FieldMap::new().with("name", name).with("location", location),
        )
    }

    #[test]
    fn attaches_children_to_present_parents() {
        let mut graph = Graph::new();
        graph
            .insert_batch(EntityKind::Location, vec![location("NYC-DC1")])
            .unwrap();
        let summary = graph
            .insert_batch(
                EntityKind::Device,
                vec![device("router01", "NYC-DC1"), device("router02", "LAX-POP")],
            )
            .unwrap();

        assert_eq!(summary, BatchSummary { inserted: 2, unparented: 1 });

        let r1 = IdentityKey::single("router01");
        let parent = graph.parent_of(EntityKind::Device, &r1).unwrap();
        assert_eq!(parent.key, IdentityKey::single("NYC-DC1"));
    }

    #[test]
    fn device_without_location_keeps_its_label() {
        let mut graph = Graph::new();
        graph
            .insert_batch(EntityKind::Device, vec![device("router01", "Nowhere")])
            .unwrap();

        let key = IdentityKey::single("router01");
        assert!(graph.parent_of(EntityKind::Device, &key).is_none());
        let Some(Entity::Device(d)) = graph.get(EntityKind::Device, &key) else {
            panic!("device missing");
        };
        assert_eq!(d.location, "Nowhere");
    }

    #[test]
    fn duplicate_within_batch_rejects_whole_batch() {
        let mut graph = Graph::new();
        let err = graph
            .insert_batch(
                EntityKind::Location,
                vec![location("A"), location("B"), location("A")],
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::DuplicateIdentity { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn duplicate_against_graph_rejects_batch() {
        let mut graph = Graph::new();
        graph.insert_batch(EntityKind::Location, vec![location("A")]).unwrap();

        let err = graph
            .insert_batch(EntityKind::Location, vec![location("B"), location("A")])
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateIdentity { .. }));
        assert_eq!(graph.count(EntityKind::Location), 1);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let mut graph = Graph::new();
        let err = graph
            .insert_batch(EntityKind::Device, vec![location("A")])
            .unwrap_err();
        assert!(matches!(err, CoreError::KindMismatch { .. }));
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut graph = Graph::new();
        graph
            .insert_batch(
                EntityKind::Location,
                vec![location("C"), location("A"), location("B")],
            )
            .unwrap();

        let names: Vec<_> = graph
            .iter_kind(EntityKind::Location)
            .map(|e| e.identity().to_string())
            .collect();
        assert_eq!(names, ["C", "A", "B"]);
    }
}
