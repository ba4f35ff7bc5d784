// ── Structural diff between two graphs ──
//
// Pure: no I/O, no policy. Each (kind, identity key) present on either
// side yields exactly one entry. Entries are grouped by kind in apply
// order; within a kind, source order comes first, then target-only keys
// in target order.

use serde::Serialize;

use crate::graph::Graph;
use crate::model::{AttrValue, Entity, EntityKind, IdentityKey};

/// Per-entity reconciliation state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityState {
    Absent,
    SourceOnly,
    TargetOnly,
    MatchedEqual,
    MatchedConflict,
}

impl EntityState {
    /// State of a key given which sides hold it.
    pub fn classify(source: Option<&Entity>, target: Option<&Entity>) -> Self {
        match (source, target) {
            (None, None) => Self::Absent,
            (Some(_), None) => Self::SourceOnly,
            (None, Some(_)) => Self::TargetOnly,
            (Some(s), Some(t)) => {
                if changes(s, t).is_empty() {
                    Self::MatchedEqual
                } else {
                    Self::MatchedConflict
                }
            }
        }
    }

    /// The candidate action this state produces, if any.
    pub fn action(self) -> Option<Action> {
        match self {
            Self::SourceOnly => Some(Action::Create),
            Self::MatchedConflict => Some(Action::Update),
            Self::Absent | Self::TargetOnly | Self::MatchedEqual => None,
        }
    }
}

/// A write the engine may issue. There is no delete.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Create,
    Update,
}

/// One differing attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttrChange {
    pub field: &'static str,
    pub source: AttrValue,
    pub target: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub kind: EntityKind,
    pub key: IdentityKey,
    pub state: EntityState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Entity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<AttrChange>,
}

impl DiffEntry {
    pub fn action(&self) -> Option<Action> {
        self.state.action()
    }
}

/// Attribute-level differences between two entities of the same kind.
pub fn changes(source: &Entity, target: &Entity) -> Vec<AttrChange> {
    source
        .attributes()
        .into_iter()
        .zip(target.attributes())
        .filter(|((_, s), (_, t))| s != t)
        .map(|((field, s), (_, t))| AttrChange {
            field,
            source: s,
            target: t,
        })
        .collect()
}

/// Diff every kind of `source` against `target`.
pub fn diff(source: &Graph, target: &Graph) -> Vec<DiffEntry> {
    let mut entries = Vec::with_capacity(source.len().max(target.len()));

    for kind in EntityKind::ALL {
        for s in source.iter_kind(kind) {
            let key = s.identity();
            let t = target.get(kind, &key);
            let state = EntityState::classify(Some(s), t);
            let changes = match state {
                EntityState::MatchedConflict => t.map(|t| changes(s, t)).unwrap_or_default(),
                _ => Vec::new(),
            };
            entries.push(DiffEntry {
                kind,
                key,
                state,
                source: Some(s.clone()),
                target: t.cloned(),
                changes,
            });
        }

        for t in target.iter_kind(kind) {
            let key = t.identity();
            if source.contains(kind, &key) {
                continue;
            }
            entries.push(DiffEntry {
                kind,
                key,
                state: EntityState::classify(None, Some(t)),
                source: None,
                target: Some(t.clone()),
                changes: Vec::new(),
            });
        }
    }

    entries
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::FieldMap;
    use pretty_assertions::assert_eq;

    fn location(name: &str, status: &str) -> Entity {
        let mut e = Entity::from_fields(
            EntityKind::Location,
            &FieldMap::new().with("name", name).with("status", status),
        );
        e.normalize_defaults();
        e
    }

    fn graph(kind: EntityKind, entities: Vec<Entity>) -> Graph {
        let mut g = Graph::new();
        g.insert_batch(kind, entities).unwrap();
        g
    }

    #[test]
    fn classify_covers_every_state() {
        let a = location("A", "active");
        let b = location("A", "planned");

        assert_eq!(EntityState::classify(None, None), EntityState::Absent);
        assert_eq!(EntityState::classify(Some(&a), None), EntityState::SourceOnly);
        assert_eq!(EntityState::classify(None, Some(&a)), EntityState::TargetOnly);
        assert_eq!(
            EntityState::classify(Some(&a), Some(&a)),
            EntityState::MatchedEqual
        );
        assert_eq!(
            EntityState::classify(Some(&a), Some(&b)),
            EntityState::MatchedConflict
        );
    }

    #[test]
    fn only_source_only_and_conflict_produce_actions() {
        assert_eq!(EntityState::SourceOnly.action(), Some(Action::Create));
        assert_eq!(EntityState::MatchedConflict.action(), Some(Action::Update));
        assert_eq!(EntityState::MatchedEqual.action(), None);
        assert_eq!(EntityState::TargetOnly.action(), None);
        assert_eq!(EntityState::Absent.action(), None);
    }

    #[test]
    fn synonym_status_matches_canonical_target() {
        // "up" normalizes to active on load, so it matches the target.
        let source = graph(EntityKind::Location, vec![location("NYC-DC1", "up")]);
        let target = graph(EntityKind::Location, vec![location("NYC-DC1", "Active")]);

        let entries = diff(&source, &target);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].state, EntityState::MatchedEqual);
    }

    #[test]
    fn conflict_reports_changed_fields() {
        let source = graph(EntityKind::Location, vec![location("A", "down")]);
        let target = graph(EntityKind::Location, vec![location("A", "active")]);

        let entries = diff(&source, &target);
        assert_eq!(entries[0].state, EntityState::MatchedConflict);
        assert_eq!(
            entries[0].changes,
            vec![AttrChange {
                field: "status",
                source: AttrValue::Text("failed".into()),
                target: AttrValue::Text("active".into()),
            }]
        );
    }

    #[test]
    fn target_only_entries_follow_source_entries() {
        let source = graph(EntityKind::Location, vec![location("B", "active")]);
        let target = graph(
            EntityKind::Location,
            vec![location("A", "active"), location("B", "active")],
        );

        let states: Vec<_> = diff(&source, &target)
            .into_iter()
            .map(|e| (e.key.to_string(), e.state))
            .collect();
        assert_eq!(
            states,
            vec![
                ("B".to_owned(), EntityState::MatchedEqual),
                ("A".to_owned(), EntityState::TargetOnly),
            ]
        );
    }
}
