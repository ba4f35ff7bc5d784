// ── Conflict policy ──
//
// Gates each candidate action before it reaches the target. `skip` only
// suppresses updates; creates still go through.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::diff::Action;
use crate::model::EntityKind;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ConflictPolicy {
    #[default]
    Overwrite,
    Skip,
    Flag,
}

/// Outcome of passing a candidate through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Execute,
    Skipped,
    Flagged,
}

impl ConflictPolicy {
    pub fn gate(self, action: Action) -> Verdict {
        match (self, action) {
            (Self::Overwrite, _) | (Self::Skip, Action::Create) => Verdict::Execute,
            (Self::Skip, Action::Update) => Verdict::Skipped,
            (Self::Flag, _) => Verdict::Flagged,
        }
    }
}

/// Per-kind policy table with a fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPolicies {
    #[serde(default)]
    pub default: ConflictPolicy,
    #[serde(default)]
    pub per_kind: IndexMap<EntityKind, ConflictPolicy>,
}

impl ConflictPolicies {
    /// Every kind uses `policy`.
    pub fn uniform(policy: ConflictPolicy) -> Self {
        Self {
            default: policy,
            per_kind: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, kind: EntityKind, policy: ConflictPolicy) -> Self {
        self.per_kind.insert(kind, policy);
        self
    }

    pub fn for_kind(&self, kind: EntityKind) -> ConflictPolicy {
        self.per_kind.get(&kind).copied().unwrap_or(self.default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn skip_suppresses_updates_only() {
        assert_eq!(ConflictPolicy::Skip.gate(Action::Create), Verdict::Execute);
        assert_eq!(ConflictPolicy::Skip.gate(Action::Update), Verdict::Skipped);
    }

    #[test]
    fn flag_suppresses_everything() {
        assert_eq!(ConflictPolicy::Flag.gate(Action::Create), Verdict::Flagged);
        assert_eq!(ConflictPolicy::Flag.gate(Action::Update), Verdict::Flagged);
    }

    #[test]
    fn overwrite_executes_everything() {
        assert_eq!(ConflictPolicy::Overwrite.gate(Action::Create), Verdict::Execute);
        assert_eq!(ConflictPolicy::Overwrite.gate(Action::Update), Verdict::Execute);
    }

    #[test]
    fn per_kind_overrides_default() {
        let policies = ConflictPolicies::default().with(EntityKind::Device, ConflictPolicy::Skip);
        assert_eq!(policies.for_kind(EntityKind::Device), ConflictPolicy::Skip);
        assert_eq!(policies.for_kind(EntityKind::Circuit), ConflictPolicy::Overwrite);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("FLAG".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Flag);
        assert!("ignore".parse::<ConflictPolicy>().is_err());
    }
}
