// ── Run report ──

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::diff::{Action, AttrChange};
use crate::model::{EntityKind, IdentityKey};
use crate::source::LoadFailure;

/// Per-kind tallies for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub loaded_source: usize,
    pub loaded_target: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub flagged: usize,
    pub failed: usize,
    pub unchanged: usize,
    pub target_only: usize,
}

impl KindCounts {
    fn add(&mut self, other: &Self) {
        self.loaded_source += other.loaded_source;
        self.loaded_target += other.loaded_target;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.flagged += other.flagged;
        self.failed += other.failed;
        self.unchanged += other.unchanged;
        self.target_only += other.target_only;
    }

    /// Writes issued (or, on a dry run, that would be issued).
    pub fn writes(&self) -> usize {
        self.created + self.updated
    }
}

/// A candidate withheld by the `flag` policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedChange {
    pub kind: EntityKind,
    pub key: IdentityKey,
    pub action: Action,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<AttrChange>,
}

/// A candidate that reached the target and was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: EntityKind,
    pub key: IdentityKey,
    pub action: Action,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub counts: IndexMap<EntityKind, KindCounts>,
    pub flagged: Vec<FlaggedChange>,
    pub failures: Vec<Failure>,
    pub load_failures: Vec<LoadFailure>,
}

impl SyncReport {
    pub(crate) fn start(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            dry_run,
            counts: EntityKind::ALL
                .into_iter()
                .map(|kind| (kind, KindCounts::default()))
                .collect(),
            flagged: Vec::new(),
            failures: Vec::new(),
            load_failures: Vec::new(),
        }
    }

    pub(crate) fn counts_mut(&mut self, kind: EntityKind) -> &mut KindCounts {
        self.counts.entry(kind).or_default()
    }

    pub fn counts_for(&self, kind: EntityKind) -> KindCounts {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    /// Sum over every kind.
    pub fn totals(&self) -> KindCounts {
        let mut totals = KindCounts::default();
        for counts in self.counts.values() {
            totals.add(counts);
        }
        totals
    }

    /// Any per-entity write failure or per-kind load failure.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || !self.load_failures.is_empty()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_every_kind() {
        let mut report = SyncReport::start(false);
        report.counts_mut(EntityKind::Location).created = 2;
        report.counts_mut(EntityKind::Device).created = 1;
        report.counts_mut(EntityKind::Device).updated = 3;
        report.counts_mut(EntityKind::Circuit).failed = 1;

        let totals = report.totals();
        assert_eq!(totals.created, 3);
        assert_eq!(totals.writes(), 6);
        assert_eq!(totals.failed, 1);
    }

    #[test]
    fn fresh_report_lists_every_kind_and_no_failures() {
        let report = SyncReport::start(true);
        assert_eq!(report.counts.len(), EntityKind::ALL.len());
        assert!(!report.has_failures());
        assert!(report.dry_run);
    }
}
