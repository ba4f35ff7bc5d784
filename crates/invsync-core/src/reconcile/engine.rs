// ── Reconciliation engine ──
//
// Load both graphs, diff them, gate each candidate through the conflict
// policy, then apply what survives in hierarchy order. A failed write is
// recorded against its entity and the run carries on.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::diff::{Action, DiffEntry, EntityState, diff};
use super::policy::{ConflictPolicies, Verdict};
use super::report::{Failure, FlaggedChange, SyncReport};
use crate::error::CoreError;
use crate::model::EntityKind;
use crate::source::{LoadFailure, Projections, SourceLoader, SourceStore};
use crate::target::{TargetStore, load_target};

/// Both graphs loaded and diffed, nothing applied yet.
#[derive(Debug, Clone, Serialize)]
pub struct SyncPlan {
    pub loaded_at: DateTime<Utc>,
    pub entries: Vec<DiffEntry>,
    pub source_counts: IndexMap<EntityKind, usize>,
    pub target_counts: IndexMap<EntityKind, usize>,
    pub load_failures: Vec<LoadFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    policies: ConflictPolicies,
    dry_run: bool,
}

impl SyncEngine {
    pub fn new(policies: ConflictPolicies) -> Self {
        Self {
            policies,
            dry_run: false,
        }
    }

    /// Report what would happen without writing to the target.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn policies(&self) -> &ConflictPolicies {
        &self.policies
    }

    /// Load source and target concurrently and diff them.
    ///
    /// Source failures are per kind and end up in the plan; a target read
    /// failure aborts.
    pub async fn plan<S, T>(
        &self,
        source: &S,
        projections: &Projections,
        target: &T,
    ) -> Result<SyncPlan, CoreError>
    where
        S: SourceStore + Sync,
        T: TargetStore + Sync,
    {
        let loader = SourceLoader::new(projections);
        let (source_load, target_load) = tokio::join!(loader.load(source), load_target(target));
        let target_load = target_load?;

        let entries = diff(&source_load.graph, &target_load.graph);
        debug!(entries = entries.len(), "diff computed");

        Ok(SyncPlan {
            loaded_at: Utc::now(),
            entries,
            source_counts: source_load.counts,
            target_counts: target_load.counts,
            load_failures: source_load.failures,
        })
    }

    /// Full run: plan, then apply.
    pub async fn run<S, T>(
        &self,
        source: &S,
        projections: &Projections,
        target: &mut T,
    ) -> Result<SyncReport, CoreError>
    where
        S: SourceStore + Sync,
        T: TargetStore + Send + Sync,
    {
        let started_at = Utc::now();
        let plan = self.plan(source, projections, target).await?;
        let mut report = self.apply(plan, target).await;
        report.started_at = started_at;
        Ok(report)
    }

    /// Gate and apply every candidate of `plan`, in plan order.
    pub async fn apply<T>(&self, plan: SyncPlan, target: &mut T) -> SyncReport
    where
        T: TargetStore + Send + Sync,
    {
        let mut report = SyncReport::start(self.dry_run);
        report.started_at = plan.loaded_at;
        for (kind, count) in &plan.source_counts {
            report.counts_mut(*kind).loaded_source = *count;
        }
        for (kind, count) in &plan.target_counts {
            report.counts_mut(*kind).loaded_target = *count;
        }
        report.load_failures = plan.load_failures;

        for entry in plan.entries {
            let kind = entry.kind;
            match entry.state {
                EntityState::MatchedEqual => report.counts_mut(kind).unchanged += 1,
                EntityState::TargetOnly => {
                    warn!(kind = %kind, key = %entry.key, "present only in target, deletes disabled");
                    report.counts_mut(kind).target_only += 1;
                }
                EntityState::Absent => {}
                EntityState::SourceOnly | EntityState::MatchedConflict => {
                    self.apply_entry(entry, target, &mut report).await;
                }
            }
        }

        report.finished_at = Utc::now();
        for (kind, counts) in &report.counts {
            info!(
                kind = %kind,
                dry_run = self.dry_run,
                created = counts.created,
                updated = counts.updated,
                skipped = counts.skipped,
                flagged = counts.flagged,
                failed = counts.failed,
                unchanged = counts.unchanged,
                "reconciled"
            );
        }
        report
    }

    async fn apply_entry<T>(&self, entry: DiffEntry, target: &mut T, report: &mut SyncReport)
    where
        T: TargetStore + Send + Sync,
    {
        let Some(action) = entry.action() else {
            return;
        };
        let kind = entry.kind;
        let policy = self.policies.for_kind(kind);

        match policy.gate(action) {
            Verdict::Skipped => {
                debug!(kind = %kind, key = %entry.key, %action, "suppressed by skip policy");
                report.counts_mut(kind).skipped += 1;
                return;
            }
            Verdict::Flagged => {
                warn!(
                    kind = %kind,
                    key = %entry.key,
                    %action,
                    changes = entry.changes.len(),
                    "conflict flagged, not applied"
                );
                report.counts_mut(kind).flagged += 1;
                report.flagged.push(FlaggedChange {
                    kind,
                    key: entry.key,
                    action,
                    changes: entry.changes,
                });
                return;
            }
            Verdict::Execute => {}
        }

        if self.dry_run {
            debug!(kind = %kind, key = %entry.key, %action, "dry run, not applied");
            Self::count_write(report, kind, action);
            return;
        }

        let result = match &entry.source {
            Some(entity) => match action {
                Action::Create => target.create(entity).await.map(|_| ()),
                Action::Update => match target.lookup(kind, &entry.key).await {
                    Ok(Some((_, reference))) => target.update(&reference, entity).await,
                    Ok(None) => Err(CoreError::NotFound {
                        kind,
                        key: entry.key.clone(),
                    }),
                    Err(e) => Err(e),
                },
            },
            None => Err(CoreError::Internal(format!(
                "{action} candidate for {kind} {} has no source entity",
                entry.key
            ))),
        };

        match result {
            Ok(()) => {
                debug!(kind = %kind, key = %entry.key, %action, "applied");
                Self::count_write(report, kind, action);
            }
            Err(e) => {
                error!(kind = %kind, key = %entry.key, %action, error = %e, "materialization failed");
                report.counts_mut(kind).failed += 1;
                report.failures.push(Failure {
                    kind,
                    key: entry.key,
                    action,
                    message: e.to_string(),
                });
            }
        }
    }

    fn count_write(report: &mut SyncReport, kind: EntityKind, action: Action) {
        let counts = report.counts_mut(kind);
        match action {
            Action::Create => counts.created += 1,
            Action::Update => counts.updated += 1,
        }
    }
}
