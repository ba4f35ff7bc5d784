//! `invsync diff`: load both sides and show how they differ. Read-only.

use tabled::Tabled;

use invsync_core::{DiffEntry, EntityKind, EntityState, PgSource, RestTarget, SyncEngine};

use crate::cli::{DiffArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DiffRow {
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Changes")]
    changes: String,
}

impl From<&DiffEntry> for DiffRow {
    fn from(e: &DiffEntry) -> Self {
        Self {
            kind: e.kind.label(),
            key: e.key.to_string(),
            state: e.state.to_string(),
            changes: change_summary(e),
        }
    }
}

/// `field: target -> source` per changed attribute, one per line.
fn change_summary(e: &DiffEntry) -> String {
    match e.state {
        EntityState::MatchedConflict => e
            .changes
            .iter()
            .map(|c| format!("{}: {} -> {}", c.field, c.target, c.source))
            .collect::<Vec<_>>()
            .join("\n"),
        EntityState::SourceOnly => "(new)".into(),
        EntityState::TargetOnly => "(target only, kept)".into(),
        EntityState::MatchedEqual | EntityState::Absent => String::new(),
    }
}

/// Entries to show: the selected kinds (all when none given), and only
/// differing ones unless `all`.
fn select<'a>(entries: &'a [DiffEntry], kinds: &[EntityKind], all: bool) -> Vec<&'a DiffEntry> {
    entries
        .iter()
        .filter(|e| kinds.is_empty() || kinds.contains(&e.kind))
        .filter(|e| all || e.state != EntityState::MatchedEqual)
        .collect()
}

pub async fn handle(args: DiffArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let run = config::resolve_run(global)?;
    let target = RestTarget::connect(&run.target)?;
    let source = PgSource::connect(&run.source).await?;

    let engine = SyncEngine::new(run.policies);
    let pb = super::spinner(global, "Loading source and target");
    let result = engine.plan(&source, &run.projections, &target).await;
    pb.finish_and_clear();
    source.close().await;
    let plan = result?;

    for failure in &plan.load_failures {
        tracing::warn!(kind = %failure.kind, error = %failure.message, "source kind not loaded");
    }

    let kinds: Vec<EntityKind> = args.kind.into_iter().map(EntityKind::from).collect();
    let shown = select(&plan.entries, &kinds, args.all);

    let out = output::render_list(global.output_format(), &shown, |e| DiffRow::from(*e), |e| {
        format!("{}\t{}\t{}", e.kind, e.key, e.state)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
