//! `invsync sync`: one reconciliation run.

use std::fmt::Write as _;

use tabled::Tabled;

use invsync_core::reconcile::{Failure, FlaggedChange, KindCounts};
use invsync_core::{EntityKind, PgSource, RestTarget, SyncEngine, SyncReport};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Source")]
    source: usize,
    #[tabled(rename = "Target")]
    target: usize,
    #[tabled(rename = "Created")]
    created: usize,
    #[tabled(rename = "Updated")]
    updated: usize,
    #[tabled(rename = "Unchanged")]
    unchanged: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Flagged")]
    flagged: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
    #[tabled(rename = "Target only")]
    target_only: usize,
}

impl CountRow {
    fn new(label: &str, c: &KindCounts) -> Self {
        Self {
            kind: label.to_owned(),
            source: c.loaded_source,
            target: c.loaded_target,
            created: c.created,
            updated: c.updated,
            unchanged: c.unchanged,
            skipped: c.skipped,
            flagged: c.flagged,
            failed: c.failed,
            target_only: c.target_only,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let run = config::resolve_run(global)?;
    let mut target = RestTarget::connect(&run.target)?;
    let source = PgSource::connect(&run.source).await?;

    let engine = SyncEngine::new(run.policies).dry_run(args.dry_run);

    let pb = super::spinner(
        global,
        &format!(
            "Reconciling {} into {}",
            run.source.display_target(),
            run.target.url
        ),
    );
    let result = engine.run(&source, &run.projections, &mut target).await;
    pb.finish_and_clear();
    source.close().await;
    let report = result?;

    let color = output::should_color(global.color_mode());
    let out = output::render_single(
        global.output_format(),
        &report,
        |r| render_text(r, color),
        render_plain,
    )?;
    output::print_output(&out, global.quiet);

    if report.has_failures() {
        return Err(CliError::PartialFailure {
            failed: report.failures.len(),
            load_failures: report.load_failures.len(),
        });
    }
    Ok(())
}

// ── Rendering ───────────────────────────────────────────────────────

fn render_text(report: &SyncReport, color: bool) -> String {
    let mut rows: Vec<CountRow> = EntityKind::ALL
        .into_iter()
        .map(|kind| CountRow::new(kind.label(), &report.counts_for(kind)))
        .collect();
    rows.push(CountRow::new("Total", &report.totals()));

    let mut out = String::new();
    if report.dry_run {
        let _ = writeln!(
            out,
            "{}",
            paint("Dry run: nothing was written to the target.", Tone::Warn, color)
        );
    }
    out.push_str(&output::render_table(&rows));

    if !report.load_failures.is_empty() {
        let _ = write!(out, "\n\n{}", paint("Could not load:", Tone::Bad, color));
        for failure in &report.load_failures {
            let _ = write!(out, "\n  {}: {}", failure.kind.label(), failure.message);
        }
    }

    if !report.flagged.is_empty() {
        let _ = write!(out, "\n\n{}", paint("Flagged for review:", Tone::Warn, color));
        for flagged in &report.flagged {
            out.push_str("\n  ");
            out.push_str(&flagged_line(flagged));
        }
    }

    if !report.failures.is_empty() {
        let _ = write!(out, "\n\n{}", paint("Failed:", Tone::Bad, color));
        for failure in &report.failures {
            out.push_str("\n  ");
            out.push_str(&failure_line(failure));
        }
    }

    let seconds = report
        .duration()
        .to_std()
        .unwrap_or_default()
        .as_secs_f64();
    let _ = write!(
        out,
        "\n\n{}",
        paint(&format!("Finished in {seconds:.1}s"), Tone::Muted, color)
    );
    out
}

fn render_plain(report: &SyncReport) -> String {
    let mut lines: Vec<String> = report
        .counts
        .iter()
        .map(|(kind, c)| {
            format!(
                "{kind}\tcreated={}\tupdated={}\tskipped={}\tflagged={}\tfailed={}",
                c.created, c.updated, c.skipped, c.flagged, c.failed
            )
        })
        .collect();
    lines.extend(report.flagged.iter().map(|f| format!("flagged\t{}", flagged_line(f))));
    lines.extend(report.failures.iter().map(|f| format!("failed\t{}", failure_line(f))));
    lines.join("\n")
}

fn flagged_line(flagged: &FlaggedChange) -> String {
    let fields: Vec<&str> = flagged.changes.iter().map(|c| c.field).collect();
    let mut line = format!("{} {} [{}]", flagged.action, flagged.kind, flagged.key);
    if !fields.is_empty() {
        let _ = write!(line, " ({})", fields.join(", "));
    }
    line
}

fn failure_line(failure: &Failure) -> String {
    format!(
        "{} {} [{}]: {}",
        failure.action, failure.kind, failure.key, failure.message
    )
}
