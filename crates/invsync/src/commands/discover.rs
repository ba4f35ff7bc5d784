//! `invsync discover`: introspect the source schema.

use invsync_core::{PgSource, SchemaReport};

use crate::cli::{DiscoverArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: DiscoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let source_config = config::resolve_source(global)?;
    let source = PgSource::connect(&source_config).await?;

    let pb = super::spinner(
        global,
        &format!("Scanning {}", source_config.display_target()),
    );
    let result = invsync_core::discover(&source).await;
    pb.finish_and_clear();
    source.close().await;

    let report = match args.filter.as_deref() {
        Some(filter) => result?.filtered(filter),
        None => result?,
    };
    let max_columns = (!args.all_columns).then_some(args.max_columns);

    let out = output::render_single(
        global.output_format(),
        &report,
        |r| r.render(max_columns),
        plain_lines,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// `kind<TAB>table` per candidate, for scripting.
fn plain_lines(report: &SchemaReport) -> String {
    report
        .candidates
        .iter()
        .flat_map(|(kind, tables)| tables.iter().map(move |t| format!("{kind}\t{t}")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use invsync_core::EntityKind;

    use super::*;

    #[test]
    fn plain_lines_pair_kind_and_table() {
        let mut report = SchemaReport::default();
        report
            .candidates
            .insert(EntityKind::Device, vec!["nc_devices".into(), "inv.device_master".into()]);
        report.candidates.insert(EntityKind::Circuit, Vec::new());

        assert_eq!(
            plain_lines(&report),
            "device\tnc_devices\ndevice\tinv.device_master"
        );
    }
}
