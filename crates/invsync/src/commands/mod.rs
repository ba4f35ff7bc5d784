//! Command dispatch: bridges CLI args -> core engine -> output formatting.

pub mod config_cmd;
pub mod diff;
pub mod discover;
pub mod sync;

use indicatif::{ProgressBar, ProgressStyle};
use invsync_core::EntityKind;

use crate::cli::{Command, GlobalOpts, KindArg, OutputFormat};
use crate::error::CliError;

/// Dispatch a connection-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sync(args) => sync::handle(args, global).await,
        Command::Diff(args) => diff::handle(args, global).await,
        Command::Discover(args) => discover::handle(args, global).await,
        // Handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are not dispatched".into(),
        )),
    }
}

impl From<KindArg> for EntityKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Location => Self::Location,
            KindArg::Device => Self::Device,
            KindArg::Interface => Self::Interface,
            KindArg::Prefix => Self::Prefix,
            KindArg::IpAddress => Self::IpAddress,
            KindArg::Circuit => Self::Circuit,
        }
    }
}

/// Stderr spinner for interactive table output; hidden otherwise.
pub(crate) fn spinner(global: &GlobalOpts, message: &str) -> ProgressBar {
    if global.quiet || !matches!(global.output_format(), OutputFormat::Table) {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_arg_maps_to_a_distinct_kind() {
        let args = [
            KindArg::Location,
            KindArg::Device,
            KindArg::Interface,
            KindArg::Prefix,
            KindArg::IpAddress,
            KindArg::Circuit,
        ];
        let kinds: Vec<EntityKind> = args.into_iter().map(EntityKind::from).collect();
        assert_eq!(kinds, EntityKind::ALL);
    }
}
