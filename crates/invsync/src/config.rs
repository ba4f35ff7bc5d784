//! Profile resolution for the CLI: which file, which profile, and the
//! flag overrides layered over what `invsync_config` resolves.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use invsync_config::{Config, Profile, RunConfig};
use invsync_core::{SourceConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(invsync_config::config_path)
}

/// Load the config file (missing file yields defaults).
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(invsync_config::load_config_from(&config_file(global))?)
}

/// Fill `--output` and `--color` from the config's `[defaults]` when not
/// given on the command line. An unreadable config is left for the
/// command itself to report.
pub fn apply_defaults(global: &mut GlobalOpts) -> Result<(), CliError> {
    if global.output.is_some() && global.color.is_some() {
        return Ok(());
    }
    let defaults = match load(global) {
        Ok(cfg) => cfg.defaults,
        Err(e) => {
            tracing::debug!(error = %e, "config not readable, using built-in output defaults");
            return Ok(());
        }
    };

    if global.output.is_none() {
        global.output = Some(parse_default("defaults.output", &defaults.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_default("defaults.color", &defaults.color)?);
    }
    Ok(())
}

fn parse_default<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// The active profile and its name. A missing profile is `NoConfig` when
/// there is no config file at all, `ProfileNotFound` otherwise.
pub fn active_profile<'a>(
    global: &'a GlobalOpts,
    cfg: &'a Config,
) -> Result<(&'a str, &'a Profile), CliError> {
    let name = cfg.profile_name(global.profile.as_deref());
    match cfg.profiles.get(name) {
        Some(profile) => Ok((name, profile)),
        None if !config_file(global).exists() && cfg.profiles.is_empty() => {
            Err(CliError::NoConfig {
                path: config_file(global).display().to_string(),
            })
        }
        None => Err(CliError::ProfileNotFound {
            name: name.into(),
            available: available_profiles(cfg),
        }),
    }
}

/// Everything `sync` and `diff` need, with `--insecure` and `--timeout`
/// applied to the target.
pub fn resolve_run(global: &GlobalOpts) -> Result<RunConfig, CliError> {
    let cfg = load(global)?;
    let (name, _) = active_profile(global, &cfg)?;
    let mut run = invsync_config::resolve_run_config(&cfg, Some(name))?;

    if global.insecure {
        run.target.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        run.target.timeout = Duration::from_secs(secs);
    }

    tracing::debug!(
        profile = %run.profile_name,
        source = %run.source.display_target(),
        target = %run.target.url,
        "run configuration resolved"
    );
    Ok(run)
}

/// Source side only, for `discover`. The target section may be empty.
pub fn resolve_source(global: &GlobalOpts) -> Result<SourceConfig, CliError> {
    let cfg = load(global)?;
    let (name, profile) = active_profile(global, &cfg)?;
    Ok(invsync_config::profile_to_source_config(profile, name)?)
}
