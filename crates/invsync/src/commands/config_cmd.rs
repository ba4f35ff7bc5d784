//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use serde::Serialize;
use tabled::Tabled;

use invsync_config::{Config, Profile, Secret, SourceProfile, TargetProfile};
use invsync_core::{ConflictPolicy, SslMode};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretArg};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

const SSL_MODES: [SslMode; 6] = [
    SslMode::Prefer,
    SslMode::Require,
    SslMode::VerifyCa,
    SslMode::VerifyFull,
    SslMode::Allow,
    SslMode::Disable,
];

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn save(cfg: &Config, global: &GlobalOpts) -> Result<std::path::PathBuf, CliError> {
    let path = config::config_file(global);
    invsync_config::save_config_to(cfg, &path)?;
    Ok(path)
}

fn prompt_secret(label: &str, field: &str) -> Result<String, CliError> {
    let value = rpassword::prompt_password(format!("{label}: ")).map_err(prompt_err)?;
    if value.is_empty() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: format!("{label} cannot be empty"),
        });
    }
    Ok(value)
}

/// Keyring when chosen (returns `None`), plaintext otherwise.
fn place_secret(profile_name: &str, secret: Secret, value: String) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {secret}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        invsync_config::store_secret(profile_name, secret, &value)?;
        eprintln!("   ✓ {secret} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.source.password.is_some() {
            profile.source.password = Some(MASK.into());
        }
        if profile.target.token.is_some() {
            profile.target.token = Some(MASK.into());
        }
    }
    cfg
}

// ── Profile listing ─────────────────────────────────────────────────

#[derive(Serialize)]
struct ProfileSummary {
    name: String,
    default: bool,
    source: String,
    target: String,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Target")]
    target: String,
}

impl From<&ProfileSummary> for ProfileRow {
    fn from(p: &ProfileSummary) -> Self {
        Self {
            marker: if p.default { "*" } else { "" },
            name: p.name.clone(),
            source: p.source.clone(),
            target: p.target.clone(),
        }
    }
}

fn summarize(cfg: &Config) -> Vec<ProfileSummary> {
    let default = cfg.profile_name(None);
    cfg.profiles
        .iter()
        .map(|(name, p)| ProfileSummary {
            name: name.clone(),
            default: name == default,
            source: match (&p.source.host, &p.source.database) {
                (Some(host), Some(db)) => format!(
                    "{host}:{}/{db}",
                    p.source.port.unwrap_or(invsync_core::SourceConfig::DEFAULT_PORT)
                ),
                _ => "-".into(),
            },
            target: p.target.url.clone().unwrap_or_else(|| "-".into()),
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = output::render_single(
                global.output_format(),
                &cfg,
                |c| serde_yaml::to_string(c).unwrap_or_else(|e| e.to_string()),
                |c| c.profile_name(None).to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load(global)?;
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: invsync config init");
                return Ok(());
            }
            let out = output::render_list(
                global.output_format(),
                &summarize(&cfg),
                |p| ProfileRow::from(p),
                |p| {
                    if p.default {
                        format!("{} *", p.name)
                    } else {
                        p.name.clone()
                    }
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            save(&cfg, global)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetSecret { secret, profile } => {
            let cfg = config::load(global)?;
            let name = profile
                .or_else(|| global.profile.clone())
                .unwrap_or_else(|| cfg.profile_name(None).to_owned());
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            let secret = match secret {
                SecretArg::Password => Secret::Password,
                SecretArg::Token => Secret::Token,
            };
            let value = prompt_secret(&format!("New {secret} for '{name}'"), &secret.to_string())?;
            invsync_config::store_secret(&name, secret, &value)?;
            eprintln!("✓ {secret} for profile '{name}' stored in system keyring");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);
    let mut cfg = config::load(global)?;
    eprintln!("invsync configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    if cfg.profiles.contains_key(&profile_name)
        && !Confirm::new()
            .with_prompt(format!("Profile '{profile_name}' exists. Overwrite?"))
            .default(false)
            .interact()
            .map_err(prompt_err)?
    {
        eprintln!("Aborted.");
        return Ok(());
    }

    // 2. Source database
    eprintln!("\nSource database (PostgreSQL)");
    let host: String = Input::new()
        .with_prompt("Host")
        .interact_text()
        .map_err(prompt_err)?;
    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(invsync_core::SourceConfig::DEFAULT_PORT)
        .interact_text()
        .map_err(prompt_err)?;
    let database: String = Input::new()
        .with_prompt("Database")
        .interact_text()
        .map_err(prompt_err)?;
    let user: String = Input::new()
        .with_prompt("User")
        .interact_text()
        .map_err(prompt_err)?;
    let password = prompt_secret("Password", "source.password")?;
    let password = place_secret(&profile_name, Secret::Password, password)?;

    let ssl_labels: Vec<String> = SSL_MODES.iter().map(ToString::to_string).collect();
    let ssl_index = Select::new()
        .with_prompt("TLS mode")
        .items(&ssl_labels[..])
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    // 3. Target inventory
    eprintln!("\nTarget inventory (Nautobot REST API)");
    let url: String = Input::new()
        .with_prompt("URL")
        .default("https://nautobot.example.net".into())
        .validate_with(|s: &String| {
            url::Url::parse(s)
                .map(|_| ())
                .map_err(|e| format!("invalid URL: {e}"))
        })
        .interact_text()
        .map_err(prompt_err)?;
    let token = prompt_secret("API token", "target.token")?;
    let token = place_secret(&profile_name, Secret::Token, token)?;

    // 4. Default conflict policy
    let policies = [
        ConflictPolicy::Overwrite,
        ConflictPolicy::Skip,
        ConflictPolicy::Flag,
    ];
    let policy_labels = &[
        "overwrite: update the target to match the source",
        "skip: never update existing target records",
        "flag: report updates for review, apply nothing",
    ];
    let policy_index = Select::new()
        .with_prompt("Conflict policy for existing records")
        .items(policy_labels)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    // 5. Build profile
    let mut profile = Profile {
        source: SourceProfile {
            host: Some(host),
            port: Some(port),
            database: Some(database),
            user: Some(user),
            password,
            ssl_mode: SSL_MODES.get(ssl_index).copied().unwrap_or_default(),
            ..SourceProfile::default()
        },
        target: TargetProfile {
            url: Some(url),
            token,
            ..TargetProfile::default()
        },
        ..Profile::default()
    };
    let policy = policies.get(policy_index).copied().unwrap_or_default();
    if policy != ConflictPolicy::Overwrite {
        profile.conflict_policy.insert("default".into(), policy);
    }

    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());

    // 6. Write config
    let path = save(&cfg, global)?;
    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Check the source schema: invsync discover");
    eprintln!("  Preview changes:         invsync sync --dry-run");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                source: SourceProfile {
                    host: Some("db.lab".into()),
                    database: Some("nc".into()),
                    password: Some("hunter2".into()),
                    ..SourceProfile::default()
                },
                target: TargetProfile {
                    url: Some("https://nautobot.lab".into()),
                    token: Some("abc".into()),
                    ..TargetProfile::default()
                },
                ..Profile::default()
            },
        );
        cfg.profiles.insert("empty".into(), Profile::default());
        cfg.default_profile = Some("lab".into());
        cfg
    }

    #[test]
    fn show_masks_plaintext_secrets() {
        let cfg = redacted(&sample());
        let lab = cfg.profiles.get("lab").unwrap();
        assert_eq!(lab.source.password.as_deref(), Some(MASK));
        assert_eq!(lab.target.token.as_deref(), Some(MASK));
        assert!(cfg.profiles.get("empty").unwrap().source.password.is_none());
    }

    #[test]
    fn profile_summary_marks_default() {
        let summary = summarize(&sample());
        assert_eq!(summary.len(), 2);
        assert!(summary[0].default);
        assert_eq!(summary[0].source, "db.lab:5432/nc");
        assert_eq!(summary[1].target, "-");
    }
}
