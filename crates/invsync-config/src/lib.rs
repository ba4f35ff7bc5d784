//! Shared configuration for the invsync CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to the runtime types in `invsync_core`. The CLI layers its
//! flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use invsync_core::{
    ConflictPolicies, ConflictPolicy, EntityKind, ProjectionOverride, Projections, SourceConfig,
    SslMode, TargetConfig, TlsVerification,
};

/// Keyring service name; entries are keyed `{profile}/{secret}`.
pub const KEYRING_SERVICE: &str = "invsync";

const DEFAULT_PROFILE: &str = "default";
const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {secret} configured for profile '{profile}'")]
    NoCredentials { profile: String, secret: Secret },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// The two secrets a profile needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Secret {
    /// Source database password.
    Password,
    /// Target API token.
    Token,
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named source/target profiles.
    #[serde(default)]
    pub profiles: IndexMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: IndexMap::new(),
        }
    }
}

/// Fallbacks for CLI flags not given on the command line.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// `table`, `json`, `json-compact`, `yaml` or `plain`.
    #[serde(default = "default_output")]
    pub output: String,

    /// `auto`, `always` or `never`.
    #[serde(default = "default_color")]
    pub color: String,

    /// Target request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// One source database paired with one target inventory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub source: SourceProfile,

    #[serde(default)]
    pub target: TargetProfile,

    /// Entity kind (or `default`) → `overwrite` | `skip` | `flag`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub conflict_policy: IndexMap<String, ConflictPolicy>,

    /// Per-kind table/column overrides.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub projections: IndexMap<EntityKind, ProjectionOverride>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceProfile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,

    /// Plaintext password. Prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    #[serde(default)]
    pub ssl_mode: SslMode,

    pub max_connections: Option<u32>,

    /// Pool acquire timeout in seconds.
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TargetProfile {
    /// Base URL (e.g., "https://nautobot.example.net").
    pub url: Option<String>,

    /// Plaintext API token. Prefer the keyring or `token_env`.
    pub token: Option<String>,

    /// Environment variable holding the API token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    #[serde(default)]
    pub insecure: bool,

    /// Override the default timeout.
    pub timeout: Option<u64>,
}

impl Config {
    /// Name of the profile to use: explicit, then `default_profile`.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or(DEFAULT_PROFILE)
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "invsync", "invsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("invsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from `path`, with `INVSYNC_` environment overrides on top.
///
/// Nested keys use a double underscore:
/// `INVSYNC_PROFILES__DEFAULT__TARGET__URL`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("INVSYNC_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML at `path`, creating parent directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a secret: `env_name` variable, then the system keyring, then
/// the plaintext value from the file.
pub fn resolve_secret(
    profile_name: &str,
    secret: Secret,
    env_name: Option<&str>,
    plaintext: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(env_name) = env_name {
        match std::env::var(env_name) {
            Ok(val) => return Ok(SecretString::from(val)),
            Err(_) => debug!(%env_name, %secret, "env var not set, trying keyring"),
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name, secret)) {
        if let Ok(val) = entry.get_password() {
            return Ok(SecretString::from(val));
        }
    }

    // 3. Plaintext in config
    if let Some(val) = plaintext {
        return Ok(SecretString::from(val.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        secret,
    })
}

/// Store a secret in the system keyring.
pub fn store_secret(profile_name: &str, secret: Secret, value: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name, secret))
        .and_then(|entry| entry.set_password(value))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

fn keyring_user(profile_name: &str, secret: Secret) -> String {
    format!("{profile_name}/{secret}")
}

// ── Translation to runtime config ───────────────────────────────────

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Validation {
            field: field.into(),
            reason: "required".into(),
        }),
    }
}

/// Build the source connection descriptor, resolving the password.
pub fn profile_to_source_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<SourceConfig, ConfigError> {
    let src = &profile.source;
    let host = required(src.host.as_deref(), "source.host")?;
    let database = required(src.database.as_deref(), "source.database")?;
    let user = required(src.user.as_deref(), "source.user")?;

    let max_connections = src.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
    if max_connections == 0 {
        return Err(ConfigError::Validation {
            field: "source.max_connections".into(),
            reason: "must be at least 1".into(),
        });
    }

    let password = resolve_secret(
        profile_name,
        Secret::Password,
        src.password_env.as_deref(),
        src.password.as_deref(),
    )?;

    Ok(SourceConfig {
        host: host.to_owned(),
        port: src.port.unwrap_or(SourceConfig::DEFAULT_PORT),
        database: database.to_owned(),
        user: user.to_owned(),
        password,
        ssl_mode: src.ssl_mode,
        max_connections,
        connect_timeout: Duration::from_secs(
            src.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        ),
    })
}

/// Build the target connection descriptor, resolving the token.
pub fn profile_to_target_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<TargetConfig, ConfigError> {
    let tgt = &profile.target;
    let raw_url = required(tgt.url.as_deref(), "target.url")?;
    let url: url::Url = raw_url.parse().map_err(|_| ConfigError::Validation {
        field: "target.url".into(),
        reason: format!("invalid URL: {raw_url}"),
    })?;

    let token = resolve_secret(
        profile_name,
        Secret::Token,
        tgt.token_env.as_deref(),
        tgt.token.as_deref(),
    )?;

    let tls = if tgt.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = tgt.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(TargetConfig {
        url,
        token,
        tls,
        timeout: Duration::from_secs(tgt.timeout.unwrap_or(defaults.timeout)),
    })
}

/// Conflict policies from the profile's `conflict_policy` table.
///
/// Keys are entity kinds, plus an optional `default`.
pub fn profile_policies(profile: &Profile) -> Result<ConflictPolicies, ConfigError> {
    let mut policies = ConflictPolicies::default();
    for (key, policy) in &profile.conflict_policy {
        if key == "default" {
            policies.default = *policy;
            continue;
        }
        let kind: EntityKind = key.parse().map_err(|_| ConfigError::Validation {
            field: format!("conflict_policy.{key}"),
            reason: "not an entity type".into(),
        })?;
        policies.per_kind.insert(kind, *policy);
    }
    Ok(policies)
}

/// Default projections with the profile's overrides applied.
pub fn profile_projections(profile: &Profile) -> Result<Projections, ConfigError> {
    Projections::with_overrides(&profile.projections).map_err(|e| ConfigError::Validation {
        field: "projections".into(),
        reason: e.to_string(),
    })
}

/// Everything a sync run needs from one profile.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub profile_name: String,
    pub source: SourceConfig,
    pub target: TargetConfig,
    pub policies: ConflictPolicies,
    pub projections: Projections,
}

/// Resolve a full run configuration. Any failure happens here, before a
/// connection is opened.
pub fn resolve_run_config(config: &Config, profile: Option<&str>) -> Result<RunConfig, ConfigError> {
    let name = config.profile_name(profile);
    let prof = config.profile(name)?;

    Ok(RunConfig {
        profile_name: name.to_owned(),
        policies: profile_policies(prof)?,
        projections: profile_projections(prof)?,
        source: profile_to_source_config(prof, name)?,
        target: profile_to_target_config(prof, name, &config.defaults)?,
    })
}
