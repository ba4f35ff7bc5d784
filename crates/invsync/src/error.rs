//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use invsync_config::ConfigError;
use invsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PARTIAL: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {target}")]
    #[diagnostic(
        code(invsync::connection_failed),
        help(
            "Check that the host is reachable and the port is open.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { target: String, reason: String },

    #[error("Request timed out: {message}")]
    #[diagnostic(
        code(invsync::timeout),
        help("Increase the timeout with --timeout or check target responsiveness.")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(invsync::auth_failed),
        help(
            "Verify the database password and API token for this profile.\n\
             Store new ones with: invsync config set-secret <password|token>"
        )
    )]
    AuthFailed { message: String },

    #[error("No {secret} configured for profile '{profile}'")]
    #[diagnostic(
        code(invsync::no_credentials),
        help(
            "Store it with: invsync config set-secret {secret} --profile {profile}\n\
             Or name an environment variable with `{secret}_env` in the profile."
        )
    )]
    NoCredentials { profile: String, secret: String },

    // ── Source / target ──────────────────────────────────────────────
    #[error("Source database error: {message}")]
    #[diagnostic(
        code(invsync::source),
        help("Run `invsync discover` to check table and column names, then adjust `projections`.")
    )]
    Source { message: String },

    #[error("{kind} '{key}' not found in target")]
    #[diagnostic(code(invsync::not_found))]
    NotFound { kind: String, key: String },

    #[error("API error: {message}")]
    #[diagnostic(code(invsync::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    // ── Run outcome ──────────────────────────────────────────────────
    #[error("Run completed with {failed} failed write(s) and {load_failures} failed load(s)")]
    #[diagnostic(
        code(invsync::partial_failure),
        help("See the report above. Failed entities are retried on the next run.")
    )]
    PartialFailure { failed: usize, load_failures: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(invsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(invsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: invsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(invsync::no_config),
        help(
            "Create one with: invsync config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(invsync::config))]
    Config(Box<ConfigError>),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(invsync::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(invsync::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(invsync::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PartialFailure { .. } => exit_code::PARTIAL,
            Self::NoCredentials { .. }
            | Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile, secret } => CliError::NoCredentials {
                profile,
                secret: secret.to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(see `invsync config profiles`)".into(),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { target, reason } => {
                CliError::ConnectionFailed { target, reason }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { message } => CliError::Timeout { message },

            CoreError::SourceQuery { message } | CoreError::Introspection { message } => {
                CliError::Source { message }
            }

            CoreError::NotFound { kind, key } => CliError::NotFound {
                kind: kind.to_string(),
                key: key.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Rejected { message } => CliError::ApiError {
                message,
                status: Some(400),
            },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            err @ (CoreError::DuplicateIdentity { .. }
            | CoreError::KindMismatch { .. }
            | CoreError::Materialization { .. }) => CliError::Internal(err.to_string()),

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn config_problems_exit_with_config_code() {
        let err = CliError::from(ConfigError::Validation {
            field: "target.url".into(),
            reason: "required".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONFIG);
    }

    #[test]
    fn core_errors_keep_their_class() {
        let conn = CliError::from(CoreError::ConnectionFailed {
            target: "db:5432/nc".into(),
            reason: "refused".into(),
        });
        assert_eq!(conn.exit_code(), exit_code::CONNECTION);

        let auth = CliError::from(CoreError::AuthenticationFailed {
            message: "bad token".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn partial_failure_has_its_own_code() {
        let err = CliError::PartialFailure {
            failed: 2,
            load_failures: 0,
        };
        assert_eq!(err.exit_code(), exit_code::PARTIAL);
    }
}
