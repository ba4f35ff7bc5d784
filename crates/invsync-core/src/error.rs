// ── Core error types ──
//
// Domain errors from invsync-core. Consumers never see HTTP status codes
// or driver errors directly: the `From<invsync_api::Error>` and
// `From<sqlx::Error>` impls translate transport-layer failures into
// domain-appropriate variants.

use thiserror::Error;

use crate::model::{EntityKind, IdentityKey};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {target}: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    // ── Graph errors ─────────────────────────────────────────────────
    #[error("Duplicate {kind} identity: {key}")]
    DuplicateIdentity { kind: EntityKind, key: IdentityKey },

    #[error("Expected a {expected} entity, got {actual}")]
    KindMismatch {
        expected: EntityKind,
        actual: EntityKind,
    },

    // ── Source errors ────────────────────────────────────────────────
    #[error("Source query failed: {message}")]
    SourceQuery { message: String },

    #[error("Schema introspection failed: {message}")]
    Introspection { message: String },

    // ── Target errors ────────────────────────────────────────────────
    #[error("{kind} {key} not found in target")]
    NotFound { kind: EntityKind, key: IdentityKey },

    #[error("Cannot materialize {kind} {key}: {message}")]
    Materialization {
        kind: EntityKind,
        key: IdentityKey,
        message: String,
    },

    #[error("Target rejected the request: {message}")]
    Rejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the failure means the store could not be reached at all,
    /// as opposed to a problem with one record.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::AuthenticationFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<invsync_api::Error> for CoreError {
    fn from(err: invsync_api::Error) -> Self {
        match err {
            invsync_api::Error::InvalidToken { url, status } => CoreError::AuthenticationFailed {
                message: format!("API token rejected by {url} (HTTP {status})"),
            },
            invsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            invsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        message: e.to_string(),
                    }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        target: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            invsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            invsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                target: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            invsync_api::Error::Api { status: 400, message } => CoreError::Rejected { message },
            invsync_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            invsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(e) => CoreError::ConnectionFailed {
                target: "source database".into(),
                reason: e.to_string(),
            },
            sqlx::Error::Tls(e) => CoreError::ConnectionFailed {
                target: "source database".into(),
                reason: format!("TLS error: {e}"),
            },
            sqlx::Error::PoolTimedOut => CoreError::Timeout {
                message: "timed out acquiring a source database connection".into(),
            },
            sqlx::Error::Configuration(e) => CoreError::Config {
                message: e.to_string(),
            },
            sqlx::Error::Database(e) if e.code().as_deref() == Some("28P01") => {
                CoreError::AuthenticationFailed {
                    message: e.message().to_owned(),
                }
            }
            other => CoreError::SourceQuery {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_validation_maps_to_rejected() {
        let err = CoreError::from(invsync_api::Error::Api {
            status: 400,
            message: "name: required".into(),
        });
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[test]
    fn invalid_token_maps_to_auth() {
        let err = CoreError::from(invsync_api::Error::InvalidToken {
            url: "https://nautobot/api/".into(),
            status: 401,
        });
        assert!(err.is_connectivity());
        assert!(err.to_string().contains("HTTP 401"));
    }

    #[test]
    fn pool_timeout_maps_to_timeout() {
        let err = CoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, CoreError::Timeout { .. }));
    }

    #[test]
    fn row_not_found_maps_to_query_failure() {
        let err = CoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, CoreError::SourceQuery { .. }));
    }
}
