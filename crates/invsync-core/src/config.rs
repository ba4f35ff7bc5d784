// ── Runtime connection configuration ──
//
// These types describe *how* to reach the source database and the target
// inventory API. They carry resolved credentials and connection tuning,
// but never touch disk. The CLI builds them from a profile and hands
// them in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// PostgreSQL TLS negotiation mode.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SslMode {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl From<SslMode> for sqlx::postgres::PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => Self::Disable,
            SslMode::Allow => Self::Allow,
            SslMode::Prefer => Self::Prefer,
            SslMode::Require => Self::Require,
            SslMode::VerifyCa => Self::VerifyCa,
            SslMode::VerifyFull => Self::VerifyFull,
        }
    }
}

/// Connection descriptor for the source database.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Already resolved through the credential chain.
    pub password: SecretString,
    pub ssl_mode: SslMode,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl SourceConfig {
    pub const DEFAULT_PORT: u16 = 5432;

    /// `host:port/database`, for logs and error messages.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// TLS verification strategy for the target API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (lab instances with self-signed certs).
    DangerAcceptInvalid,
}

/// Connection descriptor for the target inventory API.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Base URL (e.g., `https://nautobot.example.net`).
    pub url: Url,
    /// Already resolved through the credential chain.
    pub token: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl TargetConfig {
    /// Transport settings for the REST client.
    pub fn transport(&self) -> invsync_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => invsync_api::TlsMode::System,
            TlsVerification::CustomCa(path) => invsync_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => invsync_api::TlsMode::DangerAcceptInvalid,
        };
        invsync_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
