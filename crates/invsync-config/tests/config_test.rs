// Config file loading and translation, against temp files.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use tempfile::NamedTempFile;

use invsync_config::{
    Config, ConfigError, Profile, Secret, load_config_from, profile_to_source_config,
    profile_to_target_config, resolve_run_config, resolve_secret, save_config_to,
};
use invsync_core::{ConflictPolicy, EntityKind, SslMode, TlsVerification};

// ── Helpers ─────────────────────────────────────────────────────────

fn write_config(body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

const FULL: &str = r#"
default_profile = "lab"

[defaults]
output = "json"
timeout = 45

[profiles.lab.source]
host = "nc-db.example.net"
database = "netcracker"
user = "readonly"
password = "hunter2"
ssl_mode = "verify-full"

[profiles.lab.target]
url = "https://nautobot.example.net"
token = "0123456789abcdef"

[profiles.lab.conflict_policy]
device = "skip"
circuit = "flag"

[profiles.lab.projections.location]
table = "site_master"
columns = { name = "site_name", status = "site_state" }
"#;

// ── Loading ─────────────────────────────────────────────────────────

#[test]
fn test_full_profile_resolves() {
    let file = write_config(FULL);
    let config = load_config_from(file.path()).unwrap();
    assert_eq!(config.defaults.output, "json");

    let run = resolve_run_config(&config, None).unwrap();
    assert_eq!(run.profile_name, "lab");

    assert_eq!(run.source.port, 5432);
    assert_eq!(run.source.ssl_mode, SslMode::VerifyFull);
    assert_eq!(run.source.password.expose_secret(), "hunter2");
    assert_eq!(run.source.display_target(), "nc-db.example.net:5432/netcracker");

    assert_eq!(run.target.url.as_str(), "https://nautobot.example.net/");
    assert_eq!(run.target.tls, TlsVerification::SystemDefaults);
    assert_eq!(run.target.timeout, Duration::from_secs(45));

    assert_eq!(run.policies.for_kind(EntityKind::Device), ConflictPolicy::Skip);
    assert_eq!(run.policies.for_kind(EntityKind::Circuit), ConflictPolicy::Flag);
    assert_eq!(
        run.policies.for_kind(EntityKind::Location),
        ConflictPolicy::Overwrite
    );

    let location = run.projections.get(EntityKind::Location);
    assert_eq!(location.table, "site_master");
    assert_eq!(location.column("name"), Some("site_name"));
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.default_profile.as_deref(), Some("default"));
    assert!(config.profiles.is_empty());
    assert_eq!(config.defaults.timeout, 30);
}

#[test]
fn test_unknown_profile_is_error() {
    let file = write_config(FULL);
    let config = load_config_from(file.path()).unwrap();

    let err = resolve_run_config(&config, Some("prod")).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownProfile { .. }));
}

#[test]
fn test_invalid_policy_value_fails_to_load() {
    let file = write_config(
        r#"
[profiles.default.conflict_policy]
device = "ignore"
"#,
    );
    assert!(load_config_from(file.path()).is_err());
}

// ── Validation ──────────────────────────────────────────────────────

#[test]
fn test_missing_source_host_is_validation_error() {
    let profile = Profile::default();
    let err = profile_to_source_config(&profile, "default").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation { ref field, .. } if field == "source.host"
    ));
}

#[test]
fn test_bad_target_url_is_validation_error() {
    let file = write_config(
        r#"
[profiles.default.target]
url = "not a url"
token = "t"
"#,
    );
    let config = load_config_from(file.path()).unwrap();
    let profile = config.profile("default").unwrap();

    let err = profile_to_target_config(profile, "default", &config.defaults).unwrap_err();
    assert!(err.to_string().contains("invalid URL"));
}

#[test]
fn test_insecure_overrides_ca_cert() {
    let file = write_config(
        r#"
[profiles.default.target]
url = "https://lab.local"
token = "t"
insecure = true
ca_cert = "/etc/ssl/lab.pem"
"#,
    );
    let config = load_config_from(file.path()).unwrap();
    let target =
        profile_to_target_config(config.profile("default").unwrap(), "default", &config.defaults)
            .unwrap();
    assert_eq!(target.tls, TlsVerification::DangerAcceptInvalid);
}

// ── Credentials ─────────────────────────────────────────────────────

#[test]
fn test_env_var_wins_over_plaintext() {
    // PATH is always present in the test environment.
    let expected = std::env::var("PATH").unwrap();
    let secret = resolve_secret("env-test", Secret::Token, Some("PATH"), Some("plaintext")).unwrap();
    assert_eq!(secret.expose_secret(), expected);
}

#[test]
fn test_unset_env_var_falls_through_to_plaintext() {
    let secret = resolve_secret(
        "fallthrough-test",
        Secret::Password,
        Some("INVSYNC_TEST_SURELY_UNSET_VARIABLE"),
        Some("plaintext"),
    )
    .unwrap();
    assert_eq!(secret.expose_secret(), "plaintext");
}

#[test]
fn test_missing_secret_is_no_credentials() {
    let err = resolve_secret("missing-secret-test", Secret::Token, None, None).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::NoCredentials {
            secret: Secret::Token,
            ..
        }
    ));
}

// ── Saving ──────────────────────────────────────────────────────────

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let file = write_config(FULL);
    let config: Config = load_config_from(file.path()).unwrap();
    save_config_to(&config, &path).unwrap();

    let reloaded = load_config_from(&path).unwrap();
    let profile = reloaded.profile("lab").unwrap();
    assert_eq!(profile.source.host.as_deref(), Some("nc-db.example.net"));
    assert_eq!(
        profile.conflict_policy.get("device"),
        Some(&ConflictPolicy::Skip)
    );
    assert_eq!(profile.projections.len(), 1);
}
