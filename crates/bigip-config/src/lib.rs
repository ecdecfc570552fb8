//! Profile configuration for bigip-license.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `bigip_core::SessionConfig`. The CLI layers its
//! `GlobalOpts` overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use bigip_core::{ActivationEndpoints, LicenseMetadata, SessionConfig, TlsVerification};

/// Keyring service name under which profile passwords are stored.
pub const KEYRING_SERVICE: &str = "bigip-license";

/// Environment prefix for config overrides (`BIGIP_LICENSE__DEFAULTS__OUTPUT=json`).
pub const ENV_PREFIX: &str = "BIGIP_LICENSE__";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

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

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
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

/// A named device profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Management address: a bare host (`10.1.1.245`) or a URL
    /// (`https://bigip.example.com:8443`).
    pub server: String,

    /// HTTPS port, when `server` does not carry one.
    pub port: Option<u16>,

    /// Administrative username.
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate and host-key validation.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Allow the SSH command channel (needed for license removal).
    pub ssh: Option<bool>,

    pub ssh_port: Option<u16>,

    /// Override the external activation endpoint.
    pub external_endpoint: Option<String>,

    /// Override the internal activation endpoint.
    pub internal_endpoint: Option<String>,

    /// Registrant contact details sent with license requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<LicenseMetadata>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "bigip-license", "bigip-license").map_or_else(
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
    p.push("bigip-license");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from an explicit file + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

/// Resolve the profile's username, falling back to `BIGIP_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("BIGIP_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve a password from the credential chain (no CLI flag step).
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |account| {
            keyring::Entry::new(KEYRING_SERVICE, account)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// The credential chain with injectable environment and keyring lookups.
fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(val) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    // 2. Well-known env var
    if let Some(pw) = env("BIGIP_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = keyring(&format!("{profile_name}/password")) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse a management address, prepending `https://` to a bare host.
///
/// `port` applies only when the address does not carry its own.
pub fn parse_server(server: &str, port: Option<u16>) -> Result<Url, ConfigError> {
    let trimmed = server.trim();
    let text = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&text).map_err(|e| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid address '{server}': {e}"),
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("no host in '{server}'"),
        });
    }

    if let Some(port) = port {
        if url.port().is_none() {
            url.set_port(Some(port)).map_err(|()| ConfigError::Validation {
                field: "port".into(),
                reason: format!("cannot set port {port} on '{server}'"),
            })?;
        }
    }
    Ok(url)
}

/// TLS policy for a profile: `insecure` wins over a custom CA.
pub fn resolve_tls(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Activation endpoints with the profile's overrides applied.
pub fn resolve_endpoints(profile: &Profile) -> ActivationEndpoints {
    let mut endpoints = ActivationEndpoints::default();
    if let Some(ref external) = profile.external_endpoint {
        endpoints.external.clone_from(external);
    }
    if let Some(ref internal) = profile.internal_endpoint {
        endpoints.internal.clone_from(internal);
    }
    endpoints
}

/// Build a `SessionConfig` from a profile with no CLI flag overrides.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let url = parse_server(&profile.server, profile.port)?;
    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;

    let mut config = SessionConfig::new(url, username, password);
    config.tls = resolve_tls(profile, defaults);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.ssh_enabled = profile.ssh.unwrap_or(true);
    if let Some(port) = profile.ssh_port {
        config.ssh_port = port;
    }
    config.endpoints = resolve_endpoints(profile);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile(server: &str) -> Profile {
        Profile {
            server: server.into(),
            username: Some("admin".into()),
            password: Some("secret".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn bare_host_gets_https() {
        let url = parse_server("10.1.1.245", None).unwrap();
        assert_eq!(url.as_str(), "https://10.1.1.245/");
    }

    #[test]
    fn port_applies_only_without_explicit_port() {
        let url = parse_server("bigip.example.com", Some(8443)).unwrap();
        assert_eq!(url.port(), Some(8443));

        let url = parse_server("https://bigip.example.com:9443", Some(8443)).unwrap();
        assert_eq!(url.port(), Some(9443));
    }

    #[test]
    fn empty_server_rejected() {
        let err = parse_server("   ", None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "server"));
    }

    #[test]
    fn insecure_overrides_custom_ca() {
        let mut p = profile("bigip");
        p.ca_cert = Some(PathBuf::from("/etc/ca.pem"));
        assert_eq!(
            resolve_tls(&p, &Defaults::default()),
            TlsVerification::CustomCa(PathBuf::from("/etc/ca.pem"))
        );

        p.insecure = Some(true);
        assert_eq!(
            resolve_tls(&p, &Defaults::default()),
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn insecure_default_inherited() {
        let p = profile("bigip");
        let defaults = Defaults {
            insecure: true,
            ..Defaults::default()
        };
        assert_eq!(resolve_tls(&p, &defaults), TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn endpoint_overrides_applied() {
        let mut p = profile("bigip");
        p.internal_endpoint = Some("https://lab.example.com/activate".into());
        let endpoints = resolve_endpoints(&p);
        assert_eq!(endpoints.internal, "https://lab.example.com/activate");
        assert_eq!(endpoints.external, ActivationEndpoints::default().external);
    }

    #[test]
    fn session_config_from_profile() {
        let mut p = profile("10.1.1.245");
        p.timeout = Some(90);
        p.ssh = Some(false);
        p.ssh_port = Some(2222);

        let config = profile_to_session_config(&p, "lab", &Defaults::default()).unwrap();
        assert_eq!(config.url.as_str(), "https://10.1.1.245/");
        assert_eq!(config.username, "admin");
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert!(!config.ssh_enabled);
        assert_eq!(config.ssh_port, 2222);
        assert_eq!(config.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn plaintext_password_is_last_resort() {
        let p = profile("bigip");
        let secret = resolve_password_with(&p, "lab", |_| None, |_| None).unwrap();
        assert_eq!(secret.expose_secret(), "secret");
    }

    #[test]
    fn credential_chain_order() {
        let mut p = profile("bigip");
        p.password_env = Some("LAB_PASSWORD".into());
        let env = |name: &str| match name {
            "LAB_PASSWORD" => Some("from-profile-env".to_owned()),
            "BIGIP_PASSWORD" => Some("from-env".to_owned()),
            _ => None,
        };
        let keyring = |account: &str| (account == "lab/password").then(|| "from-keyring".to_owned());

        let secret = resolve_password_with(&p, "lab", env, keyring).unwrap();
        assert_eq!(secret.expose_secret(), "from-profile-env");

        p.password_env = None;
        let secret = resolve_password_with(&p, "lab", env, keyring).unwrap();
        assert_eq!(secret.expose_secret(), "from-env");

        let secret = resolve_password_with(&p, "lab", |_| None, keyring).unwrap();
        assert_eq!(secret.expose_secret(), "from-keyring");
    }

    #[test]
    fn unset_profile_env_falls_through() {
        let mut p = profile("bigip");
        p.password_env = Some("LAB_PASSWORD".into());
        p.password = None;

        let secret = resolve_password_with(
            &p,
            "lab",
            |name| (name == "BIGIP_PASSWORD").then(|| "from-env".to_owned()),
            |_| None,
        )
        .unwrap();
        assert_eq!(secret.expose_secret(), "from-env");

        let err = resolve_password_with(&p, "lab", |_| None, |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "lab"));
    }

    #[test]
    fn load_and_save_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut lab = profile("https://10.1.1.245");
        lab.contact = Some(LicenseMetadata {
            email: "ops@example.com".into(),
            ..LicenseMetadata::default()
        });
        cfg.profiles.insert("lab".into(), lab);
        cfg.default_profile = Some("lab".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.default_profile.as_deref(), Some("lab"));
        let lab = &loaded.profiles["lab"];
        assert_eq!(lab.server, "https://10.1.1.245");
        assert_eq!(
            lab.contact.as_ref().map(|c| c.email.as_str()),
            Some("ops@example.com")
        );
        assert_eq!(loaded.defaults.output, "table");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.default_profile.as_deref(), Some("default"));
        assert!(loaded.profiles.is_empty());
        assert_eq!(loaded.defaults.timeout, 30);
    }
}
