//! CLI configuration: a thin wrapper around `bigip_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--server, --user, --password, etc.).

use std::time::Duration;

use clap::ArgMatches;
use clap::ValueEnum;
use clap::parser::ValueSource;
use secrecy::SecretString;

use bigip_core::{ActivationEndpoints, LicenseMetadata, SessionConfig, TlsVerification};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use bigip_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Fill `--output` and `--color` from `[defaults]` when neither the flag
/// nor its env var was given.
pub fn apply_output_defaults(
    global: &mut GlobalOpts,
    defaults: &Defaults,
    matches: &ArgMatches,
) -> Result<(), CliError> {
    if defaulted(matches, "output") {
        global.output = parse_output(&defaults.output)?;
    }
    if defaulted(matches, "color") {
        global.color = parse_color(&defaults.color)?;
    }
    Ok(())
}

fn defaulted(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_none_or(|source| source == ValueSource::DefaultValue)
}

pub fn parse_output(value: &str) -> Result<OutputFormat, CliError> {
    <OutputFormat as ValueEnum>::from_str(value, true).map_err(|reason| CliError::Validation {
        field: "defaults.output".into(),
        reason,
    })
}

pub fn parse_color(value: &str) -> Result<ColorMode, CliError> {
    <ColorMode as ValueEnum>::from_str(value, true).map_err(|reason| CliError::Validation {
        field: "defaults.color".into(),
        reason,
    })
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--server`, `--user` and `--password`
/// (or their env vars) must describe the device on their own.
pub fn resolve_session_config(global: &GlobalOpts, cfg: &Config) -> Result<SessionConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global, &cfg.defaults);
    }

    // An explicitly named profile that doesn't exist is an error, not a fallback.
    if global.profile.is_some() {
        return Err(profile_not_found(profile_name, cfg));
    }

    let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = bigip_config::parse_server(server, None)?;

    let (Some(username), Some(password)) = (global.user.clone(), global.password.clone()) else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    let mut session = SessionConfig::new(url, username, SecretString::from(password));
    session.tls = if global.insecure || cfg.defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };
    session.timeout = Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout));
    Ok(session)
}

/// Translate a `Profile` + global flags into a `SessionConfig`.
///
/// CLI flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    defaults: &Defaults,
) -> Result<SessionConfig, CliError> {
    // 1. Server and username (flag > env > profile)
    let mut profile = profile.clone();
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
        profile.port = None;
    }
    if let Some(ref user) = global.user {
        profile.username = Some(user.clone());
    }

    // 2. Password (flag > profile credential chain)
    if let Some(ref password) = global.password {
        profile.password_env = None;
        profile.password = Some(password.clone());
    }

    let mut session = bigip_config::profile_to_session_config(&profile, profile_name, defaults)?;

    // 3. TLS and timeout overrides
    if global.insecure {
        session.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(timeout) = global.timeout {
        session.timeout = Duration::from_secs(timeout);
    }
    Ok(session)
}

/// Activation endpoints for the active profile, without touching credentials.
pub fn resolve_endpoints(global: &GlobalOpts, cfg: &Config) -> ActivationEndpoints {
    let profile_name = active_profile_name(global, cfg);
    cfg.profiles
        .get(&profile_name)
        .map(bigip_config::resolve_endpoints)
        .unwrap_or_default()
}

/// Registrant details stored on the active profile.
pub fn profile_contact(global: &GlobalOpts, cfg: &Config) -> LicenseMetadata {
    let profile_name = active_profile_name(global, cfg);
    cfg.profiles
        .get(&profile_name)
        .and_then(|p| p.contact.clone())
        .unwrap_or_default()
}

pub fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}
