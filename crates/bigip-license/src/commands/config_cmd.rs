//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Confirm, Input, Select};
use serde::Serialize;
use tabled::Tabled;

use bigip_core::LicenseMetadata;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        if let Some(port) = p.port {
            let _ = writeln!(out, "port = {port}");
        }
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ssh) = p.ssh {
            let _ = writeln!(out, "ssh = {ssh}");
        }
        if let Some(port) = p.ssh_port {
            let _ = writeln!(out, "ssh_port = {port}");
        }
        if let Some(ref url) = p.external_endpoint {
            let _ = writeln!(out, "external_endpoint = \"{url}\"");
        }
        if let Some(ref url) = p.internal_endpoint {
            let _ = writeln!(out, "internal_endpoint = \"{url}\"");
        }
        if let Some(ref contact) = p.contact {
            if !contact.email.is_empty() {
                let _ = writeln!(out, "contact.email = \"{}\"", contact.email);
            }
        }
    }

    out
}

/// Delegate to the shared config crate's save function.
fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for username and password, validating neither is empty.
fn prompt_credentials() -> Result<(String, String), CliError> {
    let user: String = Input::new()
        .with_prompt("Username")
        .default("admin".into())
        .interact_text()
        .map_err(prompt_err)?;

    let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;

    if user.is_empty() || pass.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }

    Ok((user, pass))
}

/// Offer to store the password in the system keyring or return it for plaintext config.
///
/// Returns `Some(password)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(password: &str, profile_name: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        bigip_config::store_password(profile_name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("'{value}' is not a valid number"),
    })
}

/// Set one registrant field by its config key.
fn set_contact_field(contact: &mut LicenseMetadata, field: &str, value: String) -> Result<(), CliError> {
    let slot = match field {
        "email" => &mut contact.email,
        "first_name" => &mut contact.first_name,
        "last_name" => &mut contact.last_name,
        "company_name" | "company" => &mut contact.company_name,
        "phone" => &mut contact.phone,
        "job_title" => &mut contact.job_title,
        "address" => &mut contact.address,
        "city" => &mut contact.city,
        "state_province" => &mut contact.state_province,
        "postal_code" => &mut contact.postal_code,
        "country" => &mut contact.country,
        other => {
            return Err(CliError::Validation {
                field: format!("contact.{other}"),
                reason: "unknown contact field. Valid fields: email, first_name, last_name, \
                         company_name, phone, job_title, address, city, state_province, \
                         postal_code, country"
                    .into(),
            });
        }
    };
    *slot = value;
    Ok(())
}

/// Apply `config set <key> <value>` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    if let Some(field) = key.strip_prefix("contact.") {
        let contact = profile.contact.get_or_insert_with(LicenseMetadata::default);
        return set_contact_field(contact, field, value);
    }

    match key {
        "server" => {
            bigip_config::parse_server(&value, None)?;
            profile.server = value;
        }
        "port" => profile.port = Some(parse_number("port", &value)?),
        "username" => profile.username = Some(value),
        "password_env" | "password-env" => profile.password_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_bool("insecure", &value)?),
        "timeout" => profile.timeout = Some(parse_number("timeout", &value)?),
        "ssh" => profile.ssh = Some(parse_bool("ssh", &value)?),
        "ssh_port" | "ssh-port" => profile.ssh_port = Some(parse_number("ssh_port", &value)?),
        "external_endpoint" | "external-endpoint" => profile.external_endpoint = Some(value),
        "internal_endpoint" | "internal-endpoint" => profile.internal_endpoint = Some(value),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: server, port, username, \
                     password_env, ca_cert, insecure, timeout, ssh, ssh_port, \
                     external_endpoint, internal_endpoint, contact.<field>"
                ),
            });
        }
    }
    Ok(())
}

/// Set one `[defaults]` entry by its key.
fn set_default_key(defaults: &mut Defaults, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "output" => {
            config::parse_output(&value)?;
            defaults.output = value;
        }
        "color" => {
            config::parse_color(&value)?;
            defaults.color = value;
        }
        "insecure" => defaults.insecure = parse_bool("defaults.insecure", &value)?,
        "timeout" => defaults.timeout = parse_number("defaults.timeout", &value)?,
        other => {
            return Err(CliError::Validation {
                field: format!("defaults.{other}"),
                reason: "valid keys: defaults.output, defaults.color, defaults.insecure, \
                         defaults.timeout"
                    .into(),
            });
        }
    }
    Ok(())
}

#[derive(Clone, Serialize, Tabled)]
struct ProfileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Server")]
    server: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Default")]
    default: String,
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("bigip-license configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Device address
            let server: String = Input::new()
                .with_prompt("Device address")
                .default("https://192.168.1.245".into())
                .interact_text()
                .map_err(prompt_err)?;
            bigip_config::parse_server(&server, None)?;

            // 3. Credentials
            let (username, pass) = prompt_credentials()?;
            let password = prompt_keyring_storage(&pass, &profile_name)?;

            // 4. Certificate validation
            let validate = Confirm::new()
                .with_prompt("Validate the device's certificate and SSH host key?")
                .default(true)
                .interact()
                .map_err(prompt_err)?;

            // 5. Registrant email
            let email: String = Input::new()
                .with_prompt("Registrant email (optional)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            // 6. Build profile and config
            let profile = Profile {
                server,
                username: Some(username),
                password,
                insecure: (!validate).then_some(true),
                contact: (!email.is_empty()).then(|| LicenseMetadata {
                    email,
                    ..LicenseMetadata::default()
                }),
                ..Profile::default()
            };

            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);

            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                defaults: Defaults::default(),
                profiles,
            };

            // 7. Write config
            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: bigip-license status");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &RedactedConfig(&cfg),
                |c| format_config_redacted(c.0),
                |_| "config".into(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            if let Some(field) = key.strip_prefix("defaults.") {
                set_default_key(&mut cfg.defaults, field, value)?;
                save_config(&cfg)?;
                eprintln!("✓ Set {key}");
                return Ok(());
            }
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: bigip-license config init");
                return Ok(());
            }

            let mut rows: Vec<ProfileRow> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileRow {
                    name: name.clone(),
                    server: p.server.clone(),
                    username: p.username.clone().unwrap_or_else(|| "-".into()),
                    default: if name == default { "*".into() } else { String::new() },
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            let out =
                output::render_list(&global.output, &rows, ProfileRow::clone, |r| r.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(name, &cfg));
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(config::profile_not_found(profile_name, &cfg));
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            bigip_config::store_password(&profile_name, &secret)?;

            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

/// Structured view of the config with passwords masked.
struct RedactedConfig<'a>(&'a Config);

impl Serialize for RedactedConfig<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let profiles: HashMap<&String, Profile> = self
            .0
            .profiles
            .iter()
            .map(|(name, p)| {
                let mut p = p.clone();
                if p.password.is_some() {
                    p.password = Some("****".into());
                }
                (name, p)
            })
            .collect();

        let mut state = serializer.serialize_struct("Config", 3)?;
        state.serialize_field("default_profile", &self.0.default_profile)?;
        state.serialize_field("defaults", &self.0.defaults)?;
        state.serialize_field("profiles", &profiles)?;
        state.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_known_keys() {
        let mut p = Profile::default();
        set_profile_key(&mut p, "server", "10.1.1.245".into()).unwrap();
        set_profile_key(&mut p, "ssh", "false".into()).unwrap();
        set_profile_key(&mut p, "ssh-port", "2222".into()).unwrap();
        set_profile_key(&mut p, "contact.email", "ops@example.com".into()).unwrap();

        assert_eq!(p.server, "10.1.1.245");
        assert_eq!(p.ssh, Some(false));
        assert_eq!(p.ssh_port, Some(2222));
        assert_eq!(p.contact.unwrap().email, "ops@example.com");
    }

    #[test]
    fn set_rejects_unknown_and_malformed() {
        let mut p = Profile::default();
        assert!(set_profile_key(&mut p, "site", "default".into()).is_err());
        assert!(set_profile_key(&mut p, "timeout", "soon".into()).is_err());
        assert!(set_profile_key(&mut p, "contact.nickname", "x".into()).is_err());
    }

    #[test]
    fn set_defaults_validates_output_and_color() {
        let mut d = Defaults::default();
        set_default_key(&mut d, "output", "json".into()).unwrap();
        set_default_key(&mut d, "color", "never".into()).unwrap();
        set_default_key(&mut d, "timeout", "90".into()).unwrap();
        assert_eq!(d.output, "json");
        assert_eq!(d.color, "never");
        assert_eq!(d.timeout, 90);

        assert!(set_default_key(&mut d, "output", "xml".into()).is_err());
        assert!(set_default_key(&mut d, "color", "sometimes".into()).is_err());
        assert!(set_default_key(&mut d, "profile", "lab".into()).is_err());
        assert_eq!(d.output, "json");
    }

    #[test]
    fn show_masks_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                server: "bigip".into(),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );

        let text = format_config_redacted(&cfg);
        assert!(text.contains("password = \"****\""));
        assert!(!text.contains("hunter2"));

        let json = serde_json::to_string(&RedactedConfig(&cfg)).unwrap();
        assert!(json.contains("****"));
        assert!(!json.contains("hunter2"));
    }
}
