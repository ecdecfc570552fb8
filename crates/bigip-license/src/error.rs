//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use bigip_config::ConfigError;
use bigip_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const LICENSING: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(bigip::connection_failed),
        help(
            "Check that the device is running and its management interface is reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Certificate verification failed for {url}")]
    #[diagnostic(
        code(bigip::tls_error),
        help(
            "The device presented a certificate (or SSH host key) that could not be verified: {reason}\n\
             Use --insecure (-k) to accept it, or configure ca_cert in your profile."
        )
    )]
    TlsError { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(bigip::timeout),
        help("Increase timeout with --timeout or check device responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(bigip::auth_failed),
        help(
            "Verify the username and password for the device.\n\
             Run: bigip-license config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(bigip::no_credentials),
        help(
            "Configure credentials with: bigip-license config init\n\
             Or pass --user and set BIGIP_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("Account '{username}' cannot remove licenses (role '{role}')")]
    #[diagnostic(
        code(bigip::unprivileged_account),
        help("License removal requires an account with the admin or resource-admin role.")
    )]
    Unprivileged { username: String, role: String },

    // ── Licensing ────────────────────────────────────────────────────

    #[error("Activation server {url} is unreachable")]
    #[diagnostic(
        code(bigip::activation_unreachable),
        help(
            "The device has no active license and a new one cannot be requested.\n\
             Check outbound HTTPS to the activation service, or install a\n\
             pre-issued license with --license-file."
        )
    )]
    ActivationUnreachable { url: String },

    #[error("The device did not generate a dossier")]
    #[diagnostic(
        code(bigip::no_dossier),
        help("Check the registration key, or supply one with --dossier-file.")
    )]
    DossierNotGenerated,

    #[error("No license was issued ({state}): {fault}")]
    #[diagnostic(
        code(bigip::no_license),
        help(
            "The activation service refused the request.\n\
             Registrant details can be supplied with --email and the other contact flags,\n\
             or with --metadata-file."
        )
    )]
    NoLicenseReturned { state: String, fault: String },

    #[error("License operation failed: {message}")]
    #[diagnostic(code(bigip::license_failed))]
    LicenseFailed { message: String },

    #[error("{what} not found: {path}")]
    #[diagnostic(code(bigip::file_not_found))]
    FileNotFound { what: String, path: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(bigip::api_error))]
    ApiError { code: String, message: String },

    // ── Unsupported ──────────────────────────────────────────────────

    #[error("Operation '{operation}' is not available for this device")]
    #[diagnostic(
        code(bigip::unsupported),
        help(
            "This command requires {required}.\n\
             Enable it in your profile with: bigip-license config set ssh true"
        )
    )]
    Unsupported { operation: String, required: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bigip::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bigip::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: bigip-license config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device configured")]
    #[diagnostic(
        code(bigip::no_config),
        help(
            "Create a profile with: bigip-license config init\n\
             Or pass --server. Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(bigip::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(bigip::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(bigip::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. }
            | Self::TlsError { .. }
            | Self::ActivationUnreachable { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::Unprivileged { .. } => {
                exit_code::AUTH
            }
            Self::FileNotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::DossierNotGenerated
            | Self::NoLicenseReturned { .. }
            | Self::LicenseFailed { .. } => exit_code::LICENSING,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::CertificateVerification { url, reason } => {
                CliError::TlsError { url, reason }
            }

            CoreError::UnreachableActivationServer { url } => {
                CliError::ActivationUnreachable { url }
            }

            CoreError::DossierNotGenerated => CliError::DossierNotGenerated,

            CoreError::NoLicenseReturned { state, fault } => {
                CliError::NoLicenseReturned { state, fault }
            }

            CoreError::InputFileMissing { what, path } => CliError::FileNotFound {
                what: what.into(),
                path,
            },

            CoreError::UnprivilegedAccount { username, role } => {
                CliError::Unprivileged { username, role }
            }

            CoreError::Unsupported {
                operation,
                required,
            } => CliError::Unsupported {
                operation,
                required,
            },

            CoreError::OperationFailed { message } => CliError::LicenseFailed { message },

            CoreError::Api {
                message,
                code,
                status,
            } => CliError::ApiError {
                code: code
                    .or_else(|| status.map(|s| format!("HTTP {s}")))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
