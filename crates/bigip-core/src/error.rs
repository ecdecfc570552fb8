// ── Core error types ──
//
// User-facing errors from bigip-core. Consumers never see SOAP envelopes,
// HTTP status codes or SSH channel failures directly: the
// `From<bigip_api::Error>` impl translates transport-layer errors into the
// licensing taxonomy below.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Certificate verification failed for {url}: {reason}")]
    CertificateVerification { url: String, reason: String },

    // ── Licensing errors ─────────────────────────────────────────────
    #[error("License activation server {url} is unreachable")]
    UnreachableActivationServer { url: String },

    #[error("The device did not generate a dossier")]
    DossierNotGenerated,

    #[error("No license returned (state {state}): {fault}")]
    NoLicenseReturned { state: String, fault: String },

    /// A local license, dossier or service descriptor file is absent.
    #[error("{what} not found: {path}")]
    InputFileMissing { what: &'static str, path: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Account '{username}' has role '{role}'; license removal requires admin or resource-admin")]
    UnprivilegedAccount { username: String, role: String },

    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported { operation: String, required: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// SOAP fault code (e.g. "SOAP-ENV:Server"), when the error is a fault.
        code: Option<String>,
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

// ── Conversion from transport-layer errors ───────────────────────────

impl From<bigip_api::Error> for CoreError {
    fn from(err: bigip_api::Error) -> Self {
        if err.is_certificate_error() {
            let url = match &err {
                bigip_api::Error::Transport(e) => e.url().map(ToString::to_string),
                _ => None,
            };
            return CoreError::CertificateVerification {
                url: url.unwrap_or_else(|| "<unknown>".into()),
                reason: err.to_string(),
            };
        }

        match err {
            bigip_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            bigip_api::Error::SshAuthentication { username } => CoreError::AuthenticationFailed {
                message: format!("SSH password rejected for '{username}'"),
            },
            // Clients report timeouts as `Error::Timeout` with their limit.
            bigip_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            bigip_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            bigip_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            bigip_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            bigip_api::Error::SoapFault { code, message } => CoreError::Api {
                message,
                code: Some(code),
                status: None,
            },
            bigip_api::Error::Rest { status, message } => CoreError::Api {
                message,
                code: None,
                status: Some(status),
            },
            bigip_api::Error::Ssh(e) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("SSH error: {e}"),
            },
            bigip_api::Error::HostKeyRejected { host } => CoreError::CertificateVerification {
                url: host,
                reason: "SSH host key is not in known_hosts".into(),
            },
            bigip_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            bigip_api::Error::UnsupportedOperation(op) => CoreError::Unsupported {
                operation: op.to_string(),
                required: "a newer device firmware".into(),
            },
        }
    }
}
