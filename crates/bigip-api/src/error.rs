use thiserror::Error;

/// Top-level error type for the `bigip-api` crate.
///
/// Covers every failure mode across all remote surfaces: iControl SOAP,
/// account REST, the license activation service and the SSH command
/// channel. `bigip-core` maps these into licensing-domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected by the device (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// SSH password authentication rejected.
    #[error("SSH authentication failed for user '{username}'")]
    SshAuthentication { username: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── SOAP ────────────────────────────────────────────────────────
    /// A `<Fault>` element returned by a SOAP endpoint.
    #[error("SOAP fault ({code}): {message}")]
    SoapFault { code: String, message: String },

    // ── REST ────────────────────────────────────────────────────────
    /// Non-success response from the account REST endpoint.
    #[error("REST API error (HTTP {status}): {message}")]
    Rest { status: u16, message: String },

    // ── SSH ─────────────────────────────────────────────────────────
    /// SSH protocol or channel failure.
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// The server's host key is not in `known_hosts`.
    #[error("Host key for {host} was rejected")]
    HostKeyRejected { host: String },

    // ── Data ────────────────────────────────────────────────────────
    /// XML or JSON decoding failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Operation not supported by this device or endpoint.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl Error {
    /// Classify a `reqwest` failure. Timeouts carry the client's configured
    /// limit so callers can report it.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Transport(err)
        }
    }

    /// Returns `true` for a SOAP fault reporting a missing file.
    ///
    /// iControl wraps `Common::OperationFailed` with the errno text, e.g.
    /// `error_string : No such file or directory`.
    pub fn is_file_not_found(&self) -> bool {
        match self {
            Self::SoapFault { message, .. } => {
                let lower = message.to_ascii_lowercase();
                lower.contains("no such file") || lower.contains("file not found")
            }
            _ => false,
        }
    }

    /// Returns `true` if the TLS handshake failed on certificate validation.
    pub fn is_certificate_error(&self) -> bool {
        match self {
            Self::Transport(e) => {
                let mut source: Option<&dyn std::error::Error> = Some(e);
                while let Some(err) = source {
                    let text = err.to_string().to_ascii_lowercase();
                    if text.contains("certificate") || text.contains("unknownissuer") {
                        return true;
                    }
                    source = err.source();
                }
                false
            }
            _ => false,
        }
    }
}
