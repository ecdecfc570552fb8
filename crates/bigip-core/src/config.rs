// ── Runtime connection configuration ──
//
// These types describe *how* to reach a device and the activation service.
// They carry credential data and timing, but never touch disk. The CLI
// builds a `SessionConfig` from a profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Production activation service.
pub const DEFAULT_EXTERNAL_ENDPOINT: &str =
    "https://activate.f5.com/license/services/urn:com.f5.license.v5b.ActivationService";

/// Internal (vendor network) activation service.
pub const DEFAULT_INTERNAL_ENDPOINT: &str =
    "https://authem.f5net.com/license/services/urn:com.f5.license.v5b.ActivationService";

/// TLS verification strategy.
///
/// Also governs SSH host-key checking: anything but `DangerAcceptInvalid`
/// requires the device's key to be in `known_hosts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed management certificates).
    DangerAcceptInvalid,
}

/// The two fixed activation endpoints, keyed by registration-key shape.
///
/// Kept as text so profile overrides are validated where they are used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationEndpoints {
    pub external: String,
    pub internal: String,
}

impl Default for ActivationEndpoints {
    fn default() -> Self {
        Self {
            external: DEFAULT_EXTERNAL_ENDPOINT.into(),
            internal: DEFAULT_INTERNAL_ENDPOINT.into(),
        }
    }
}

/// Intervals and deadlines of the two removal-path polling loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Status re-query interval while waiting for `DISABLED`.
    pub disable_interval: Duration,
    pub disable_timeout: Duration,
    /// Shell re-apply interval while restoring the account shell.
    pub restore_interval: Duration,
    pub restore_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            disable_interval: Duration::from_secs(1),
            disable_timeout: Duration::from_secs(60),
            restore_interval: Duration::from_secs(5),
            restore_timeout: Duration::from_secs(60),
        }
    }
}

/// Configuration for one device session.
///
/// Built by the CLI, passed to `DeviceSession`; core never reads config files.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Management URL (e.g., `https://10.1.1.245`); the port is the HTTPS port.
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Request timeout for every HTTP call and the SSH handshake.
    pub timeout: Duration,
    /// Whether the SSH command channel may be used (license removal).
    pub ssh_enabled: bool,
    pub ssh_port: u16,
    pub endpoints: ActivationEndpoints,
    pub poll: PollSettings,
}

impl SessionConfig {
    /// A config with defaults for everything but the connection triple.
    pub fn new(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            ssh_enabled: true,
            ssh_port: 22,
            endpoints: ActivationEndpoints::default(),
            poll: PollSettings::default(),
        }
    }
}
