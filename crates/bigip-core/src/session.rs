// ── Device session ──
//
// Builds the real bigip-api clients from a `SessionConfig` and hands them
// to a `LicenseController`. One session per invocation; SSH sessions are
// opened on demand by the removal path.

use bigip_api::{
    AccountClient, ActivationClient, Credentials, HostKeyPolicy, IControlClient, SshConnector,
    TlsMode, TransportConfig,
};
use tracing::debug;

use crate::capability::Capability;
use crate::config::{SessionConfig, TlsVerification};
use crate::controller::{ControllerSettings, LicenseController};
use crate::error::CoreError;

/// A controller over the real device and activation clients.
pub type SessionController =
    LicenseController<IControlClient, ActivationClient, AccountClient, SshConnector>;

/// The clients for one device.
pub struct DeviceSession {
    icontrol: IControlClient,
    activation: ActivationClient,
    accounts: AccountClient,
    ssh: Capability<SshConnector>,
    settings: ControllerSettings,
}

impl DeviceSession {
    /// Build every client. No network traffic happens here.
    pub fn open(config: &SessionConfig) -> Result<Self, CoreError> {
        let device_transport = TransportConfig {
            tls: tls_mode(&config.tls),
            timeout: config.timeout,
        };
        // The activation service is public infrastructure; always verify it.
        let activation_transport = TransportConfig {
            tls: TlsMode::System,
            timeout: config.timeout,
        };
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let icontrol =
            IControlClient::new(config.url.clone(), credentials.clone(), &device_transport)?;
        let accounts =
            AccountClient::new(config.url.clone(), credentials.clone(), &device_transport)?;
        let activation = ActivationClient::new(&activation_transport)?;

        let ssh = if config.ssh_enabled {
            let host = config.url.host_str().ok_or_else(|| CoreError::Config {
                message: format!("device URL {} has no host", config.url),
            })?;
            let host_keys = if matches!(config.tls, TlsVerification::DangerAcceptInvalid) {
                HostKeyPolicy::AcceptAny
            } else {
                HostKeyPolicy::KnownHosts
            };
            Capability::Available(SshConnector::new(
                host,
                config.ssh_port,
                credentials,
                host_keys,
                config.timeout,
            ))
        } else {
            Capability::unavailable("SSH access to the device, which is disabled in this profile")
        };

        debug!(url = %config.url, ssh = ssh.is_available(), "device session ready");
        Ok(Self {
            icontrol,
            activation,
            accounts,
            ssh,
            settings: ControllerSettings {
                username: config.username.clone(),
                endpoints: config.endpoints.clone(),
                poll: config.poll,
            },
        })
    }

    pub fn into_controller(self) -> SessionController {
        LicenseController::new(
            self.icontrol,
            self.activation,
            Capability::Available(self.accounts),
            self.ssh,
            self.settings,
        )
    }
}

fn tls_mode(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
