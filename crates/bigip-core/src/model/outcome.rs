// ── Invocation report ──

use serde::Serialize;

use super::endpoint::ActivationEndpoint;
use super::request::DesiredState;
use super::status::ActivationStatus;
use crate::poll::PollOutcome;

/// Confirmation results of the removal path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    /// Waiting for the device to report `DISABLED`.
    pub disable: PollOutcome,
    /// Restoring the account shell; absent when it never changed.
    pub shell_restore: Option<PollOutcome>,
}

/// What one invocation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseOutcome {
    pub changed: bool,
    pub state: DesiredState,
    /// Activation status at the end of the run.
    pub status: ActivationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<ActivationEndpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal: Option<RemovalReport>,
    pub warnings: Vec<String>,
}

impl LicenseOutcome {
    /// Nothing was changed on the device.
    pub fn unchanged(state: DesiredState, status: ActivationStatus) -> Self {
        Self {
            changed: false,
            state,
            status,
            endpoint: None,
            removal: None,
            warnings: Vec::new(),
        }
    }

    /// A change was made and the device reports `status`.
    pub fn changed(state: DesiredState, status: ActivationStatus) -> Self {
        Self {
            changed: true,
            ..Self::unchanged(state, status)
        }
    }

    pub fn with_endpoint(mut self, endpoint: ActivationEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}
