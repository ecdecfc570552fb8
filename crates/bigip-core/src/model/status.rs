use bigip_api::EnabledState;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Device-reported license activation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ActivationStatus {
    Enabled,
    Disabled,
}

impl ActivationStatus {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl From<EnabledState> for ActivationStatus {
    fn from(state: EnabledState) -> Self {
        match state {
            EnabledState::Enabled => Self::Enabled,
            EnabledState::Disabled => Self::Disabled,
        }
    }
}
