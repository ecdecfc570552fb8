use std::str::FromStr;

use crate::error::Error;

/// `Common.EnabledState` as returned by
/// `LicenseAdministration::get_license_activation_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledState {
    Enabled,
    Disabled,
}

impl FromStr for EnabledState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "STATE_ENABLED" => Ok(Self::Enabled),
            "STATE_DISABLED" => Ok(Self::Disabled),
            other => Err(Error::Deserialization {
                message: format!("unknown enabled state '{other}'"),
                body: other.to_owned(),
            }),
        }
    }
}

/// Chain position of an uploaded chunk (`System.ConfigSync.FileChainType`).
///
/// Licensing payloads are small, so every upload is a single chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChainType {
    FirstAndLast,
}

impl FileChainType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstAndLast => "FILE_FIRST_AND_LAST",
        }
    }
}
