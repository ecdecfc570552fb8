// ── License request types ──

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::endpoint::ServiceDescriptor;
use crate::error::CoreError;

/// The license state to converge the device to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DesiredState {
    /// A license is installed; nothing happens if one already is.
    Present,
    /// No license is installed.
    Absent,
    /// A freshly issued license is installed, even if one already is.
    Latest,
}

/// Registrant contact details sent with a license request.
///
/// Every field defaults to empty. Deserialization also accepts the run-together
/// key spellings (`firstname`, `postalcode`, ...) found in older metadata files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseMetadata {
    pub email: String,
    #[serde(alias = "firstname")]
    pub first_name: String,
    #[serde(alias = "lastname")]
    pub last_name: String,
    #[serde(alias = "companyname", alias = "company")]
    pub company_name: String,
    pub phone: String,
    #[serde(alias = "jobtitle")]
    pub job_title: String,
    pub address: String,
    pub city: String,
    #[serde(alias = "stateprovince")]
    pub state_province: String,
    #[serde(alias = "postalcode")]
    pub postal_code: String,
    pub country: String,
}

impl LicenseMetadata {
    /// Parse a JSON object of contact fields.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::Config {
            message: format!("invalid license metadata: {e}"),
        })
    }
}

/// Everything one invocation needs to know.
#[derive(Debug, Clone)]
pub struct LicenseRequest {
    pub state: DesiredState,
    pub registration_key: String,
    /// Pre-issued license to install as-is, skipping negotiation.
    pub license_file: Option<PathBuf>,
    /// Pre-generated dossier, used instead of asking the device.
    pub dossier_file: Option<PathBuf>,
    pub metadata: LicenseMetadata,
    /// Alternate activation service; overrides key-based selection.
    pub service_descriptor: Option<ServiceDescriptor>,
    /// Treat unconfirmed removal polls as failures instead of warnings.
    pub strict_removal: bool,
}

impl LicenseRequest {
    pub fn new(state: DesiredState, registration_key: impl Into<String>) -> Self {
        Self {
            state,
            registration_key: registration_key.into(),
            license_file: None,
            dossier_file: None,
            metadata: LicenseMetadata::default(),
            service_descriptor: None,
            strict_removal: false,
        }
    }
}
