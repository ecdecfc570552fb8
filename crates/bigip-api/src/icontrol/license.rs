// Management.LicenseAdministration endpoints

use base64::{Engine as _, prelude::BASE64_STANDARD};
use tracing::debug;

use crate::error::Error;
use crate::icontrol::client::{IControlClient, Interface};
use crate::icontrol::models::EnabledState;
use crate::soap::{self, SoapValue};

impl IControlClient {
    /// Whether a valid license is currently installed.
    pub async fn get_license_activation_status(&self) -> Result<EnabledState, Error> {
        let call = Self::request(
            Interface::LicenseAdministration,
            "get_license_activation_status",
        );
        let body = self.call(Interface::LicenseAdministration, call).await?;
        let value = soap::return_value(&body).ok_or_else(|| Error::Deserialization {
            message: "activation status response has no return value".into(),
            body: String::new(),
        })?;
        value.text().parse()
    }

    /// Generate the device dossier for the given registration key(s).
    ///
    /// Returns the dossier text; an empty string means the device could not
    /// produce one.
    pub async fn get_system_dossier(&self, registration_keys: &[String]) -> Result<String, Error> {
        debug!(keys = registration_keys.len(), "requesting system dossier");
        let call = Self::request(Interface::LicenseAdministration, "get_system_dossier").param(
            "registration_keys",
            SoapValue::TextArray(registration_keys.to_vec()),
        );
        let body = self.call(Interface::LicenseAdministration, call).await?;
        Ok(soap::return_value(&body)
            .map(|v| v.text().trim().to_owned())
            .unwrap_or_default())
    }

    /// Install a license. The text is base64-encoded on the wire.
    pub async fn install_license(&self, license: &str) -> Result<(), Error> {
        debug!(bytes = license.len(), "installing license");
        let call = Self::request(Interface::LicenseAdministration, "install_license").param(
            "license_file_data",
            SoapValue::Text(BASE64_STANDARD.encode(license.as_bytes())),
        );
        self.call(Interface::LicenseAdministration, call).await?;
        Ok(())
    }
}
