// System.ConfigSync endpoints
//
// File transfer on the device's file store. Used to drop the accepted EULA
// next to the license and to remove license files during revocation.

use base64::{Engine as _, prelude::BASE64_STANDARD};
use tracing::debug;

use crate::error::Error;
use crate::icontrol::client::{IControlClient, Interface};
use crate::icontrol::models::FileChainType;
use crate::soap::SoapValue;

impl IControlClient {
    /// Upload `data` to `file_name` as a single base64-encoded chunk.
    pub async fn upload_file(&self, file_name: &str, data: &[u8]) -> Result<(), Error> {
        debug!(file_name, bytes = data.len(), "uploading file");
        let call = Self::request(Interface::ConfigSync, "upload_file")
            .param("file_name", SoapValue::Text(file_name.to_owned()))
            .param(
                "file_context",
                SoapValue::Struct(vec![
                    ("file_data", SoapValue::Text(BASE64_STANDARD.encode(data))),
                    (
                        "chain_type",
                        SoapValue::Text(FileChainType::FirstAndLast.as_str().to_owned()),
                    ),
                ]),
            );
        self.call(Interface::ConfigSync, call).await?;
        Ok(())
    }

    /// Delete a file on the device.
    ///
    /// A missing file surfaces as a `SoapFault` for which
    /// [`Error::is_file_not_found`] returns `true`.
    pub async fn delete_file(&self, file_name: &str) -> Result<(), Error> {
        debug!(file_name, "deleting file");
        let call = Self::request(Interface::ConfigSync, "delete_file")
            .param("file_name", SoapValue::Text(file_name.to_owned()));
        self.call(Interface::ConfigSync, call).await?;
        Ok(())
    }
}
