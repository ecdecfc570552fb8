// ── bigip-api adapters ──
//
// Capability implementations over the real clients. Transport errors are
// classified through `From<bigip_api::Error>`; file-not-found faults are
// the one API error turned into a value.

use async_trait::async_trait;
use bigip_api::{
    AccountClient, ActivationClient, CommandOutput, IControlClient, LicenseApplication,
    SshConnector, SshSession,
};
use tracing::debug;
use url::Url;

use crate::capability::{
    AccountDirectory, ActivationService, CommandChannel, DeviceManagement, FileRemoval,
    ShellConnector,
};
use crate::error::CoreError;
use crate::model::{AccountRecord, AccountShell, ActivationStatus, LicenseMetadata, LicenseTransaction};

#[async_trait]
impl DeviceManagement for IControlClient {
    async fn activation_status(&self) -> Result<ActivationStatus, CoreError> {
        Ok(self.get_license_activation_status().await?.into())
    }

    async fn system_dossier(&self, registration_key: &str) -> Result<String, CoreError> {
        Ok(self
            .get_system_dossier(&[registration_key.to_owned()])
            .await?)
    }

    async fn install_license(&self, license: &str) -> Result<(), CoreError> {
        Ok(IControlClient::install_license(self, license).await?)
    }

    async fn upload_file(&self, path: &str, contents: &[u8]) -> Result<(), CoreError> {
        Ok(IControlClient::upload_file(self, path, contents).await?)
    }

    async fn delete_file(&self, path: &str) -> Result<FileRemoval, CoreError> {
        match IControlClient::delete_file(self, path).await {
            Ok(()) => Ok(FileRemoval::Deleted),
            Err(e) if e.is_file_not_found() => {
                debug!(path, "file already absent");
                Ok(FileRemoval::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn login_shell(&self, username: &str) -> Result<AccountShell, CoreError> {
        let path = self.get_login_shell(username).await?;
        Ok(AccountShell::from_login_shell(&path))
    }
}

#[async_trait]
impl ActivationService for ActivationClient {
    async fn ping(&self, endpoint: &Url) -> bool {
        ActivationClient::ping(self, endpoint).await
    }

    async fn request_license(
        &self,
        endpoint: &Url,
        dossier: &str,
        eula: &str,
        metadata: &LicenseMetadata,
    ) -> Result<LicenseTransaction, CoreError> {
        let application = LicenseApplication {
            dossier: dossier.to_owned(),
            eula: eula.to_owned(),
            email: metadata.email.clone(),
            first_name: metadata.first_name.clone(),
            last_name: metadata.last_name.clone(),
            company_name: metadata.company_name.clone(),
            phone: metadata.phone.clone(),
            job_title: metadata.job_title.clone(),
            address: metadata.address.clone(),
            city: metadata.city.clone(),
            state_province: metadata.state_province.clone(),
            postal_code: metadata.postal_code.clone(),
            country: metadata.country.clone(),
        };
        let resp = self.get_license(endpoint, &application).await?;
        Ok(resp.into())
    }

    async fn fetch_descriptor(&self, location: &Url) -> Result<String, CoreError> {
        Ok(ActivationClient::fetch_descriptor(self, location).await?)
    }
}

#[async_trait]
impl AccountDirectory for AccountClient {
    async fn account(&self, username: &str) -> Result<AccountRecord, CoreError> {
        Ok(self.get_user(username).await?.into())
    }

    async fn set_shell(&self, username: &str, shell: AccountShell) -> Result<(), CoreError> {
        Ok(AccountClient::set_shell(self, username, shell.as_rest_value()).await?)
    }
}

#[async_trait]
impl ShellConnector for SshConnector {
    type Channel = SshSession;

    async fn open(&self) -> Result<SshSession, CoreError> {
        Ok(self.connect().await?)
    }
}

#[async_trait]
impl CommandChannel for SshSession {
    async fn run(&mut self, command: &str) -> Result<CommandOutput, CoreError> {
        Ok(self.exec(command).await?)
    }

    async fn close(self) -> Result<(), CoreError> {
        Ok(self.disconnect().await?)
    }
}
