// ── Capability seams ──
//
// The controller talks to the device and the activation service only
// through these traits. `adapters` implements them over the bigip-api
// clients; tests substitute in-memory doubles.

use async_trait::async_trait;
use bigip_api::CommandOutput;
use url::Url;

use crate::error::CoreError;
use crate::model::{AccountRecord, AccountShell, ActivationStatus, LicenseMetadata, LicenseTransaction};

/// Outcome of deleting a file on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRemoval {
    Deleted,
    /// The file did not exist; not an error.
    NotFound,
}

/// Device management API (license administration, file store, login shells).
#[async_trait]
pub trait DeviceManagement: Send + Sync {
    async fn activation_status(&self) -> Result<ActivationStatus, CoreError>;

    /// Device dossier for a registration key; empty when none was produced.
    async fn system_dossier(&self, registration_key: &str) -> Result<String, CoreError>;

    async fn install_license(&self, license: &str) -> Result<(), CoreError>;

    async fn upload_file(&self, path: &str, contents: &[u8]) -> Result<(), CoreError>;

    async fn delete_file(&self, path: &str) -> Result<FileRemoval, CoreError>;

    async fn login_shell(&self, username: &str) -> Result<AccountShell, CoreError>;
}

/// The license issuing service.
#[async_trait]
pub trait ActivationService: Send + Sync {
    /// Reachability probe; never fails.
    async fn ping(&self, endpoint: &Url) -> bool;

    async fn request_license(
        &self,
        endpoint: &Url,
        dossier: &str,
        eula: &str,
        metadata: &LicenseMetadata,
    ) -> Result<LicenseTransaction, CoreError>;

    /// Download a service descriptor document.
    async fn fetch_descriptor(&self, location: &Url) -> Result<String, CoreError>;
}

/// Account records (roles, shell).
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn account(&self, username: &str) -> Result<AccountRecord, CoreError>;

    async fn set_shell(&self, username: &str, shell: AccountShell) -> Result<(), CoreError>;
}

/// An open command channel. Must be closed with [`CommandChannel::close`].
#[async_trait]
pub trait CommandChannel: Send + Sized {
    async fn run(&mut self, command: &str) -> Result<CommandOutput, CoreError>;

    async fn close(self) -> Result<(), CoreError>;
}

/// Opens command channels on the device.
#[async_trait]
pub trait ShellConnector: Send + Sync {
    type Channel: CommandChannel;

    async fn open(&self) -> Result<Self::Channel, CoreError>;
}

/// A collaborator that may be missing for this device or configuration.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Capability<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Borrow the collaborator, or fail with `Unsupported` for `operation`.
    pub fn require(&self, operation: &str) -> Result<&T, CoreError> {
        match self {
            Self::Available(inner) => Ok(inner),
            Self::Unavailable { reason } => Err(CoreError::Unsupported {
                operation: operation.into(),
                required: reason.clone(),
            }),
        }
    }
}
