//! License lifecycle controller and domain model for BIG-IP devices.
//!
//! This crate owns the business logic between `bigip-api` and the CLI:
//!
//! - **[`LicenseController`]**: converges a device's license to a
//!   [`DesiredState`]. Issuance runs dossier, EULA negotiation, license
//!   request and install; removal runs privilege check, shell switch, file
//!   deletion, reload and confirmation polling, restoring the account shell
//!   on every path.
//!
//! - **Capabilities** ([`capability`]): the traits the controller is generic
//!   over ([`DeviceManagement`], [`ActivationService`], [`AccountDirectory`],
//!   [`ShellConnector`]). [`adapters`] implements them over the real clients.
//!
//! - **[`DeviceSession`]**: builds those clients from a [`SessionConfig`]
//!   and yields a ready controller.
//!
//! - **Domain model** ([`model`]): requests, activation status, account
//!   shells, license transactions, endpoints and the [`LicenseOutcome`]
//!   report.

pub mod adapters;
pub mod capability;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod poll;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use capability::{
    AccountDirectory, ActivationService, Capability, CommandChannel, DeviceManagement,
    FileRemoval, ShellConnector,
};
pub use config::{ActivationEndpoints, PollSettings, SessionConfig, TlsVerification};
pub use controller::{ControllerSettings, LicenseController};
pub use error::CoreError;
pub use poll::{PollOutcome, PollStatus};
pub use session::{DeviceSession, SessionController};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccountRecord, AccountShell, ActivationEndpoint, ActivationStatus, DesiredState,
    LicenseMetadata, LicenseOutcome, LicenseRequest, LicenseTransaction, RemovalReport,
    ServiceDescriptor, select_endpoint,
};
