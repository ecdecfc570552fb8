// ── Domain model ──
//
// Canonical licensing types. Both SOAP surfaces and the account REST
// endpoint are normalised into these before the controller sees them.

pub mod account;
pub mod endpoint;
pub mod outcome;
pub mod request;
pub mod status;
pub mod transaction;

pub use account::{AccountRecord, AccountShell};
pub use endpoint::{ActivationEndpoint, ServiceDescriptor, select_endpoint};
pub use outcome::{LicenseOutcome, RemovalReport};
pub use request::{DesiredState, LicenseMetadata, LicenseRequest};
pub use status::ActivationStatus;
pub use transaction::LicenseTransaction;
