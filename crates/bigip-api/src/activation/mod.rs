// License activation service client
//
// The vendor-operated issuing service: a reachability probe and the
// `getLicense` transaction, plus service-descriptor (WSDL) endpoint lookup.

pub mod client;
pub mod descriptor;
pub mod models;

pub use client::ActivationClient;
pub use descriptor::endpoint_from_descriptor;
pub use models::{ActivationFault, ActivationResponse, LicenseApplication, TransactionState};
