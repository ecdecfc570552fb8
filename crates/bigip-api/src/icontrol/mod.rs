// iControl SOAP client
//
// `IControlClient` owns transport mechanics (portal URL, basic auth,
// envelope exchange). Each iControl interface the licensing workflow uses
// gets its own file of inherent methods.

pub mod client;
pub mod config_sync;
pub mod license;
pub mod models;
pub mod user_management;

pub use client::{IControlClient, Interface};
pub use models::EnabledState;
