// bigip-api: Async Rust clients for the remote surfaces a BIG-IP licensing
// workflow touches (iControl SOAP, account REST, SSH, activation service)

pub mod account;
pub mod activation;
pub mod auth;
pub mod error;
pub mod icontrol;
pub mod soap;
pub mod ssh;
pub mod transport;

pub use account::{AccountClient, PartitionAccess, PartitionRole, UserRecord};
pub use activation::{
    ActivationClient, ActivationFault, ActivationResponse, LicenseApplication, TransactionState,
    endpoint_from_descriptor,
};
pub use auth::{Credentials, HostKeyPolicy};
pub use error::Error;
pub use icontrol::{EnabledState, IControlClient, Interface};
pub use ssh::{CommandOutput, SshConnector, SshSession};
pub use transport::{TlsMode, TransportConfig};
