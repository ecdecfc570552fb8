// iControl portal HTTP client
//
// Wraps `reqwest::Client` with the portal URL, basic-auth credentials and
// SOAPAction routing. Endpoint groups (license administration, config
// sync, user management) are inherent methods in sibling files.

use std::fmt;

use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::soap::{self, SoapCall, XmlNode};
use crate::transport::TransportConfig;

const PORTAL_PATH: &str = "/iControl/iControlPortal.cgi";

/// The iControl interfaces used by the licensing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    LicenseAdministration,
    ConfigSync,
    UserManagement,
}

impl Interface {
    /// The interface URN, used both as SOAPAction and as the method namespace.
    pub fn urn(self) -> &'static str {
        match self {
            Self::LicenseAdministration => "urn:iControl:Management/LicenseAdministration",
            Self::ConfigSync => "urn:iControl:System/ConfigSync",
            Self::UserManagement => "urn:iControl:Management/UserManagement",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LicenseAdministration => "Management.LicenseAdministration",
            Self::ConfigSync => "System.ConfigSync",
            Self::UserManagement => "Management.UserManagement",
        };
        f.write_str(name)
    }
}

/// SOAP client for a device's iControl portal.
pub struct IControlClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    timeout_secs: u64,
}

impl IControlClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the management interface root, e.g. `https://10.0.0.5`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            credentials,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            timeout_secs: 0,
        }
    }

    fn portal_url(&self) -> Result<Url, Error> {
        self.base_url.join(PORTAL_PATH).map_err(Error::InvalidUrl)
    }

    /// Invoke one method and return the response `<Body>`.
    pub(crate) async fn call(&self, interface: Interface, call: SoapCall) -> Result<XmlNode, Error> {
        let url = self.portal_url()?;
        debug!("iControl {interface}::{}", call.method());

        let request = self.credentials.apply(self.http.post(url));
        soap::exchange(request, &call, interface.urn(), self.timeout_secs).await
    }

    /// Start a call in the interface's namespace.
    pub(crate) fn request(interface: Interface, method: &'static str) -> SoapCall {
        SoapCall::new(interface.urn(), method)
    }
}
