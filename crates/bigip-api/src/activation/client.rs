// Activation service HTTP client

use tracing::debug;
use url::Url;

use crate::activation::models::{ActivationResponse, LicenseApplication, NAMESPACE};
use crate::error::Error;
use crate::soap::{self, SoapCall};
use crate::transport::TransportConfig;

/// SOAP client for the license issuing service.
///
/// Stateless apart from the HTTP client: the endpoint is chosen per call,
/// because the controller decides between the external and internal
/// service from the registration key.
pub struct ActivationClient {
    http: reqwest::Client,
    timeout_secs: u64,
}

impl ActivationClient {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout_secs: 0,
        }
    }

    /// Capability probe. Any well-formed, fault-free reply counts as
    /// reachable; transport failures and faults count as unreachable.
    pub async fn ping(&self, endpoint: &Url) -> bool {
        let call = SoapCall::new(NAMESPACE, "ping");
        match soap::exchange(self.http.post(endpoint.clone()), &call, "", self.timeout_secs).await
        {
            Ok(_) => true,
            Err(err) => {
                debug!(%endpoint, error = %err, "activation service ping failed");
                false
            }
        }
    }

    /// Submit a license request and decode the transaction.
    pub async fn get_license(
        &self,
        endpoint: &Url,
        application: &LicenseApplication,
    ) -> Result<ActivationResponse, Error> {
        debug!(%endpoint, eula = !application.eula.is_empty(), "requesting license");
        let call = application.to_call();
        let body =
            soap::exchange(self.http.post(endpoint.clone()), &call, "", self.timeout_secs).await?;
        ActivationResponse::from_body(&body)
    }

    /// Fetch a remote service descriptor (WSDL) as text.
    pub async fn fetch_descriptor(&self, location: &Url) -> Result<String, Error> {
        debug!(%location, "fetching service descriptor");
        let resp = self
            .http
            .get(location.clone())
            .send()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Rest {
                status: status.as_u16(),
                message: format!("service descriptor download failed: {location}"),
            });
        }
        resp.text()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))
    }
}
