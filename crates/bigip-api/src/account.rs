// Account REST client
//
// iControl REST user records: read the account's partition roles and shell,
// and change the shell. Used only by the license removal path, which needs
// an elevated shell for the duration of the file deletion and reload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

/// One entry of a user's `partitionAccess` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRole {
    pub name: String,
    pub role: String,
}

/// `partitionAccess` is a list of `{name, role}` on current firmware and a
/// bare partition name (with the role in a sibling field) on older releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartitionAccess {
    Roles(Vec<PartitionRole>),
    Partition(String),
}

impl Default for PartitionAccess {
    fn default() -> Self {
        Self::Roles(Vec::new())
    }
}

/// `GET /mgmt/tm/auth/user/{name}` response (fields we use).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub partition_access: PartitionAccess,
    /// Role on firmware that reports a single partition.
    #[serde(default)]
    pub role: Option<String>,
}

impl UserRecord {
    /// Every role granted to the account, across partitions.
    pub fn roles(&self) -> Vec<String> {
        match &self.partition_access {
            PartitionAccess::Roles(entries) => entries.iter().map(|e| e.role.clone()).collect(),
            PartitionAccess::Partition(_) => self.role.iter().cloned().collect(),
        }
    }
}

/// REST client for device account records.
pub struct AccountClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    timeout_secs: u64,
}

impl AccountClient {
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
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

    fn user_url(&self, username: &str) -> Result<Url, Error> {
        let mut url = self.base_url.join("/mgmt/tm/auth/user/")?;
        url.path_segments_mut()
            .map_err(|()| Error::UnsupportedOperation("base URL cannot carry a path"))?
            .pop_if_empty()
            .push(username);
        Ok(url)
    }

    /// Fetch an account record.
    pub async fn get_user(&self, username: &str) -> Result<UserRecord, Error> {
        let url = self.user_url(username)?;
        debug!("GET {}", url);
        let resp = self
            .credentials
            .apply(self.http.get(url))
            .send()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;
        self.parse(resp).await
    }

    /// Set an account's shell (`bash`, `tmsh`, `none`).
    ///
    /// The device applies the change asynchronously; callers confirm it
    /// through the management API's login-shell query.
    pub async fn set_shell(&self, username: &str, shell: &str) -> Result<(), Error> {
        let url = self.user_url(username)?;
        debug!(shell, "PUT {}", url);
        let resp = self
            .credentials
            .apply(self.http.put(url))
            .json(&json!({ "shell": shell }))
            .send()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;
        let _: serde_json::Value = self.parse(resp).await?;
        Ok(())
    }

    async fn parse<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "account endpoint rejected the supplied credentials".into(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;

        if !status.is_success() {
            // iControl REST errors look like {"code":404,"message":"..."}
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(Error::Rest {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}
