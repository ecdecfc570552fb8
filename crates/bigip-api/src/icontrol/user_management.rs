// Management.UserManagement endpoints

use crate::error::Error;
use crate::icontrol::client::{IControlClient, Interface};
use crate::soap::{self, SoapValue};

impl IControlClient {
    /// The login shell configured for `username`, as a path
    /// (e.g. `/bin/bash`, `/usr/bin/tmsh`, `/sbin/nologin`).
    pub async fn get_login_shell(&self, username: &str) -> Result<String, Error> {
        let call = Self::request(Interface::UserManagement, "get_login_shell").param(
            "user_names",
            SoapValue::TextArray(vec![username.to_owned()]),
        );
        let body = self.call(Interface::UserManagement, call).await?;
        let shells = soap::return_value(&body)
            .map(crate::soap::XmlNode::items)
            .unwrap_or_default();
        shells
            .into_iter()
            .next()
            .ok_or_else(|| Error::Deserialization {
                message: format!("no login shell returned for '{username}'"),
                body: String::new(),
            })
    }
}
