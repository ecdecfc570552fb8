// SSH command channel
//
// Password-authenticated exec sessions over russh. The licensing workflow
// uses it for a single command (`reloadlic`), but the session is generic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::auth::{Credentials, HostKeyPolicy};
use crate::error::Error;

/// Output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the server closed the channel without an exit status.
    pub exit_status: Option<u32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command reported exit status 0.
    pub fn succeeded(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// Accumulates exec channel messages into a [`CommandOutput`].
#[derive(Default)]
struct OutputCollector {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_status: Option<u32>,
}

impl OutputCollector {
    fn push(&mut self, msg: &ChannelMsg) {
        match msg {
            ChannelMsg::Data { data } => self.stdout.extend_from_slice(data),
            ChannelMsg::ExtendedData { data, ext: 1 } => self.stderr.extend_from_slice(data),
            ChannelMsg::ExitStatus { exit_status } => self.exit_status = Some(*exit_status),
            _ => {}
        }
    }

    fn finish(self) -> CommandOutput {
        CommandOutput {
            exit_status: self.exit_status,
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
        }
    }
}

/// russh callback handler; only host-key verification is customised.
struct HostKeyCheck {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

#[async_trait]
impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        match self.policy {
            HostKeyPolicy::AcceptAny => Ok(true),
            HostKeyPolicy::KnownHosts => {
                match russh_keys::check_known_hosts(&self.host, self.port, server_public_key) {
                    Ok(known) => Ok(known),
                    Err(e) => {
                        warn!(host = %self.host, error = %e, "known_hosts check failed");
                        Ok(false)
                    }
                }
            }
        }
    }
}

/// Connection parameters for the device's SSH service.
#[derive(Debug, Clone)]
pub struct SshConnector {
    host: String,
    port: u16,
    credentials: Credentials,
    host_keys: HostKeyPolicy,
    timeout: Duration,
}

impl SshConnector {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        credentials: Credentials,
        host_keys: HostKeyPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            credentials,
            host_keys,
            timeout,
        }
    }

    /// Open and authenticate a session.
    pub async fn connect(&self) -> Result<SshSession, Error> {
        let config = Arc::new(client::Config {
            inactivity_timeout: Some(self.timeout),
            ..client::Config::default()
        });
        let handler = HostKeyCheck {
            host: self.host.clone(),
            port: self.port,
            policy: self.host_keys,
        };

        debug!(host = %self.host, port = self.port, "opening SSH session");
        let connect = client::connect(config, (self.host.as_str(), self.port), handler);
        let mut handle = match tokio::time::timeout(self.timeout, connect).await {
            Err(_) => {
                return Err(Error::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(russh::Error::UnknownKey)) => {
                return Err(Error::HostKeyRejected {
                    host: self.host.clone(),
                });
            }
            Ok(Err(e)) => return Err(Error::Ssh(e)),
            Ok(Ok(handle)) => handle,
        };

        let accepted = handle
            .authenticate_password(
                self.credentials.username(),
                self.credentials.password().expose_secret(),
            )
            .await?;
        if !accepted {
            return Err(Error::SshAuthentication {
                username: self.credentials.username().to_owned(),
            });
        }

        debug!("SSH session authenticated");
        Ok(SshSession { handle })
    }
}

/// An authenticated SSH session. Close it with [`SshSession::disconnect`].
pub struct SshSession {
    handle: Handle<HostKeyCheck>,
}

impl SshSession {
    /// Run a command on a fresh exec channel and collect its output.
    pub async fn exec(&mut self, command: &str) -> Result<CommandOutput, Error> {
        debug!(command, "exec");
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut collected = OutputCollector::default();
        while let Some(msg) = channel.wait().await {
            collected.push(&msg);
        }
        Ok(collected.finish())
    }

    /// Close the session politely.
    pub async fn disconnect(self) -> Result<(), Error> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;
        Ok(())
    }
}
