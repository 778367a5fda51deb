//! SSH connection carrying the NETCONF subsystem, built on `russh`.

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{ChannelMsg, ChannelStream, Disconnect};
use russh_keys::key::PublicKey;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::device::{DeviceConfig, HostKeyPolicy};
use crate::error::{SessionError, SessionResult};

/// Name of the SSH subsystem NETCONF runs in.
pub const NETCONF_SUBSYSTEM: &str = "netconf";

/// Checks the server key against the configured policy.
struct HostKeyCheck {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    known_hosts: Option<PathBuf>,
}

#[async_trait]
impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        if self.policy == HostKeyPolicy::AcceptAny {
            warn!(host = %self.host, "accepting host key without verification");
            return Ok(true);
        }

        let known = match &self.known_hosts {
            Some(path) => {
                russh_keys::check_known_hosts_path(&self.host, self.port, server_public_key, path)
            }
            None => russh_keys::check_known_hosts(&self.host, self.port, server_public_key),
        };
        match known {
            Ok(true) => Ok(true),
            Ok(false) => {
                warn!(host = %self.host, "host key not found in known hosts");
                Ok(false)
            }
            Err(err) => {
                warn!(host = %self.host, error = %err, "host key check failed");
                Ok(false)
            }
        }
    }
}

/// An authenticated SSH connection to one device.
pub struct SshLink {
    handle: Handle<HostKeyCheck>,
}

impl SshLink {
    /// Connects, authenticates and opens the NETCONF subsystem.
    ///
    /// The whole sequence is bounded by the configured connect timeout.
    #[instrument(skip(config), fields(device = %config.target()))]
    pub async fn open(config: &DeviceConfig) -> SessionResult<(Self, ChannelStream<Msg>)> {
        let target = config.target();
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        tokio::time::timeout(timeout, Self::establish(config))
            .await
            .map_err(|_| {
                SessionError::connect(&target, format!("timed out after {}s", timeout.as_secs()))
            })?
    }

    async fn establish(config: &DeviceConfig) -> SessionResult<(Self, ChannelStream<Msg>)> {
        let target = config.target();
        let user = config
            .username
            .as_deref()
            .ok_or_else(|| SessionError::invalid_device("username", "required for ssh login"))?;

        let handler = HostKeyCheck {
            host: config.host.clone(),
            port: config.port,
            policy: config.host_key,
            known_hosts: config.known_hosts.clone(),
        };
        let ssh_config = Arc::new(client::Config::default());
        let mut handle = client::connect(ssh_config, (config.host.as_str(), config.port), handler)
            .await
            .map_err(|e| SessionError::connect(&target, e.to_string()))?;

        let authenticated = match (&config.identity_file, &config.password) {
            (Some(path), _) => {
                let key = russh_keys::load_secret_key(path, None).map_err(|e| {
                    SessionError::connect(&target, format!("failed to load {}: {e}", path.display()))
                })?;
                handle.authenticate_publickey(user, Arc::new(key)).await
            }
            (None, Some(password)) => handle.authenticate_password(user, password.as_str()).await,
            (None, None) => {
                return Err(SessionError::invalid_device(
                    "identity_file",
                    "an identity file or a password is required",
                ))
            }
        }
        .map_err(|e| SessionError::connect(&target, e.to_string()))?;
        if !authenticated {
            return Err(SessionError::connect(
                &target,
                format!("authentication as {user} was rejected"),
            ));
        }
        debug!(user, "authenticated");

        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(|e| SessionError::connect(&target, e.to_string()))?;
        channel
            .request_subsystem(true, NETCONF_SUBSYSTEM)
            .await
            .map_err(|e| SessionError::connect(&target, e.to_string()))?;
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Success) => break,
                Some(ChannelMsg::Failure) | None => {
                    return Err(SessionError::connect(
                        &target,
                        "device refused the netconf subsystem",
                    ))
                }
                Some(_) => {}
            }
        }

        Ok((Self { handle }, channel.into_stream()))
    }

    /// Ends the SSH connection.
    pub async fn disconnect(&self) {
        if let Err(err) = self
            .handle
            .disconnect(Disconnect::ByApplication, "session closed", "en")
            .await
        {
            debug!(error = %err, "ssh connection already gone");
        }
    }
}
