//! Session factories handed to the controller.

use async_trait::async_trait;
use tracing::debug;

use devcfg_session::{DeviceConfig, NetconfTransport, Session, SessionMode, SessionResult};

use crate::config::DevcfgConfig;

/// Opens one fresh [`Session`] per lifecycle invocation.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to the device.
    async fn connect(&self) -> SessionResult<Session>;
}

/// Connects over NETCONF on an SSH channel opened with `russh`.
#[derive(Debug, Clone)]
pub struct NetconfConnector {
    device: DeviceConfig,
    mode: SessionMode,
}

impl NetconfConnector {
    /// Creates a connector for `device`.
    pub fn new(device: DeviceConfig, mode: SessionMode) -> Self {
        Self { device, mode }
    }

    /// Creates a connector from settings; `fake_session` selects
    /// [`SessionMode::Direct`].
    pub fn from_config(config: &DevcfgConfig) -> Self {
        Self::new(config.device.clone(), config.session.mode())
    }
}

#[async_trait]
impl Connector for NetconfConnector {
    async fn connect(&self) -> SessionResult<Session> {
        debug!(device = %self.device.target(), mode = %self.mode, "connecting");
        let transport = NetconfTransport::connect(&self.device, self.mode).await?;
        Ok(Session::new(Box::new(transport)))
    }
}
