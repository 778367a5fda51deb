//! Shared helpers for lifecycle tests

#![allow(dead_code)]

use async_trait::async_trait;
use devcfg_resource::{Connector, Controller};
use devcfg_session::{Session, SessionMode, SessionResult};
use devcfg_test::SimulatedDevice;

/// Opens sessions on a simulated device
pub struct SimulatedConnector {
    device: SimulatedDevice,
    mode: SessionMode,
}

#[async_trait]
impl Connector for SimulatedConnector {
    async fn connect(&self) -> SessionResult<Session> {
        Ok(Session::new(Box::new(self.device.connect_with_mode(self.mode))))
    }
}

/// Controller with transactional sessions on `device`
pub fn controller(device: &SimulatedDevice) -> Controller<SimulatedConnector> {
    controller_with_mode(device, SessionMode::Transactional)
}

/// Controller with sessions in `mode` on `device`
pub fn controller_with_mode(
    device: &SimulatedDevice,
    mode: SessionMode,
) -> Controller<SimulatedConnector> {
    Controller::new(SimulatedConnector {
        device: device.clone(),
        mode,
    })
}
