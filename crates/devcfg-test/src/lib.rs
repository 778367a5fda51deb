//! Test infrastructure for devcfg sessions and resources
//!
//! Provides:
//! - A simulated device with lock contention, candidate/commit semantics
//!   and scripted failures
//! - Test fixtures for common configuration
//! - RPC log verification helpers

pub mod fixtures;
mod simulated;
mod verification;

pub use fixtures::*;
pub use simulated::{SimulatedDevice, SimulatedTransport};
pub use verification::*;
