//! Device sessions for line-configured network devices.
//!
//! This crate owns everything that talks to a device:
//!
//! - [`Session`]: lock, submit, commit, unlock and close, with an explicit
//!   [`SessionMode`] and caller-driven cancellation
//! - [`DeviceTransport`]: the seam a session drives, one [`Rpc`] at a time
//! - [`NetconfTransport`]: NETCONF over the SSH `netconf` subsystem
//!   ([`ssh::SshLink`], built on `russh`) or any byte stream
//! - [`probe`]: existence checks through `show configuration ... | display set`
//!
//! # Architecture
//!
//! ```text
//! Session ──► DeviceTransport ──► NetconfTransport ──► SshLink (russh)
//!    │                      └──► (simulated devices in tests)
//!    └──► probe::exists ──► devcfg_codec::dump
//! ```
//!
//! # Example
//!
//! ```ignore
//! use devcfg_session::{probe, DeviceConfig, NetconfTransport, Session, SessionMode};
//!
//! let transport = NetconfTransport::connect(&config, SessionMode::Transactional).await?;
//! let mut session = Session::new(Box::new(transport));
//!
//! session.lock().await?;
//! session.submit(&statements).await?;
//! let outcome = session.commit("add web application").await;
//! // rolls back if the commit failed, then unlocks
//! let release_warnings = session.release().await;
//! session.close().await?;
//! ```

pub mod device;
pub mod error;
pub mod netconf;
pub mod probe;
pub mod session;
pub mod ssh;
pub mod transport;

pub use device::{DeviceConfig, HostKeyPolicy};
pub use error::{SessionError, SessionResult};
pub use netconf::{NetconfStream, NetconfTransport};
pub use probe::{exists, show_config_command};
pub use session::{CommitOutcome, Session, SessionState, Transaction};
pub use transport::{DeviceTransport, Rpc, RpcMessage, RpcReply, SessionMode};
