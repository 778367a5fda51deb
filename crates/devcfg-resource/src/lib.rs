//! Resource lifecycle for line-configured devices.
//!
//! A [`ManagedObject`] describes where an object lives in the device
//! configuration and which optional checks apply to it. The [`Controller`]
//! drives create, read, update and delete for any such object over a
//! session opened by a [`Connector`]:
//!
//! ```text
//! Controller ──connect──▶ Connector ──▶ Session ──▶ DeviceTransport
//!     │
//!     └── render / parse_into (devcfg-codec)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use devcfg_resource::{Controller, DevcfgConfig, NetconfConnector};
//! use devcfg_resource::objects::RadiusServer;
//!
//! let config = DevcfgConfig::load()?;
//! let controller = Controller::from_config(NetconfConnector::from_config(&config), &config);
//!
//! let plan = RadiusServer { port: Some(1812), ..RadiusServer::new("192.0.2.1") };
//! let response = controller.create(&plan).await;
//! for warning in &response.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! let state = response.into_result()?;
//! ```

pub mod config;
pub mod connector;
pub mod controller;
pub mod error;
pub mod object;
pub mod objects;

pub use config::{DevcfgConfig, SessionSettings};
pub use connector::{Connector, NetconfConnector};
pub use controller::{Controller, Response};
pub use error::{ResourceError, ResourceResult};
pub use object::{Capabilities, ManagedObject};
