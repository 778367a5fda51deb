//! Object types managed through the [`Controller`](crate::Controller).
//!
//! - [`Application`]: one custom application, owned by its name
//! - [`Applications`]: the shared `applications` stanza
//! - [`RadiusServer`]: one RADIUS server, owned by its address

mod application;
mod applications;
mod radius_server;

pub use application::{Application, ApplicationTerm, MatchFields};
pub use applications::{ApplicationEntry, ApplicationSet, Applications};
pub use radius_server::RadiusServer;
