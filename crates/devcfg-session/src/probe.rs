//! Existence probing through scoped configuration queries.
//!
//! An empty dump means the path is absent; only a failing command is an
//! error.

use devcfg_codec::{dump, join_words};
use tracing::debug;

use crate::error::SessionResult;
use crate::session::Session;

/// Builds `show configuration <path> | display set [relative]`.
pub fn show_config_command<S: AsRef<str>>(path: &[S], relative: bool) -> String {
    let mut command = String::from("show configuration");
    if !path.is_empty() {
        command.push(' ');
        command.push_str(&join_words(path));
    }
    command.push_str(" | display set");
    if relative {
        command.push_str(" relative");
    }
    command
}

/// Returns true if the device has any configuration under `path`.
pub async fn exists<S: AsRef<str>>(session: &mut Session, path: &[S]) -> SessionResult<bool> {
    let output = session.show_config(path, false).await?;
    let found = !dump::is_empty(&output);
    debug!(path = %join_words(path), found, "probed configuration");
    Ok(found)
}
