//! The seam between a [`Session`](crate::Session) and the wire.
//!
//! A transport executes one [`Rpc`] at a time and answers with an
//! [`RpcReply`]. Device-level rejections come back inside the reply; only a
//! broken or unusable connection is an `Err`.

use async_trait::async_trait;
use std::fmt;

use crate::error::SessionResult;

/// Whether a transport supports locking and commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Lock, load into the candidate, commit, unlock.
    #[default]
    Transactional,
    /// Statements take effect as they are loaded; lock, unlock and commit
    /// are no-ops. Only meant for test and simulation setups.
    Direct,
}

impl SessionMode {
    /// Returns true for [`SessionMode::Transactional`].
    pub fn is_transactional(self) -> bool {
        self == SessionMode::Transactional
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Transactional => f.write_str("transactional"),
            SessionMode::Direct => f.write_str("direct"),
        }
    }
}

/// One request to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rpc {
    /// Take the exclusive candidate configuration lock.
    Lock,
    /// Release the candidate configuration lock.
    Unlock,
    /// Load configuration statements, one per line.
    LoadSet {
        /// Statement lines in submission order.
        lines: Vec<String>,
    },
    /// Drop uncommitted candidate changes.
    Discard,
    /// Commit the candidate configuration.
    Commit {
        /// Commit log message.
        log: String,
    },
    /// Run a read-only operational command.
    Command {
        /// Command text.
        command: String,
    },
    /// End the session.
    Close,
}

impl Rpc {
    /// Returns a short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Rpc::Lock => "lock",
            Rpc::Unlock => "unlock",
            Rpc::LoadSet { .. } => "load-set",
            Rpc::Discard => "discard",
            Rpc::Commit { .. } => "commit",
            Rpc::Command { .. } => "command",
            Rpc::Close => "close",
        }
    }
}

/// An error or warning reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMessage {
    /// Message text.
    pub message: String,
    /// Where the device reported the problem: an `[edit ...]` hierarchy or
    /// the offending statement.
    pub path: Option<String>,
    /// The word the device rejected, if any.
    pub element: Option<String>,
}

impl RpcMessage {
    /// Creates a message without a location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            element: None,
        }
    }

    /// Attaches the path the device reported.
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches the rejected word.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

impl fmt::Display for RpcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        match (&self.path, &self.element) {
            (Some(path), Some(element)) => write!(f, " ({path}: {element})"),
            (Some(path), None) => write!(f, " ({path})"),
            (None, Some(element)) => write!(f, " ({element})"),
            (None, None) => Ok(()),
        }
    }
}

/// The device's answer to one [`Rpc`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcReply {
    /// Text output, with configuration output wrapped in dump markers.
    pub output: String,
    /// Errors; a non-empty list means the request failed.
    pub errors: Vec<RpcMessage>,
    /// Advisory warnings.
    pub warnings: Vec<RpcMessage>,
}

impl RpcReply {
    /// A successful reply without output.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A successful reply carrying `output`.
    pub fn with_output(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    /// A failed reply with a single error.
    pub fn error(message: RpcMessage) -> Self {
        Self {
            errors: vec![message],
            ..Self::default()
        }
    }

    /// Returns true if the device reported no error.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns every error joined by `"; "`.
    pub fn error_text(&self) -> String {
        join(&self.errors)
    }

    /// Returns the warnings as display strings.
    pub fn warning_texts(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Appends the messages of `other` to this reply.
    pub fn merge(&mut self, other: RpcReply) {
        self.output.push_str(&other.output);
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

fn join(messages: &[RpcMessage]) -> String {
    messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A connection to one device.
#[async_trait]
pub trait DeviceTransport: Send {
    /// Device address, used in logs and errors.
    fn target(&self) -> &str;

    /// Mode this transport runs in.
    fn mode(&self) -> SessionMode {
        SessionMode::Transactional
    }

    /// Sends `rpc` and waits for the device's reply.
    async fn call(&mut self, rpc: &Rpc) -> SessionResult<RpcReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_texts() {
        let mut reply = RpcReply::error(RpcMessage::new("syntax error").at("protocol"));
        reply.merge(RpcReply {
            output: String::new(),
            errors: vec![RpcMessage::new("load failed")],
            warnings: vec![RpcMessage::new("statement has no effect")],
        });

        assert!(!reply.is_ok());
        assert_eq!(reply.error_text(), "syntax error (protocol); load failed");
        assert_eq!(reply.warning_texts(), vec!["statement has no effect"]);

        let located = RpcMessage::new("syntax error")
            .at("[edit applications application web]")
            .with_element("bogus");
        assert_eq!(
            located.to_string(),
            "syntax error ([edit applications application web]: bogus)"
        );
    }

    #[test]
    fn test_rpc_names() {
        assert_eq!(Rpc::Lock.name(), "lock");
        assert_eq!(Rpc::LoadSet { lines: vec![] }.name(), "load-set");
        assert_eq!(Rpc::Discard.name(), "discard");
        assert_eq!(
            Rpc::Commit {
                log: "x".to_string()
            }
            .name(),
            "commit"
        );
        assert!(SessionMode::default().is_transactional());
        assert_eq!(SessionMode::Direct.to_string(), "direct");
    }
}
