//! Error types for device sessions.
//!
//! Every failure a session can report maps to one variant here. Unlock
//! failures are still errors at this level; callers releasing a session on
//! the way out downgrade them to warnings (see [`Session::release`]).
//!
//! [`Session::release`]: crate::Session::release

use std::io;
use thiserror::Error;

use crate::session::SessionState;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while talking to a device.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport could not be established.
    #[error("Failed to connect to {target}: {reason}")]
    Connect {
        /// Device address.
        target: String,
        /// Why the connection failed.
        reason: String,
    },

    /// The configuration lock is held elsewhere or was refused.
    #[error("Failed to lock configuration: {message}")]
    ConfigLock {
        /// Device or session message.
        message: String,
    },

    /// Releasing the configuration lock failed.
    #[error("Failed to unlock configuration: {message}")]
    ConfigUnlock {
        /// Device message.
        message: String,
    },

    /// The device rejected a submitted statement.
    #[error("Statement rejected{}: {message}", rejected_at(.statement, .path))]
    ConfigSet {
        /// The rejected statement, when it could be identified.
        statement: Option<String>,
        /// Element path reported by the device.
        path: Option<String>,
        /// Device message.
        message: String,
    },

    /// Dropping uncommitted changes failed.
    #[error("Failed to discard uncommitted changes: {message}")]
    ConfigDiscard {
        /// Device message.
        message: String,
    },

    /// The device refused to commit the candidate configuration.
    #[error("Failed to commit configuration: {message}")]
    ConfigCommit {
        /// Device message.
        message: String,
    },

    /// A read-only command failed.
    #[error("Command '{command}' failed: {message}")]
    Command {
        /// The command that failed.
        command: String,
        /// Device message.
        message: String,
    },

    /// Connection parameters are unusable.
    #[error("Invalid device setting {field}: {reason}")]
    InvalidDevice {
        /// Offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The operation is not allowed in the current session state.
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        /// Attempted operation.
        operation: &'static str,
        /// Current state.
        state: SessionState,
    },

    /// The caller cancelled the invocation.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Operation that was interrupted.
        operation: &'static str,
    },

    /// The transport broke or answered something unexpected.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// I/O failure on the transport stream.
    #[error("I/O error on device transport: {0}")]
    Io(#[from] io::Error),
}

fn rejected_at(statement: &Option<String>, path: &Option<String>) -> String {
    match (statement, path) {
        (Some(statement), Some(path)) => format!(" '{statement}' at {path}"),
        (Some(statement), None) => format!(" '{statement}'"),
        (None, Some(path)) => format!(" at {path}"),
        (None, None) => String::new(),
    }
}

impl SessionError {
    /// Creates a connect error.
    pub fn connect(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connect {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates a lock error.
    pub fn config_lock(message: impl Into<String>) -> Self {
        Self::ConfigLock {
            message: message.into(),
        }
    }

    /// Creates an unlock error.
    pub fn config_unlock(message: impl Into<String>) -> Self {
        Self::ConfigUnlock {
            message: message.into(),
        }
    }

    /// Creates a discard error.
    pub fn config_discard(message: impl Into<String>) -> Self {
        Self::ConfigDiscard {
            message: message.into(),
        }
    }

    /// Creates an invalid device setting error.
    pub fn invalid_device(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidDevice {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a commit error.
    pub fn config_commit(message: impl Into<String>) -> Self {
        Self::ConfigCommit {
            message: message.into(),
        }
    }

    /// Creates a command error.
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns true if the caller cancelled the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_set_display() {
        let err = SessionError::ConfigSet {
            statement: Some("set applications application web protocol bogus".to_string()),
            path: Some("protocol".to_string()),
            message: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Statement rejected 'set applications application web protocol bogus' at protocol: syntax error"
        );

        let err = SessionError::ConfigSet {
            statement: None,
            path: None,
            message: "syntax error".to_string(),
        };
        assert_eq!(err.to_string(), "Statement rejected: syntax error");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = SessionError::InvalidState {
            operation: "commit",
            state: SessionState::Opened,
        };
        assert_eq!(err.to_string(), "Cannot commit while session is opened");
    }

    #[test]
    fn test_classification() {
        assert!(SessionError::Cancelled { operation: "lock" }.is_cancelled());
        assert!(!SessionError::transport("eof").is_cancelled());
        assert_eq!(
            SessionError::invalid_device("host", "must not start with '-'").to_string(),
            "Invalid device setting host: must not start with '-'"
        );
    }
}
