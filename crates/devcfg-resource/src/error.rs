//! Error types for resource lifecycle operations.
//!
//! Codec and session errors pass through unchanged. The remaining variants
//! are the domain-level pre/post-condition failures a host runtime renders
//! as distinct diagnostics.

use std::io;
use thiserror::Error;

use devcfg_codec::CodecError;
use devcfg_session::SessionError;

/// Result type alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors reported by the lifecycle controller.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Validation, parse or decode failure in the line codec.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Lock, submit, commit or command failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The existence check before applying could not run.
    #[error("Pre-check failed for {resource}: {source}")]
    PreCheck {
        /// Resource identity.
        resource: String,
        /// The failing query.
        #[source]
        source: SessionError,
    },

    /// The existence check after committing could not run.
    #[error("Post-check failed for {resource}: {source}")]
    PostCheck {
        /// Resource identity.
        resource: String,
        /// The failing query.
        #[source]
        source: SessionError,
    },

    /// The device accepted the configuration but it is not there.
    #[error("{resource} not found")]
    NotFound {
        /// Resource identity.
        resource: String,
    },

    /// The resource already exists on the device.
    #[error("{resource} already exists")]
    DuplicateConfig {
        /// Resource identity.
        resource: String,
    },

    /// Attributes that cannot be configured together.
    #[error("Conflicting configuration for {resource}: {message}")]
    ConflictConfig {
        /// Resource identity.
        resource: String,
        /// What conflicts.
        message: String,
    },

    /// An attribute required by another one is missing.
    #[error("Missing configuration for {resource}: {message}")]
    MissingConfig {
        /// Resource identity.
        resource: String,
        /// What is missing.
        message: String,
    },

    /// The configuration cannot be expressed on this device.
    #[error("{resource} is not compatible: {message}")]
    Compatibility {
        /// Resource identity.
        resource: String,
        /// Why.
        message: String,
    },

    /// Invalid settings file.
    #[error("Invalid configuration file: {0}")]
    Configuration(String),

    /// I/O error reading or writing settings.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ResourceError {
    /// Creates a pre-check error.
    pub fn pre_check(resource: impl Into<String>, source: SessionError) -> Self {
        Self::PreCheck {
            resource: resource.into(),
            source,
        }
    }

    /// Creates a post-check error.
    pub fn post_check(resource: impl Into<String>, source: SessionError) -> Self {
        Self::PostCheck {
            resource: resource.into(),
            source,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a duplicate configuration error.
    pub fn duplicate_config(resource: impl Into<String>) -> Self {
        Self::DuplicateConfig {
            resource: resource.into(),
        }
    }

    /// Creates a conflicting configuration error.
    pub fn conflict_config(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConflictConfig {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a missing configuration error.
    pub fn missing_config(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MissingConfig {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a compatibility error.
    pub fn compatibility(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compatibility {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Short name of the error kind, stable for host runtimes.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceError::Codec(CodecError::Validation { .. }) => "ValidationError",
            ResourceError::Codec(CodecError::Parse { .. }) => "ParseError",
            ResourceError::Codec(CodecError::Decode { .. }) => "DecodeError",
            ResourceError::Session(SessionError::ConfigLock { .. }) => "ConfigLockErr",
            ResourceError::Session(SessionError::ConfigUnlock { .. }) => "ConfigUnlockWarn",
            ResourceError::Session(SessionError::ConfigSet { .. }) => "ConfigSetErr",
            ResourceError::Session(SessionError::ConfigCommit { .. }) => "ConfigCommitErr",
            ResourceError::Session(SessionError::Command { .. }) => "CommandError",
            ResourceError::Session(SessionError::Cancelled { .. }) => "Cancelled",
            ResourceError::Session(SessionError::InvalidDevice { .. }) => "ConfigurationError",
            ResourceError::Session(_) => "SessionError",
            ResourceError::PreCheck { .. } => "PreCheckErr",
            ResourceError::PostCheck { .. } => "PostCheckErr",
            ResourceError::NotFound { .. } => "NotFoundErr",
            ResourceError::DuplicateConfig { .. } => "DuplicateConfigErr",
            ResourceError::ConflictConfig { .. } => "ConflictConfigErr",
            ResourceError::MissingConfig { .. } => "MissingConfigErr",
            ResourceError::Compatibility { .. } => "CompatibilityErr",
            ResourceError::Configuration(_) | ResourceError::Io(_) => "ConfigurationError",
        }
    }
}
