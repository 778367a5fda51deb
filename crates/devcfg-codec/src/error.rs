//! Error types for rendering and parsing configuration statements.
//!
//! Validation problems are collected into a single [`CodecError::Validation`]
//! so that every problem in an object is reported before any statement is
//! produced.

use thiserror::Error;

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// A single problem found while validating an object before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationProblem {
    /// An identifier field of a block is empty.
    #[error("{block}: identifier field '{field}' must not be empty")]
    MissingIdentifier {
        /// Block keyword.
        block: String,
        /// Name of the empty identifier field.
        field: String,
    },

    /// Two sibling blocks share the same identifier tuple.
    #[error("{block}: multiple blocks with identifier '{identifier}'")]
    DuplicateIdentifier {
        /// Block keyword.
        block: String,
        /// The shared identifier, fields joined by a space.
        identifier: String,
    },

    /// A block has nothing set beyond its identifier.
    #[error("{block} '{identifier}': block has no configuration besides its identifier")]
    EmptyBlock {
        /// Block keyword.
        block: String,
        /// Identifier of the empty block.
        identifier: String,
    },
}

/// Errors produced by the line codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// One or more validation problems; nothing was rendered.
    #[error("invalid configuration: {}", join_problems(.problems))]
    Validation {
        /// Every problem found, in visit order.
        problems: Vec<ValidationProblem>,
    },

    /// A numeric or otherwise typed field could not be parsed.
    #[error("failed to parse '{line}': {reason}")]
    Parse {
        /// The dump line being parsed.
        line: String,
        /// What went wrong.
        reason: String,
    },

    /// An obfuscated secret could not be decoded.
    #[error("failed to decode secret field '{field}': {reason}")]
    Decode {
        /// Attribute holding the secret.
        field: String,
        /// Decoder message.
        reason: String,
    },
}

fn join_problems(problems: &[ValidationProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CodecError {
    /// Creates a parse error for a dump line.
    pub fn parse(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Creates a secret decode error.
    pub fn decode(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the validation problems, or an empty slice for other errors.
    pub fn problems(&self) -> &[ValidationProblem] {
        match self {
            CodecError::Validation { problems } => problems,
            _ => &[],
        }
    }

    /// Returns true if any validation problem is an empty block.
    pub fn is_empty_block(&self) -> bool {
        self.problems()
            .iter()
            .any(|p| matches!(p, ValidationProblem::EmptyBlock { .. }))
    }

    /// Returns true if any validation problem is a duplicate identifier.
    pub fn is_duplicate_identifier(&self) -> bool {
        self.problems()
            .iter()
            .any(|p| matches!(p, ValidationProblem::DuplicateIdentifier { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_joins_problems() {
        let err = CodecError::Validation {
            problems: vec![
                ValidationProblem::MissingIdentifier {
                    block: "term".to_string(),
                    field: "name".to_string(),
                },
                ValidationProblem::EmptyBlock {
                    block: "term".to_string(),
                    identifier: "t1".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("identifier field 'name'"));
        assert!(msg.contains("term 't1'"));
        assert!(msg.contains("; "));
        assert!(err.is_empty_block());
        assert!(!err.is_duplicate_identifier());
    }

    #[test]
    fn test_parse_and_decode_helpers() {
        let err = CodecError::parse("set port abc", "port: invalid digit");
        assert_eq!(
            err.to_string(),
            "failed to parse 'set port abc': port: invalid digit"
        );
        assert!(err.problems().is_empty());

        let err = CodecError::decode("secret", "truncated");
        assert_eq!(
            err.to_string(),
            "failed to decode secret field 'secret': truncated"
        );
    }
}
