//! Verification helpers over the RPCs a simulated device received.

use devcfg_session::Rpc;
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected a '{name}' rpc, got {sent:?}")]
    RpcMissing { name: String, sent: Vec<String> },

    #[error("Unexpected '{name}' rpc in {sent:?}")]
    UnexpectedRpc { name: String, sent: Vec<String> },

    #[error("Expected {expected} {what}, found {actual}")]
    CountMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("No loaded statement contains '{expected}', loaded {loaded:?}")]
    StatementMissing { expected: String, loaded: Vec<String> },

    #[error("Statement '{first}' was not loaded before '{second}'")]
    OrderMismatch { first: String, second: String },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// RPC log verifier
pub struct RpcVerifier {
    captured: Vec<Rpc>,
}

impl RpcVerifier {
    /// Create a new verifier over captured RPCs
    pub fn new(captured: Vec<Rpc>) -> Self {
        Self { captured }
    }

    fn names(&self) -> Vec<String> {
        self.captured.iter().map(|r| r.name().to_string()).collect()
    }

    fn count(&self, name: &str) -> usize {
        self.captured.iter().filter(|r| r.name() == name).count()
    }

    /// Verify that an RPC with this name was sent
    pub fn assert_rpc_sent(&self, name: &str) -> VerifyResult<()> {
        if self.count(name) > 0 {
            Ok(())
        } else {
            Err(VerificationError::RpcMissing {
                name: name.to_string(),
                sent: self.names(),
            })
        }
    }

    /// Verify that no RPC with this name was sent
    pub fn assert_rpc_not_sent(&self, name: &str) -> VerifyResult<()> {
        if self.count(name) == 0 {
            Ok(())
        } else {
            Err(VerificationError::UnexpectedRpc {
                name: name.to_string(),
                sent: self.names(),
            })
        }
    }

    /// Verify how many times an RPC was sent
    pub fn assert_rpc_count(&self, name: &str, expected: usize) -> VerifyResult<()> {
        let actual = self.count(name);
        if actual != expected {
            return Err(VerificationError::CountMismatch {
                what: format!("'{name}' rpcs"),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Verify that a loaded statement contains `expected`
    pub fn assert_statement_loaded(&self, expected: &str) -> VerifyResult<()> {
        let loaded = self.loaded_statements();
        if loaded.iter().any(|line| line.contains(expected)) {
            Ok(())
        } else {
            Err(VerificationError::StatementMissing {
                expected: expected.to_string(),
                loaded,
            })
        }
    }

    /// Verify that nothing was loaded
    pub fn assert_no_statements_loaded(&self) -> VerifyResult<()> {
        let actual = self.loaded_statements().len();
        if actual != 0 {
            return Err(VerificationError::CountMismatch {
                what: "loaded statements".to_string(),
                expected: 0,
                actual,
            });
        }
        Ok(())
    }

    /// Verify that the statement containing `first` was loaded before the
    /// one containing `second`
    pub fn assert_loaded_before(&self, first: &str, second: &str) -> VerifyResult<()> {
        let loaded = self.loaded_statements();
        let a = loaded.iter().position(|line| line.contains(first));
        let b = loaded.iter().position(|line| line.contains(second));
        match (a, b) {
            (Some(a), Some(b)) if a < b => Ok(()),
            _ => Err(VerificationError::OrderMismatch {
                first: first.to_string(),
                second: second.to_string(),
            }),
        }
    }

    /// Every statement line loaded, in order
    pub fn loaded_statements(&self) -> Vec<String> {
        self.captured
            .iter()
            .filter_map(|rpc| match rpc {
                Rpc::LoadSet { lines } => Some(lines.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}
