//! Configuration session state machine.
//!
//! A session owns one device connection and the transaction running on it:
//!
//! ```text
//! Closed <- Opened -> Locked <-> Unlocked -> Closed
//! ```
//!
//! A transaction that loaded anything but did not commit is rolled back
//! with a discard before the lock is released.
//!
//! In [`SessionMode::Direct`] the lock, unlock, discard and commit steps
//! still move the state machine but send nothing to the device.

use std::fmt;

use devcfg_codec::{tokenize, Statement};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{SessionError, SessionResult};
use crate::probe::show_config_command;
use crate::transport::{DeviceTransport, Rpc, RpcMessage, RpcReply, SessionMode};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection released.
    Closed,
    /// Connected, never locked.
    Opened,
    /// Holding the configuration lock.
    Locked,
    /// Connected, lock released.
    Unlocked,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Closed => "closed",
            SessionState::Opened => "opened",
            SessionState::Locked => "locked",
            SessionState::Unlocked => "unlocked",
        };
        f.write_str(name)
    }
}

/// Statements submitted since the lock was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    statements: Vec<Statement>,
    warnings: Vec<String>,
    loaded: bool,
    committed: bool,
}

impl Transaction {
    /// Statements accepted by the device, in submission order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns true once a commit succeeded.
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

/// Outcome of [`Session::commit`].
///
/// Warnings are reported whether or not the commit succeeded.
#[derive(Debug)]
pub struct CommitOutcome {
    /// Device warnings from loading and committing.
    pub warnings: Vec<String>,
    /// Commit result.
    pub result: SessionResult<()>,
}

/// A configuration session on one device.
pub struct Session {
    transport: Box<dyn DeviceTransport>,
    mode: SessionMode,
    state: SessionState,
    transaction: Transaction,
    cancel: CancellationToken,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.transport.target())
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("transaction", &self.transaction)
            .finish()
    }
}

impl Session {
    /// Wraps a connected transport. The session starts [`SessionState::Opened`]
    /// in the transport's mode.
    pub fn new(transport: Box<dyn DeviceTransport>) -> Self {
        let mode = transport.mode();
        info!(device = %transport.target(), %mode, "session opened");
        Self {
            transport,
            mode,
            state: SessionState::Opened,
            transaction: Transaction::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Aborts lock, submit, commit and commands once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Device address.
    pub fn target(&self) -> &str {
        self.transport.target()
    }

    /// Mode of the underlying transport.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The current or last transaction.
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    async fn call(&mut self, operation: &'static str, rpc: Rpc) -> SessionResult<RpcReply> {
        if self.cancel.is_cancelled() {
            return Err(SessionError::Cancelled { operation });
        }
        if matches!(rpc, Rpc::LoadSet { .. }) {
            self.transaction.loaded = true;
        }
        debug!(device = %self.transport.target(), rpc = rpc.name(), "sending rpc");
        let cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SessionError::Cancelled { operation }),
            reply = self.transport.call(&rpc) => reply,
        }
    }

    fn ensure_open(&self, operation: &'static str) -> SessionResult<()> {
        if self.state == SessionState::Closed {
            return Err(SessionError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn ensure_locked(&self, operation: &'static str) -> SessionResult<()> {
        let allowed = match self.mode {
            SessionMode::Transactional => self.state == SessionState::Locked,
            SessionMode::Direct => self.state != SessionState::Closed,
        };
        if !allowed {
            return Err(SessionError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Takes the exclusive configuration lock and starts a new transaction.
    #[instrument(skip(self), fields(device = %self.target()))]
    pub async fn lock(&mut self) -> SessionResult<()> {
        match self.state {
            SessionState::Locked => {
                return Err(SessionError::config_lock(
                    "configuration lock already held by this session",
                ))
            }
            SessionState::Closed => {
                return Err(SessionError::InvalidState {
                    operation: "lock",
                    state: self.state,
                })
            }
            SessionState::Opened | SessionState::Unlocked => {}
        }

        if self.mode.is_transactional() {
            let reply = self.call("lock", Rpc::Lock).await?;
            if !reply.is_ok() {
                return Err(SessionError::config_lock(reply.error_text()));
            }
        }

        self.state = SessionState::Locked;
        self.transaction = Transaction::default();
        debug!("configuration locked");
        Ok(())
    }

    /// Loads `statements` into the transaction, in order.
    ///
    /// The whole batch is rejected on the first statement the device refuses.
    #[instrument(skip(self, statements), fields(device = %self.target(), count = statements.len()))]
    pub async fn submit(&mut self, statements: &[Statement]) -> SessionResult<()> {
        self.ensure_locked("submit")?;
        if statements.is_empty() {
            return Ok(());
        }

        let lines = statements.iter().map(ToString::to_string).collect();
        let reply = self.call("submit", Rpc::LoadSet { lines }).await?;
        if let Some(error) = reply.errors.first() {
            let statement = locate(statements, error);
            warn!(
                statement = statement.as_deref().unwrap_or("-"),
                message = %error.message,
                "device rejected statement"
            );
            let path = match (&error.path, &error.element) {
                (Some(path), Some(element)) => Some(format!("{path} {element}")),
                (path, element) => path.clone().or_else(|| element.clone()),
            };
            return Err(SessionError::ConfigSet {
                statement,
                path,
                message: error.message.clone(),
            });
        }

        self.transaction.warnings.extend(reply.warning_texts());
        self.transaction.statements.extend_from_slice(statements);
        Ok(())
    }

    /// Commits the transaction with `message` as the commit log.
    #[instrument(skip(self), fields(device = %self.target()))]
    pub async fn commit(&mut self, message: &str) -> CommitOutcome {
        let mut warnings = std::mem::take(&mut self.transaction.warnings);

        if let Err(err) = self.ensure_locked("commit") {
            return CommitOutcome {
                warnings,
                result: Err(err),
            };
        }

        if !self.mode.is_transactional() {
            self.transaction.committed = true;
            return CommitOutcome {
                warnings,
                result: Ok(()),
            };
        }

        let rpc = Rpc::Commit {
            log: message.to_string(),
        };
        let result = match self.call("commit", rpc).await {
            Ok(reply) => {
                warnings.extend(reply.warning_texts());
                if reply.is_ok() {
                    self.transaction.committed = true;
                    info!(
                        statements = self.transaction.statements.len(),
                        warnings = warnings.len(),
                        "configuration committed"
                    );
                    Ok(())
                } else {
                    Err(SessionError::config_commit(reply.error_text()))
                }
            }
            Err(err) => Err(err),
        };

        CommitOutcome { warnings, result }
    }

    /// Releases the configuration lock.
    ///
    /// Runs even if the session was cancelled.
    #[instrument(skip(self), fields(device = %self.target()))]
    pub async fn unlock(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Locked {
            return Err(SessionError::InvalidState {
                operation: "unlock",
                state: self.state,
            });
        }
        self.state = SessionState::Unlocked;
        if !self.mode.is_transactional() {
            return Ok(());
        }

        debug!(rpc = "unlock", "sending rpc");
        let reply = self.transport.call(&Rpc::Unlock).await?;
        if !reply.is_ok() {
            return Err(SessionError::config_unlock(reply.error_text()));
        }
        debug!("configuration unlocked");
        Ok(())
    }

    /// Drops uncommitted changes from the candidate configuration.
    ///
    /// Runs even if the session was cancelled.
    #[instrument(skip(self), fields(device = %self.target()))]
    pub async fn discard(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Locked {
            return Err(SessionError::InvalidState {
                operation: "discard",
                state: self.state,
            });
        }
        if !self.mode.is_transactional() {
            return Ok(());
        }

        debug!(rpc = "discard", "sending rpc");
        let reply = self.transport.call(&Rpc::Discard).await?;
        if !reply.is_ok() {
            return Err(SessionError::config_discard(reply.error_text()));
        }
        self.transaction.loaded = false;
        info!(
            statements = self.transaction.statements.len(),
            "uncommitted changes discarded"
        );
        Ok(())
    }

    /// Ends the transaction if the lock is held: uncommitted changes are
    /// discarded, then the lock is released.
    ///
    /// Failures of either step come back as warnings.
    pub async fn release(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.state != SessionState::Locked {
            return warnings;
        }
        if self.transaction.loaded && !self.transaction.committed {
            if let Err(err) = self.discard().await {
                warn!(device = %self.target(), error = %err, "discard failed");
                warnings.push(err.to_string());
            }
        }
        if let Err(err) = self.unlock().await {
            warn!(device = %self.target(), error = %err, "unlock failed");
            warnings.push(err.to_string());
        }
        warnings
    }

    /// Runs a read-only operational command and returns its output.
    #[instrument(skip(self), fields(device = %self.target()))]
    pub async fn command(&mut self, command: &str) -> SessionResult<String> {
        self.ensure_open("run command")?;
        let rpc = Rpc::Command {
            command: command.to_string(),
        };
        let reply = self.call("command", rpc).await?;
        if !reply.is_ok() {
            return Err(SessionError::command(command, reply.error_text()));
        }
        Ok(reply.output)
    }

    /// Returns the configuration dump under `path`.
    ///
    /// With `relative`, lines omit the `path` prefix.
    pub async fn show_config<S: AsRef<str>>(
        &mut self,
        path: &[S],
        relative: bool,
    ) -> SessionResult<String> {
        self.command(&show_config_command(path, relative)).await
    }

    /// Ends the session. Closing twice is a no-op.
    #[instrument(skip(self), fields(device = %self.target()))]
    pub async fn close(&mut self) -> SessionResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;

        let reply = self.transport.call(&Rpc::Close).await?;
        if !reply.is_ok() {
            warn!(error = %reply.error_text(), "device reported an error on close");
        }
        info!("session closed");
        Ok(())
    }
}

/// Finds the statement a device error points at.
///
/// A path naming a whole statement wins. Otherwise the rejected word is
/// looked up below the reported `[edit ...]` hierarchy first, then in any
/// statement.
fn locate(statements: &[Statement], error: &RpcMessage) -> Option<String> {
    if let [only] = statements {
        return Some(only.to_string());
    }
    if let Some(path) = error.path.as_deref() {
        let path = path.trim();
        if let Some(exact) = statements
            .iter()
            .find(|s| s.to_string() == path || s.path_text() == path)
        {
            return Some(exact.to_string());
        }
    }

    let scope = error
        .path
        .as_deref()
        .and_then(edit_hierarchy)
        .unwrap_or_default();
    let in_scope: Vec<&Statement> = statements
        .iter()
        .filter(|s| !scope.is_empty() && s.words().starts_with(&scope))
        .collect();

    let found = match error.element.as_deref() {
        Some(element) => in_scope
            .iter()
            .copied()
            .find(|s| s.words()[scope.len()..].iter().any(|w| w == element))
            .or_else(|| {
                statements
                    .iter()
                    .find(|s| s.words().iter().any(|w| w == element))
            }),
        None => match in_scope.as_slice() {
            [only] => Some(*only),
            _ => None,
        },
    };
    found.map(ToString::to_string)
}

/// Words of an `[edit a b c]` error path.
fn edit_hierarchy(path: &str) -> Option<Vec<String>> {
    let inner = path.trim().strip_prefix('[')?.strip_suffix(']')?;
    let words = tokenize(inner);
    match words.split_first() {
        Some((first, rest)) if first == "edit" => Some(rest.to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Answers each RPC with the next scripted reply, or success. An RPC
    /// named `stall` never gets an answer.
    struct Scripted {
        mode: SessionMode,
        log: Arc<Mutex<Vec<Rpc>>>,
        replies: VecDeque<RpcReply>,
        stall: Option<&'static str>,
    }

    #[async_trait]
    impl DeviceTransport for Scripted {
        fn target(&self) -> &str {
            "scripted"
        }

        fn mode(&self) -> SessionMode {
            self.mode
        }

        async fn call(&mut self, rpc: &Rpc) -> SessionResult<RpcReply> {
            self.log.lock().unwrap().push(rpc.clone());
            if self.stall == Some(rpc.name()) {
                std::future::pending::<()>().await;
            }
            Ok(self.replies.pop_front().unwrap_or_default())
        }
    }

    fn session(mode: SessionMode, replies: Vec<RpcReply>) -> (Session, Arc<Mutex<Vec<Rpc>>>) {
        scripted(mode, replies, None)
    }

    fn scripted(
        mode: SessionMode,
        replies: Vec<RpcReply>,
        stall: Option<&'static str>,
    ) -> (Session, Arc<Mutex<Vec<Rpc>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport = Scripted {
            mode,
            log: Arc::clone(&log),
            replies: replies.into(),
            stall,
        };
        (Session::new(Box::new(transport)), log)
    }

    fn names(log: &Arc<Mutex<Vec<Rpc>>>) -> Vec<&'static str> {
        log.lock().unwrap().iter().map(Rpc::name).collect()
    }

    fn statements() -> Vec<Statement> {
        vec![
            Statement::set(["applications", "application", "web", "protocol", "tcp"]),
            Statement::set(["applications", "application", "web", "destination-port", "80"]),
        ]
    }

    #[tokio::test]
    async fn test_transactional_flow() {
        let (mut session, log) = session(SessionMode::Transactional, vec![]);
        assert_eq!(session.state(), SessionState::Opened);

        session.lock().await.unwrap();
        session.submit(&statements()).await.unwrap();
        let outcome = session.commit("devcfg").await;
        assert!(outcome.result.is_ok());
        assert!(outcome.warnings.is_empty());
        assert!(session.release().await.is_empty());
        session.close().await.unwrap();

        assert_eq!(names(&log), vec!["lock", "load-set", "commit", "unlock", "close"]);
        assert!(session.transaction().is_committed());
        assert_eq!(session.transaction().statements().len(), 2);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_double_lock_fails() {
        let (mut session, log) = session(SessionMode::Transactional, vec![]);
        session.lock().await.unwrap();
        let err = session.lock().await.unwrap_err();
        assert!(matches!(err, SessionError::ConfigLock { .. }));
        assert_eq!(names(&log), vec!["lock"]);
    }

    #[tokio::test]
    async fn test_lock_refused_by_device() {
        let refused = RpcReply::error(RpcMessage::new("configuration database locked by admin"));
        let (mut session, _log) = session(SessionMode::Transactional, vec![refused]);
        let err = session.lock().await.unwrap_err();
        assert!(err.to_string().contains("locked by admin"));
        assert_eq!(session.state(), SessionState::Opened);
        assert!(session.release().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_requires_lock() {
        let (mut session, log) = session(SessionMode::Transactional, vec![]);
        let err = session.submit(&statements()).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { operation: "submit", .. }));
        assert!(names(&log).is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejection_names_statement() {
        let rejected =
            RpcReply::error(RpcMessage::new("syntax error").with_element("destination-port"));
        let (mut session, _log) = session(SessionMode::Transactional, vec![RpcReply::ok(), rejected]);
        session.lock().await.unwrap();

        let err = session.submit(&statements()).await.unwrap_err();
        match err {
            SessionError::ConfigSet {
                statement, path, ..
            } => {
                assert_eq!(
                    statement.as_deref(),
                    Some("set applications application web destination-port 80")
                );
                assert_eq!(path.as_deref(), Some("destination-port"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(session.transaction().statements().is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_warnings() {
        let load = RpcReply {
            warnings: vec![RpcMessage::new("statement not found")],
            ..RpcReply::ok()
        };
        let commit = RpcReply {
            output: String::new(),
            errors: vec![RpcMessage::new("commit check failed")],
            warnings: vec![RpcMessage::new("deprecated statement")],
        };
        let (mut session, _log) =
            session(SessionMode::Transactional, vec![RpcReply::ok(), load, commit]);
        session.lock().await.unwrap();
        session.submit(&statements()).await.unwrap();

        let outcome = session.commit("devcfg").await;
        assert!(matches!(outcome.result, Err(SessionError::ConfigCommit { .. })));
        assert_eq!(
            outcome.warnings,
            vec!["statement not found", "deprecated statement"]
        );
        assert!(!session.transaction().is_committed());
    }

    #[tokio::test]
    async fn test_unlock_failure_becomes_warning() {
        let unlock = RpcReply::error(RpcMessage::new("lock not held"));
        let (mut session, log) =
            session(SessionMode::Transactional, vec![RpcReply::ok(), unlock]);
        session.lock().await.unwrap();

        let warnings = session.release().await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("lock not held"));
        assert_eq!(session.state(), SessionState::Unlocked);
        assert!(session.release().await.is_empty());
        assert_eq!(names(&log), vec!["lock", "unlock"]);
    }

    #[tokio::test]
    async fn test_direct_mode_skips_lock_and_commit() {
        let (mut session, log) = session(SessionMode::Direct, vec![]);
        assert_eq!(session.mode(), SessionMode::Direct);

        session.lock().await.unwrap();
        session.submit(&statements()).await.unwrap();
        assert!(session.commit("devcfg").await.result.is_ok());
        assert!(session.release().await.is_empty());

        assert_eq!(names(&log), vec!["load-set"]);
    }

    #[tokio::test]
    async fn test_cancellation_still_unlocks() {
        let token = CancellationToken::new();
        let (session, log) = session(SessionMode::Transactional, vec![]);
        let mut session = session.with_cancellation(token.clone());
        session.lock().await.unwrap();

        token.cancel();
        let err = session.submit(&statements()).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(session.release().await.is_empty());
        session.close().await.unwrap();

        assert_eq!(names(&log), vec!["lock", "unlock", "close"]);
    }

    #[tokio::test]
    async fn test_cancel_during_load_rolls_back() {
        let token = CancellationToken::new();
        let (session, log) = scripted(SessionMode::Transactional, vec![], Some("load-set"));
        let mut session = session.with_cancellation(token.clone());
        session.lock().await.unwrap();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            canceller.cancel();
        });
        let err = session.submit(&statements()).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(session.release().await.is_empty());

        assert_eq!(names(&log), vec!["lock", "load-set", "discard", "unlock"]);
    }

    #[tokio::test]
    async fn test_commit_failure_discards_before_unlock() {
        let commit = RpcReply::error(RpcMessage::new("commit check failed"));
        let (mut session, log) = session(
            SessionMode::Transactional,
            vec![RpcReply::ok(), RpcReply::ok(), commit],
        );
        session.lock().await.unwrap();
        session.submit(&statements()).await.unwrap();
        assert!(session.commit("devcfg").await.result.is_err());

        assert!(session.release().await.is_empty());
        session.close().await.unwrap();
        assert_eq!(
            names(&log),
            vec!["lock", "load-set", "commit", "discard", "unlock", "close"]
        );
    }

    #[tokio::test]
    async fn test_rejected_load_discards_partial_changes() {
        let rejected = RpcReply::error(RpcMessage::new("syntax error").with_element("80"));
        let (mut session, log) =
            session(SessionMode::Transactional, vec![RpcReply::ok(), rejected]);
        session.lock().await.unwrap();
        assert!(session.submit(&statements()).await.is_err());

        assert!(session.release().await.is_empty());
        assert_eq!(names(&log), vec!["lock", "load-set", "discard", "unlock"]);
    }

    #[tokio::test]
    async fn test_discard_failure_still_unlocks() {
        let commit = RpcReply::error(RpcMessage::new("commit check failed"));
        let discard = RpcReply::error(RpcMessage::new("candidate busy"));
        let (mut session, log) = session(
            SessionMode::Transactional,
            vec![RpcReply::ok(), RpcReply::ok(), commit, discard],
        );
        session.lock().await.unwrap();
        session.submit(&statements()).await.unwrap();
        let _ = session.commit("devcfg").await;

        let warnings = session.release().await;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("candidate busy"));
        assert_eq!(session.state(), SessionState::Unlocked);
        assert_eq!(
            names(&log),
            vec!["lock", "load-set", "commit", "discard", "unlock"]
        );
    }

    #[tokio::test]
    async fn test_lock_without_load_skips_discard() {
        let (mut session, log) = session(SessionMode::Transactional, vec![]);
        session.lock().await.unwrap();
        assert!(session.release().await.is_empty());
        assert_eq!(names(&log), vec!["lock", "unlock"]);
    }

    #[test]
    fn test_locate_prefers_reported_hierarchy() {
        let statements = vec![
            Statement::set(["applications", "application", "web", "destination-port", "80"]),
            Statement::set(["applications", "application", "api", "destination-port", "80"]),
        ];

        let error = RpcMessage::new("invalid port")
            .at("[edit applications application api]")
            .with_element("destination-port");
        assert_eq!(
            locate(&statements, &error).as_deref(),
            Some("set applications application api destination-port 80")
        );

        let error = RpcMessage::new("syntax error")
            .at("set applications application api destination-port 80");
        assert_eq!(
            locate(&statements, &error).as_deref(),
            Some("set applications application api destination-port 80")
        );

        let error = RpcMessage::new("syntax error").with_element("destination-port");
        assert_eq!(
            locate(&statements, &error).as_deref(),
            Some("set applications application web destination-port 80")
        );

        let error = RpcMessage::new("syntax error").at("[edit system]");
        assert_eq!(locate(&statements, &error), None);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut session, log) = session(SessionMode::Transactional, vec![]);
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(names(&log), vec!["close"]);

        let err = session.command("show version").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_show_config_command() {
        let (mut session, log) = session(
            SessionMode::Transactional,
            vec![RpcReply::with_output("set protocol tcp\n")],
        );
        let out = session
            .show_config(&["applications", "application", "web"], true)
            .await
            .unwrap();
        assert_eq!(out, "set protocol tcp\n");
        assert_eq!(
            log.lock().unwrap()[0],
            Rpc::Command {
                command: "show configuration applications application web | display set relative"
                    .to_string()
            }
        );
    }
}
