//! In-memory device answering session RPCs.
//!
//! A [`SimulatedDevice`] keeps a committed configuration, one candidate and
//! a single configuration lock shared by every transport connected to it.
//! Each [`SimulatedTransport`] is one device-side session, so two sessions
//! on the same device contend for the lock like they would on hardware.
//!
//! Unlocking leaves uncommitted candidate changes in place and no session
//! can lock a modified candidate until it is committed or discarded.
//! Closing the session that holds the lock drops its changes.
//!
//! Configuration is stored as word lists. A `set` replaces an existing line
//! that differs only in its last word (a single-valued leaf) unless the
//! keyword before the value was registered with
//! [`SimulatedDevice::with_leaf_list`]. A `delete` removes every line under
//! the path.
//!
//! Failures and warnings are scripted up front:
//!
//! ```ignore
//! let device = SimulatedDevice::new()
//!     .with_config(&["set applications application web protocol tcp"])
//!     .reject("bogus", "syntax error");
//! device.commit_warning("statement has no effect");
//!
//! let mut session = device.session();
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use devcfg_codec::secret::TYPE9_PREFIX;
use devcfg_codec::{dump, join_words, tokenize, Type9Decoder, Verb};
use devcfg_session::{
    DeviceTransport, Rpc, RpcMessage, RpcReply, Session, SessionMode, SessionResult,
};

use crate::verification::RpcVerifier;

type Line = Vec<String>;

#[derive(Debug, Default)]
struct DeviceState {
    next_session: u64,
    lock_owner: Option<u64>,
    committed: Vec<Line>,
    candidate: Vec<Line>,
    modified: bool,
    leaf_lists: Vec<String>,
    secret_keywords: Vec<String>,
    secret_seed: usize,
    rejections: Vec<(String, String)>,
    commit_warnings: Vec<String>,
    commit_failure: Option<String>,
    unlock_failure: Option<String>,
    command_failure: Option<String>,
    commands: HashMap<String, String>,
    log: Vec<(u64, Rpc)>,
    commits: usize,
}

/// A simulated device shared by every session connected to it.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    inner: Arc<Mutex<DeviceState>>,
}

impl SimulatedDevice {
    /// Creates a device with an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds committed configuration. Lines may carry the `set ` prefix.
    pub fn with_config<S: AsRef<str>>(self, lines: &[S]) -> Self {
        {
            let mut state = self.state();
            for line in lines {
                let mut words = tokenize(line.as_ref());
                if words.first().map(String::as_str) == Some(Verb::Set.as_str()) {
                    words.remove(0);
                }
                if words.is_empty() {
                    continue;
                }
                let leaf_lists = state.leaf_lists.clone();
                apply(&mut state.committed, Verb::Set, words, &leaf_lists);
            }
        }
        self
    }

    /// Treats `keyword` as a leaf list: repeated `set`s accumulate values.
    pub fn with_leaf_list(self, keyword: &str) -> Self {
        self.state().leaf_lists.push(keyword.to_string());
        self
    }

    /// Stores values set under `keyword` in `$9$` form, like the device
    /// does for secrets.
    pub fn obfuscate_secrets(self, keyword: &str) -> Self {
        self.state().secret_keywords.push(keyword.to_string());
        self
    }

    /// Rejects any loaded statement containing the word `keyword`.
    pub fn reject(self, keyword: &str, message: &str) -> Self {
        self.state()
            .rejections
            .push((keyword.to_string(), message.to_string()));
        self
    }

    /// Answers `command` with `output`.
    pub fn with_command_output(self, command: &str, output: &str) -> Self {
        self.state()
            .commands
            .insert(command.to_string(), output.to_string());
        self
    }

    /// Adds a warning to the next commit.
    pub fn commit_warning(&self, message: &str) {
        self.state().commit_warnings.push(message.to_string());
    }

    /// Makes the next commit fail with `message`.
    pub fn fail_next_commit(&self, message: &str) {
        self.state().commit_failure = Some(message.to_string());
    }

    /// Makes every unlock fail with `message`. The lock stays held until
    /// the session closes.
    pub fn fail_unlock(&self, message: &str) {
        self.state().unlock_failure = Some(message.to_string());
    }

    /// Makes every operational command fail with `message`.
    pub fn fail_commands(&self, message: &str) {
        self.state().command_failure = Some(message.to_string());
    }

    /// Opens a transactional device-side session.
    pub fn connect(&self) -> SimulatedTransport {
        self.connect_with_mode(SessionMode::Transactional)
    }

    /// Opens a device-side session in `mode`.
    pub fn connect_with_mode(&self, mode: SessionMode) -> SimulatedTransport {
        let mut state = self.state();
        state.next_session += 1;
        SimulatedTransport {
            device: self.clone(),
            session: state.next_session,
            target: format!("simulated-{}", state.next_session),
            mode,
        }
    }

    /// Opens a transactional [`Session`].
    pub fn session(&self) -> Session {
        Session::new(Box::new(self.connect()))
    }

    /// Opens a [`Session`] in [`SessionMode::Direct`].
    pub fn direct_session(&self) -> Session {
        Session::new(Box::new(self.connect_with_mode(SessionMode::Direct)))
    }

    /// Number of sessions opened so far.
    pub fn sessions_opened(&self) -> u64 {
        self.state().next_session
    }

    /// Returns true while any session holds the lock.
    pub fn is_locked(&self) -> bool {
        self.state().lock_owner.is_some()
    }

    /// Returns true while the candidate holds changes that were neither
    /// committed nor discarded.
    pub fn has_uncommitted_changes(&self) -> bool {
        self.state().modified
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.state().commits
    }

    /// Committed configuration as `set` lines.
    pub fn committed_lines(&self) -> Vec<String> {
        self.state()
            .committed
            .iter()
            .map(|line| format!("set {}", join_words(line)))
            .collect()
    }

    /// Returns true if committed configuration exists under `path`.
    pub fn has_config(&self, path: &[&str]) -> bool {
        let path: Line = path.iter().map(|w| w.to_string()).collect();
        self.state()
            .committed
            .iter()
            .any(|line| line.starts_with(&path))
    }

    /// Every RPC received, in order, across all sessions.
    pub fn rpc_log(&self) -> Vec<Rpc> {
        self.state().log.iter().map(|(_, rpc)| rpc.clone()).collect()
    }

    /// A verifier over the RPC log.
    pub fn verifier(&self) -> RpcVerifier {
        RpcVerifier::new(self.rpc_log())
    }
}

fn apply(target: &mut Vec<Line>, verb: Verb, words: Line, leaf_lists: &[String]) {
    match verb {
        Verb::Set => {
            if target.contains(&words) {
                return;
            }
            let keyword = words.len().checked_sub(2).map(|i| &words[i]);
            let is_list = keyword.is_some_and(|k| leaf_lists.contains(k));
            if !is_list {
                let stem = &words[..words.len() - 1];
                if let Some(existing) = target
                    .iter_mut()
                    .find(|line| line.len() == words.len() && line[..line.len() - 1] == *stem)
                {
                    *existing = words;
                    return;
                }
            }
            target.push(words);
        }
        Verb::Delete => target.retain(|line| !line.starts_with(&words)),
    }
}

impl DeviceState {
    fn lock(&mut self, session: u64) -> RpcReply {
        match self.lock_owner {
            Some(owner) if owner == session => RpcReply::error(RpcMessage::new(
                "configuration database already locked by this session",
            )),
            Some(owner) => RpcReply::error(RpcMessage::new(format!(
                "configuration database locked by session {owner}"
            ))),
            None if self.modified => RpcReply::error(RpcMessage::new(
                "configuration database modified",
            )),
            None => {
                self.lock_owner = Some(session);
                self.candidate = self.committed.clone();
                RpcReply::ok()
            }
        }
    }

    fn reset_candidate(&mut self) {
        self.candidate = self.committed.clone();
        self.modified = false;
    }

    fn unlock(&mut self, session: u64) -> RpcReply {
        if let Some(message) = &self.unlock_failure {
            return RpcReply::error(RpcMessage::new(message.clone()));
        }
        if self.lock_owner != Some(session) {
            return RpcReply::error(RpcMessage::new(
                "configuration database not locked by this session",
            ));
        }
        self.lock_owner = None;
        RpcReply::ok()
    }

    fn discard(&mut self, session: u64) -> RpcReply {
        if self.lock_owner != Some(session) {
            return RpcReply::error(RpcMessage::new(
                "configuration database not locked by this session",
            ));
        }
        self.reset_candidate();
        RpcReply::ok()
    }

    fn close(&mut self, session: u64) {
        if self.lock_owner == Some(session) {
            self.lock_owner = None;
            self.reset_candidate();
        }
    }

    fn load(&mut self, session: u64, lines: &[String], direct: bool) -> RpcReply {
        if !direct && self.lock_owner != Some(session) {
            return RpcReply::error(RpcMessage::new(
                "configuration database not locked by this session",
            ));
        }

        let mut parsed = Vec::with_capacity(lines.len());
        for line in lines {
            let words = tokenize(line);
            let verb = match words.first().map(String::as_str) {
                Some("set") => Verb::Set,
                Some("delete") => Verb::Delete,
                _ => return RpcReply::error(RpcMessage::new("syntax error").at(line.clone())),
            };
            let path = words[1..].to_vec();
            if path.is_empty() {
                return RpcReply::error(RpcMessage::new("syntax error").at(line.clone()));
            }
            if let Some((index, message)) = self.rejections.iter().find_map(|(keyword, message)| {
                path.iter()
                    .position(|word| word == keyword)
                    .map(|index| (index, message))
            }) {
                let error = RpcMessage::new(message.clone())
                    .at(format!("[edit {}]", join_words(&path[..index])))
                    .with_element(path[index].clone());
                return RpcReply::error(error);
            }
            parsed.push((verb, path));
        }

        let target = if direct {
            &mut self.committed
        } else {
            &mut self.candidate
        };
        for (verb, mut path) in parsed {
            if verb == Verb::Set {
                let n = path.len();
                let is_secret = n >= 2 && self.secret_keywords.contains(&path[n - 2]);
                if is_secret && !path[n - 1].starts_with(TYPE9_PREFIX) {
                    path[n - 1] = Type9Decoder::new().encode_with_seed(&path[n - 1], self.secret_seed);
                    self.secret_seed += 7;
                }
            }
            apply(target, verb, path, &self.leaf_lists);
        }
        if direct {
            self.commits += 1;
        } else {
            self.modified = true;
        }
        RpcReply::ok()
    }

    fn commit(&mut self, session: u64) -> RpcReply {
        if self.lock_owner != Some(session) {
            return RpcReply::error(RpcMessage::new("configuration database not locked"));
        }
        let warnings = std::mem::take(&mut self.commit_warnings)
            .into_iter()
            .map(RpcMessage::new)
            .collect();
        if let Some(message) = self.commit_failure.take() {
            return RpcReply {
                output: String::new(),
                errors: vec![RpcMessage::new(message)],
                warnings,
            };
        }
        self.committed = self.candidate.clone();
        self.modified = false;
        self.commits += 1;
        RpcReply {
            warnings,
            ..RpcReply::ok()
        }
    }

    fn command(&self, command: &str) -> RpcReply {
        if let Some(message) = &self.command_failure {
            return RpcReply::error(RpcMessage::new(message.clone()));
        }
        if let Some(output) = self.commands.get(command) {
            return RpcReply::with_output(output.clone());
        }
        match command.strip_prefix("show configuration") {
            Some(rest) => self.show_configuration(rest),
            None => RpcReply::error(RpcMessage::new("syntax error").at(command.to_string())),
        }
    }

    fn show_configuration(&self, rest: &str) -> RpcReply {
        let (path_text, display) = rest.split_once('|').unwrap_or((rest, ""));
        let relative = match display.trim() {
            "display set" => false,
            "display set relative" => true,
            other => {
                return RpcReply::error(RpcMessage::new("unsupported display").at(other.to_string()))
            }
        };
        let path = tokenize(path_text.trim());
        let lines: Vec<String> = self
            .committed
            .iter()
            .filter(|line| line.starts_with(&path))
            .map(|line| {
                let words = if relative { &line[path.len()..] } else { &line[..] };
                format!("set {}", join_words(words))
            })
            .collect();
        RpcReply::with_output(dump::wrap(&lines))
    }
}

/// One device-side session on a [`SimulatedDevice`].
#[derive(Debug)]
pub struct SimulatedTransport {
    device: SimulatedDevice,
    session: u64,
    target: String,
    mode: SessionMode,
}

#[async_trait]
impl DeviceTransport for SimulatedTransport {
    fn target(&self) -> &str {
        &self.target
    }

    fn mode(&self) -> SessionMode {
        self.mode
    }

    async fn call(&mut self, rpc: &Rpc) -> SessionResult<RpcReply> {
        let direct = self.mode == SessionMode::Direct;
        let mut state = self.device.state();
        state.log.push((self.session, rpc.clone()));
        debug!(session = self.session, rpc = rpc.name(), "simulated rpc");

        let reply = match rpc {
            Rpc::Lock => state.lock(self.session),
            Rpc::Unlock => state.unlock(self.session),
            Rpc::LoadSet { lines } => state.load(self.session, lines, direct),
            Rpc::Commit { .. } => state.commit(self.session),
            Rpc::Discard => state.discard(self.session),
            Rpc::Command { command } => state.command(command),
            Rpc::Close => {
                state.close(self.session);
                RpcReply::ok()
            }
        };
        Ok(reply)
    }
}
