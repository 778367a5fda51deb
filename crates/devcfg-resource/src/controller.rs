//! Create/read/update/delete sequencing shared by every object type.
//!
//! Each call opens its own session through the [`Connector`], runs one
//! transaction and closes the session again. Every step is fatal on error.
//! On every path out, uncommitted changes are discarded, the lock is
//! released and the session closed.
//!
//! Plans are checked with [`ManagedObject::check_plan`] before a session is
//! opened, so a bad plan never takes the device lock.
//!
//! ```text
//! create: check_plan → lock → exists? (duplicate) → pre_check → submit → commit
//!              → exists? (not found) → post_check → read back
//! update: check_plan → lock → pre_check → submit(retract + set) → commit
//!              → post_check → read back
//! delete: lock → submit(delete root) → commit
//! read:   show configuration <root> | display set relative → parse
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use devcfg_codec::{dump, parse_into, render, SecretDecoder, Statement, Type9Decoder};
use devcfg_session::{exists, Session};

use crate::config::DevcfgConfig;
use crate::connector::Connector;
use crate::error::{ResourceError, ResourceResult};
use crate::object::ManagedObject;

/// Result of one lifecycle call.
///
/// Warnings (commit advisories, downgraded unlock failures) are reported
/// next to the result whether it succeeded or not.
#[derive(Debug)]
pub struct Response<T> {
    /// Outcome of the call.
    pub result: ResourceResult<T>,
    /// Device and session warnings, in the order they occurred.
    pub warnings: Vec<String>,
}

impl<T> Response<T> {
    fn new(result: ResourceResult<T>, warnings: Vec<String>) -> Self {
        Self { result, warnings }
    }

    fn failed(err: ResourceError) -> Self {
        Self::new(Err(err), Vec::new())
    }

    /// Returns true if the call succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Drops the warnings and returns the result.
    pub fn into_result(self) -> ResourceResult<T> {
        self.result
    }
}

/// Runs lifecycle operations against one device.
pub struct Controller<C> {
    connector: C,
    decoder: Arc<dyn SecretDecoder>,
    commit_message: String,
    cancel: CancellationToken,
}

impl<C: Connector> Controller<C> {
    /// Creates a controller decoding `$9$` secrets on read.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            decoder: Arc::new(Type9Decoder::new()),
            commit_message: "commit from devcfg".to_string(),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a controller with the decoder and commit message from
    /// `config`.
    pub fn from_config(connector: C, config: &DevcfgConfig) -> Self {
        Self::new(connector)
            .with_decoder(config.session.decoder())
            .with_commit_message(config.session.commit_message.clone())
    }

    /// Replaces the secret decoder used on read.
    pub fn with_decoder(mut self, decoder: Arc<dyn SecretDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replaces the commit log message.
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Aborts in-flight calls at their next device round trip once `token`
    /// is cancelled. Unlock and close still run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Creates `plan` on the device and returns what the device now holds.
    #[instrument(skip_all, fields(kind = O::KIND, resource = %plan.identity()))]
    pub async fn create<O: ManagedObject>(&self, plan: &O) -> Response<O> {
        if let Err(err) = plan.check_plan() {
            return Response::failed(err);
        }
        let statements = match render(plan, &plan.root_path()) {
            Ok(statements) => statements,
            Err(err) => return Response::failed(err.into()),
        };
        let mut session = match self.open().await {
            Ok(session) => session,
            Err(err) => return Response::failed(err),
        };

        let mut warnings = Vec::new();
        let result = self
            .create_in(&mut session, plan, &statements, &mut warnings)
            .await;
        self.finish(&mut session, &mut warnings).await;
        log_outcome("create", &result);
        Response::new(result, warnings)
    }

    /// Reads the object identified by `id`; `None` if the device has no
    /// configuration under its root.
    #[instrument(skip_all, fields(kind = O::KIND, resource = %id.identity()))]
    pub async fn read<O: ManagedObject>(&self, id: &O) -> Response<Option<O>> {
        let mut session = match self.open().await {
            Ok(session) => session,
            Err(err) => return Response::failed(err),
        };

        let mut warnings = Vec::new();
        let result = self.read_back(&mut session, id).await;
        self.finish(&mut session, &mut warnings).await;
        Response::new(result, warnings)
    }

    /// Reads an existing object; absence is a [`ResourceError::NotFound`].
    pub async fn import<O: ManagedObject>(&self, id: &O) -> Response<O> {
        let Response { result, warnings } = self.read(id).await;
        let result = result.and_then(|found| {
            found.ok_or_else(|| ResourceError::not_found(id.identity()))
        });
        Response::new(result, warnings)
    }

    /// Replaces the device configuration of `plan`'s identity with `plan`.
    #[instrument(skip_all, fields(kind = O::KIND, resource = %plan.identity()))]
    pub async fn update<O: ManagedObject>(&self, plan: &O) -> Response<O> {
        if let Err(err) = plan.check_plan() {
            return Response::failed(err);
        }
        let mut statements = update_retractions(plan);
        match render(plan, &plan.root_path()) {
            Ok(sets) => statements.extend(sets),
            Err(err) => return Response::failed(err.into()),
        }
        let mut session = match self.open().await {
            Ok(session) => session,
            Err(err) => return Response::failed(err),
        };

        let mut warnings = Vec::new();
        let result = self
            .update_in(&mut session, plan, &statements, &mut warnings)
            .await;
        self.finish(&mut session, &mut warnings).await;
        log_outcome("update", &result);
        Response::new(result, warnings)
    }

    /// Removes `state` from the device.
    ///
    /// Shared objects with `clean_on_destroy` off are left in place and no
    /// session is opened.
    #[instrument(skip_all, fields(kind = O::KIND, resource = %state.identity()))]
    pub async fn delete<O: ManagedObject>(&self, state: &O) -> Response<()> {
        if O::CAPABILITIES.shared_state && !state.clean_on_destroy() {
            info!("clean_on_destroy is off, leaving device configuration in place");
            return Response::new(Ok(()), Vec::new());
        }
        let mut session = match self.open().await {
            Ok(session) => session,
            Err(err) => return Response::failed(err),
        };

        let mut warnings = Vec::new();
        let statements = vec![Statement::delete(state.root_path())];
        let result = self.delete_in(&mut session, &statements, &mut warnings).await;
        self.finish(&mut session, &mut warnings).await;
        log_outcome("delete", &result);
        Response::new(result, warnings)
    }

    async fn open(&self) -> ResourceResult<Session> {
        let session = self.connector.connect().await?;
        Ok(session.with_cancellation(self.cancel.clone()))
    }

    /// Rolls back, releases the lock and closes, collecting warnings.
    async fn finish(&self, session: &mut Session, warnings: &mut Vec<String>) {
        warnings.extend(session.release().await);
        if let Err(err) = session.close().await {
            warn!(error = %err, "failed to close session");
            warnings.push(format!("failed to close session: {err}"));
        }
    }

    async fn create_in<O: ManagedObject>(
        &self,
        session: &mut Session,
        plan: &O,
        statements: &[Statement],
        warnings: &mut Vec<String>,
    ) -> ResourceResult<O> {
        session.lock().await?;

        if O::CAPABILITIES.existence_checks {
            let found = exists(session, &plan.root_path())
                .await
                .map_err(|e| ResourceError::pre_check(plan.identity(), e))?;
            if found {
                return Err(ResourceError::duplicate_config(plan.identity()));
            }
        }
        plan.pre_check(session).await?;

        self.apply(session, statements, warnings).await?;

        if O::CAPABILITIES.existence_checks {
            let found = exists(session, &plan.root_path())
                .await
                .map_err(|e| ResourceError::post_check(plan.identity(), e))?;
            if !found {
                return Err(ResourceError::not_found(plan.identity()));
            }
        }
        plan.post_check(session).await?;

        self.read_back(session, plan)
            .await?
            .ok_or_else(|| ResourceError::not_found(plan.identity()))
    }

    async fn update_in<O: ManagedObject>(
        &self,
        session: &mut Session,
        plan: &O,
        statements: &[Statement],
        warnings: &mut Vec<String>,
    ) -> ResourceResult<O> {
        session.lock().await?;
        plan.pre_check(session).await?;
        self.apply(session, statements, warnings).await?;
        plan.post_check(session).await?;

        self.read_back(session, plan)
            .await?
            .ok_or_else(|| ResourceError::not_found(plan.identity()))
    }

    async fn delete_in(
        &self,
        session: &mut Session,
        statements: &[Statement],
        warnings: &mut Vec<String>,
    ) -> ResourceResult<()> {
        session.lock().await?;
        self.apply(session, statements, warnings).await
    }

    /// Submits and commits; commit warnings are kept even if commit fails.
    async fn apply(
        &self,
        session: &mut Session,
        statements: &[Statement],
        warnings: &mut Vec<String>,
    ) -> ResourceResult<()> {
        session.submit(statements).await?;
        let outcome = session.commit(&self.commit_message).await;
        warnings.extend(outcome.warnings);
        outcome.result?;
        Ok(())
    }

    async fn read_back<O: ManagedObject>(
        &self,
        session: &mut Session,
        id: &O,
    ) -> ResourceResult<Option<O>> {
        let output = session.show_config(&id.root_path(), true).await?;
        if dump::is_empty(&output) {
            debug!("no configuration under root");
            return Ok(None);
        }
        let object = parse_into(id.seed(), &output, self.decoder.as_ref())?;
        Ok(Some(object))
    }
}

/// Delete statements emitted ahead of the new configuration on update.
fn update_retractions<O: ManagedObject>(plan: &O) -> Vec<Statement> {
    let root = plan.root_path();
    if !O::CAPABILITIES.retract_on_update {
        return vec![Statement::delete(root)];
    }
    plan.retract_paths()
        .into_iter()
        .map(|path| Statement::delete(root.iter().cloned().chain(path)))
        .collect()
}

fn log_outcome<T>(operation: &str, result: &ResourceResult<T>) {
    match result {
        Ok(_) => info!(operation, "completed"),
        Err(err) => warn!(operation, kind = err.kind(), error = %err, "failed"),
    }
}
