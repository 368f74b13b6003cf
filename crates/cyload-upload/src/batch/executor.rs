//! Batched upload executor
//!
//! Walks the execution plan of a parsed script against one session. Schema
//! statements run on their own; consecutive data statements run in
//! transactions of at most `batch_size` statements. The first failure stops
//! the run, rolls back the open transaction and reports what had been
//! committed before it.

use cyload_core::{Driver, NotificationSink, Params, QueryCounters, Session};
use cyload_settings::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::{UploadError, UploadResult};
use crate::plan::{ExecutionUnit, Statement, plan_units};
use crate::state::{ExecutionStateStore, ExecutionStatus, StatePatch};
use crate::summary::{
    FAILURE_TITLE, SUCCESS_TITLE, commit_failure_report, statement_failure_report,
    success_message, success_notification,
};

/// Configuration options for upload execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorOptions {
    /// Maximum number of data statements per transaction
    pub batch_size: usize,
    /// Target database, or the server default when `None`
    pub database: Option<String>,
}

impl ExecutorOptions {
    /// Create new executor options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size (clamped to at least 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the target database
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            database: None,
        }
    }
}

/// Outcome of a run that completed every statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Number of statements executed
    pub total_statements: usize,
    /// Number of execution units (transactions and schema statements)
    pub units: usize,
    /// Counters aggregated over the whole run
    pub counters: QueryCounters,
    /// Message stored as the state's result message
    pub message: String,
}

/// Error message for a run that stopped before finishing
pub const INTERRUPTED_MESSAGE: &str = "Upload interrupted before completion";

/// Work committed so far in the current run
#[derive(Debug, Default)]
struct RunProgress {
    executed: usize,
    units: usize,
    counters: QueryCounters,
}

/// Executor for uploaded Cypher scripts
#[derive(Debug, Clone, Default)]
pub struct UploadExecutor {
    options: ExecutorOptions,
}

impl UploadExecutor {
    /// Create an executor with the given options
    pub fn new(options: ExecutorOptions) -> Self {
        Self { options }
    }

    /// Get the current options
    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Change the batch size used by subsequent runs
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.options.batch_size = batch_size.max(1);
    }

    /// Open a session from `driver` and execute `statements` on it
    ///
    /// The caller must ensure no other run is writing to `store`.
    #[tracing::instrument(
        skip(self, driver, statements, store, notifier),
        fields(driver = driver.driver_name(), statements = statements.len(), batch_size = self.options.batch_size)
    )]
    pub async fn execute(
        &self,
        driver: &dyn Driver,
        statements: &[Statement],
        store: &ExecutionStateStore,
        notifier: &dyn NotificationSink,
    ) -> UploadResult<RunReport> {
        if statements.is_empty() {
            let err = UploadError::NoStatements;
            report_preflight_failure(store, notifier, &err);
            return Err(err);
        }

        self.begin_run(statements.len(), store);
        let mut run = ActiveRun::new(store, notifier);

        let session = match driver.open_session(self.options.database.as_deref()).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "failed to open session");
                let err = UploadError::SessionOpenFailed(e.message());
                run.complete();
                self.finish_failure(statements.len(), &RunProgress::default(), &err, store, notifier);
                return Err(err);
            }
        };
        let session = run.hold(session);

        let total = statements.len();
        let mut progress = RunProgress::default();
        let outcome = self
            .run_units(session, statements, store, &mut progress)
            .await;

        if let Some(session) = run.take_session() {
            if let Err(e) = session.close().await {
                tracing::warn!(error = %e, "failed to close session");
            }
        }
        run.complete();

        match outcome {
            Ok(()) => Ok(self.finish_success(total, &progress, store, notifier)),
            Err(err) => {
                self.finish_failure(total, &progress, &err, store, notifier);
                Err(err)
            }
        }
    }

    fn begin_run(&self, total: usize, store: &ExecutionStateStore) {
        tracing::info!(total, batch_size = self.options.batch_size, "starting upload run");
        store.update(
            StatePatch::new()
                .running(true)
                .status(ExecutionStatus::Executing)
                .clear_messages()
                .executed(0, total)
                .total_statements(total)
                .batch_size(self.options.batch_size)
                .counters(QueryCounters::new()),
        );
    }

    async fn run_units(
        &self,
        session: &dyn Session,
        statements: &[Statement],
        store: &ExecutionStateStore,
        progress: &mut RunProgress,
    ) -> UploadResult<()> {
        let total = statements.len();
        let params = Params::new();

        for unit in plan_units(statements, self.options.batch_size) {
            let counters = match unit {
                ExecutionUnit::Schema { index } => {
                    run_schema_statement(session, &statements[index], &params).await?
                }
                ExecutionUnit::Batch { start, len } => {
                    run_batch(session, &statements[start..start + len], start, &params).await?
                }
            };

            progress.counters.add(&counters);
            progress.executed = unit.end();
            progress.units += 1;

            store.add_to_counters(&counters);
            store.update(StatePatch::new().executed(progress.executed, total));

            tracing::debug!(
                executed = progress.executed,
                total,
                unit_len = unit.len(),
                "execution unit committed"
            );
        }

        Ok(())
    }

    fn finish_success(
        &self,
        total: usize,
        progress: &RunProgress,
        store: &ExecutionStateStore,
        notifier: &dyn NotificationSink,
    ) -> RunReport {
        let message = success_message(total, &progress.counters);
        store.update(
            StatePatch::new()
                .running(false)
                .status(ExecutionStatus::Success)
                .result_message(message.clone()),
        );
        notifier.notify(SUCCESS_TITLE, &success_notification(total));

        tracing::info!(total, units = progress.units, "upload run completed");

        RunReport {
            total_statements: total,
            units: progress.units,
            counters: progress.counters,
            message,
        }
    }

    fn finish_failure(
        &self,
        total: usize,
        progress: &RunProgress,
        err: &UploadError,
        store: &ExecutionStateStore,
        notifier: &dyn NotificationSink,
    ) {
        let headline = err.to_string();
        let full_message = match err {
            UploadError::StatementFailed { .. } | UploadError::TransactionStartFailed { .. } => {
                statement_failure_report(&headline, progress.executed, total, &progress.counters)
            }
            UploadError::BatchCommitFailed { .. } => {
                commit_failure_report(&headline, &progress.counters)
            }
            _ => headline.clone(),
        };

        tracing::error!(
            error = %err,
            executed = progress.executed,
            total,
            "upload run failed"
        );

        store.update(
            StatePatch::new()
                .running(false)
                .status(ExecutionStatus::Error)
                .error_message(full_message),
        );
        notifier.notify(FAILURE_TITLE, &headline);
    }
}

/// Releases a run that stops without reaching a terminal state
///
/// Covers the run future being dropped mid-flight and panics inside a
/// driver. On drop the store is moved to `error` and a still-held session
/// is closed on the current tokio runtime.
struct ActiveRun<'a> {
    store: &'a ExecutionStateStore,
    notifier: &'a dyn NotificationSink,
    session: Option<Box<dyn Session>>,
    completed: bool,
}

impl<'a> ActiveRun<'a> {
    fn new(store: &'a ExecutionStateStore, notifier: &'a dyn NotificationSink) -> Self {
        Self {
            store,
            notifier,
            session: None,
            completed: false,
        }
    }

    fn hold(&mut self, session: Box<dyn Session>) -> &dyn Session {
        &**self.session.insert(session)
    }

    fn take_session(&mut self) -> Option<Box<dyn Session>> {
        self.session.take()
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = session.close().await {
                            tracing::warn!(error = %e, "failed to close session of interrupted run");
                        }
                    });
                }
                Err(_) => tracing::warn!("no runtime to close session of interrupted run"),
            }
        }

        if self.completed {
            return;
        }

        tracing::error!("upload run interrupted");
        self.store.update(
            StatePatch::new()
                .running(false)
                .status(ExecutionStatus::Error)
                .error_message(INTERRUPTED_MESSAGE),
        );
        self.notifier.notify(FAILURE_TITLE, INTERRUPTED_MESSAGE);
    }
}

/// Record a failure detected before any session was opened
pub(crate) fn report_preflight_failure(
    store: &ExecutionStateStore,
    notifier: &dyn NotificationSink,
    err: &UploadError,
) {
    tracing::warn!(error = %err, "upload rejected before execution");
    store.update(
        StatePatch::new()
            .status(ExecutionStatus::Error)
            .error_message(err.to_string()),
    );
    notifier.notify(FAILURE_TITLE, &err.to_string());
}

/// Run a schema statement in its own implicit transaction
#[tracing::instrument(skip(session, statement, params), fields(statement_index = statement.index, sql_preview = %statement.preview(100)))]
async fn run_schema_statement(
    session: &dyn Session,
    statement: &Statement,
    params: &Params,
) -> UploadResult<QueryCounters> {
    match session.run(&statement.text, params).await {
        Ok(summary) => Ok(summary.counters),
        Err(e) => {
            tracing::error!(error = %e, "schema statement failed");
            Err(UploadError::StatementFailed {
                index: statement.index,
                message: e.message(),
            })
        }
    }
}

/// Run data statements in one transaction, returning the batch counters
///
/// Nothing is reported upward unless the commit succeeds.
#[tracing::instrument(skip(session, batch, params), fields(batch_start = start, batch_len = batch.len()))]
async fn run_batch(
    session: &dyn Session,
    batch: &[Statement],
    start: usize,
    params: &Params,
) -> UploadResult<QueryCounters> {
    let tx = session.begin_transaction().await.map_err(|e| {
        tracing::error!(error = %e, "failed to begin transaction");
        UploadError::TransactionStartFailed {
            start,
            message: e.message(),
        }
    })?;

    let mut batch_counters = QueryCounters::new();

    for statement in batch {
        let outcome = tx.run(&statement.text, params).await;
        match outcome {
            Ok(summary) => batch_counters.add(&summary.counters),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    statement_index = statement.index,
                    sql_preview = %statement.preview(100),
                    "statement failed inside batch"
                );
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed after statement error");
                }
                return Err(UploadError::StatementFailed {
                    index: statement.index,
                    message: e.message(),
                });
            }
        }
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "batch commit failed");
        UploadError::BatchCommitFailed {
            start,
            message: e.message(),
        }
    })?;

    Ok(batch_counters)
}
