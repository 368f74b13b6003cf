//! Upload service
//!
//! Owns one upload job: the pending script, the executor options and the
//! state store the job publishes to. Display layers hold the same store and
//! only ever read from it.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cyload_core::{Driver, NotificationSink};
use cyload_settings::UploadSettings;
use parking_lot::{Mutex, RwLock};

use crate::batch::{ExecutorOptions, RunReport, UploadExecutor, report_preflight_failure};
use crate::error::{UploadError, UploadResult};
use crate::plan::{Statement, parse_statements};
use crate::state::{ExecutionStateStore, ExecutionStatus, StatePatch};

/// Script selected for the next run
#[derive(Debug, Clone, Default)]
struct PendingScript {
    file_name: String,
    content: String,
}

/// Service driving a single upload job at a time
pub struct UploadService {
    store: Arc<ExecutionStateStore>,
    notifier: Arc<dyn NotificationSink>,
    settings: UploadSettings,
    executor: RwLock<UploadExecutor>,
    pending: Mutex<PendingScript>,
    running: AtomicBool,
}

impl UploadService {
    /// Create a service with its own state store
    pub fn new(settings: UploadSettings, notifier: Arc<dyn NotificationSink>) -> Self {
        Self::with_store(Arc::new(ExecutionStateStore::new()), settings, notifier)
    }

    /// Create a service publishing to a shared state store
    ///
    /// This allows display components created before the service to observe
    /// its runs.
    pub fn with_store(
        store: Arc<ExecutionStateStore>,
        settings: UploadSettings,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let mut options = ExecutorOptions::new().with_batch_size(settings.normalized_batch_size());
        if let Some(database) = settings.database.as_deref() {
            options = options.with_database(database);
        }

        store.update(StatePatch::new().batch_size(options.batch_size));

        Self {
            store,
            notifier,
            settings,
            executor: RwLock::new(UploadExecutor::new(options)),
            pending: Mutex::new(PendingScript::default()),
            running: AtomicBool::new(false),
        }
    }

    /// The state store this service writes to
    pub fn store(&self) -> &Arc<ExecutionStateStore> {
        &self.store
    }

    /// Settings the service was created with
    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Options the next run will use
    pub fn options(&self) -> ExecutorOptions {
        self.executor.read().options().clone()
    }

    /// Statements of the pending script
    pub fn pending_statements(&self) -> Vec<Statement> {
        parse_statements(&self.pending.lock().content)
    }

    /// Select a script for the next run
    ///
    /// Returns the number of statements found. The state is reset to idle
    /// with the new file name and statement count.
    #[tracing::instrument(skip(self, content), fields(file_name = %file_name, bytes = tracing::field::Empty))]
    pub fn load_script(&self, file_name: &str, content: impl Into<String>) -> UploadResult<usize> {
        if self.store.has_active_execution() {
            tracing::warn!("cannot load a script while an upload is running");
            return Err(UploadError::AlreadyRunning);
        }

        if !self.settings.accepts_file(file_name) {
            tracing::warn!(
                accepted = ?self.settings.accepted_extensions,
                "file extension is not a recognised Cypher script extension"
            );
        }

        let content = strip_bom(content.into());
        tracing::Span::current().record("bytes", content.len());
        let total = parse_statements(&content).len();
        *self.pending.lock() = PendingScript {
            file_name: file_name.to_string(),
            content,
        };

        self.store.update(
            StatePatch::new()
                .file_name(file_name)
                .total_statements(total)
                .status(ExecutionStatus::Idle)
                .clear_messages()
                .executed(0, total),
        );

        tracing::debug!(statements = total, "script loaded");
        Ok(total)
    }

    /// Read a script from disk and select it for the next run
    pub async fn load_file(&self, path: &Path) -> UploadResult<usize> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match tokio::fs::read_to_string(path).await {
            Ok(content) => self.load_script(&file_name, content),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read script");
                let err = UploadError::FileRead(e);
                self.store.update(
                    StatePatch::new()
                        .status(ExecutionStatus::Error)
                        .error_message(err.to_string()),
                );
                Err(err)
            }
        }
    }

    /// Change the batch size for subsequent runs; zero is ignored
    pub fn set_batch_size(&self, batch_size: usize) {
        if batch_size == 0 {
            tracing::debug!("ignoring zero batch size");
            return;
        }
        self.executor.write().set_batch_size(batch_size);
        self.store.update(StatePatch::new().batch_size(batch_size));
    }

    /// Run the pending script against `driver`
    ///
    /// Checks run in order: an active run, a missing driver, a blank script
    /// and a script without statements. All but the first are reported into
    /// the store before returning.
    #[tracing::instrument(skip(self, driver), fields(file_name = tracing::field::Empty))]
    pub async fn execute(&self, driver: Option<&dyn Driver>) -> UploadResult<RunReport> {
        let _guard = match RunGuard::acquire(&self.running) {
            Some(guard) if !self.store.has_active_execution() => guard,
            _ => {
                tracing::warn!("upload already running");
                return Err(UploadError::AlreadyRunning);
            }
        };

        let Some(driver) = driver else {
            return Err(self.preflight_failure(UploadError::SessionUnavailable));
        };

        let PendingScript { file_name, content } = self.pending.lock().clone();
        tracing::Span::current().record("file_name", file_name.as_str());
        if content.trim().is_empty() {
            return Err(self.preflight_failure(UploadError::EmptyFile));
        }

        let statements = parse_statements(&content);
        if statements.is_empty() {
            return Err(self.preflight_failure(UploadError::NoStatements));
        }

        let executor = self.executor.read().clone();
        executor
            .execute(driver, &statements, &self.store, self.notifier.as_ref())
            .await
    }

    /// Restore the default state and forget the pending script
    pub fn reset(&self) {
        *self.pending.lock() = PendingScript::default();
        self.store.reset();
        self.store
            .update(StatePatch::new().batch_size(self.executor.read().options().batch_size));
    }

    /// Reset unless a run is active
    ///
    /// Returns whether the state was reset. A display closing mid-run
    /// leaves the job observable.
    pub fn dismiss(&self) -> bool {
        if self.store.has_active_execution() {
            tracing::debug!("keeping state of active upload");
            return false;
        }
        self.reset();
        true
    }

    fn preflight_failure(&self, err: UploadError) -> UploadError {
        report_preflight_failure(&self.store, self.notifier.as_ref(), &err);
        err
    }
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("store", &self.store)
            .field("settings", &self.settings)
            .field("options", &self.options())
            .finish()
    }
}

/// Drop a leading byte order mark left by the file's encoder
fn strip_bom(content: String) -> String {
    match content.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => content,
    }
}

/// Marks the service busy until dropped
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
