//! Upload execution state
//!
//! The store is the single source of truth for whether an upload job is
//! running and how far it got. It is meant to outlive any display surface:
//! construct one per process (or per test), hand it to the engine as the
//! only writer, and let any number of observers subscribe to snapshots.

mod store;
#[cfg(test)]
mod tests;

use cyload_core::QueryCounters;
use cyload_settings::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};

pub use store::{ExecutionStateStore, StateCallback, Subscription};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// No run in progress; also the state after an explicit reset
    #[default]
    Idle,
    /// A run is in progress
    Executing,
    /// The last run completed every statement
    Success,
    /// The last run stopped on its first failure
    Error,
}

/// Snapshot of the upload job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub is_running: bool,
    pub file_name: String,
    pub total_statements: usize,
    /// Never decreases during a run and never exceeds `total_statements`
    pub executed_statements: usize,
    /// Integer percentage, 0 to 100
    pub progress: u8,
    pub status: ExecutionStatus,
    pub result_message: String,
    pub error_message: String,
    pub batch_size: usize,
    pub counters: QueryCounters,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            is_running: false,
            file_name: String::new(),
            total_statements: 0,
            executed_statements: 0,
            progress: 0,
            status: ExecutionStatus::Idle,
            result_message: String::new(),
            error_message: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            counters: QueryCounters::default(),
        }
    }
}

impl ExecutionState {
    /// "Statement 1,200 of 5,000"
    pub fn progress_label(&self) -> String {
        format!(
            "Statement {} of {}",
            group_thousands(self.executed_statements),
            group_thousands(self.total_statements)
        )
    }

    /// "42% complete"
    pub fn percent_label(&self) -> String {
        format!("{}% complete", self.progress)
    }

    fn apply(&mut self, patch: StatePatch) {
        let StatePatch {
            is_running,
            file_name,
            total_statements,
            executed_statements,
            progress,
            status,
            result_message,
            error_message,
            batch_size,
            counters,
        } = patch;

        if let Some(v) = is_running {
            self.is_running = v;
        }
        if let Some(v) = file_name {
            self.file_name = v;
        }
        if let Some(v) = total_statements {
            self.total_statements = v;
        }
        if let Some(v) = executed_statements {
            self.executed_statements = v;
        }
        if let Some(v) = progress {
            self.progress = v.min(100);
        }
        if let Some(v) = status {
            self.status = v;
        }
        if let Some(v) = result_message {
            self.result_message = v;
        }
        if let Some(v) = error_message {
            self.error_message = v;
        }
        if let Some(v) = batch_size {
            self.batch_size = v;
        }
        if let Some(v) = counters {
            self.counters = v;
        }
    }
}

/// Partial update of an [`ExecutionState`]
///
/// Unset fields are left untouched. `counters` replaces the whole record;
/// use [`ExecutionStateStore::add_to_counters`] to accumulate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePatch {
    pub is_running: Option<bool>,
    pub file_name: Option<String>,
    pub total_statements: Option<usize>,
    pub executed_statements: Option<usize>,
    pub progress: Option<u8>,
    pub status: Option<ExecutionStatus>,
    pub result_message: Option<String>,
    pub error_message: Option<String>,
    pub batch_size: Option<usize>,
    pub counters: Option<QueryCounters>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running(mut self, is_running: bool) -> Self {
        self.is_running = Some(is_running);
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn total_statements(mut self, total: usize) -> Self {
        self.total_statements = Some(total);
        self
    }

    /// Set executed count together with the derived percentage
    pub fn executed(mut self, executed: usize, total: usize) -> Self {
        self.executed_statements = Some(executed);
        self.progress = Some(progress_percent(executed, total));
        self
    }

    pub fn status(mut self, status: ExecutionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn result_message(mut self, message: impl Into<String>) -> Self {
        self.result_message = Some(message.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn counters(mut self, counters: QueryCounters) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Clear both messages
    pub fn clear_messages(self) -> Self {
        self.result_message("").error_message("")
    }
}

/// `round(100 * executed / total)`, or 0 for an empty script
pub fn progress_percent(executed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let executed = executed.min(total) as u128;
    let total = total as u128;
    ((200 * executed + total) / (2 * total)) as u8
}

fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
