//! In-memory driver used by the upload tests
//!
//! Records every call made through it and can be scripted to fail on a
//! given statement, transaction start, commit or session open, or to stall
//! on a statement.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cyload_core::{
    CounterKind, CyloadError, Driver, Params, QueryCounters, Result, RunSummary, Session,
    Transaction,
};
use parking_lot::Mutex;

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(Option<String>),
    /// Statement run in its own implicit transaction
    AutoCommit(String),
    Begin,
    /// Statement run inside an explicit transaction
    TxRun(String),
    Commit,
    Rollback,
    Close,
}

#[derive(Default)]
struct Script {
    fail_open: Option<String>,
    fail_statement: Option<(String, String)>,
    fail_begin: Option<usize>,
    fail_commit: Option<usize>,
    fail_rollback: bool,
    stall_statement: Option<(String, Duration)>,
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<Call>>,
    script: Mutex<Script>,
    begins: Mutex<usize>,
    commits: Mutex<usize>,
}

impl MockState {
    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    async fn run(&self, statement: &str, call: Call) -> Result<RunSummary> {
        self.record(call);
        let stall = match &self.script.lock().stall_statement {
            Some((needle, delay)) if statement.contains(needle.as_str()) => Some(*delay),
            _ => None,
        };
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if let Some((needle, message)) = &self.script.lock().fail_statement {
            if statement.contains(needle.as_str()) {
                return Err(CyloadError::Query(message.clone()));
            }
        }
        Ok(RunSummary::with_counters(counters_for(statement)))
    }
}

/// Counters the mock reports for a statement
///
/// Node creations count one node with one property and one label; index and
/// constraint creations count one of each.
pub fn counters_for(statement: &str) -> QueryCounters {
    let upper = statement.to_uppercase();
    if upper.starts_with("CREATE INDEX") {
        QueryCounters::new().with(CounterKind::IndexesAdded, 1)
    } else if upper.starts_with("CREATE CONSTRAINT") {
        QueryCounters::new().with(CounterKind::ConstraintsAdded, 1)
    } else if upper.starts_with("DROP INDEX") {
        QueryCounters::new().with(CounterKind::IndexesRemoved, 1)
    } else if upper.starts_with("CREATE (") {
        QueryCounters::new()
            .with(CounterKind::NodesCreated, 1)
            .with(CounterKind::LabelsAdded, 1)
            .with(CounterKind::PropertiesSet, 1)
    } else {
        QueryCounters::new()
    }
}

/// Mock driver handing out sessions that share one call log
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail to open a session
    pub fn fail_open(self, message: &str) -> Self {
        self.state.script.lock().fail_open = Some(message.to_string());
        self
    }

    /// Fail any statement containing `needle`
    pub fn fail_statement(self, needle: &str, message: &str) -> Self {
        self.state.script.lock().fail_statement = Some((needle.to_string(), message.to_string()));
        self
    }

    /// Fail the `n`th transaction start (1-based)
    pub fn fail_begin(self, n: usize) -> Self {
        self.state.script.lock().fail_begin = Some(n);
        self
    }

    /// Fail the `n`th commit (1-based)
    pub fn fail_commit(self, n: usize) -> Self {
        self.state.script.lock().fail_commit = Some(n);
        self
    }

    /// Make rollbacks fail as well
    pub fn fail_rollback(self) -> Self {
        self.state.script.lock().fail_rollback = true;
        self
    }

    /// Sleep for `delay` before answering any statement containing `needle`
    pub fn stall_statement(self, needle: &str, delay: Duration) -> Self {
        self.state.script.lock().stall_statement = Some((needle.to_string(), delay));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    pub fn opens(&self) -> usize {
        self.count(|c| matches!(c, Call::Open(_)))
    }

    pub fn closes(&self) -> usize {
        self.count(|c| *c == Call::Close)
    }

    pub fn commits(&self) -> usize {
        self.count(|c| *c == Call::Commit)
    }

    pub fn rollbacks(&self) -> usize {
        self.count(|c| *c == Call::Rollback)
    }

    pub fn begins(&self) -> usize {
        self.count(|c| *c == Call::Begin)
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn open_session(&self, database: Option<&str>) -> Result<Box<dyn Session>> {
        self.state.record(Call::Open(database.map(str::to_string)));
        if let Some(message) = &self.state.script.lock().fail_open {
            return Err(CyloadError::Connection(message.clone()));
        }
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
            closed: Mutex::new(false),
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
    closed: Mutex<bool>,
}

#[async_trait]
impl Session for MockSession {
    async fn run(&self, statement: &str, _params: &Params) -> Result<RunSummary> {
        self.state
            .run(statement, Call::AutoCommit(statement.to_string()))
            .await
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        self.state.record(Call::Begin);
        let n = {
            let mut begins = self.state.begins.lock();
            *begins += 1;
            *begins
        };
        if self.state.script.lock().fail_begin == Some(n) {
            return Err(CyloadError::Transaction("transaction limit reached".into()));
        }
        Ok(Box::new(MockTransaction {
            state: Arc::clone(&self.state),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.state.record(Call::Close);
        *self.closed.lock() = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

struct MockTransaction {
    state: Arc<MockState>,
}

#[async_trait]
impl Transaction for MockTransaction {
    async fn run(&self, statement: &str, _params: &Params) -> Result<RunSummary> {
        self.state
            .run(statement, Call::TxRun(statement.to_string()))
            .await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.state.record(Call::Commit);
        let n = {
            let mut commits = self.state.commits.lock();
            *commits += 1;
            *commits
        };
        if self.state.script.lock().fail_commit == Some(n) {
            return Err(CyloadError::Transaction("deadlock detected".into()));
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.state.record(Call::Rollback);
        if self.state.script.lock().fail_rollback {
            return Err(CyloadError::Transaction("rollback failed".into()));
        }
        Ok(())
    }
}

/// Notification sink that keeps every notification
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub notifications: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn taken(&self) -> Vec<(String, String)> {
        self.notifications.lock().clone()
    }
}

impl cyload_core::NotificationSink for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.notifications
            .lock()
            .push((title.to_string(), message.to_string()));
    }
}

/// `count` data statements creating one node each
pub fn data_script(count: usize) -> String {
    (0..count)
        .map(|i| format!("CREATE (:Item {{id: {i}}});"))
        .collect::<Vec<_>>()
        .join("\n")
}
