//! Cyload Upload - Cypher script splitting and batched execution
//!
//! This crate turns a Cypher script into statements, plans how they are
//! grouped into transactions, runs them against a database session and
//! publishes progress through an observable state store.

pub mod batch;
mod classify;
mod error;
mod plan;
mod service;
mod splitter;
pub mod state;
mod summary;

pub use batch::{ExecutorOptions, INTERRUPTED_MESSAGE, RunReport, UploadExecutor};
pub use classify::{StatementKind, classify_statement, normalize_statement};
pub use error::{UploadError, UploadResult};
pub use plan::{ExecutionUnit, Statement, parse_statements, plan_units};
pub use service::UploadService;
pub use splitter::{is_comment_only, split_statements};
pub use state::{
    ExecutionState, ExecutionStateStore, ExecutionStatus, StatePatch, Subscription,
    progress_percent,
};
pub use summary::{
    FAILURE_TITLE, NO_CHANGES_MESSAGE, SUCCESS_TITLE, build_summary, commit_failure_report,
    statement_failure_report, success_message, success_notification,
};
