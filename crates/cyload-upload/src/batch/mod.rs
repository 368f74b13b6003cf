//! Batched upload execution
//!
//! Runs a parsed script against a single session, grouping data statements
//! into transactions and isolating schema statements, while publishing
//! progress to an [`ExecutionStateStore`](crate::state::ExecutionStateStore).

mod executor;

pub use executor::{ExecutorOptions, INTERRUPTED_MESSAGE, RunReport, UploadExecutor};
pub(crate) use executor::report_preflight_failure;
