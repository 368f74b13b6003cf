//! Upload errors

use thiserror::Error;

pub type UploadResult<T> = Result<T, UploadError>;

/// Terminal failures of an upload, with user-facing messages
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No database connection available")]
    SessionUnavailable,

    #[error("Failed to open session: {0}")]
    SessionOpenFailed(String),

    #[error("Cypher file is empty")]
    EmptyFile,

    #[error("No valid Cypher statements found in file")]
    NoStatements,

    #[error("An upload is already running")]
    AlreadyRunning,

    #[error("Failed to read file")]
    FileRead(#[source] std::io::Error),

    /// A statement failed; `index` is 0-based
    #[error("Statement {} failed: {message}", .index + 1)]
    StatementFailed { index: usize, message: String },

    /// A batch transaction could not be opened; `start` is 0-based
    #[error("Failed to begin transaction at statement {}: {message}", .start + 1)]
    TransactionStartFailed { start: usize, message: String },

    /// A batch transaction failed to commit; `start` is 0-based
    #[error("Batch commit failed at statement {}: {message}", .start + 1)]
    BatchCommitFailed { start: usize, message: String },
}
