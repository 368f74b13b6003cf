//! Error types for Cyload

use thiserror::Error;

/// Core error type for database collaborator operations
#[derive(Error, Debug)]
pub enum CyloadError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl CyloadError {
    /// The bare driver message without the category prefix.
    ///
    /// Failure reports quote what the database said, so the category
    /// label added by `Display` is stripped here.
    pub fn message(&self) -> String {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Transaction(msg)
            | Self::Configuration(msg)
            | Self::NotSupported(msg)
            | Self::Other(msg) => msg.clone(),
            Self::Io(err) => err.to_string(),
            Self::Serialization(err) => err.to_string(),
            Self::Cancelled => "Cancelled".to_string(),
        }
    }
}

/// Result type alias for Cyload operations
pub type Result<T> = std::result::Result<T, CyloadError>;
