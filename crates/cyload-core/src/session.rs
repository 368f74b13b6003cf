//! Driver, session and transaction traits

use crate::{Result, RunSummary};
use async_trait::async_trait;

/// Named statement parameters, passed through to the driver untouched
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Entry point to a graph database
///
/// A driver is long-lived and cheap to share; every upload run opens
/// exactly one session from it.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Get the driver name (e.g., "neo4j", "memgraph")
    fn driver_name(&self) -> &str;

    /// Open a session against the given database, or the server default
    async fn open_session(&self, database: Option<&str>) -> Result<Box<dyn Session>>;
}

/// A logical connection used serially by a single run
#[async_trait]
pub trait Session: Send + Sync {
    /// Run a statement in its own implicit unit of work
    async fn run(&self, statement: &str, params: &Params) -> Result<RunSummary>;

    /// Begin an explicit transaction
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>>;

    /// Close the session
    async fn close(&self) -> Result<()>;

    /// Check if the session is closed
    fn is_closed(&self) -> bool;
}

/// An explicit transaction
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Run a statement within the transaction
    async fn run(&self, statement: &str, params: &Params) -> Result<RunSummary>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}
