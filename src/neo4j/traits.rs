//! Graph backend trait definitions
//!
//! The executor only talks to the store through these two traits, which lets the
//! Neo4j client be swapped for the in-memory mock in tests.

use super::models::EdgeRecord;
use super::query::Statement;
use crate::error::Result;
use async_trait::async_trait;

/// Source of write transactions.
///
/// Every call to [`GraphBackend::begin`] acquires its own connection; the
/// connection is held by the returned transaction and released when that
/// transaction is committed, rolled back or dropped.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Open a write transaction on a freshly acquired connection
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>>;
}

/// An open write transaction.
#[async_trait]
pub trait GraphTransaction: Send {
    /// Run one statement and collect every row it returns, in store order
    async fn execute(&mut self, statement: &Statement) -> Result<Vec<EdgeRecord>>;

    /// Make every statement run so far visible
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every statement run so far
    async fn rollback(self: Box<Self>) -> Result<()>;
}
