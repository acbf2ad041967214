//! `GraphBackend` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method.

use async_trait::async_trait;

use super::client::{Neo4jClient, Neo4jTransaction};
use super::models::EdgeRecord;
use super::query::Statement;
use super::traits::{GraphBackend, GraphTransaction};
use crate::error::Result;

#[async_trait]
impl GraphBackend for Neo4jClient {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        Ok(Box::new(self.start_transaction().await?))
    }
}

#[async_trait]
impl GraphTransaction for Neo4jTransaction {
    async fn execute(&mut self, statement: &Statement) -> Result<Vec<EdgeRecord>> {
        self.run_statement(statement).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        Neo4jTransaction::commit(*self).await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Neo4jTransaction::rollback(*self).await
    }
}
