//! Transaction execution
//!
//! Every executor call opens exactly one write transaction, runs its statements
//! in order, and either commits all of them or none.

use super::models::EdgeRecord;
use super::query::Statement;
use super::traits::GraphBackend;
use crate::error::{Result, StoreError};
use std::sync::Arc;
use std::time::Instant;

/// Runs statements inside scoped write transactions
#[derive(Clone)]
pub struct Executor {
    backend: Arc<dyn GraphBackend>,
    deadline: Option<Instant>,
}

impl Executor {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self {
            backend,
            deadline: None,
        }
    }

    /// Same backend, refusing to start work once `deadline` has passed
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            backend: self.backend.clone(),
            deadline: Some(deadline),
        }
    }

    /// Run a single statement in its own transaction
    pub async fn run(&self, statement: Statement) -> Result<Vec<EdgeRecord>> {
        let mut results = self.run_all(vec![statement]).await?;
        Ok(results.pop().unwrap_or_default())
    }

    /// Run several statements in one transaction.
    ///
    /// Returns the rows of each statement, in statement order. The first failing
    /// statement rolls back the whole transaction and its error is returned as is.
    pub async fn run_all(&self, statements: Vec<Statement>) -> Result<Vec<Vec<EdgeRecord>>> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(StoreError::DeadlineExceeded);
            }
        }

        tracing::debug!(statements = statements.len(), "opening write transaction");
        let mut txn = self.backend.begin().await?;

        let mut results = Vec::with_capacity(statements.len());
        for statement in &statements {
            match txn.execute(statement).await {
                Ok(rows) => results.push(rows),
                Err(e) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        tracing::warn!("Rollback failed after statement error: {}", rollback_err);
                    }
                    return Err(e);
                }
            }
        }

        txn.commit().await?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo4j::mock::MockBackend;
    use crate::neo4j::query::{Anchor, EdgeData, EdgeMatch, MediaRef, NodeRef};
    use crate::neo4j::schema::{LikeKind, MediaKind, RelKind};
    use std::time::Duration;

    fn like(user_id: i64, media_id: &str) -> Statement {
        Statement::UpsertEdge {
            user_id,
            media: MediaRef::new(MediaKind::Movie, media_id),
            data: EdgeData::Preference(LikeKind::Like),
        }
    }

    #[tokio::test]
    async fn test_run_all_returns_rows_per_statement() {
        let backend = Arc::new(MockBackend::new());
        let executor = Executor::new(backend.clone());

        let results = executor
            .run_all(vec![
                like(1, "42"),
                Statement::MatchEdges(EdgeMatch::new(RelKind::Preference, Anchor::User(1))),
            ])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_empty());
        assert_eq!(results[1].len(), 1);
        assert_eq!(results[1][0].like_type, Some(LikeKind::Like));
        assert_eq!(backend.open_transactions(), 0);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_earlier_statements() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_statement(2);
        let executor = Executor::new(backend.clone());

        let err = executor
            .run_all(vec![like(1, "a"), like(1, "b"), like(1, "c")])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(backend.edge_count().await, 0);
        assert_eq!(backend.open_transactions(), 0);
        assert_eq!(backend.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_store_errors_are_not_retried() {
        let backend = Arc::new(MockBackend::new());
        let executor = Executor::new(backend.clone());

        executor.run(Statement::CreateNode(NodeRef::User(1))).await.unwrap();
        let err = executor
            .run(Statement::CreateNode(NodeRef::User(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(backend.transactions_started(), 2);
    }

    #[tokio::test]
    async fn test_expired_deadline_never_acquires() {
        let backend = Arc::new(MockBackend::new());
        let executor = Executor::new(backend.clone())
            .with_deadline(Instant::now() - Duration::from_millis(1));

        let err = executor.run(like(1, "42")).await.unwrap_err();

        assert!(matches!(err, StoreError::DeadlineExceeded));
        assert_eq!(backend.transactions_started(), 0);
    }

    #[tokio::test]
    async fn test_future_deadline_runs() {
        let backend = Arc::new(MockBackend::new());
        let executor =
            Executor::new(backend.clone()).with_deadline(Instant::now() + Duration::from_secs(60));

        executor.run(like(1, "42")).await.unwrap();
        assert_eq!(backend.edge_count().await, 1);
    }
}
