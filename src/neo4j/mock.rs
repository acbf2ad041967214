//! In-memory mock implementation of GraphBackend for testing.
//!
//! Interprets the same [`Statement`] values the Neo4j client renders to Cypher,
//! over a small property graph held in `tokio::sync::RwLock`. Transactions work
//! on a private copy of the graph and replay their statements onto the shared
//! one on commit.
//! Conditionally compiled with `#[cfg(test)]`.

use crate::error::{Result, StoreError};
use crate::neo4j::models::EdgeRecord;
use crate::neo4j::query::{Anchor, EdgeData, EdgeMatch, MediaRef, NodeRef, Statement};
use crate::neo4j::schema::RelKind;
use crate::neo4j::traits::{GraphBackend, GraphTransaction};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

type EdgeKey = (RelKind, i64, MediaRef);

#[derive(Debug, Clone, Default)]
struct GraphState {
    users: BTreeSet<i64>,
    media: BTreeSet<MediaRef>,
    edges: BTreeMap<EdgeKey, EdgeRecord>,
}

impl GraphState {
    fn apply(&mut self, statement: &Statement) -> Result<Vec<EdgeRecord>> {
        match statement {
            Statement::CreateNode(node) => {
                let inserted = match node {
                    NodeRef::User(id) => self.users.insert(*id),
                    NodeRef::Media(m) => self.media.insert(m.clone()),
                };
                if !inserted {
                    return Err(StoreError::Duplicate(node.to_string()));
                }
            }
            Statement::UpsertEdge {
                user_id,
                media,
                data,
            } => {
                self.users.insert(*user_id);
                self.media.insert(media.clone());
                let (like_type, rating) = match data {
                    EdgeData::Preference(kind) => (Some(*kind), None),
                    EdgeData::Rating(r) => (None, Some(*r)),
                    EdgeData::Wishlist => (None, None),
                };
                self.edges.insert(
                    (data.rel(), *user_id, media.clone()),
                    EdgeRecord {
                        user_id: *user_id,
                        media_id: media.id.clone(),
                        media_type: media.kind,
                        like_type,
                        rating,
                    },
                );
            }
            Statement::DeleteEdge {
                rel,
                user_id,
                media,
            } => {
                self.edges.remove(&(*rel, *user_id, media.clone()));
            }
            Statement::DeleteNodeCascade(node) => match node {
                NodeRef::User(id) => {
                    self.users.remove(id);
                    self.edges.retain(|(_, user, _), _| user != id);
                }
                NodeRef::Media(m) => {
                    self.media.remove(m);
                    self.edges.retain(|(_, _, media), _| media != m);
                }
            },
            Statement::MatchEdges(m) => return Ok(self.match_edges(m)),
        }
        Ok(Vec::new())
    }

    fn match_edges(&self, m: &EdgeMatch) -> Vec<EdgeRecord> {
        self.edges
            .iter()
            .filter(|((rel, user, media), _)| {
                *rel == m.rel
                    && match &m.anchor {
                        Anchor::User(id) => user == id,
                        Anchor::Media(anchor) => media == anchor,
                        Anchor::Pair { user_id, media: anchor } => {
                            user == user_id && media == anchor
                        }
                    }
            })
            .map(|(_, record)| record)
            .filter(|r| m.like_type.is_none() || r.like_type == m.like_type)
            .filter(|r| m.media_type.map_or(true, |kind| r.media_type == kind))
            .cloned()
            .collect()
    }
}

/// In-memory mock implementation of GraphBackend for testing.
#[derive(Default)]
pub struct MockBackend {
    state: Arc<RwLock<GraphState>>,
    /// 1-based statement index that fails in the next transaction (0 = none)
    fail_at: AtomicUsize,
    started: AtomicUsize,
    open: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new empty MockBackend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`-th statement of the next transaction fail
    pub fn fail_statement(&self, n: usize) {
        self.fail_at.store(n, Ordering::SeqCst);
    }

    /// Transactions currently holding a "connection"
    pub fn open_transactions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn transactions_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub async fn edge_count(&self) -> usize {
        self.state.read().await.edges.len()
    }

    pub async fn edges_of(&self, rel: RelKind) -> Vec<EdgeRecord> {
        self.state
            .read()
            .await
            .edges
            .iter()
            .filter(|((r, _, _), _)| *r == rel)
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub async fn has_user(&self, user_id: i64) -> bool {
        self.state.read().await.users.contains(&user_id)
    }

    pub async fn has_media(&self, media: &MediaRef) -> bool {
        self.state.read().await.media.contains(media)
    }

    pub async fn node_count(&self) -> usize {
        let state = self.state.read().await;
        state.users.len() + state.media.len()
    }
}

#[async_trait]
impl GraphBackend for MockBackend {
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_add(1, Ordering::SeqCst);
        let fail_at = self.fail_at.swap(0, Ordering::SeqCst);

        Ok(Box::new(MockTransaction {
            staged: self.state.read().await.clone(),
            log: Vec::new(),
            shared: self.state.clone(),
            executed: 0,
            fail_at: (fail_at != 0).then_some(fail_at),
            open: self.open.clone(),
            rollbacks: self.rollbacks.clone(),
        }))
    }
}

struct MockTransaction {
    staged: GraphState,
    log: Vec<Statement>,
    shared: Arc<RwLock<GraphState>>,
    executed: usize,
    fail_at: Option<usize>,
    open: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

impl Drop for MockTransaction {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GraphTransaction for MockTransaction {
    async fn execute(&mut self, statement: &Statement) -> Result<Vec<EdgeRecord>> {
        self.executed += 1;
        if self.fail_at == Some(self.executed) {
            return Err(StoreError::Backend(format!(
                "injected failure at statement {}",
                self.executed
            )));
        }
        let rows = self.staged.apply(statement)?;
        if !statement.returns_rows() {
            self.log.push(statement.clone());
        }
        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut shared = self.shared.write().await;
        for statement in &self.log {
            shared.apply(statement)?;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
