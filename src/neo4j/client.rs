//! Neo4j client for the likes graph

use super::models::EdgeRecord;
use super::query::Statement;
use crate::error::{Result, StoreError};
use crate::Config;
use anyhow::Context;
use neo4rs::{query, ConfigBuilder, Graph, Query, Row, Txn};
use std::sync::Arc;

/// Client for Neo4j operations.
///
/// Holds the driver's connection pool; no session or transaction is stored
/// here, each operation checks out its own connection.
#[derive(Clone)]
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

impl Neo4jClient {
    /// Connect, verify the server answers, and initialize the schema
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(config.neo4j_uri.as_str())
            .user(config.neo4j_user.as_str())
            .password(config.neo4j_password.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size);
        if let Some(db) = &config.neo4j_database {
            builder = builder.db(db.as_str());
        }
        let neo4j_config = builder.build().context("Invalid Neo4j configuration")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        client
            .graph
            .run(query("RETURN 1"))
            .await
            .with_context(|| format!("Neo4j at {} is not reachable", config.neo4j_uri))?;
        tracing::info!("Connected to Neo4j at {}", config.neo4j_uri);

        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize uniqueness constraints and relationship property indexes
    async fn init_schema(&self) -> anyhow::Result<()> {
        let constraints = vec![
            "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id_user IS UNIQUE",
            "CREATE CONSTRAINT movie_id IF NOT EXISTS FOR (m:Movie) REQUIRE m.id_movie IS UNIQUE",
            "CREATE CONSTRAINT song_id IF NOT EXISTS FOR (s:Song) REQUIRE s.id_song IS UNIQUE",
            "CREATE CONSTRAINT book_id IF NOT EXISTS FOR (b:Book) REQUIRE b.id_book IS UNIQUE",
        ];

        let indexes = vec![
            "CREATE INDEX pref_type IF NOT EXISTS FOR ()-[r:PREF]-() ON (r.type)",
            "CREATE INDEX pref_media_type IF NOT EXISTS FOR ()-[r:PREF]-() ON (r.media_type)",
            "CREATE INDEX rte_media_type IF NOT EXISTS FOR ()-[r:RTE]-() ON (r.media_type)",
            "CREATE INDEX wsh_media_type IF NOT EXISTS FOR ()-[r:WSH]-() ON (r.media_type)",
        ];

        for constraint in constraints {
            if let Err(e) = self.graph.run(query(constraint)).await {
                tracing::warn!("Constraint may already exist: {}", e);
            }
        }

        for index in indexes {
            if let Err(e) = self.graph.run(query(index)).await {
                tracing::warn!("Index may already exist: {}", e);
            }
        }

        Ok(())
    }

    /// Check out a pooled connection and open a write transaction on it
    pub async fn start_transaction(&self) -> Result<Neo4jTransaction> {
        let txn = self.graph.start_txn().await?;
        Ok(Neo4jTransaction { txn })
    }
}

/// A write transaction bound to one pooled connection.
///
/// Dropping it without committing returns the connection to the pool and the
/// server discards the uncommitted work.
pub struct Neo4jTransaction {
    txn: Txn,
}

impl Neo4jTransaction {
    /// Run one statement and collect its rows
    pub async fn run_statement(&mut self, statement: &Statement) -> Result<Vec<EdgeRecord>> {
        let cypher = statement.to_cypher();
        tracing::trace!(query = %cypher.text, "running statement");
        let q = Query::from(cypher);

        if !statement.returns_rows() {
            self.txn
                .run(q)
                .await
                .map_err(|e| StoreError::from_graph(e, || describe(statement)))?;
            return Ok(Vec::new());
        }

        let mut stream = self.txn.execute(q).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next(self.txn.handle()).await? {
            records.push(edge_from_row(&row)?);
        }
        Ok(records)
    }

    pub async fn commit(self) -> Result<()> {
        self.txn.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}

/// Human-readable subject of a statement, for duplicate errors
fn describe(statement: &Statement) -> String {
    match statement {
        Statement::CreateNode(node) => node.to_string(),
        other => format!("{:?}", other),
    }
}

/// Convert a row of edge columns into a record.
///
/// `like_type` and `rating` are null on edges that do not carry them; any other
/// value of the wrong type is a decode error.
fn edge_from_row(row: &Row) -> Result<EdgeRecord> {
    let media_type: String = row.get("media_type")?;
    let like_type = row
        .get::<Option<String>>("like_type")?
        .map(|code| code.parse())
        .transpose()?;

    Ok(EdgeRecord {
        user_id: row.get("user_id")?,
        media_id: row.get("media_id")?,
        media_type: media_type.parse()?,
        like_type,
        rating: row.get::<Option<f64>>("rating")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo4j::schema::{LikeKind, MediaKind};
    use neo4rs::{BoltList, BoltNull, BoltType};

    fn edge_row(like_type: BoltType, rating: BoltType) -> Row {
        let fields = ["user_id", "media_id", "media_type", "like_type", "rating"]
            .into_iter()
            .map(BoltType::from)
            .collect::<Vec<_>>();
        let data = vec![
            BoltType::from(7_i64),
            BoltType::from("42"),
            BoltType::from("MOV"),
            like_type,
            rating,
        ];
        Row::new(BoltList::from(fields), BoltList::from(data))
    }

    #[test]
    fn test_edge_from_row_preference() {
        let row = edge_row(BoltType::from("DLK"), BoltType::Null(BoltNull));
        let record = edge_from_row(&row).unwrap();
        assert_eq!(record.user_id, 7);
        assert_eq!(record.media_id, "42");
        assert_eq!(record.media_type, MediaKind::Movie);
        assert_eq!(record.like_type, Some(LikeKind::Dislike));
        assert_eq!(record.rating, None);
    }

    #[test]
    fn test_edge_from_row_rating() {
        let row = edge_row(BoltType::Null(BoltNull), BoltType::from(3.5_f64));
        let record = edge_from_row(&row).unwrap();
        assert_eq!(record.like_type, None);
        assert_eq!(record.rating, Some(3.5));
    }

    #[test]
    fn test_edge_from_row_rejects_non_float_rating() {
        let row = edge_row(BoltType::Null(BoltNull), BoltType::from(4_i64));
        assert!(matches!(edge_from_row(&row), Err(StoreError::Decode(_))));

        let row = edge_row(BoltType::Null(BoltNull), BoltType::from("4.0"));
        assert!(matches!(edge_from_row(&row), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_edge_from_row_rejects_unknown_like_type() {
        let row = edge_row(BoltType::from("LOVE"), BoltType::Null(BoltNull));
        assert!(matches!(
            edge_from_row(&row),
            Err(StoreError::UnknownLikeType(_))
        ));
    }
}
