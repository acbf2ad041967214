//! Cypher query building
//!
//! A [`Statement`] describes one graph operation in schema terms (which node,
//! which edge, which filters). [`Statement::to_cypher`] renders it into a
//! [`CypherQuery`]: query text where labels, property names and relationship
//! types come from the schema resolver, and every caller-supplied value is a
//! bound `$parameter`.

use super::schema::{LikeKind, MediaKind, RelKind, USER_ID_PROPERTY, USER_LABEL};
use std::fmt;

// ============================================================================
// Parameters
// ============================================================================

/// A value bound to a `$name` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Rendered query text plus its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    pub text: String,
    pub params: Vec<(&'static str, ParamValue)>,
}

impl CypherQuery {
    fn new(text: String) -> Self {
        Self {
            text,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, name: &'static str, value: impl Into<ParamValue>) {
        // Several clauses may reference the same placeholder; bind it once
        if self.param(name).is_none() {
            self.params.push((name, value.into()));
        }
    }

    /// Look up a bound parameter by name
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

impl From<CypherQuery> for neo4rs::Query {
    fn from(q: CypherQuery) -> Self {
        q.params
            .into_iter()
            .fold(neo4rs::query(&q.text), |query, (key, value)| match value {
                ParamValue::Int(v) => query.param(key, v),
                ParamValue::Float(v) => query.param(key, v),
                ParamValue::Text(v) => query.param(key, v),
            })
    }
}

/// Builder for WHERE clauses whose values are always bound parameters
#[derive(Default)]
pub struct WhereBuilder {
    conditions: Vec<String>,
    params: Vec<(&'static str, ParamValue)>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `alias.property = $param`
    pub fn add_eq(
        &mut self,
        alias: &str,
        property: &str,
        param: &'static str,
        value: impl Into<ParamValue>,
    ) -> &mut Self {
        self.conditions
            .push(format!("{}.{} = ${}", alias, property, param));
        self.params.push((param, value.into()));
        self
    }

    /// Add an equality filter only when a value is present
    pub fn add_optional_eq<V: Into<ParamValue>>(
        &mut self,
        alias: &str,
        property: &str,
        param: &'static str,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.add_eq(alias, property, param, value);
        }
        self
    }

    /// Build the WHERE clause (returns empty string if no conditions)
    pub fn build(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn bind_into(self, query: &mut CypherQuery) {
        for (name, value) in self.params {
            query.bind(name, value);
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

/// A media node reference: kind plus identifying value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub id: String,
}

impl MediaRef {
    pub fn new(kind: MediaKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Either endpoint of a User -> Media edge
#[derive(Debug, Clone, PartialEq)]
pub enum NodeRef {
    User(i64),
    Media(MediaRef),
}

impl NodeRef {
    pub fn label(&self) -> &'static str {
        match self {
            NodeRef::User(_) => USER_LABEL,
            NodeRef::Media(m) => m.kind.label(),
        }
    }

    pub fn id_property(&self) -> &'static str {
        match self {
            NodeRef::User(_) => USER_ID_PROPERTY,
            NodeRef::Media(m) => m.kind.id_property(),
        }
    }

    fn id_value(&self) -> ParamValue {
        match self {
            NodeRef::User(id) => ParamValue::Int(*id),
            NodeRef::Media(m) => ParamValue::Text(m.id.clone()),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::User(id) => write!(f, "{} {}", USER_LABEL, id),
            NodeRef::Media(m) => write!(f, "{} {}", m.kind.label(), m.id),
        }
    }
}

/// Relationship kind together with the properties specific to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeData {
    Preference(LikeKind),
    Rating(f64),
    Wishlist,
}

impl EdgeData {
    pub fn rel(&self) -> RelKind {
        match self {
            EdgeData::Preference(_) => RelKind::Preference,
            EdgeData::Rating(_) => RelKind::Rating,
            EdgeData::Wishlist => RelKind::Wishlist,
        }
    }
}

/// Node an edge match is anchored on
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    User(i64),
    Media(MediaRef),
    /// Both endpoints fixed: at most one edge per relationship type
    Pair { user_id: i64, media: MediaRef },
}

/// Pattern query over edges of one relationship type
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMatch {
    pub rel: RelKind,
    pub anchor: Anchor,
    /// Filter on the PREF `type` property
    pub like_type: Option<LikeKind>,
    /// Filter on the denormalized `media_type` property
    pub media_type: Option<MediaKind>,
}

impl EdgeMatch {
    pub fn new(rel: RelKind, anchor: Anchor) -> Self {
        Self {
            rel,
            anchor,
            like_type: None,
            media_type: None,
        }
    }

    pub fn with_like_type(mut self, like_type: Option<LikeKind>) -> Self {
        self.like_type = like_type;
        self
    }

    pub fn with_media_type(mut self, media_type: Option<MediaKind>) -> Self {
        self.media_type = media_type;
        self
    }
}

/// One graph operation
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateNode(NodeRef),
    /// Merge both endpoints and the edge, then set the edge properties
    UpsertEdge {
        user_id: i64,
        media: MediaRef,
        data: EdgeData,
    },
    DeleteEdge {
        rel: RelKind,
        user_id: i64,
        media: MediaRef,
    },
    /// Detach-delete a node together with every incident edge
    DeleteNodeCascade(NodeRef),
    MatchEdges(EdgeMatch),
}

/// Columns returned by every edge match, one per `EdgeRecord` field
const EDGE_COLUMNS: &str = "r.user_id AS user_id, r.media_id AS media_id, \
     r.media_type AS media_type, r.type AS like_type, r.rating AS rating";

impl Statement {
    /// Render to Cypher text and parameters
    pub fn to_cypher(&self) -> CypherQuery {
        match self {
            Statement::CreateNode(node) => {
                let mut q = CypherQuery::new(format!(
                    "CREATE (n:{} {{{}: $id}})",
                    node.label(),
                    node.id_property()
                ));
                q.bind("id", node.id_value());
                q
            }
            Statement::UpsertEdge {
                user_id,
                media,
                data,
            } => render_upsert(*user_id, media, data),
            Statement::DeleteEdge {
                rel,
                user_id,
                media,
            } => {
                let mut q = CypherQuery::new(format!(
                    "MATCH (u:{user} {{{user_prop}: $user_id}})-[r:{rel}]->(m:{label} {{{media_prop}: $media_id}})\n\
                     DELETE r",
                    user = USER_LABEL,
                    user_prop = USER_ID_PROPERTY,
                    rel = rel.rel_type(),
                    label = media.kind.label(),
                    media_prop = media.kind.id_property(),
                ));
                q.bind("user_id", *user_id);
                q.bind("media_id", media.id.as_str());
                q
            }
            Statement::DeleteNodeCascade(node) => {
                let mut q = CypherQuery::new(format!(
                    "MATCH (n:{} {{{}: $id}})\nDETACH DELETE n",
                    node.label(),
                    node.id_property()
                ));
                q.bind("id", node.id_value());
                q
            }
            Statement::MatchEdges(m) => render_match(m),
        }
    }

    /// Whether the statement produces result rows
    pub fn returns_rows(&self) -> bool {
        matches!(self, Statement::MatchEdges(_))
    }
}

fn render_upsert(user_id: i64, media: &MediaRef, data: &EdgeData) -> CypherQuery {
    let mut assignments = vec![
        "r.user_id = $user_id",
        "r.media_id = $media_id",
        "r.media_type = $media_type",
    ];
    match data {
        EdgeData::Preference(_) => assignments.push("r.type = $like_type"),
        EdgeData::Rating(_) => assignments.push("r.rating = $rating"),
        EdgeData::Wishlist => {}
    }
    let assignments = assignments.join(", ");

    // Both merge branches write the same properties, so re-running updates in place
    let mut q = CypherQuery::new(format!(
        "MERGE (u:{user} {{{user_prop}: $user_id}})\n\
         MERGE (m:{label} {{{media_prop}: $media_id}})\n\
         MERGE (u)-[r:{rel}]->(m)\n\
         ON CREATE SET {assignments}\n\
         ON MATCH SET {assignments}",
        user = USER_LABEL,
        user_prop = USER_ID_PROPERTY,
        label = media.kind.label(),
        media_prop = media.kind.id_property(),
        rel = data.rel().rel_type(),
    ));
    q.bind("user_id", user_id);
    q.bind("media_id", media.id.as_str());
    q.bind("media_type", media.kind.code());
    match data {
        EdgeData::Preference(kind) => q.bind("like_type", kind.code()),
        EdgeData::Rating(rating) => q.bind("rating", *rating),
        EdgeData::Wishlist => {}
    }
    q
}

fn render_match(m: &EdgeMatch) -> CypherQuery {
    let mut wb = WhereBuilder::new();
    let media_node = match &m.anchor {
        Anchor::User(user_id) => {
            wb.add_eq("u", USER_ID_PROPERTY, "user_id", *user_id);
            "m".to_string()
        }
        Anchor::Media(media) => {
            wb.add_eq("m", media.kind.id_property(), "media_id", media.id.as_str());
            format!("m:{}", media.kind.label())
        }
        Anchor::Pair { user_id, media } => {
            wb.add_eq("u", USER_ID_PROPERTY, "user_id", *user_id);
            wb.add_eq("m", media.kind.id_property(), "media_id", media.id.as_str());
            format!("m:{}", media.kind.label())
        }
    };
    wb.add_optional_eq("r", "type", "like_type", m.like_type.map(LikeKind::code));
    wb.add_optional_eq(
        "r",
        "media_type",
        "media_type",
        m.media_type.map(MediaKind::code),
    );

    let mut q = CypherQuery::new(format!(
        "MATCH (u:{user})-[r:{rel}]->({media_node})\n{where_clause}\nRETURN {columns}",
        user = USER_LABEL,
        rel = m.rel.rel_type(),
        where_clause = wb.build(),
        columns = EDGE_COLUMNS,
    ));
    wb.bind_into(&mut q);
    q
}
