//! Neo4j storage layer for the likes graph

pub mod aggregate;
pub mod client;
pub mod executor;
mod impl_graph_backend;
pub mod models;
pub mod query;
pub mod schema;
pub mod traits;

pub use client::Neo4jClient;
pub use executor::Executor;
pub use models::*;
pub use schema::{LikeKind, MediaKind, RelKind, WishlistAction};
pub use traits::{GraphBackend, GraphTransaction};

#[cfg(test)]
pub(crate) mod mock;
