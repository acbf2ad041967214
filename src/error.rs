//! Error taxonomy for the likes graph layer

use thiserror::Error;

/// Neo4j status code raised when a uniqueness constraint rejects a write
const CONSTRAINT_VIOLATION: &str = "Neo.ClientError.Schema.ConstraintValidationFailed";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown media type: {0:?}")]
    UnknownMediaType(String),

    #[error("Unknown like type: {0:?}")]
    UnknownLikeType(String),

    #[error("Unknown wishlist action: {0:?}")]
    UnknownWishlistAction(String),

    #[error("Invalid rating: {0} (ratings must be finite)")]
    InvalidRating(f64),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No ratings recorded for {media_type} {media_id}")]
    NoRatings {
        media_id: String,
        media_type: String,
    },

    #[error("Deadline passed before the operation started")]
    DeadlineExceeded,

    #[error("Graph error: {0}")]
    Graph(#[from] neo4rs::Error),

    #[error("Row decode error: {0}")]
    Decode(#[from] neo4rs::DeError),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Map a driver error, turning constraint violations into `Duplicate`.
    pub(crate) fn from_graph(err: neo4rs::Error, what: impl FnOnce() -> String) -> Self {
        match &err {
            neo4rs::Error::Neo4j(e) if e.code() == CONSTRAINT_VIOLATION => {
                StoreError::Duplicate(what())
            }
            _ => StoreError::Graph(err),
        }
    }

    /// True for caller mistakes (bad codes or values), as opposed to store or lookup failures
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            StoreError::UnknownMediaType(_)
                | StoreError::UnknownLikeType(_)
                | StoreError::UnknownWishlistAction(_)
                | StoreError::InvalidRating(_)
        )
    }
}
