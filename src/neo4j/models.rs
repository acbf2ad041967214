//! Relationship records and the view models built from them

use super::schema::{LikeKind, MediaKind};
use serde::{Deserialize, Serialize};

/// Stored rating value meaning "not rated"
pub const RATING_SENTINEL: f64 = -1.0;

// ============================================================================
// Raw records (one per matched relationship)
// ============================================================================

/// Properties of a single User -> Media relationship as returned by the store.
///
/// `media_id`, `media_type` and `user_id` are denormalized onto every edge, so a
/// record never needs the endpoint nodes to be read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub user_id: i64,
    pub media_id: String,
    pub media_type: MediaKind,
    /// Only set on PREF edges
    pub like_type: Option<LikeKind>,
    /// Raw stored rating, only set on RTE edges. May hold the sentinel.
    pub rating: Option<f64>,
}

impl EdgeRecord {
    /// The rating, or `None` when absent, equal to the sentinel, or not finite
    pub fn effective_rating(&self) -> Option<f64> {
        self.rating.filter(|r| r.is_finite() && *r != RATING_SENTINEL)
    }
}

// ============================================================================
// View models
// ============================================================================

/// Public shape of a single user/media relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeView {
    pub user_id: i64,
    pub media_id: String,
    #[serde(rename = "type")]
    pub media_type: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_type: Option<LikeKind>,
}

/// Items partitioned by media kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaBuckets<T> {
    pub movies: Vec<T>,
    pub songs: Vec<T>,
    pub books: Vec<T>,
}

impl<T> Default for MediaBuckets<T> {
    fn default() -> Self {
        Self {
            movies: Vec::new(),
            songs: Vec::new(),
            books: Vec::new(),
        }
    }
}

impl<T> MediaBuckets<T> {
    pub fn bucket(&self, kind: MediaKind) -> &[T] {
        match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Song => &self.songs,
            MediaKind::Book => &self.books,
        }
    }

    pub fn bucket_mut(&mut self, kind: MediaKind) -> &mut Vec<T> {
        match kind {
            MediaKind::Movie => &mut self.movies,
            MediaKind::Song => &mut self.songs,
            MediaKind::Book => &mut self.books,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.songs.is_empty() && self.books.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movies.len() + self.songs.len() + self.books.len()
    }

    /// Apply `f` to every item, keeping the partition
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> MediaBuckets<U> {
        MediaBuckets {
            movies: self.movies.into_iter().map(&mut f).collect(),
            songs: self.songs.into_iter().map(&mut f).collect(),
            books: self.books.into_iter().map(&mut f).collect(),
        }
    }
}

/// A user's preferences grouped by media kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLikes {
    #[serde(rename = "id")]
    pub user_id: i64,
    #[serde(flatten)]
    pub likes: MediaBuckets<LikeView>,
}

/// A user's wishlist as media ids grouped by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    #[serde(rename = "id")]
    pub user_id: i64,
    #[serde(flatten)]
    pub items: MediaBuckets<String>,
}

impl Wishlist {
    pub fn contains(&self, kind: MediaKind, media_id: &str) -> bool {
        self.items.bucket(kind).iter().any(|id| id == media_id)
    }
}

/// Aggregate rating of a media item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageRating {
    #[serde(rename = "id")]
    pub media_id: String,
    #[serde(rename = "type")]
    pub media_type: MediaKind,
    pub avg_rating: f64,
    /// Number of ratings that went into the average
    pub ratings: usize,
}

// ============================================================================
// Requests
// ============================================================================

/// Everything a user can say about one media item in a single call.
///
/// Codes are kept as strings so they can be validated by the schema resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLike {
    pub user_id: i64,
    pub media_id: String,
    pub media_type: String,
    pub like_type: String,
    #[serde(default)]
    pub wishlist: bool,
    #[serde(default)]
    pub rating: Option<f64>,
}
