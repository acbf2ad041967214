//! Test helper factories
//!
//! Provides convenience functions for building requests and seeding a
//! `LikesManager` with a known set of relationships.
#![allow(dead_code)]

use crate::likes::LikesManager;
use crate::neo4j::models::NewLike;

/// Build a NewLike with the given fields
pub fn new_like(
    user_id: i64,
    media_id: &str,
    media_type: &str,
    like_type: &str,
    wishlist: bool,
    rating: Option<f64>,
) -> NewLike {
    NewLike {
        user_id,
        media_id: media_id.to_string(),
        media_type: media_type.to_string(),
        like_type: like_type.to_string(),
        wishlist,
        rating,
    }
}

/// Seed four preferences for a user:
/// movies m1 (LK) and m2 (DLK), song s1 (DLK), book b1 (LK)
pub async fn seed_likes(mgr: &LikesManager, user_id: i64) {
    for (media_id, media_type, like_type) in [
        ("m1", "MOV", "LK"),
        ("m2", "MOV", "DLK"),
        ("s1", "SON", "DLK"),
        ("b1", "BOO", "LK"),
    ] {
        mgr.set_like(user_id, media_id, media_type, like_type)
            .await
            .expect("seed like");
    }
}
