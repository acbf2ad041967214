//! Likes Manager - the operation set exposed to request handlers
//!
//! Each method resolves the media/like codes it is given, renders its statements,
//! and runs them in exactly one write transaction. Nothing is shared between
//! calls except the backend's connection pool.

use crate::error::{Result, StoreError};
use crate::neo4j::aggregate;
use crate::neo4j::models::*;
use crate::neo4j::query::{Anchor, EdgeData, EdgeMatch, MediaRef, NodeRef, Statement};
use crate::neo4j::schema::{parse_filter, LikeKind, MediaKind, RelKind, WishlistAction};
use crate::neo4j::{Executor, GraphBackend};
use std::sync::Arc;
use std::time::Instant;

/// Manager for like, rating and wishlist relationships
#[derive(Clone)]
pub struct LikesManager {
    executor: Executor,
}

fn media_ref(media_id: &str, media_type: &str) -> Result<MediaRef> {
    Ok(MediaRef::new(media_type.parse::<MediaKind>()?, media_id))
}

fn check_rating(rating: f64) -> Result<f64> {
    if rating.is_finite() {
        Ok(rating)
    } else {
        Err(StoreError::InvalidRating(rating))
    }
}

impl LikesManager {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self {
            executor: Executor::new(backend),
        }
    }

    /// A handle whose operations refuse to start after `deadline`.
    ///
    /// The check happens before a connection is acquired; operations already
    /// running are not interrupted.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            executor: self.executor.with_deadline(deadline),
        }
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    pub async fn create_user(&self, user_id: i64) -> Result<()> {
        self.executor
            .run(Statement::CreateNode(NodeRef::User(user_id)))
            .await?;
        Ok(())
    }

    pub async fn create_media(&self, media_id: &str, media_type: &str) -> Result<()> {
        let media = media_ref(media_id, media_type)?;
        self.executor
            .run(Statement::CreateNode(NodeRef::Media(media)))
            .await?;
        Ok(())
    }

    /// Delete a user and every relationship it has
    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        self.executor
            .run(Statement::DeleteNodeCascade(NodeRef::User(user_id)))
            .await?;
        tracing::info!(user_id, "Deleted user and its relationships");
        Ok(())
    }

    /// Delete a media item and every relationship pointing at it
    pub async fn delete_media(&self, media_id: &str, media_type: &str) -> Result<()> {
        let media = media_ref(media_id, media_type)?;
        self.executor
            .run(Statement::DeleteNodeCascade(NodeRef::Media(media)))
            .await?;
        tracing::info!(media_id, media_type, "Deleted media and its relationships");
        Ok(())
    }

    // ========================================================================
    // Preferences (PREF)
    // ========================================================================

    /// Set the like/dislike/block preference, replacing any previous one
    pub async fn set_like(
        &self,
        user_id: i64,
        media_id: &str,
        media_type: &str,
        like_type: &str,
    ) -> Result<()> {
        let media = media_ref(media_id, media_type)?;
        let like_type: LikeKind = like_type.parse()?;
        self.executor
            .run(Statement::UpsertEdge {
                user_id,
                media,
                data: EdgeData::Preference(like_type),
            })
            .await?;
        Ok(())
    }

    /// Remove the preference; absent preferences are not an error
    pub async fn delete_like(&self, user_id: i64, media_id: &str, media_type: &str) -> Result<()> {
        let media = media_ref(media_id, media_type)?;
        self.executor
            .run(Statement::DeleteEdge {
                rel: RelKind::Preference,
                user_id,
                media,
            })
            .await?;
        Ok(())
    }

    pub async fn get_specific_like(
        &self,
        user_id: i64,
        media_id: &str,
        media_type: &str,
    ) -> Result<LikeView> {
        let media = media_ref(media_id, media_type)?;
        let records = self
            .executor
            .run(Statement::MatchEdges(EdgeMatch::new(
                RelKind::Preference,
                Anchor::Pair { user_id, media },
            )))
            .await?;

        records
            .into_iter()
            .next()
            .map(aggregate::to_like_view)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "like of user {} on {} {}",
                    user_id, media_type, media_id
                ))
            })
    }

    /// A user's preferences grouped by media kind.
    ///
    /// `None` or `""` filters match everything. No matches gives empty groups.
    pub async fn get_user_likes(
        &self,
        user_id: i64,
        media_type: Option<&str>,
        like_type: Option<&str>,
    ) -> Result<UserLikes> {
        let media_type = parse_filter::<MediaKind>(media_type)?;
        let like_type = parse_filter::<LikeKind>(like_type)?;

        let records = self
            .executor
            .run(Statement::MatchEdges(
                EdgeMatch::new(RelKind::Preference, Anchor::User(user_id))
                    .with_media_type(media_type)
                    .with_like_type(like_type),
            ))
            .await?;

        Ok(UserLikes {
            user_id,
            likes: aggregate::group_by_media_kind(records).map(aggregate::to_like_view),
        })
    }

    /// Every user's preference on one media item
    pub async fn get_media_likes(
        &self,
        media_id: &str,
        media_type: &str,
        like_type: Option<&str>,
    ) -> Result<Vec<LikeView>> {
        let media = media_ref(media_id, media_type)?;
        let like_type = parse_filter::<LikeKind>(like_type)?;

        let records = self
            .executor
            .run(Statement::MatchEdges(
                EdgeMatch::new(RelKind::Preference, Anchor::Media(media)).with_like_type(like_type),
            ))
            .await?;

        Ok(records.into_iter().map(aggregate::to_like_view).collect())
    }

    /// Like, rate and (un)wishlist in one go; all or nothing
    pub async fn record_like(&self, like: &NewLike) -> Result<()> {
        let media = media_ref(&like.media_id, &like.media_type)?;
        let like_type: LikeKind = like.like_type.parse()?;
        let rating = like.rating.map(check_rating).transpose()?;

        let mut statements = vec![Statement::UpsertEdge {
            user_id: like.user_id,
            media: media.clone(),
            data: EdgeData::Preference(like_type),
        }];
        if let Some(rating) = rating {
            statements.push(Statement::UpsertEdge {
                user_id: like.user_id,
                media: media.clone(),
                data: EdgeData::Rating(rating),
            });
        }
        statements.push(if like.wishlist {
            Statement::UpsertEdge {
                user_id: like.user_id,
                media,
                data: EdgeData::Wishlist,
            }
        } else {
            Statement::DeleteEdge {
                rel: RelKind::Wishlist,
                user_id: like.user_id,
                media,
            }
        });

        self.executor.run_all(statements).await?;
        Ok(())
    }

    /// Remove preference, rating and wishlist entry for a pair in one transaction
    pub async fn clear_relations(
        &self,
        user_id: i64,
        media_id: &str,
        media_type: &str,
    ) -> Result<()> {
        let media = media_ref(media_id, media_type)?;
        let statements = RelKind::ALL
            .into_iter()
            .map(|rel| Statement::DeleteEdge {
                rel,
                user_id,
                media: media.clone(),
            })
            .collect();
        self.executor.run_all(statements).await?;
        Ok(())
    }

    // ========================================================================
    // Ratings (RTE)
    // ========================================================================

    /// Set a user's rating, replacing any previous one.
    ///
    /// Writing `RATING_SENTINEL` marks the pair as not rated. NaN and
    /// infinities are rejected before any transaction starts.
    pub async fn set_rating(
        &self,
        user_id: i64,
        media_id: &str,
        media_type: &str,
        rating: f64,
    ) -> Result<()> {
        let media = media_ref(media_id, media_type)?;
        let rating = check_rating(rating)?;
        self.executor
            .run(Statement::UpsertEdge {
                user_id,
                media,
                data: EdgeData::Rating(rating),
            })
            .await?;
        Ok(())
    }

    /// Mean rating of a media item, ignoring sentinel ratings
    pub async fn get_average(&self, media_id: &str, media_type: &str) -> Result<AverageRating> {
        let media = media_ref(media_id, media_type)?;
        let records = self
            .executor
            .run(Statement::MatchEdges(EdgeMatch::new(
                RelKind::Rating,
                Anchor::Media(media.clone()),
            )))
            .await?;
        aggregate::average(&media, &records)
    }

    /// One user's rating of a media item
    pub async fn get_rating(&self, media_id: &str, media_type: &str, user_id: i64) -> Result<f64> {
        let media = media_ref(media_id, media_type)?;
        let records = self
            .executor
            .run(Statement::MatchEdges(EdgeMatch::new(
                RelKind::Rating,
                Anchor::Pair { user_id, media },
            )))
            .await?;

        records
            .iter()
            .find_map(EdgeRecord::effective_rating)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "rating of user {} on {} {}",
                    user_id, media_type, media_id
                ))
            })
    }

    // ========================================================================
    // Wishlist (WSH)
    // ========================================================================

    pub async fn add_to_wishlist(&self, user_id: i64, media_id: &str, media_type: &str) -> Result<()> {
        let media = media_ref(media_id, media_type)?;
        self.executor
            .run(Statement::UpsertEdge {
                user_id,
                media,
                data: EdgeData::Wishlist,
            })
            .await?;
        Ok(())
    }

    pub async fn remove_from_wishlist(
        &self,
        user_id: i64,
        media_id: &str,
        media_type: &str,
    ) -> Result<()> {
        let media = media_ref(media_id, media_type)?;
        self.executor
            .run(Statement::DeleteEdge {
                rel: RelKind::Wishlist,
                user_id,
                media,
            })
            .await?;
        Ok(())
    }

    /// Dispatch an `ADD` / `RMV` action code
    pub async fn update_wishlist(
        &self,
        user_id: i64,
        media_id: &str,
        media_type: &str,
        action: &str,
    ) -> Result<()> {
        match action.parse::<WishlistAction>()? {
            WishlistAction::Add => self.add_to_wishlist(user_id, media_id, media_type).await,
            WishlistAction::Remove => {
                self.remove_from_wishlist(user_id, media_id, media_type)
                    .await
            }
        }
    }

    /// Wishlisted media ids grouped by kind
    pub async fn get_wishlist(&self, user_id: i64, media_type: Option<&str>) -> Result<Wishlist> {
        let media_type = parse_filter::<MediaKind>(media_type)?;
        let records = self
            .executor
            .run(Statement::MatchEdges(
                EdgeMatch::new(RelKind::Wishlist, Anchor::User(user_id)).with_media_type(media_type),
            ))
            .await?;

        Ok(Wishlist {
            user_id,
            items: aggregate::group_by_media_kind(records).map(|r| r.media_id),
        })
    }
}
