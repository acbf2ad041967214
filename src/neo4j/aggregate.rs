//! Aggregation of raw edge records into view models

use super::models::{AverageRating, EdgeRecord, LikeView, MediaBuckets};
use super::query::MediaRef;
use crate::error::{Result, StoreError};

/// Partition records by `media_type`, keeping store order inside each bucket
pub fn group_by_media_kind(records: Vec<EdgeRecord>) -> MediaBuckets<EdgeRecord> {
    let mut buckets = MediaBuckets::default();
    for record in records {
        buckets.bucket_mut(record.media_type).push(record);
    }
    buckets
}

/// Mean of the effective ratings of `records`.
///
/// Sentinel and missing ratings are skipped; if nothing is left the average is
/// undefined and `NoRatings` is returned.
pub fn average(media: &MediaRef, records: &[EdgeRecord]) -> Result<AverageRating> {
    let ratings: Vec<f64> = records.iter().filter_map(EdgeRecord::effective_rating).collect();
    if ratings.is_empty() {
        return Err(StoreError::NoRatings {
            media_id: media.id.clone(),
            media_type: media.kind.code().to_string(),
        });
    }

    Ok(AverageRating {
        media_id: media.id.clone(),
        media_type: media.kind,
        avg_rating: ratings.iter().sum::<f64>() / ratings.len() as f64,
        ratings: ratings.len(),
    })
}

/// Narrow a record to its public shape
pub fn to_like_view(record: EdgeRecord) -> LikeView {
    LikeView {
        user_id: record.user_id,
        media_id: record.media_id,
        media_type: record.media_type,
        like_type: record.like_type,
    }
}
