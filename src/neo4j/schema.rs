//! Schema resolution: media/like/relation codes to graph labels and properties
//!
//! Labels and relationship types cannot be bound as Cypher parameters, so they
//! only ever come from the closed enums in this module. Every value supplied by
//! a caller travels as a bound parameter (see `query.rs`).

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label of the user node
pub const USER_LABEL: &str = "User";
/// Identifying property of the user node
pub const USER_ID_PROPERTY: &str = "id_user";

/// The three kinds of media node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "MOV")]
    Movie,
    #[serde(rename = "SON")]
    Song,
    #[serde(rename = "BOO")]
    Book,
}

struct MediaSchema {
    kind: MediaKind,
    code: &'static str,
    label: &'static str,
    id_property: &'static str,
}

static MEDIA_SCHEMA: [MediaSchema; 3] = [
    MediaSchema {
        kind: MediaKind::Movie,
        code: "MOV",
        label: "Movie",
        id_property: "id_movie",
    },
    MediaSchema {
        kind: MediaKind::Song,
        code: "SON",
        label: "Song",
        id_property: "id_song",
    },
    MediaSchema {
        kind: MediaKind::Book,
        code: "BOO",
        label: "Book",
        id_property: "id_book",
    },
];

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Movie, MediaKind::Song, MediaKind::Book];

    fn schema(self) -> &'static MediaSchema {
        // MEDIA_SCHEMA is indexed in declaration order
        &MEDIA_SCHEMA[self as usize]
    }

    /// Wire code (`MOV`, `SON`, `BOO`)
    pub fn code(self) -> &'static str {
        self.schema().code
    }

    /// Node label
    pub fn label(self) -> &'static str {
        self.schema().label
    }

    /// Name of the identifying node property
    pub fn id_property(self) -> &'static str {
        self.schema().id_property
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MediaKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MEDIA_SCHEMA
            .iter()
            .find(|m| m.code == s)
            .map(|m| m.kind)
            .ok_or_else(|| StoreError::UnknownMediaType(s.to_string()))
    }
}

/// Resolve a media-type code to its `(label, id_property)` pair.
///
/// Unrecognized codes are an error; there is no fallback label.
pub fn resolve(code: &str) -> Result<(&'static str, &'static str), StoreError> {
    let kind: MediaKind = code.parse()?;
    Ok((kind.label(), kind.id_property()))
}

/// Preference carried by a PREF edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LikeKind {
    #[serde(rename = "LK")]
    Like,
    #[serde(rename = "DLK")]
    Dislike,
    #[serde(rename = "BLK")]
    Block,
}

impl LikeKind {
    pub fn code(self) -> &'static str {
        match self {
            LikeKind::Like => "LK",
            LikeKind::Dislike => "DLK",
            LikeKind::Block => "BLK",
        }
    }
}

impl fmt::Display for LikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LikeKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LK" => Ok(LikeKind::Like),
            "DLK" => Ok(LikeKind::Dislike),
            "BLK" => Ok(LikeKind::Block),
            other => Err(StoreError::UnknownLikeType(other.to_string())),
        }
    }
}

/// User -> Media relationship types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelKind {
    /// Like / dislike / block
    Preference,
    /// Numeric rating
    Rating,
    /// Wishlist membership
    Wishlist,
}

impl RelKind {
    pub const ALL: [RelKind; 3] = [RelKind::Preference, RelKind::Rating, RelKind::Wishlist];

    /// Relationship type name in the graph
    pub fn rel_type(self) -> &'static str {
        match self {
            RelKind::Preference => "PREF",
            RelKind::Rating => "RTE",
            RelKind::Wishlist => "WSH",
        }
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rel_type())
    }
}

/// Wishlist action codes accepted at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistAction {
    Add,
    Remove,
}

impl FromStr for WishlistAction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(WishlistAction::Add),
            "RMV" => Ok(WishlistAction::Remove),
            other => Err(StoreError::UnknownWishlistAction(other.to_string())),
        }
    }
}

/// Parse an optional filter code; `None` and `""` both mean "no filter".
pub fn parse_filter<T>(code: Option<&str>) -> Result<Option<T>, StoreError>
where
    T: FromStr<Err = StoreError>,
{
    match code {
        None | Some("") => Ok(None),
        Some(code) => code.parse().map(Some),
    }
}
