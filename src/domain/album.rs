use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AlbumId, UserId};

/// An album submitted by one member of the group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    /// collection id in the external catalog
    pub catalog_id: i64,
    pub title: String,
    pub artist: String,
    pub cover: String,
    pub submitted_by: String,
    pub submitted_by_uid: UserId,
    pub created_at: DateTime<Utc>,
}

/// Album data as it comes from the catalog, before it gets an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlbum {
    pub catalog_id: i64,
    pub title: String,
    pub artist: String,
    pub cover: String,
}
