use serde::{Deserialize, Serialize};

use super::ids::{AlbumId, TrackId};

/// Represent a track of a submitted album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub album_id: AlbumId,
    pub catalog_album_id: i64,
    pub name: String,
    pub artist: String,
    pub track_number: u32,
    pub duration_ms: u32,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrack {
    pub catalog_album_id: i64,
    pub name: String,
    pub artist: String,
    pub track_number: u32,
    pub duration_ms: u32,
    pub preview_url: Option<String>,
}
