//! Album search and track listings from an external music catalog

use serde::{Deserialize, Serialize};

use crate::domain::{album::NewAlbum, track::NewTrack};

pub mod error;
pub mod itunes;

pub use error::CatalogError;
pub use itunes::ItunesCatalog;

/// An album as found by a catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogAlbum {
    pub catalog_id: i64,
    pub title: String,
    pub artist: String,
    pub artwork_url: String,
    pub track_count: Option<u32>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub catalog_album_id: i64,
    pub name: String,
    pub artist: String,
    pub track_number: u32,
    pub duration_ms: u32,
    pub preview_url: Option<String>,
}

/// Result of looking up one album: the album itself and its songs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogListing {
    pub album: Option<CatalogAlbum>,
    pub tracks: Vec<CatalogTrack>,
}

impl CatalogListing {
    /// What gets stored when a user submits this album.
    ///
    /// `None` if the catalog did not return the album itself.
    pub fn into_submission(self) -> Option<(NewAlbum, Vec<NewTrack>)> {
        let album = self.album?;
        let tracks = self
            .tracks
            .into_iter()
            .map(|t| NewTrack {
                catalog_album_id: t.catalog_album_id,
                name: t.name,
                artist: t.artist,
                track_number: t.track_number,
                duration_ms: t.duration_ms,
                preview_url: t.preview_url,
            })
            .collect();

        Some((
            NewAlbum {
                catalog_id: album.catalog_id,
                title: album.title,
                artist: album.artist,
                cover: hires_artwork(&album.artwork_url),
            },
            tracks,
        ))
    }
}

/// The catalog answers with 100px artwork, the same image exists in 600px
pub fn hires_artwork(url: &str) -> String {
    url.replace("100x100", "600x600")
}

/// A read-only music catalog
pub trait Catalog: Send + Sync {
    /// albums matching free text
    fn search(&self, term: &str) -> Result<Vec<CatalogAlbum>, CatalogError>;

    /// one album and its full track listing
    fn lookup(&self, catalog_id: i64) -> Result<CatalogListing, CatalogError>;
}
