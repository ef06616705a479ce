//! Client for the iTunes Search API

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{
    catalog::{Catalog, CatalogAlbum, CatalogError, CatalogListing, CatalogTrack},
    config::CatalogConfig,
};

/// Body of both `/search` and `/lookup` responses
#[derive(Debug, Deserialize)]
struct ItunesResponse {
    #[serde(default)]
    results: Vec<ItunesResult>,
}

/// The API mixes collections, tracks and artists in one result list
#[derive(Debug, Deserialize)]
#[serde(tag = "wrapperType", rename_all = "lowercase")]
enum ItunesResult {
    Collection(ItunesCollection),
    Track(ItunesTrack),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesCollection {
    collection_id: i64,
    #[serde(default)]
    collection_name: String,
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    artwork_url100: String,
    track_count: Option<u32>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesTrack {
    kind: Option<String>,
    collection_id: i64,
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    track_number: u32,
    #[serde(default)]
    track_time_millis: u32,
    preview_url: Option<String>,
}

impl From<ItunesCollection> for CatalogAlbum {
    fn from(c: ItunesCollection) -> Self {
        Self {
            catalog_id: c.collection_id,
            title: c.collection_name,
            artist: c.artist_name,
            artwork_url: c.artwork_url100,
            track_count: c.track_count,
            release_date: c.release_date,
        }
    }
}

impl From<ItunesTrack> for CatalogTrack {
    fn from(t: ItunesTrack) -> Self {
        Self {
            catalog_album_id: t.collection_id,
            name: t.track_name,
            artist: t.artist_name,
            track_number: t.track_number,
            duration_ms: t.track_time_millis,
            preview_url: t.preview_url,
        }
    }
}

fn collections(results: Vec<ItunesResult>) -> Vec<CatalogAlbum> {
    results
        .into_iter()
        .filter_map(|r| match r {
            ItunesResult::Collection(c) => Some(c.into()),
            _ => None,
        })
        .collect()
}

/// first collection is the album, songs are its tracks, the rest is dropped
fn split_listing(results: Vec<ItunesResult>) -> CatalogListing {
    let mut listing = CatalogListing::default();
    for result in results {
        match result {
            ItunesResult::Collection(c) if listing.album.is_none() => {
                listing.album = Some(c.into());
            }
            ItunesResult::Track(t) if t.kind.as_deref() == Some("song") => {
                listing.tracks.push(t.into());
            }
            _ => {}
        }
    }
    listing
}

pub struct ItunesCatalog {
    http: Client,
    base_url: String,
}

impl ItunesCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// a single attempt, failures are reported to the caller as they are
    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<ItunesResponse, CatalogError> {
        let url = format!("{}/{endpoint}", self.base_url);
        log::debug!("GET {url} {query:?}");

        let response = self.http.get(&url).query(query).send()?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("catalog {url} answered {status}");
            return Err(CatalogError::UpstreamStatus(status));
        }

        Ok(response.json()?)
    }
}

impl Catalog for ItunesCatalog {
    fn search(&self, term: &str) -> Result<Vec<CatalogAlbum>, CatalogError> {
        let response = self.get("search", &[("term", term), ("entity", "album")])?;
        Ok(collections(response.results))
    }

    fn lookup(&self, catalog_id: i64) -> Result<CatalogListing, CatalogError> {
        let id = catalog_id.to_string();
        let response = self.get("lookup", &[("id", id.as_str()), ("entity", "song")])?;
        Ok(split_listing(response.results))
    }
}
