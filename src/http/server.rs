use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use log::info;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    config::{HttpConfig, RankingConfig},
    domain::{
        album::Album,
        ids::{AlbumId, TrackId},
        rating::Score,
        track::Track,
        user::User,
    },
    http::error::ApiError,
    ranking::{AlbumStats, Leaderboard, dashboard},
    storage::operations::Storage,
};

/// Set by the identity proxy in front of us
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USERNAME_HEADER: &str = "X-Username";

pub struct HttpServer {
    storage: Arc<Mutex<Storage>>,
    catalog: Box<dyn Catalog>,
    ranking: RankingConfig,
    pub config: HttpConfig,
}

#[derive(Deserialize)]
struct SubmitAlbumRequest {
    catalog_id: i64,
}

#[derive(Deserialize)]
struct RateTrackRequest {
    score: Score,
}

#[derive(Serialize)]
struct AlbumDetailsResponse {
    album: Album,
    tracks: Vec<Track>,
    /// scores the caller gave, empty for anonymous requests
    my_ratings: HashMap<TrackId, Score>,
}

impl HttpServer {
    pub fn new(
        storage: Storage,
        catalog: Box<dyn Catalog>,
        config: HttpConfig,
        ranking: RankingConfig,
    ) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            catalog,
            ranking,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/api/search) => {
                Self::respond(self.search(request))
            },
            (GET) (/api/lookup) => {
                Self::respond(self.lookup(request))
            },
            (GET) (/albums) => {
                Self::respond(self.list_albums())
            },
            (POST) (/albums) => {
                Self::respond(self.submit_album(request))
            },
            (GET) (/albums/{id: i64}) => {
                Self::respond(self.get_album(AlbumId(id), request))
            },
            (DELETE) (/albums/{id: i64}) => {
                Self::respond(self.delete_album(AlbumId(id), request))
            },
            (PUT) (/tracks/{id: i64}/rating) => {
                Self::respond(self.rate_track(TrackId(id), request))
            },
            (GET) (/me/album) => {
                Self::respond(self.my_album(request))
            },
            (GET) (/stats) => {
                Self::respond(self.leaderboard())
            },
            (GET) (/stats/albums/{id: i64}) => {
                Self::respond(self.album_stats(AlbumId(id)))
            },
            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.raw_url());
    }

    fn respond(result: Result<Response, ApiError>) -> Response {
        match result {
            Ok(r) => r,
            Err(e) => e.into_response(),
        }
    }

    fn storage(&self) -> Result<MutexGuard<'_, Storage>, ApiError> {
        self.storage.lock().map_err(|e| {
            log::error!("Could not access storage under lock: {e}");
            ApiError::Internal("internal server error".into())
        })
    }

    /// caller identity, if the identity proxy supplied one
    fn identity(request: &Request) -> Option<User> {
        let uid = request.header(USER_ID_HEADER).filter(|uid| !uid.is_empty())?;
        let username = request
            .header(USERNAME_HEADER)
            .filter(|name| !name.is_empty())
            .unwrap_or(uid);
        Some(User::new(uid, username))
    }

    fn require_identity(request: &Request) -> Result<User, ApiError> {
        Self::identity(request)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))
    }

    fn json_body<T: serde::de::DeserializeOwned>(request: &Request) -> Result<T, ApiError> {
        rouille::input::json_input(request)
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
    }

    // --------------------------------------------------
    // Catalog proxy
    // --------------------------------------------------

    fn search(&self, request: &Request) -> Result<Response, ApiError> {
        let query = request
            .get_param("q")
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing query".into()))?;

        let albums = self.catalog.search(&query)?;
        Ok(Response::json(&albums))
    }

    fn lookup(&self, request: &Request) -> Result<Response, ApiError> {
        let id = request
            .get_param("id")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing Album ID".into()))?;
        let id = id
            .parse::<i64>()
            .map_err(|_| ApiError::BadRequest(format!("invalid album id {id}")))?;

        let listing = self.catalog.lookup(id)?;
        Ok(Response::json(&listing))
    }

    // --------------------------------------------------
    // Albums and ratings
    // --------------------------------------------------

    fn list_albums(&self) -> Result<Response, ApiError> {
        let snapshot = self.storage()?.snapshot()?;
        Ok(Response::json(&dashboard(&snapshot.albums, &snapshot.ratings)))
    }

    fn get_album(&self, album_id: AlbumId, request: &Request) -> Result<Response, ApiError> {
        let storage = self.storage()?;
        let album = storage.get_album(album_id)?;
        let tracks = storage.tracks_for_album(album_id)?;
        let my_ratings = match Self::identity(request) {
            Some(user) => storage.user_ratings_for_album(album_id, &user.uid)?,
            None => HashMap::new(),
        };

        Ok(Response::json(&AlbumDetailsResponse {
            album,
            tracks,
            my_ratings,
        }))
    }

    /// Looks the album up in the catalog and stores it with its tracks
    fn submit_album(&self, request: &Request) -> Result<Response, ApiError> {
        let user = Self::require_identity(request)?;
        let body: SubmitAlbumRequest = Self::json_body(request)?;

        // refuse early, before bothering the catalog
        if let Some(existing) = self.storage()?.album_by_submitter(&user.uid)? {
            return Err(ApiError::Conflict(format!(
                "{} already submitted album {}",
                user.username, existing.id
            )));
        }

        let listing = self.catalog.lookup(body.catalog_id)?;
        let (album, tracks) = listing.into_submission().ok_or_else(|| {
            ApiError::NotFound(format!("album {} not found in catalog", body.catalog_id))
        })?;

        let album = self.storage()?.submit_album(&user, album, &tracks)?;
        Ok(Response::json(&album).with_status_code(201))
    }

    fn delete_album(&self, album_id: AlbumId, request: &Request) -> Result<Response, ApiError> {
        let user = Self::require_identity(request)?;
        let report = self.storage()?.delete_album(album_id, &user.uid)?;
        Ok(Response::json(&report))
    }

    fn rate_track(&self, track_id: TrackId, request: &Request) -> Result<Response, ApiError> {
        let user = Self::require_identity(request)?;
        let body: RateTrackRequest = Self::json_body(request)?;

        let rating = self
            .storage()?
            .rate_track(&user.uid, &user.username, track_id, body.score)?;
        Ok(Response::json(&rating))
    }

    fn my_album(&self, request: &Request) -> Result<Response, ApiError> {
        let user = Self::require_identity(request)?;
        match self.storage()?.album_by_submitter(&user.uid)? {
            Some(album) => Ok(Response::json(&album)),
            None => Err(ApiError::NotFound(format!(
                "{} has not submitted an album",
                user.username
            ))),
        }
    }

    // --------------------------------------------------
    // Statistics
    // --------------------------------------------------

    fn leaderboard(&self) -> Result<Response, ApiError> {
        let snapshot = self.storage()?.snapshot()?;
        let leaderboard = Leaderboard::compute(&snapshot, self.ranking.masterpiece_threshold);
        Ok(Response::json(&leaderboard))
    }

    fn album_stats(&self, album_id: AlbumId) -> Result<Response, ApiError> {
        let storage = self.storage()?;
        let album = storage.get_album(album_id)?;
        let tracks = storage.tracks_for_album(album_id)?;
        let ratings = storage.ratings_for_album(album_id)?;

        Ok(Response::json(&AlbumStats::compute(album, &tracks, &ratings)))
    }
}

#[cfg(test)]
pub fn parse_json_response(response: rouille::Response) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
