use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;

use crate::{
    config,
    domain::{
        album::{Album, NewAlbum},
        ids::{AlbumId, TrackId, UserId},
        rating::{Rating, Score},
        track::{NewTrack, Track},
        user::User,
    },
    ranking::Snapshot,
    storage::{
        db::{self, datetime_to_i64, f64_to_score, i64_to_datetime},
        error::StorageError,
        schema::tables::*,
    },
};

const ALBUM_COLUMNS: &str =
    "id, catalog_id, title, artist, cover, submitted_by, submitted_by_uid, created_at";
const TRACK_COLUMNS: &str =
    "id, album_id, catalog_album_id, name, artist, track_number, duration_ms, preview_url";
const RATING_COLUMNS: &str = "user_id, username, track_id, album_id, score, created_at";

fn album_from_row(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: AlbumId(row.get(0)?),
        catalog_id: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        cover: row.get(4)?,
        submitted_by: row.get(5)?,
        submitted_by_uid: UserId(row.get(6)?),
        created_at: i64_to_datetime(7, row.get(7)?)?,
    })
}

fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: TrackId(row.get(0)?),
        album_id: AlbumId(row.get(1)?),
        catalog_album_id: row.get(2)?,
        name: row.get(3)?,
        artist: row.get(4)?,
        track_number: row.get(5)?,
        duration_ms: row.get(6)?,
        preview_url: row.get(7)?,
    })
}

fn rating_from_row(row: &Row) -> rusqlite::Result<Rating> {
    Ok(Rating {
        user_id: UserId(row.get(0)?),
        username: row.get(1)?,
        track_id: TrackId(row.get(2)?),
        album_id: AlbumId(row.get(3)?),
        score: f64_to_score(4, row.get(4)?)?,
        created_at: i64_to_datetime(5, row.get(5)?)?,
    })
}

/// What got removed along with an album
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub removed_tracks: usize,
    pub removed_ratings: usize,
}

/// Main structure that implements all storage logic
pub struct Storage {
    pub(crate) db: rusqlite::Connection,
}

impl Storage {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db: rusqlite::Connection = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    /// all albums, newest first
    pub fn list_albums(&self) -> Result<Vec<Album>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {ALBUM_COLUMNS} FROM {ALBUMS} ORDER BY created_at DESC, id DESC"
        ))?;
        let albums = stmt
            .query_map([], album_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    pub fn get_album(&self, album_id: AlbumId) -> Result<Album, StorageError> {
        self.db
            .query_row(
                &format!("SELECT {ALBUM_COLUMNS} FROM {ALBUMS} WHERE id = ?1"),
                params![album_id.0],
                album_from_row,
            )
            .optional()?
            .ok_or(StorageError::AlbumNotFound(album_id))
    }

    /// the album the user submitted, if any
    pub fn album_by_submitter(&self, user: &UserId) -> Result<Option<Album>, StorageError> {
        Ok(self
            .db
            .query_row(
                &format!("SELECT {ALBUM_COLUMNS} FROM {ALBUMS} WHERE submitted_by_uid = ?1"),
                params![user.as_str()],
                album_from_row,
            )
            .optional()?)
    }

    /// tracks of the album in track number order
    pub fn tracks_for_album(&self, album_id: AlbumId) -> Result<Vec<Track>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {TRACK_COLUMNS} FROM {TRACKS} WHERE album_id = ?1 ORDER BY track_number, id"
        ))?;
        let tracks = stmt
            .query_map(params![album_id.0], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    pub fn get_track(&self, track_id: TrackId) -> Result<Track, StorageError> {
        self.db
            .query_row(
                &format!("SELECT {TRACK_COLUMNS} FROM {TRACKS} WHERE id = ?1"),
                params![track_id.0],
                track_from_row,
            )
            .optional()?
            .ok_or(StorageError::TrackNotFound(track_id))
    }

    pub fn ratings_for_album(&self, album_id: AlbumId) -> Result<Vec<Rating>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {RATING_COLUMNS} FROM {RATINGS} WHERE album_id = ?1 ORDER BY rowid"
        ))?;
        let ratings = stmt
            .query_map(params![album_id.0], rating_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ratings)
    }

    /// the scores one user gave to the tracks of an album
    pub fn user_ratings_for_album(
        &self,
        album_id: AlbumId,
        user: &UserId,
    ) -> Result<HashMap<TrackId, Score>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT track_id, score FROM {RATINGS} WHERE album_id = ?1 AND user_id = ?2"
        ))?;
        let scores = stmt
            .query_map(params![album_id.0, user.as_str()], |row| {
                Ok((TrackId(row.get(0)?), f64_to_score(1, row.get(1)?)?))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(scores)
    }

    pub fn submit_album(
        &mut self,
        submitter: &User,
        album: NewAlbum,
        tracks: &[NewTrack],
    ) -> Result<Album, StorageError> {
        self.submit_album_at(Utc::now(), submitter, album, tracks)
    }

    /// Stores an album together with its tracks.
    ///
    /// Each user gets to submit one album, a second one is refused.
    pub(crate) fn submit_album_at(
        &mut self,
        created_at: DateTime<Utc>,
        submitter: &User,
        album: NewAlbum,
        tracks: &[NewTrack],
    ) -> Result<Album, StorageError> {
        let tx = self.db.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                &format!("SELECT id FROM {ALBUMS} WHERE submitted_by_uid = ?1"),
                params![submitter.uid.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StorageError::AlbumAlreadySubmitted(submitter.uid.clone()));
        }

        tx.execute(
            &format!(
                "INSERT INTO {ALBUMS} (catalog_id, title, artist, cover, submitted_by, submitted_by_uid, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                album.catalog_id,
                album.title,
                album.artist,
                album.cover,
                submitter.username,
                submitter.uid.as_str(),
                datetime_to_i64(created_at)
            ],
        )?;
        let album_id = AlbumId(tx.last_insert_rowid());

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {TRACKS} (album_id, catalog_album_id, name, artist, track_number, duration_ms, preview_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ))?;
            for track in tracks {
                stmt.execute(params![
                    album_id.0,
                    track.catalog_album_id,
                    track.name,
                    track.artist,
                    track.track_number,
                    track.duration_ms,
                    track.preview_url
                ])?;
            }
        }

        tx.commit()?;

        log::info!(
            "{} submitted album {} ({} - {}) with {} tracks",
            submitter.username,
            album_id,
            album.artist,
            album.title,
            tracks.len()
        );

        Ok(Album {
            id: album_id,
            catalog_id: album.catalog_id,
            title: album.title,
            artist: album.artist,
            cover: album.cover,
            submitted_by: submitter.username.clone(),
            submitted_by_uid: submitter.uid.clone(),
            created_at: i64_to_datetime(0, datetime_to_i64(created_at))?,
        })
    }

    /// Deletes an album, its tracks and every rating they got.
    ///
    /// All or nothing: either everything is gone or nothing is.
    pub fn delete_album(
        &mut self,
        album_id: AlbumId,
        requester: &UserId,
    ) -> Result<DeleteReport, StorageError> {
        let tx = self.db.transaction()?;

        let owner: Option<String> = tx
            .query_row(
                &format!("SELECT submitted_by_uid FROM {ALBUMS} WHERE id = ?1"),
                params![album_id.0],
                |row| row.get(0),
            )
            .optional()?;

        match owner {
            None => return Err(StorageError::AlbumNotFound(album_id)),
            Some(owner) if owner != requester.as_str() => {
                return Err(StorageError::NotAlbumOwner {
                    album: album_id,
                    user: requester.clone(),
                });
            }
            Some(_) => {}
        }

        // ratings may be tagged with the album or point at one of its tracks
        let removed_ratings = tx.execute(
            &format!(
                "DELETE FROM {RATINGS}
                 WHERE album_id = ?1 OR track_id IN (SELECT id FROM {TRACKS} WHERE album_id = ?1)"
            ),
            params![album_id.0],
        )?;
        let removed_tracks = tx.execute(
            &format!("DELETE FROM {TRACKS} WHERE album_id = ?1"),
            params![album_id.0],
        )?;
        tx.execute(
            &format!("DELETE FROM {ALBUMS} WHERE id = ?1"),
            params![album_id.0],
        )?;

        tx.commit()?;

        log::info!(
            "Deleted album {album_id}: {removed_tracks} tracks, {removed_ratings} ratings"
        );

        Ok(DeleteReport {
            removed_tracks,
            removed_ratings,
        })
    }

    pub fn rate_track(
        &mut self,
        user_id: &UserId,
        username: &str,
        track_id: TrackId,
        score: Score,
    ) -> Result<Rating, StorageError> {
        self.rate_track_at(Utc::now(), user_id, username, track_id, score)
    }

    /// Records a user's score for a track, replacing the previous one
    pub(crate) fn rate_track_at(
        &mut self,
        created_at: DateTime<Utc>,
        user_id: &UserId,
        username: &str,
        track_id: TrackId,
        score: Score,
    ) -> Result<Rating, StorageError> {
        let tx = self.db.transaction()?;

        let album_id: Option<i64> = tx
            .query_row(
                &format!("SELECT album_id FROM {TRACKS} WHERE id = ?1"),
                params![track_id.0],
                |row| row.get(0),
            )
            .optional()?;
        let album_id = AlbumId(album_id.ok_or(StorageError::TrackNotFound(track_id))?);

        tx.execute(
            &format!(
                "INSERT INTO {RATINGS} ({RATING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (user_id, track_id) DO UPDATE SET
                     username = excluded.username,
                     score = excluded.score,
                     created_at = excluded.created_at"
            ),
            params![
                user_id.as_str(),
                username,
                track_id.0,
                album_id.0,
                score.value(),
                datetime_to_i64(created_at)
            ],
        )?;

        tx.commit()?;

        log::debug!("{username} rated track {track_id}: {score}");

        Ok(Rating {
            user_id: user_id.clone(),
            username: username.to_string(),
            track_id,
            album_id,
            score,
            created_at: i64_to_datetime(0, datetime_to_i64(created_at))?,
        })
    }

    /// Reads albums, tracks and ratings at one point in time
    pub fn snapshot(&mut self) -> Result<Snapshot, StorageError> {
        let tx = self.db.transaction()?;

        let snapshot = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {ALBUM_COLUMNS} FROM {ALBUMS} ORDER BY created_at DESC, id DESC"
            ))?;
            let albums = stmt
                .query_map([], album_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = tx.prepare(&format!(
                "SELECT {TRACK_COLUMNS} FROM {TRACKS} ORDER BY album_id, track_number, id"
            ))?;
            let tracks = stmt
                .query_map([], track_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = tx.prepare(&format!(
                "SELECT {RATING_COLUMNS} FROM {RATINGS} ORDER BY rowid"
            ))?;
            let ratings = stmt
                .query_map([], rating_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Snapshot {
                albums,
                tracks,
                ratings,
            }
        };

        tx.commit()?;
        Ok(snapshot)
    }
}
