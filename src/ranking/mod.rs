//! Aggregation and ranking of ratings.
//!
//! Everything here is a pure function of a [`Snapshot`]: nothing is cached
//! between calls and the inputs are never modified, so views can be
//! recomputed from scratch whenever the data changes.

use serde::Serialize;

use crate::domain::{album::Album, rating::Rating, track::Track};

pub mod aggregate;
pub mod rank;
pub mod stars;

pub use aggregate::{Tally, album_mean_for_dashboard, average_score};
pub use rank::{
    MASTERPIECE_THRESHOLD, RankedAlbum, RankedTrack, best_track_globally, rank_albums_globally,
    rank_tracks_within_album, rank_voted_tracks, select_masterpieces,
};
pub use stars::star_score;

/// Everything the views are computed from, fully loaded in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
    pub ratings: Vec<Rating>,
}

/// Best rated track, along with the cover of its album
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChampionTrack {
    #[serde(flatten)]
    pub ranked: RankedTrack,
    pub cover: String,
}

/// The hall of fame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub best_track: Option<ChampionTrack>,
    pub top_albums: Vec<RankedAlbum>,
    pub masterpieces: Vec<RankedAlbum>,
}

impl Leaderboard {
    pub fn compute(snapshot: &Snapshot, masterpiece_threshold: f64) -> Self {
        let top_albums = rank_albums_globally(&snapshot.albums, &snapshot.ratings);
        let voted_tracks = rank_voted_tracks(&snapshot.tracks, &snapshot.ratings);
        let masterpieces = select_masterpieces(&top_albums, &voted_tracks, masterpiece_threshold);

        let best_track = voted_tracks.into_iter().next().map(|ranked| {
            let cover = snapshot
                .albums
                .iter()
                .find(|album| album.id == ranked.track.album_id)
                .map(|album| album.cover.clone())
                .unwrap_or_default();
            ChampionTrack { ranked, cover }
        });

        Self {
            best_track,
            top_albums,
            masterpieces,
        }
    }
}

/// Statistics page of a single album
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumStats {
    pub album: Album,
    pub average_score: f64,
    pub vote_count: usize,
    pub ranked_tracks: Vec<RankedTrack>,
    /// only set once the top track has at least one vote
    pub best_track: Option<RankedTrack>,
}

impl AlbumStats {
    pub fn compute(album: Album, tracks: &[Track], ratings: &[Rating]) -> Self {
        let tally = Tally::of(ratings.iter().filter(|r| r.album_id == album.id));
        let ranked_tracks = rank_tracks_within_album(tracks, ratings);
        let best_track = ranked_tracks
            .first()
            .filter(|t| t.vote_count > 0)
            .cloned();

        Self {
            album,
            average_score: tally.average_score,
            vote_count: tally.vote_count,
            ranked_tracks,
            best_track,
        }
    }
}

/// An album card of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardEntry {
    #[serde(flatten)]
    pub album: Album,
    /// `None` until somebody rates the album
    pub rating: Option<f64>,
}

/// Dashboard cards, in the order the albums are given
pub fn dashboard(albums: &[Album], ratings: &[Rating]) -> Vec<DashboardEntry> {
    albums
        .iter()
        .map(|album| DashboardEntry {
            album: album.clone(),
            rating: album_mean_for_dashboard(ratings, album.id),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::domain::{
        ids::{AlbumId, TrackId, UserId},
        rating::Score,
    };

    fn epoch(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    pub fn album(id: i64, title: &str) -> Album {
        Album {
            id: AlbumId(id),
            catalog_id: 1000 + id,
            title: title.to_string(),
            artist: "Some Artist".to_string(),
            cover: format!("https://covers.example/{id}.jpg"),
            submitted_by: format!("user{id}"),
            submitted_by_uid: UserId::new(format!("uid{id}")),
            created_at: epoch(id),
        }
    }

    pub fn track(id: i64, album_id: i64, track_number: u32, name: &str) -> Track {
        Track {
            id: TrackId(id),
            album_id: AlbumId(album_id),
            catalog_album_id: 1000 + album_id,
            name: name.to_string(),
            artist: "Some Artist".to_string(),
            track_number,
            duration_ms: 180_000,
            preview_url: None,
        }
    }

    pub fn rating(user: &str, track_id: i64, album_id: i64, score: f64) -> Rating {
        Rating {
            user_id: UserId::new(user),
            username: user.to_uppercase(),
            track_id: TrackId(track_id),
            album_id: AlbumId(album_id),
            score: Score::new(score).unwrap(),
            created_at: epoch(0),
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            albums: vec![album(1, "first"), album(2, "second"), album(3, "unrated")],
            tracks: vec![
                track(10, 1, 1, "opener"),
                track(11, 1, 2, "closer"),
                track(20, 2, 1, "single"),
                track(30, 3, 1, "ignored"),
            ],
            ratings: vec![
                rating("u1", 10, 1, 3.0),
                rating("u2", 10, 1, 3.5),
                rating("u1", 11, 1, 2.0),
                rating("u1", 20, 2, 5.0),
                rating("u2", 20, 2, 4.5),
            ],
        }
    }

    #[test]
    fn test_leaderboard() {
        let board = Leaderboard::compute(&sample_snapshot(), MASTERPIECE_THRESHOLD);

        let best = board.best_track.expect("there are votes");
        assert_eq!(best.ranked.track.name, "single");
        assert_eq!(best.ranked.average_score, 4.75);
        assert_eq!(best.cover, "https://covers.example/2.jpg");

        let top = board
            .top_albums
            .iter()
            .map(|a| (a.album.title.as_str(), a.vote_count))
            .collect::<Vec<_>>();
        assert_eq!(top, vec![("second", 2), ("first", 3)]);

        assert_eq!(board.masterpieces.len(), 1);
        assert_eq!(board.masterpieces[0].album.title, "second");
    }

    #[test]
    fn test_leaderboard_without_ratings() {
        let mut snapshot = sample_snapshot();
        snapshot.ratings.clear();

        let board = Leaderboard::compute(&snapshot, MASTERPIECE_THRESHOLD);

        assert_eq!(board.best_track, None);
        assert!(board.top_albums.is_empty());
        assert!(board.masterpieces.is_empty());
    }

    #[test]
    fn test_leaderboard_is_idempotent() {
        let snapshot = sample_snapshot();

        let first = Leaderboard::compute(&snapshot, MASTERPIECE_THRESHOLD);
        let second = Leaderboard::compute(&snapshot, MASTERPIECE_THRESHOLD);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_album_stats() {
        let snapshot = sample_snapshot();
        let tracks = &snapshot.tracks[0..2];

        let stats = AlbumStats::compute(album(1, "first"), tracks, &snapshot.ratings);

        assert_eq!(stats.vote_count, 3);
        assert_eq!(stats.average_score, 8.5 / 3.0);
        assert_eq!(stats.ranked_tracks.len(), 2);
        assert_eq!(stats.ranked_tracks[0].track.name, "opener");
        assert_eq!(stats.ranked_tracks[0].star_score, 3.5);
        assert_eq!(
            stats.best_track.map(|t| t.track.name),
            Some("opener".to_string())
        );
    }

    #[test]
    fn test_album_stats_unrated() {
        let snapshot = sample_snapshot();
        let tracks = &snapshot.tracks[3..];

        let stats = AlbumStats::compute(album(3, "unrated"), tracks, &snapshot.ratings);

        assert_eq!(stats.vote_count, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.ranked_tracks.len(), 1);
        assert_eq!(stats.best_track, None);
    }

    #[test]
    fn test_dashboard_distinguishes_unrated() {
        let snapshot = sample_snapshot();

        let entries = dashboard(&snapshot.albums, &snapshot.ratings);

        let ratings = entries.iter().map(|e| e.rating).collect::<Vec<_>>();
        assert_eq!(ratings, vec![Some(8.5 / 3.0), Some(4.75), None]);

        let json = serde_json::to_value(&entries[2]).unwrap();
        assert!(json["rating"].is_null());
        assert_eq!(json["title"], "unrated");
    }
}
