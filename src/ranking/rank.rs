//! Ranking of tracks and albums by average score

use std::collections::HashSet;

use serde::Serialize;

use crate::{
    domain::{album::Album, rating::Rating, track::Track},
    ranking::{
        aggregate::{Tally, group_by, tally_for},
        stars::star_score,
    },
};

/// An album containing a track rated at least this high is a masterpiece
pub const MASTERPIECE_THRESHOLD: f64 = 4.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTrack {
    #[serde(flatten)]
    pub track: Track,
    pub average_score: f64,
    pub vote_count: usize,
    pub star_score: f64,
}

impl RankedTrack {
    fn new(track: Track, tally: Tally) -> Self {
        Self {
            track,
            average_score: tally.average_score,
            vote_count: tally.vote_count,
            star_score: star_score(tally.average_score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAlbum {
    #[serde(flatten)]
    pub album: Album,
    pub average_score: f64,
    pub vote_count: usize,
}

/// Stable sort, best score first. Equal scores keep their input order.
fn sort_by_score_desc<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

fn rank_tracks(tracks: &[Track], ratings: &[Rating]) -> Vec<RankedTrack> {
    let by_track = group_by(ratings, |r| r.track_id);
    tracks
        .iter()
        .map(|track| RankedTrack::new(track.clone(), tally_for(&by_track, &track.id)))
        .collect()
}

/// Ranks the tracks of one album.
///
/// Every track is in the output, tracks without votes sink to the bottom
/// in the order they were given.
pub fn rank_tracks_within_album(tracks: &[Track], ratings: &[Rating]) -> Vec<RankedTrack> {
    let mut ranked = rank_tracks(tracks, ratings);
    sort_by_score_desc(&mut ranked, |t| t.average_score);
    ranked
}

/// Ranks all tracks that got at least one vote
pub fn rank_voted_tracks(tracks: &[Track], ratings: &[Rating]) -> Vec<RankedTrack> {
    let mut ranked = rank_tracks(tracks, ratings);
    ranked.retain(|t| t.vote_count > 0);
    sort_by_score_desc(&mut ranked, |t| t.average_score);
    ranked
}

/// Ranks albums by the mean of every rating they received.
///
/// The mean is taken over individual ratings, not over track averages, so
/// albums with more votes weigh them accordingly. Albums nobody voted on
/// are left out.
pub fn rank_albums_globally(albums: &[Album], ratings: &[Rating]) -> Vec<RankedAlbum> {
    let by_album = group_by(ratings, |r| r.album_id);
    let mut ranked = albums
        .iter()
        .filter_map(|album| {
            let tally = tally_for(&by_album, &album.id);
            (tally.vote_count > 0).then(|| RankedAlbum {
                album: album.clone(),
                average_score: tally.average_score,
                vote_count: tally.vote_count,
            })
        })
        .collect::<Vec<_>>();
    sort_by_score_desc(&mut ranked, |a| a.average_score);
    ranked
}

/// best rated track of all albums, if anybody voted at all
pub fn best_track_globally(tracks: &[Track], ratings: &[Rating]) -> Option<RankedTrack> {
    rank_voted_tracks(tracks, ratings).into_iter().next()
}

/// Albums of `ranked_albums` with at least one track scoring `threshold` or more.
///
/// The order of `ranked_albums` is kept. The album's own mean does not matter.
pub fn select_masterpieces(
    ranked_albums: &[RankedAlbum],
    ranked_tracks: &[RankedTrack],
    threshold: f64,
) -> Vec<RankedAlbum> {
    let qualifying = ranked_tracks
        .iter()
        .filter(|t| t.average_score >= threshold)
        .map(|t| t.track.album_id)
        .collect::<HashSet<_>>();

    ranked_albums
        .iter()
        .filter(|a| qualifying.contains(&a.album.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ids::{AlbumId, TrackId},
        ranking::tests::{album, rating, track},
    };

    fn names(ranked: &[RankedTrack]) -> Vec<&str> {
        ranked.iter().map(|t| t.track.name.as_str()).collect()
    }

    fn album_ids(ranked: &[RankedAlbum]) -> Vec<i64> {
        ranked.iter().map(|a| a.album.id.0).collect()
    }

    #[test]
    fn test_scenario_two_tracks_one_album() {
        let tracks = vec![track(1, 100, 1, "A"), track(2, 100, 2, "B")];
        let albums = vec![album(100, "X")];
        let ratings = vec![
            rating("u1", 1, 100, 5.0),
            rating("u2", 1, 100, 3.0),
            rating("u1", 2, 100, 4.0),
        ];

        let ranked = rank_tracks_within_album(&tracks, &ratings);
        assert_eq!(ranked[0].average_score, 4.0);
        assert_eq!(ranked[1].average_score, 4.0);
        // tie keeps input order
        assert_eq!(names(&ranked), vec!["A", "B"]);
        assert_eq!(ranked[0].vote_count, 2);
        assert_eq!(ranked[1].vote_count, 1);

        let albums = rank_albums_globally(&albums, &ratings);
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].average_score, 4.0);
        assert_eq!(albums[0].vote_count, 3);
    }

    #[test]
    fn test_within_album_sorted_desc_with_star_score() {
        let tracks = vec![track(1, 1, 1, "low"), track(2, 1, 2, "high"), track(3, 1, 3, "mid")];
        let ratings = vec![
            rating("u1", 1, 1, 2.0),
            rating("u1", 2, 1, 5.0),
            rating("u2", 2, 1, 4.5),
            rating("u1", 3, 1, 3.5),
            rating("u2", 3, 1, 4.0),
        ];

        let ranked = rank_tracks_within_album(&tracks, &ratings);

        assert_eq!(names(&ranked), vec!["high", "mid", "low"]);
        assert_eq!(ranked[0].average_score, 4.75);
        assert_eq!(ranked[0].star_score, 5.0);
        assert_eq!(ranked[1].star_score, 4.0);
        assert_eq!(ranked[2].star_score, 2.0);
    }

    #[test]
    fn test_unvoted_tracks_last_in_input_order() {
        let tracks = vec![
            track(1, 1, 1, "one"),
            track(2, 1, 2, "two"),
            track(3, 1, 3, "three"),
            track(4, 1, 4, "four"),
        ];
        let ratings = vec![rating("u1", 3, 1, 1.0)];

        let ranked = rank_tracks_within_album(&tracks, &ratings);

        assert_eq!(names(&ranked), vec!["three", "one", "two", "four"]);
        for unvoted in &ranked[1..] {
            assert_eq!(unvoted.vote_count, 0);
            assert_eq!(unvoted.average_score, 0.0);
            assert_eq!(unvoted.star_score, 0.0);
        }
    }

    #[test]
    fn test_unrated_album_keeps_tracks_but_not_in_global_ranking() {
        let albums = vec![album(1, "rated"), album(2, "unrated")];
        let tracks = vec![track(10, 1, 1, "a"), track(20, 2, 1, "b"), track(21, 2, 2, "c")];
        let ratings = vec![rating("u1", 10, 1, 3.0)];

        let global = rank_albums_globally(&albums, &ratings);
        assert_eq!(album_ids(&global), vec![1]);

        let album_tracks = tracks
            .iter()
            .filter(|t| t.album_id == AlbumId(2))
            .cloned()
            .collect::<Vec<_>>();
        let detail = rank_tracks_within_album(&album_tracks, &ratings);
        assert_eq!(names(&detail), vec!["b", "c"]);
    }

    #[test]
    fn test_global_ranking_never_has_zero_votes() {
        let albums = vec![album(1, "a"), album(2, "b"), album(3, "c")];
        let ratings = vec![rating("u1", 10, 3, 2.0), rating("u1", 20, 1, 4.0)];

        let global = rank_albums_globally(&albums, &ratings);

        assert_eq!(album_ids(&global), vec![1, 3]);
        assert!(global.iter().all(|a| a.vote_count > 0));
    }

    #[test]
    fn test_global_ranking_is_vote_weighted() {
        let albums = vec![album(1, "a")];
        // track means are 5 and 2, mean of means would be 3.5
        let ratings = vec![
            rating("u1", 10, 1, 5.0),
            rating("u1", 11, 1, 2.0),
            rating("u2", 11, 1, 2.0),
            rating("u3", 11, 1, 2.0),
        ];

        let global = rank_albums_globally(&albums, &ratings);

        assert_eq!(global[0].average_score, 11.0 / 4.0);
        assert_eq!(global[0].vote_count, 4);
    }

    #[test]
    fn test_global_ranking_ties_keep_input_order() {
        let albums = vec![album(5, "e"), album(3, "c"), album(4, "d")];
        let ratings = vec![
            rating("u1", 1, 3, 3.0),
            rating("u1", 2, 4, 4.0),
            rating("u1", 3, 5, 3.0),
        ];

        let global = rank_albums_globally(&albums, &ratings);

        assert_eq!(album_ids(&global), vec![4, 5, 3]);
    }

    #[test]
    fn test_orphan_ratings_are_ignored() {
        let albums = vec![album(1, "a")];
        let tracks = vec![track(10, 1, 1, "a1")];
        let ratings = vec![
            rating("u1", 10, 1, 4.0),
            rating("u1", 99, 42, 1.0), // unknown track and album
        ];

        let ranked = rank_tracks_within_album(&tracks, &ratings);
        assert_eq!(ranked[0].vote_count, 1);

        let global = rank_albums_globally(&albums, &ratings);
        assert_eq!(album_ids(&global), vec![1]);
        assert_eq!(global[0].average_score, 4.0);
    }

    #[test]
    fn test_best_track_globally() {
        let tracks = vec![track(1, 1, 1, "x"), track(2, 2, 1, "y"), track(3, 2, 2, "z")];
        let ratings = vec![
            rating("u1", 1, 1, 3.0),
            rating("u1", 3, 2, 4.5),
            rating("u2", 3, 2, 4.0),
        ];

        let best = best_track_globally(&tracks, &ratings).expect("someone voted");

        assert_eq!(best.track.id, TrackId(3));
        assert_eq!(best.average_score, 4.25);
    }

    #[test]
    fn test_best_track_none_without_votes() {
        let tracks = vec![track(1, 1, 1, "x")];

        assert_eq!(best_track_globally(&tracks, &[]), None);
        assert_eq!(best_track_globally(&[], &[]), None);
    }

    #[test]
    fn test_masterpieces() {
        let albums = vec![album(1, "one great song"), album(2, "consistent"), album(3, "great mean")];
        let tracks = vec![
            track(10, 1, 1, "great"),
            track(11, 1, 2, "meh"),
            track(20, 2, 1, "good"),
            track(21, 2, 2, "good too"),
            track(30, 3, 1, "solid"),
            track(31, 3, 2, "solid too"),
        ];
        let ratings = vec![
            // album 1 tracks: 4.6, 2.0
            rating("u1", 10, 1, 5.0),
            rating("u2", 10, 1, 4.5),
            rating("u3", 10, 1, 4.5),
            rating("u4", 10, 1, 4.5),
            rating("u5", 10, 1, 4.5),
            rating("u1", 11, 1, 2.0),
            // album 2 tracks: 4.4, 4.4
            rating("u1", 20, 2, 4.0),
            rating("u2", 20, 2, 4.0),
            rating("u3", 20, 2, 5.0),
            rating("u4", 20, 2, 4.5),
            rating("u5", 20, 2, 4.5),
            rating("u1", 21, 2, 4.0),
            rating("u2", 21, 2, 4.0),
            rating("u3", 21, 2, 5.0),
            rating("u4", 21, 2, 4.5),
            rating("u5", 21, 2, 4.5),
            // album 3: its only rated track has 4.0, ratings of a track that no
            // longer exists push the album mean to 4.75
            rating("u1", 30, 3, 4.0),
            rating("u1", 39, 3, 5.0),
            rating("u2", 39, 3, 5.0),
            rating("u3", 39, 3, 5.0),
        ];

        let ranked_albums = rank_albums_globally(&albums, &ratings);
        let ranked_tracks = rank_voted_tracks(&tracks, &ratings);

        let masterpieces = select_masterpieces(&ranked_albums, &ranked_tracks, MASTERPIECE_THRESHOLD);

        assert_eq!(album_ids(&masterpieces), vec![1]);
    }

    #[test]
    fn test_masterpiece_threshold_is_inclusive() {
        let albums = vec![album(1, "a")];
        let tracks = vec![track(10, 1, 1, "a1"), track(11, 1, 2, "a2")];
        let ratings = vec![rating("u1", 10, 1, 4.5), rating("u1", 11, 1, 4.0)];

        let ranked_albums = rank_albums_globally(&albums, &ratings);
        let ranked_tracks = rank_voted_tracks(&tracks, &ratings);

        assert_eq!(
            album_ids(&select_masterpieces(&ranked_albums, &ranked_tracks, 4.5)),
            vec![1]
        );
        assert!(select_masterpieces(&ranked_albums, &ranked_tracks, 4.6).is_empty());
    }

    #[test]
    fn test_masterpieces_keep_album_order() {
        let albums = vec![album(1, "a"), album(2, "b")];
        let tracks = vec![track(10, 1, 1, "a1"), track(11, 1, 2, "a2"), track(20, 2, 1, "b1")];
        let ratings = vec![
            rating("u1", 10, 1, 5.0),
            rating("u1", 11, 1, 1.0),
            rating("u1", 20, 2, 4.5),
        ];

        let ranked_albums = rank_albums_globally(&albums, &ratings);
        let ranked_tracks = rank_voted_tracks(&tracks, &ratings);
        let masterpieces = select_masterpieces(&ranked_albums, &ranked_tracks, MASTERPIECE_THRESHOLD);

        assert_eq!(album_ids(&ranked_albums), vec![2, 1]);
        assert_eq!(album_ids(&masterpieces), vec![2, 1]);
    }
}
