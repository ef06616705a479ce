//! Grouping and averaging of ratings

use std::collections::HashMap;
use std::hash::Hash;

use crate::domain::{ids::AlbumId, rating::Rating};

/// Mean score and number of votes of a group of ratings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tally {
    pub average_score: f64,
    pub vote_count: usize,
}

impl Tally {
    pub const EMPTY: Tally = Tally {
        average_score: 0.0,
        vote_count: 0,
    };

    pub fn of<'a, I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = &'a Rating>,
    {
        let (sum, vote_count) = ratings
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), rating| {
                (sum + rating.score.value(), count + 1)
            });

        if vote_count == 0 {
            return Self::EMPTY;
        }

        Self {
            average_score: sum / vote_count as f64,
            vote_count,
        }
    }
}

/// arithmetic mean of the scores, 0 when there are none
pub fn average_score<'a, I>(ratings: I) -> f64
where
    I: IntoIterator<Item = &'a Rating>,
{
    Tally::of(ratings).average_score
}

/// Score shown on an album card of the dashboard.
///
/// This is the mean of every rating of the album, across all of its tracks.
/// `None` means nobody rated the album yet, which the dashboard shows
/// differently from a low score.
pub fn album_mean_for_dashboard(ratings: &[Rating], album_id: AlbumId) -> Option<f64> {
    let tally = Tally::of(ratings.iter().filter(|r| r.album_id == album_id));
    if tally.vote_count == 0 {
        None
    } else {
        Some(tally.average_score)
    }
}

/// Groups ratings by `key`, keeping their relative order inside each group
pub(crate) fn group_by<K, F>(ratings: &[Rating], key: F) -> HashMap<K, Vec<&Rating>>
where
    K: Eq + Hash,
    F: Fn(&Rating) -> K,
{
    let mut groups: HashMap<K, Vec<&Rating>> = HashMap::new();
    for rating in ratings {
        groups.entry(key(rating)).or_default().push(rating);
    }
    groups
}

/// Tally of the group under `key`, or an empty tally when nobody voted
pub(crate) fn tally_for<K: Eq + Hash>(groups: &HashMap<K, Vec<&Rating>>, key: &K) -> Tally {
    groups
        .get(key)
        .map(|group| Tally::of(group.iter().copied()))
        .unwrap_or(Tally::EMPTY)
}
