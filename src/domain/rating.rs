use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{AlbumId, TrackId, UserId};

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;

#[derive(Debug, Error, PartialEq)]
#[error("score {0} is not a half step between 1 and 5")]
pub struct InvalidScore(pub f64);

/// A star score: 1 to 5 in steps of one half.
///
/// Can only be built from a valid value, so everything downstream
/// can trust it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Result<Self, InvalidScore> {
        let in_range = (MIN_SCORE..=MAX_SCORE).contains(&value);
        let half_step = (value * 2.0).fract() == 0.0;
        if in_range && half_step {
            Ok(Self(value))
        } else {
            Err(InvalidScore(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = InvalidScore;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// One user's score for one track.
///
/// There is at most one per (user, track); rating again overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub username: String,
    pub track_id: TrackId,
    pub album_id: AlbumId,
    pub score: Score,
    pub created_at: DateTime<Utc>,
}
