use thiserror::Error;

use crate::domain::ids::{AlbumId, TrackId, UserId};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("album {0} not found")]
    AlbumNotFound(AlbumId),

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("user {0} already submitted an album")]
    AlbumAlreadySubmitted(UserId),

    #[error("album {album} was not submitted by {user}")]
    NotAlbumOwner { album: AlbumId, user: UserId },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
