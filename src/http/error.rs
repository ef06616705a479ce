use rouille::Response;
use serde::Serialize;
use thiserror::Error;

use crate::{catalog::CatalogError, storage::error::StorageError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AlbumNotFound(_) | StorageError::TrackNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }

            StorageError::AlbumAlreadySubmitted(_) => ApiError::Conflict(err.to_string()),

            StorageError::NotAlbumOwner { .. } => ApiError::Forbidden(err.to_string()),

            StorageError::Database(_) | StorageError::Internal(_) => {
                log::error!("storage failure: {err}");
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        log::error!("catalog failure: {err}");
        ApiError::Internal("Internal Server Error".into())
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        Response::json(&ErrorBody { error: &message }).with_status_code(status)
    }
}
