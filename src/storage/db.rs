use std::path::Path;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, types::Type};

use crate::{
    config::Database,
    domain::rating::Score,
    storage::{error::StorageError, schema},
};

pub type MillisSinceUnix = i64;

fn open_in_memory() -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

fn open_from_file(path: &Path) -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open(path)
}

pub fn open(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = if config.in_memory {
        open_in_memory()?
    } else {
        let path = config
            .path
            .as_ref()
            .ok_or_else(|| anyhow!("database.path is required unless database.in_memory is set"))?;
        log::info!("Opening database at {}", path.to_string_lossy());
        open_from_file(path)?
    };
    schema::init(&db)?;
    Ok(db)
}

/// converts time to number of milliseconds since unix epoch
pub fn datetime_to_i64(time: DateTime<Utc>) -> MillisSinceUnix {
    time.timestamp_millis()
}

/// reads a timestamp column stored by [`datetime_to_i64`]
pub fn i64_to_datetime(column: usize, millis: MillisSinceUnix) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, millis))
}

/// reads a score column, refusing values that are not valid scores
pub fn f64_to_score(column: usize, value: f64) -> rusqlite::Result<Score> {
    Score::new(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Real, Box::new(e)))
}
