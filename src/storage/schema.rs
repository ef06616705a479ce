use rusqlite::Connection;

pub mod tables {
    pub const ALBUMS: &str = "albums";
    pub const TRACKS: &str = "tracks";
    pub const RATINGS: &str = "ratings";

    pub const ALL_TABLES: &[&str] = &[ALBUMS, TRACKS, RATINGS];
}

pub use tables::*;

// A user submits at most one album, hence the unique submitter.
// Ratings are keyed by (user, track) so rating again overwrites.
const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    catalog_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    cover TEXT NOT NULL,
    submitted_by TEXT NOT NULL,
    submitted_by_uid TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    album_id INTEGER NOT NULL REFERENCES albums (id),
    catalog_album_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    artist TEXT NOT NULL,
    track_number INTEGER NOT NULL,
    duration_ms INTEGER NOT NULL,
    preview_url TEXT
);

CREATE INDEX IF NOT EXISTS tracks_by_album ON tracks (album_id, track_number);

CREATE TABLE IF NOT EXISTS ratings (
    user_id TEXT NOT NULL,
    username TEXT NOT NULL,
    track_id INTEGER NOT NULL REFERENCES tracks (id),
    album_id INTEGER NOT NULL REFERENCES albums (id),
    score REAL NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, track_id)
);

CREATE INDEX IF NOT EXISTS ratings_by_album ON ratings (album_id);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
