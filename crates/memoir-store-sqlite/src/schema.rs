//! SQL schema for the memoir SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The natural key (origin, external_id) is not UNIQUE. Overlapping sync runs
-- may race; the duplicate janitor collapses what they leave behind.
CREATE TABLE IF NOT EXISTS events (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id       TEXT,
    external_source   TEXT,
    origin            TEXT    NOT NULL CHECK (origin IN ('feed', 'cms')),
    event_date        TEXT,
    event_type        TEXT    NOT NULL DEFAULT 'memory',
    event_name_line_1 TEXT    NOT NULL CHECK (length(event_name_line_1) <= 120),
    event_name_line_2 TEXT             CHECK (length(event_name_line_2) <= 180),
    event_description TEXT    NOT NULL DEFAULT '',
    posted_by_name    TEXT,
    posted_by_photo   TEXT,
    sync              INTEGER NOT NULL DEFAULT 1,   -- 1 = needs push
    active            INTEGER NOT NULL DEFAULT 1,
    approved          INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT    NOT NULL,             -- RFC 3339 UTC
    updated_at        TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS photos (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id            INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    storage_key         TEXT    NOT NULL UNIQUE,
    public_url          TEXT    NOT NULL,
    original_source_url TEXT    NOT NULL,
    position            INTEGER NOT NULL CHECK (position >= 0),
    created_at          TEXT    NOT NULL,
    updated_at          TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS blobs (
    key          TEXT PRIMARY KEY,
    content_type TEXT NOT NULL,
    bytes        BLOB NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS events_natural_key_idx ON events(origin, external_id);
CREATE INDEX IF NOT EXISTS events_source_key_idx  ON events(external_source, external_id);
CREATE INDEX IF NOT EXISTS events_sync_idx        ON events(sync, updated_at);
CREATE INDEX IF NOT EXISTS photos_event_idx       ON photos(event_id, position);

PRAGMA user_version = 1;
";
