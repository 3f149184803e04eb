//! Database schema for the media catalog.
//!
//! A single table keyed by id; structured metadata columns hold JSON.
//! Listing order is `created_at DESC` with rowid as the same-millisecond
//! tie-breaker, so "most recent first" is deterministic.

/// SQL schema for the catalog database.
pub const CATALOG_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS media_records (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT,
    file_type TEXT NOT NULL,
    original_filename TEXT NOT NULL,

    -- Derived artifacts (written before the record is created)
    derived_file_path TEXT NOT NULL,
    thumbnail_path TEXT,

    -- Probed source facts
    duration TEXT,
    file_size_bytes INTEGER NOT NULL,
    technical_metadata TEXT,

    -- Category-specific admin-supplied fields (JSON)
    audio_metadata TEXT,

    -- Timestamps (Unix milliseconds)
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_media_records_category
    ON media_records(category);
CREATE INDEX IF NOT EXISTS idx_media_records_created_at
    ON media_records(created_at DESC);
"#;
