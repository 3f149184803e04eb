//! SQLite-backed catalog store.
//!
//! Every mutation commits before the call returns, so the durable file and
//! the served state never diverge; on startup the store serves straight from
//! the database file. A single guarded connection serializes writers.

use super::models::{
    AudioDetails, Category, MediaFileType, MediaRecord, MediaUpdate, NewMediaRecord,
    TechnicalMetadata,
};
use super::schema::CATALOG_SCHEMA_SQL;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Trait for catalog storage backends.
///
/// Not-found is an absent value (or `false` for delete), never an error;
/// errors mean the store itself failed.
pub trait CatalogStore: Send + Sync {
    /// Create a record, assigning id and timestamps. Returns the stored record.
    fn create(&self, record: NewMediaRecord) -> Result<MediaRecord>;

    /// Get a record by id.
    fn get(&self, id: &str) -> Result<Option<MediaRecord>>;

    /// List all records, most recent first.
    fn list(&self) -> Result<Vec<MediaRecord>>;

    /// List records in a category, most recent first.
    fn list_by_category(&self, category: Category) -> Result<Vec<MediaRecord>>;

    /// Apply the mutable field subset to a record and refresh `updated_at`.
    fn update(&self, id: &str, update: MediaUpdate) -> Result<Option<MediaRecord>>;

    /// Delete a record. Returns false when the id is unknown.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Number of records, for the metrics gauge.
    fn count(&self) -> Result<usize>;
}

/// SQLite implementation of `CatalogStore`.
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Open or create a catalog database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog database: {:?}", path))?;
        Self::init(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(CATALOG_SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MediaRecord> {
        let technical_metadata: Option<TechnicalMetadata> = row
            .get::<_, Option<String>>("technical_metadata")?
            .and_then(|s| serde_json::from_str(&s).ok());
        let audio_metadata: Option<AudioDetails> = row
            .get::<_, Option<String>>("audio_metadata")?
            .and_then(|s| serde_json::from_str(&s).ok());

        Ok(MediaRecord {
            id: row.get("id")?,
            title: row.get("title")?,
            category: Category::parse(&row.get::<_, String>("category")?)
                .unwrap_or(Category::VideoStudio),
            description: row.get("description")?,
            file_type: MediaFileType::parse(&row.get::<_, String>("file_type")?)
                .unwrap_or(MediaFileType::Video),
            original_filename: row.get("original_filename")?,
            derived_file_path: row.get("derived_file_path")?,
            thumbnail_path: row.get("thumbnail_path")?,
            duration: row.get("duration")?,
            file_size_bytes: row.get("file_size_bytes")?,
            technical_metadata,
            audio_metadata,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn query_records(&self, category: Option<Category>) -> Result<Vec<MediaRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut records = Vec::new();

        match category {
            Some(category) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM media_records WHERE category = ?1 \
                     ORDER BY created_at DESC, rowid DESC",
                )?;
                let rows = stmt.query_map(params![category.as_str()], Self::row_to_record)?;
                for row in rows {
                    records.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM media_records ORDER BY created_at DESC, rowid DESC",
                )?;
                let rows = stmt.query_map([], Self::row_to_record)?;
                for row in rows {
                    records.push(row?);
                }
            }
        }

        Ok(records)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn create(&self, record: NewMediaRecord) -> Result<MediaRecord> {
        let now = chrono::Utc::now().timestamp_millis();
        let record = MediaRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: record.title,
            category: record.category,
            description: record.description,
            file_type: record.file_type,
            original_filename: record.original_filename,
            derived_file_path: record.derived_file_path,
            thumbnail_path: record.thumbnail_path,
            duration: record.duration,
            file_size_bytes: record.file_size_bytes,
            technical_metadata: record.technical_metadata,
            audio_metadata: record.audio_metadata,
            created_at: now,
            updated_at: now,
        };

        let technical_json = record
            .technical_metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let audio_json = record
            .audio_metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO media_records (
                id, title, category, description, file_type, original_filename,
                derived_file_path, thumbnail_path, duration, file_size_bytes,
                technical_metadata, audio_metadata, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                record.id,
                record.title,
                record.category.as_str(),
                record.description,
                record.file_type.as_str(),
                record.original_filename,
                record.derived_file_path,
                record.thumbnail_path,
                record.duration,
                record.file_size_bytes,
                technical_json,
                audio_json,
                record.created_at,
                record.updated_at,
            ],
        )
        .context("Failed to insert media record")?;

        Ok(record)
    }

    fn get(&self, id: &str) -> Result<Option<MediaRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT * FROM media_records WHERE id = ?1",
                params![id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list(&self) -> Result<Vec<MediaRecord>> {
        self.query_records(None)
    }

    fn list_by_category(&self, category: Category) -> Result<Vec<MediaRecord>> {
        self.query_records(Some(category))
    }

    fn update(&self, id: &str, update: MediaUpdate) -> Result<Option<MediaRecord>> {
        update.validate().map_err(|msg| anyhow!(msg))?;

        let conn = self.conn.lock().unwrap();
        let existing = conn
            .query_row(
                "SELECT * FROM media_records WHERE id = ?1",
                params![id],
                Self::row_to_record,
            )
            .optional()?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let updated = MediaRecord {
            title: update.title.unwrap_or(existing.title),
            category: update.category.unwrap_or(existing.category),
            description: update.description.or(existing.description),
            audio_metadata: update.audio_metadata.or(existing.audio_metadata),
            updated_at: chrono::Utc::now().timestamp_millis(),
            ..existing
        };

        let audio_json = updated
            .audio_metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // A single statement, so a failed write leaves the stored row intact.
        conn.execute(
            "UPDATE media_records
             SET title = ?2, category = ?3, description = ?4,
                 audio_metadata = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                updated.id,
                updated.title,
                updated.category.as_str(),
                updated.description,
                audio_json,
                updated.updated_at,
            ],
        )
        .context("Failed to update media record")?;

        Ok(Some(updated))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn
            .execute("DELETE FROM media_records WHERE id = ?1", params![id])
            .context("Failed to delete media record")?;
        Ok(affected > 0)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM media_records", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}
