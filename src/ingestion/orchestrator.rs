//! Ingestion orchestration: the path from a raw upload to a cataloged,
//! web-optimized asset.
//!
//! Upload workflow:
//! 1. Declared MIME type checked against the allow-list, content sniffed
//! 2. Raw bytes staged with a hard size cap (never fully buffered)
//! 3. Title/category validated, optional audio metadata parsed defensively
//! 4. Transcode (compression + thumbnail for video)
//! 5. Catalog record created; a failed create deletes the fresh outputs
//! 6. Staged file removed on every exit path
//!
//! A record is only ever persisted after its derived file exists, and no
//! derived file survives a failed ingestion.

use super::file_handler::{FileHandler, FileHandlerError};
use super::transcoder::{TranscodeError, Transcoder};
use crate::catalog::{
    AudioDetails, CatalogStore, Category, MediaFileType, MediaRecord, NewMediaRecord,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

/// Declared MIME types accepted for upload.
const ALLOWED_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/webm",
    "audio/mpeg",
    "audio/wav",
    "audio/mp3",
    "audio/x-wav",
];

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Invalid file type: {0}. Only video and audio files are allowed.")]
    InvalidFileType(String),

    #[error("{0}")]
    Validation(String),

    #[error("File too large: the limit is {0} bytes")]
    FileTooLarge(u64),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("File handling error: {0}")]
    FileHandler(FileHandlerError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<FileHandlerError> for IngestionError {
    fn from(err: FileHandlerError) -> Self {
        match err {
            FileHandlerError::FileTooLarge(limit) => IngestionError::FileTooLarge(limit),
            other => IngestionError::FileHandler(other),
        }
    }
}

/// A raw upload sitting in the staging area, ready to be ingested.
#[derive(Debug)]
pub struct StagedUpload {
    pub path: PathBuf,
    pub original_filename: String,
    pub file_type: MediaFileType,
}

/// Descriptive fields accompanying an upload.
#[derive(Debug, Default, Clone)]
pub struct UploadMeta {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub audio_metadata_json: Option<String>,
}

/// Orchestrates ingestion and the cascading delete of cataloged media.
pub struct IngestionOrchestrator {
    store: Arc<dyn CatalogStore>,
    transcoder: Arc<dyn Transcoder>,
    file_handler: FileHandler,
}

impl IngestionOrchestrator {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        transcoder: Arc<dyn Transcoder>,
        file_handler: FileHandler,
    ) -> Self {
        Self {
            store,
            transcoder,
            file_handler,
        }
    }

    /// Initialize the staging and media directories.
    pub async fn init(&self) -> Result<(), IngestionError> {
        self.file_handler.init().await?;
        Ok(())
    }

    pub fn file_handler(&self) -> &FileHandler {
        &self.file_handler
    }

    // =========================================================================
    // Staging
    // =========================================================================

    /// Validate the declared type and stream the body into staging. Fails
    /// before touching storage for a bad declared type; an oversized body is
    /// cut off at the cap. The staged content is sniffed afterwards so a
    /// renamed non-media file never reaches the transcoder.
    pub async fn stage<R>(
        &self,
        original_filename: &str,
        declared_mime: &str,
        body: R,
    ) -> Result<StagedUpload, IngestionError>
    where
        R: AsyncRead + Unpin,
    {
        let file_type = file_type_for_mime(declared_mime)
            .ok_or_else(|| IngestionError::InvalidFileType(declared_mime.to_string()))?;

        let path = self
            .file_handler
            .stage_upload(original_filename, body)
            .await?;

        if let Err(err) = self.sniff_staged(&path, file_type).await {
            self.file_handler.discard_staged(&path).await;
            return Err(err);
        }

        Ok(StagedUpload {
            path,
            original_filename: original_filename.to_string(),
            file_type,
        })
    }

    /// Content sniffing: the first bytes must identify a media container of
    /// the declared kind. Catches files renamed to a media extension.
    async fn sniff_staged(
        &self,
        path: &std::path::Path,
        declared: MediaFileType,
    ) -> Result<(), IngestionError> {
        use tokio::io::AsyncReadExt;

        let mut head = vec![0u8; 512];
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| IngestionError::FileHandler(e.into()))?;
        let read = file
            .read(&mut head)
            .await
            .map_err(|e| IngestionError::FileHandler(e.into()))?;
        head.truncate(read);

        let kind = infer::get(&head)
            .ok_or_else(|| IngestionError::InvalidFileType("unrecognized content".to_string()))?;

        let sniffed = file_type_for_mime_prefix(kind.mime_type());
        if sniffed != Some(declared) {
            return Err(IngestionError::InvalidFileType(format!(
                "content is {}, not {}",
                kind.mime_type(),
                declared.as_str()
            )));
        }

        Ok(())
    }

    /// Discard a staged upload that will not be ingested.
    pub async fn discard(&self, staged: StagedUpload) {
        self.file_handler.discard_staged(&staged.path).await;
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Validate metadata, transcode the staged upload, and persist the
    /// catalog record. The staged file is removed on every exit path; a
    /// failed record create deletes the derived outputs before surfacing.
    pub async fn ingest(
        &self,
        staged: StagedUpload,
        meta: UploadMeta,
    ) -> Result<MediaRecord, IngestionError> {
        let result = self.ingest_staged(&staged, meta).await;
        self.file_handler.discard_staged(&staged.path).await;
        result
    }

    async fn ingest_staged(
        &self,
        staged: &StagedUpload,
        meta: UploadMeta,
    ) -> Result<MediaRecord, IngestionError> {
        let title = meta.title.trim();
        if title.is_empty() {
            return Err(IngestionError::Validation(
                "Title and category are required".to_string(),
            ));
        }
        let category = Category::parse(meta.category.trim()).ok_or_else(|| {
            IngestionError::Validation(format!("Unknown category: {}", meta.category))
        })?;

        let audio_metadata = parse_audio_details(meta.audio_metadata_json.as_deref());

        info!(
            "Processing {}: {}",
            staged.file_type.as_str(),
            staged.original_filename
        );

        let output = self
            .transcoder
            .transcode(&staged.path, &staged.original_filename, staged.file_type)
            .await?;

        let record = NewMediaRecord {
            title: title.to_string(),
            category,
            description: meta
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            file_type: staged.file_type,
            original_filename: staged.original_filename.clone(),
            derived_file_path: output.derived_file_path.clone(),
            thumbnail_path: output.thumbnail_path.clone(),
            duration: output
                .duration_secs
                .map(|d| (d.round() as i64).to_string()),
            file_size_bytes: output.file_size_bytes as i64,
            technical_metadata: output.technical_metadata,
            audio_metadata,
        };

        match self.store.create(record) {
            Ok(created) => {
                info!(
                    "Ingested {} as {} ({})",
                    staged.original_filename, created.id, created.derived_file_path
                );
                Ok(created)
            }
            Err(err) => {
                // No record was persisted, so the derived outputs must go too.
                error!(
                    "Catalog create failed for {}, removing derived outputs: {}",
                    staged.original_filename, err
                );
                self.remove_outputs(&output.derived_file_path, output.thumbnail_path.as_deref())
                    .await;
                Err(IngestionError::Storage(err))
            }
        }
    }

    async fn remove_outputs(&self, derived: &str, thumbnail: Option<&str>) {
        if let Err(err) = self.file_handler.remove_public_file(derived, true).await {
            warn!("Failed to remove derived file {}: {}", derived, err);
        }
        if let Some(thumbnail) = thumbnail {
            if let Err(err) = self.file_handler.remove_public_file(thumbnail, true).await {
                warn!("Failed to remove thumbnail {}: {}", thumbnail, err);
            }
        }
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete a record and its files. The record goes first so no record can
    /// ever point at a missing file; a failed file delete afterwards is
    /// surfaced, not reported as success. Returns false for an unknown id.
    pub async fn delete_media(&self, id: &str) -> Result<bool, IngestionError> {
        let Some(record) = self.store.get(id)? else {
            return Ok(false);
        };

        if !self.store.delete(id)? {
            // Lost a race with a concurrent delete; the winner removes files.
            return Ok(false);
        }

        self.file_handler
            .remove_public_file(&record.derived_file_path, false)
            .await
            .map_err(IngestionError::FileHandler)?;

        if let Some(thumbnail) = &record.thumbnail_path {
            self.file_handler
                .remove_public_file(thumbnail, true)
                .await
                .map_err(IngestionError::FileHandler)?;
        }

        info!("Deleted media {} and its derived files", id);
        Ok(true)
    }
}

/// Declared MIME to file type, gated by the allow-list.
fn file_type_for_mime(mime: &str) -> Option<MediaFileType> {
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return None;
    }
    file_type_for_mime_prefix(mime)
}

fn file_type_for_mime_prefix(mime: &str) -> Option<MediaFileType> {
    if mime.starts_with("video/") {
        Some(MediaFileType::Video)
    } else if mime.starts_with("audio/") {
        Some(MediaFileType::Audio)
    } else {
        None
    }
}

/// Parse the optional category-specific metadata JSON. Malformed input means
/// "no metadata provided", never a failed ingestion.
fn parse_audio_details(json: Option<&str>) -> Option<AudioDetails> {
    let json = json?.trim();
    if json.is_empty() {
        return None;
    }
    match serde_json::from_str(json) {
        Ok(details) => Some(details),
        Err(err) => {
            warn!("Failed to parse audio metadata, ignoring it: {}", err);
            None
        }
    }
}
