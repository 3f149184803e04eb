//! File handling for media uploads.
//!
//! Raw uploads land in a staging directory, derived files under
//! `compressed/` and `thumbnails/` inside the media directory. Staging never
//! overlaps the served prefixes, so a half-written upload can never be
//! served or cataloged.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

/// Errors that can occur during file handling.
#[derive(Debug, Error)]
pub enum FileHandlerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File too large: limit is {0} bytes")]
    FileTooLarge(u64),

    #[error("Not a media file path: {0}")]
    NotAMediaPath(String),
}

/// Public URL prefix under which derived files are served.
const PUBLIC_PREFIX: &str = "/uploads/";

/// File handler for staged uploads and derived media files.
pub struct FileHandler {
    staging_dir: PathBuf,
    media_dir: PathBuf,
    max_upload_bytes: u64,
}

impl FileHandler {
    pub fn new(
        staging_dir: impl Into<PathBuf>,
        media_dir: impl Into<PathBuf>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            media_dir: media_dir.into(),
            max_upload_bytes,
        }
    }

    /// Create the staging and media directories.
    pub async fn init(&self) -> Result<(), FileHandlerError> {
        fs::create_dir_all(&self.staging_dir).await?;
        fs::create_dir_all(self.media_dir.join("compressed")).await?;
        fs::create_dir_all(self.media_dir.join("thumbnails")).await?;
        Ok(())
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Stream an upload into the staging directory, enforcing the size cap
    /// without buffering the body in memory. On any failure nothing is left
    /// behind in staging.
    pub async fn stage_upload<R>(
        &self,
        filename: &str,
        body: R,
    ) -> Result<PathBuf, FileHandlerError>
    where
        R: AsyncRead + Unpin,
    {
        let safe_name = sanitize_filename(filename)?;
        let staged_path = self
            .staging_dir
            .join(format!("{}-{}", uuid::Uuid::new_v4(), safe_name));

        fs::create_dir_all(&self.staging_dir).await?;

        // Read one byte past the cap so an oversized stream is detected
        // without draining it fully.
        let mut limited = body.take(self.max_upload_bytes + 1);
        let mut file = fs::File::create(&staged_path).await?;

        let written = match tokio::io::copy(&mut limited, &mut file).await {
            Ok(n) => n,
            Err(err) => {
                drop(file);
                self.discard_staged(&staged_path).await;
                return Err(err.into());
            }
        };
        file.sync_all().await?;
        drop(file);

        if written > self.max_upload_bytes {
            self.discard_staged(&staged_path).await;
            return Err(FileHandlerError::FileTooLarge(self.max_upload_bytes));
        }

        Ok(staged_path)
    }

    /// Remove a staged file, logging rather than failing; cleanup runs on
    /// every exit path and must not mask the primary error.
    pub async fn discard_staged(&self, path: &Path) {
        if let Err(err) = fs::remove_file(path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove staged upload {:?}: {}", path, err);
            }
        }
    }

    /// Map a public path (`/uploads/compressed/x.mp4`) to its location on
    /// disk. Rejects anything outside the served prefixes.
    pub fn public_to_fs_path(&self, public_path: &str) -> Result<PathBuf, FileHandlerError> {
        let rest = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .ok_or_else(|| FileHandlerError::NotAMediaPath(public_path.to_string()))?;

        let (prefix, filename) = rest
            .split_once('/')
            .ok_or_else(|| FileHandlerError::NotAMediaPath(public_path.to_string()))?;

        if !matches!(prefix, "compressed" | "thumbnails") {
            return Err(FileHandlerError::NotAMediaPath(public_path.to_string()));
        }

        let safe_name = sanitize_filename(filename)?;
        if safe_name != filename {
            return Err(FileHandlerError::NotAMediaPath(public_path.to_string()));
        }

        Ok(self.media_dir.join(prefix).join(filename))
    }

    /// Delete a derived file by its public path. `missing_ok` tolerates an
    /// already-absent file (thumbnails on cascade delete).
    pub async fn remove_public_file(
        &self,
        public_path: &str,
        missing_ok: bool,
    ) -> Result<(), FileHandlerError> {
        let fs_path = self.public_to_fs_path(public_path)?;
        match fs::remove_file(&fs_path).await {
            Ok(()) => Ok(()),
            Err(err) if missing_ok && err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Derived output naming: original stem + time + random bytes. Unique without
/// needing a catalog id, since transcoding runs before the record exists.
pub fn unique_output_name(original_filename: &str, ext: &str) -> String {
    let stem = Path::new(original_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("media");
    let stem: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect();

    let timestamp = chrono::Utc::now().timestamp_millis();
    let token: u32 = rand::random();

    format!("{}-{}-{:08x}.{}", stem, timestamp, token, ext)
}

/// Sanitize a filename to prevent path traversal.
fn sanitize_filename(filename: &str) -> Result<String, FileHandlerError> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FileHandlerError::InvalidFilename(filename.to_string()))?;

    if name.contains('\0') || name.starts_with('.') {
        return Err(FileHandlerError::InvalidFilename(filename.to_string()));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    if sanitized.is_empty() {
        return Err(FileHandlerError::InvalidFilename(filename.to_string()));
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_handler(max_bytes: u64) -> (TempDir, FileHandler) {
        let temp = TempDir::new().unwrap();
        let handler = FileHandler::new(
            temp.path().join("staging"),
            temp.path().join("media"),
            max_bytes,
        );
        (temp, handler)
    }

    #[tokio::test]
    async fn stages_upload_to_staging_dir() {
        let (_temp, handler) = make_handler(1024);
        handler.init().await.unwrap();

        let staged = handler
            .stage_upload("track.mp3", &b"hello world"[..])
            .await
            .unwrap();

        assert!(staged.starts_with(handler.staging_dir()));
        assert_eq!(fs::read(&staged).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_and_removed() {
        let (_temp, handler) = make_handler(8);
        handler.init().await.unwrap();

        let result = handler
            .stage_upload("big.mp4", &b"way more than eight bytes"[..])
            .await;

        assert!(matches!(result, Err(FileHandlerError::FileTooLarge(8))));

        // Nothing left behind in staging
        let mut entries = fs::read_dir(handler.staging_dir()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upload_at_exact_limit_is_accepted() {
        let (_temp, handler) = make_handler(5);
        handler.init().await.unwrap();

        let staged = handler.stage_upload("ok.mp3", &b"12345"[..]).await.unwrap();
        assert_eq!(fs::read(&staged).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn discard_staged_tolerates_missing_file() {
        let (_temp, handler) = make_handler(1024);
        handler.init().await.unwrap();
        handler
            .discard_staged(&handler.staging_dir().join("never-existed"))
            .await;
    }

    #[tokio::test]
    async fn remove_public_file_round_trips() {
        let (_temp, handler) = make_handler(1024);
        handler.init().await.unwrap();

        let fs_path = handler
            .public_to_fs_path("/uploads/compressed/demo-1-aa.mp4")
            .unwrap();
        fs::write(&fs_path, b"data").await.unwrap();

        handler
            .remove_public_file("/uploads/compressed/demo-1-aa.mp4", false)
            .await
            .unwrap();
        assert!(!fs_path.exists());

        // Gone now: strict removal errors, tolerant removal does not
        assert!(handler
            .remove_public_file("/uploads/compressed/demo-1-aa.mp4", false)
            .await
            .is_err());
        assert!(handler
            .remove_public_file("/uploads/compressed/demo-1-aa.mp4", true)
            .await
            .is_ok());
    }

    #[test]
    fn public_path_mapping_rejects_traversal() {
        let handler = FileHandler::new("/tmp/staging", "/tmp/media", 1024);

        assert!(handler.public_to_fs_path("/uploads/compressed/ok.mp4").is_ok());
        assert!(handler.public_to_fs_path("/uploads/thumbnails/ok.jpg").is_ok());
        assert!(handler.public_to_fs_path("/etc/passwd").is_err());
        assert!(handler.public_to_fs_path("/uploads/other/x.mp4").is_err());
        assert!(handler
            .public_to_fs_path("/uploads/compressed/../../etc/passwd")
            .is_err());
        assert!(handler.public_to_fs_path("/uploads/compressed/").is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("track.mp3").unwrap(), "track.mp3");
        // Path components are stripped, leaving just the filename
        assert_eq!(sanitize_filename("/path/to/track.mp3").unwrap(), "track.mp3");
        assert_eq!(sanitize_filename("../track.mp3").unwrap(), "track.mp3");
        assert_eq!(sanitize_filename("a:b.mp4").unwrap(), "a_b.mp4");

        // Hidden files (starting with .) should fail
        assert!(sanitize_filename(".hidden").is_err());
        assert!(sanitize_filename("..").is_err());
    }

    #[test]
    fn unique_output_names_do_not_collide() {
        let a = unique_output_name("My Clip.mov", "mp4");
        let b = unique_output_name("My Clip.mov", "mp4");

        assert!(a.starts_with("My_Clip-"));
        assert!(a.ends_with(".mp4"));
        assert_ne!(a, b);
    }
}
