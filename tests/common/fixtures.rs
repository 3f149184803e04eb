//! Test fixtures: media byte stubs and a transcoder that skips ffmpeg.

use async_trait::async_trait;
use siwaht_media_server::catalog::{MediaFileType, TechnicalMetadata};
use siwaht_media_server::ingestion::{
    unique_output_name, TranscodeError, TranscodeOutput, Transcoder,
};
use std::path::{Path, PathBuf};

/// Minimal bytes the content sniffer recognizes as audio/mpeg (ID3 header).
pub const MP3_FIXTURE: &[u8] = &[
    0x49, 0x44, 0x33, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Minimal bytes the content sniffer recognizes as video/mp4 (ftyp box).
pub const MP4_FIXTURE: &[u8] = &[
    0x00, 0x00, 0x00, 0x18, 0x66, 0x74, 0x79, 0x70, 0x69, 0x73, 0x6f, 0x6d, 0x00, 0x00, 0x02,
    0x00, 0x69, 0x73, 0x6f, 0x6d, 0x69, 0x73, 0x6f, 0x32,
];

/// Transcoder stand-in for tests: copies the staged file into the media
/// store (so every file-existence invariant is exercised for real) without
/// shelling out to ffmpeg.
pub struct MockTranscoder {
    media_dir: PathBuf,
}

impl MockTranscoder {
    pub fn new(media_dir: &Path) -> Self {
        Self {
            media_dir: media_dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        original_filename: &str,
        file_type: MediaFileType,
    ) -> Result<TranscodeOutput, TranscodeError> {
        let ext = match file_type {
            MediaFileType::Video => "mp4",
            MediaFileType::Audio => "mp3",
        };
        let name = unique_output_name(original_filename, ext);
        let out = self.media_dir.join("compressed").join(&name);
        tokio::fs::create_dir_all(out.parent().unwrap()).await?;
        tokio::fs::copy(input, &out).await?;

        let thumbnail_path = match file_type {
            MediaFileType::Video => {
                let thumb_name = format!("{}.jpg", name.trim_end_matches(".mp4"));
                let thumb = self.media_dir.join("thumbnails").join(&thumb_name);
                tokio::fs::create_dir_all(thumb.parent().unwrap()).await?;
                tokio::fs::write(&thumb, b"jpg").await?;
                Some(format!("/uploads/thumbnails/{}", thumb_name))
            }
            MediaFileType::Audio => None,
        };

        let file_size_bytes = tokio::fs::metadata(&out).await?.len();

        Ok(TranscodeOutput {
            derived_file_path: format!("/uploads/compressed/{}", name),
            thumbnail_path,
            duration_secs: Some(30.0),
            file_size_bytes,
            technical_metadata: Some(TechnicalMetadata {
                codec: Some("mock".to_string()),
                ..Default::default()
            }),
        })
    }
}
