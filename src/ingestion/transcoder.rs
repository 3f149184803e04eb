//! Media transcoding using ffmpeg/ffprobe.
//!
//! Compression targets:
//! - video: H.264 + AAC in an mp4 container, faststart, capped at 720p
//! - audio: MP3 at a fixed bitrate and sample rate
//!
//! A still frame is extracted at ~10% of the duration for video. Probing is
//! best effort: a failed probe only degrades duration/technical metadata,
//! never the transcode itself.

use crate::catalog::{MediaFileType, TechnicalMetadata};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use super::file_handler::unique_output_name;

/// Errors that can occur during transcoding.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),

    #[error("ffmpeg failed: {0}")]
    EncodeFailed(String),

    #[error("transcode timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),
}

impl TranscodeError {
    /// Timeouts are safe to retry; a failed encode of the same input is not.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TranscodeError::Timeout(_))
    }
}

/// Result of a successful transcode. Paths are the public addresses the
/// catalog stores and the site serves (`/uploads/compressed/...`).
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    pub derived_file_path: String,
    pub thumbnail_path: Option<String>,
    pub duration_secs: Option<f64>,
    pub file_size_bytes: u64,
    pub technical_metadata: Option<TechnicalMetadata>,
}

/// Transcoding backend. The ffmpeg subprocess implementation is the default;
/// tests substitute a mock and a remote transcoding service could slot in
/// behind the same contract.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Compress `input` into the media store and, for video, extract a
    /// thumbnail. The input file is left in place; on error no referenced
    /// output remains on disk.
    async fn transcode(
        &self,
        input: &Path,
        original_filename: &str,
        file_type: MediaFileType,
    ) -> Result<TranscodeOutput, TranscodeError>;
}

/// Encoding parameters for the ffmpeg backend.
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// x264 constant rate factor (higher = smaller output).
    pub video_crf: u8,
    pub video_preset: String,
    /// Output resolution cap; aspect ratio is preserved.
    pub max_width: u32,
    pub max_height: u32,
    /// Bitrate for the audio track (video) and audio-only output, in kbps.
    pub audio_bitrate_kbps: u32,
    pub audio_sample_rate: u32,
    /// Thumbnail bounding box.
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// Hard cap on a single ffmpeg run; the subprocess is killed on expiry.
    pub timeout_secs: u64,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            video_crf: 28,
            video_preset: "medium".to_string(),
            max_width: 1280,
            max_height: 720,
            audio_bitrate_kbps: 128,
            audio_sample_rate: 44100,
            thumbnail_width: 320,
            thumbnail_height: 240,
            timeout_secs: 600,
        }
    }
}

/// ffmpeg/ffprobe subprocess transcoder writing into the media directory
/// (`compressed/` and `thumbnails/` prefixes).
pub struct FfmpegTranscoder {
    media_dir: PathBuf,
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    pub fn new(media_dir: impl Into<PathBuf>, config: TranscoderConfig) -> Self {
        Self {
            media_dir: media_dir.into(),
            config,
        }
    }

    /// Run ffmpeg/ffprobe with a kill-on-expiry timeout so no orphan process
    /// survives an aborted ingestion.
    async fn run_tool(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<std::process::Output, TranscodeError> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        match tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(output) => Ok(output?),
            Err(_) => Err(TranscodeError::Timeout(self.config.timeout_secs)),
        }
    }

    /// Probe a media file; callers degrade gracefully on error.
    async fn probe(&self, path: &Path) -> Result<ProbeInfo, TranscodeError> {
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            path.to_string_lossy().to_string(),
        ];

        let output = self.run_tool("ffprobe", &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscodeError::ProbeFailed(stderr.trim().to_string()));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn encode_video(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        let scale = format!(
            "scale='min({},iw)':'min({},ih)':force_original_aspect_ratio=decrease",
            self.config.max_width, self.config.max_height
        );
        let args = vec![
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.video_preset.clone(),
            "-crf".to_string(),
            self.config.video_crf.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.config.audio_bitrate_kbps),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-vf".to_string(),
            scale,
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ];

        self.run_encode(&args, output).await
    }

    async fn encode_audio(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<(), TranscodeError> {
        let args = vec![
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-c:a".to_string(),
            "libmp3lame".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.config.audio_bitrate_kbps),
            "-ar".to_string(),
            self.config.audio_sample_rate.to_string(),
            "-vn".to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ];

        self.run_encode(&args, output).await
    }

    async fn run_encode(&self, args: &[String], output: &Path) -> Result<(), TranscodeError> {
        let result = self.run_tool("ffmpeg", args).await;

        let failure = match result {
            Ok(out) if out.status.success() => return Ok(()),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                TranscodeError::EncodeFailed(tail(&stderr, 2000))
            }
            Err(err) => err,
        };

        // ffmpeg may have written a partial file before dying; no caller may
        // end up referencing it.
        if let Err(err) = tokio::fs::remove_file(output).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial output {:?}: {}", output, err);
            }
        }

        Err(failure)
    }

    /// Extract one representative frame from the encoded video. Sampled at
    /// 10% of the duration so intros/black frames are usually skipped.
    async fn extract_thumbnail(
        &self,
        video: &Path,
        thumbnail: &Path,
        duration_secs: Option<f64>,
    ) -> Result<(), TranscodeError> {
        let seek = thumbnail_timestamp(duration_secs);
        let scale = format!(
            "scale={}:{}:force_original_aspect_ratio=decrease",
            self.config.thumbnail_width, self.config.thumbnail_height
        );
        let args = vec![
            "-ss".to_string(),
            format!("{:.3}", seek),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            scale,
            "-y".to_string(),
            thumbnail.to_string_lossy().to_string(),
        ];

        self.run_encode(&args, thumbnail).await
    }

    fn compressed_dir(&self) -> PathBuf {
        self.media_dir.join("compressed")
    }

    fn thumbnails_dir(&self) -> PathBuf {
        self.media_dir.join("thumbnails")
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        original_filename: &str,
        file_type: MediaFileType,
    ) -> Result<TranscodeOutput, TranscodeError> {
        tokio::fs::create_dir_all(self.compressed_dir()).await?;

        // Probe first; failure only costs us duration/technical metadata.
        let probe = match self.probe(input).await {
            Ok(info) => info,
            Err(err) => {
                warn!("Probe failed for {:?}: {}", input, err);
                ProbeInfo::default()
            }
        };

        match file_type {
            MediaFileType::Video => {
                let output_name = unique_output_name(original_filename, "mp4");
                let output_path = self.compressed_dir().join(&output_name);
                self.encode_video(input, &output_path).await?;
                debug!("Video compression completed: {}", output_name);

                // Thumbnail failure is degraded, not fatal.
                let thumbnail_name = format!(
                    "{}.jpg",
                    output_name.trim_end_matches(".mp4")
                );
                let thumbnail_path = {
                    tokio::fs::create_dir_all(self.thumbnails_dir()).await?;
                    let path = self.thumbnails_dir().join(&thumbnail_name);
                    match self
                        .extract_thumbnail(&output_path, &path, probe.duration_secs)
                        .await
                    {
                        Ok(()) => Some(format!("/uploads/thumbnails/{}", thumbnail_name)),
                        Err(err) => {
                            warn!("Thumbnail extraction failed for {}: {}", output_name, err);
                            None
                        }
                    }
                };

                let file_size_bytes = tokio::fs::metadata(&output_path).await?.len();

                Ok(TranscodeOutput {
                    derived_file_path: format!("/uploads/compressed/{}", output_name),
                    thumbnail_path,
                    duration_secs: probe.duration_secs,
                    file_size_bytes,
                    technical_metadata: probe.technical_metadata,
                })
            }
            MediaFileType::Audio => {
                let output_name = unique_output_name(original_filename, "mp3");
                let output_path = self.compressed_dir().join(&output_name);
                self.encode_audio(input, &output_path).await?;
                debug!("Audio compression completed: {}", output_name);

                let file_size_bytes = tokio::fs::metadata(&output_path).await?.len();

                let technical_metadata =
                    probe.technical_metadata.or_else(|| {
                        Some(TechnicalMetadata {
                            codec: Some("mp3".to_string()),
                            bitrate: Some(format!("{}k", self.config.audio_bitrate_kbps)),
                            ..Default::default()
                        })
                    });

                Ok(TranscodeOutput {
                    derived_file_path: format!("/uploads/compressed/{}", output_name),
                    thumbnail_path: None,
                    duration_secs: probe.duration_secs,
                    file_size_bytes,
                    technical_metadata,
                })
            }
        }
    }
}

/// Probed source facts; everything is optional by design.
#[derive(Debug, Clone, Default)]
pub struct ProbeInfo {
    pub duration_secs: Option<f64>,
    pub technical_metadata: Option<TechnicalMetadata>,
}

/// ffprobe JSON output structure.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    bit_rate: Option<String>,
}

/// Parse ffprobe's JSON into probe info. Prefers the video stream for
/// codec/dimensions, falls back to the audio stream, and takes the stream
/// bitrate over the container bitrate when present.
fn parse_probe_output(json: &str) -> Result<ProbeInfo, TranscodeError> {
    let probe: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| TranscodeError::InvalidOutput(format!("JSON parse error: {}", e)))?;

    let duration_secs: Option<f64> = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse().ok());

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .or_else(|| probe.streams.iter().find(|s| s.codec_type == "audio"));

    let technical_metadata = stream.map(|s| TechnicalMetadata {
        width: s.width,
        height: s.height,
        codec: s.codec_name.clone(),
        bitrate: s
            .bit_rate
            .clone()
            .or_else(|| probe.format.bit_rate.clone()),
    });

    Ok(ProbeInfo {
        duration_secs,
        technical_metadata,
    })
}

/// Pick the thumbnail sample point: 10% into the video, 0 when the duration
/// is unknown.
fn thumbnail_timestamp(duration_secs: Option<f64>) -> f64 {
    match duration_secs {
        Some(d) if d > 0.0 => d * 0.1,
        _ => 0.0,
    }
}

fn tail(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.trim().to_string()
    } else {
        let start = s.len() - max;
        // Avoid slicing mid-codepoint
        let start = (start..s.len()).find(|i| s.is_char_boundary(*i)).unwrap();
        s[start..].trim().to_string()
    }
}
