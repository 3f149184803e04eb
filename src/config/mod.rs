mod file_config;

pub use file_config::{FileConfig, TranscoderFileConfig};

use crate::ingestion::TranscoderConfig;
use crate::projection::ProjectionDefaults;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub samples_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub max_upload_mb: u64,
    pub transcode_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            media_dir: None,
            staging_dir: None,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            samples_cache_age_sec: 300,
            frontend_dir_path: None,
            max_upload_mb: 500,
            transcode_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub media_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub samples_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub max_upload_bytes: u64,

    // Admin credential / session signing
    pub admin_password_hash: Option<String>,
    pub session_secret: Option<String>,

    // Feature configs (with defaults)
    pub transcoder: TranscoderConfig,
    pub projection: ProjectionDefaults,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let media_dir = file
            .media_dir
            .map(PathBuf::from)
            .or_else(|| cli.media_dir.clone())
            .unwrap_or_else(|| db_dir.join("media"));

        let staging_dir = file
            .staging_dir
            .map(PathBuf::from)
            .or_else(|| cli.staging_dir.clone())
            .unwrap_or_else(|| db_dir.join("staging"));

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let samples_cache_age_sec = file
            .samples_cache_age_sec
            .unwrap_or(cli.samples_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let max_upload_mb = file.max_upload_mb.unwrap_or(cli.max_upload_mb);
        let max_upload_bytes = max_upload_mb * 1024 * 1024;

        let transcode_timeout_secs = file
            .transcode_timeout_secs
            .unwrap_or(cli.transcode_timeout_secs);

        // Transcoder settings - merge file config with defaults
        let tc_file = file.transcoder.unwrap_or_default();
        let defaults = TranscoderConfig::default();
        let transcoder = TranscoderConfig {
            video_crf: tc_file.video_crf.unwrap_or(defaults.video_crf),
            video_preset: tc_file.video_preset.unwrap_or(defaults.video_preset),
            max_width: tc_file.max_width.unwrap_or(defaults.max_width),
            max_height: tc_file.max_height.unwrap_or(defaults.max_height),
            audio_bitrate_kbps: tc_file
                .audio_bitrate_kbps
                .unwrap_or(defaults.audio_bitrate_kbps),
            audio_sample_rate: tc_file
                .audio_sample_rate
                .unwrap_or(defaults.audio_sample_rate),
            thumbnail_width: tc_file.thumbnail_width.unwrap_or(defaults.thumbnail_width),
            thumbnail_height: tc_file
                .thumbnail_height
                .unwrap_or(defaults.thumbnail_height),
            timeout_secs: transcode_timeout_secs,
        };

        let projection = file.projection.unwrap_or_default();

        Ok(Self {
            db_dir,
            media_dir,
            staging_dir,
            port,
            metrics_port,
            logging_level,
            samples_cache_age_sec,
            frontend_dir_path,
            max_upload_bytes,
            admin_password_hash: file.admin_password_hash,
            session_secret: file.session_secret,
            transcoder,
            projection,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
