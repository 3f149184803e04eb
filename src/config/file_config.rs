use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::projection::ProjectionDefaults;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub media_dir: Option<String>,
    pub staging_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub samples_cache_age_sec: Option<usize>,
    pub frontend_dir_path: Option<String>,
    pub max_upload_mb: Option<u64>,
    pub transcode_timeout_secs: Option<u64>,

    // Admin credential / session signing (env vars take precedence)
    pub admin_password_hash: Option<String>,
    pub session_secret: Option<String>,

    // Feature configs
    pub transcoder: Option<TranscoderFileConfig>,
    pub projection: Option<ProjectionDefaults>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TranscoderFileConfig {
    pub video_crf: Option<u8>,
    pub video_preset: Option<String>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub audio_bitrate_kbps: Option<u32>,
    pub audio_sample_rate: Option<u32>,
    pub thumbnail_width: Option<u32>,
    pub thumbnail_height: Option<u32>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
