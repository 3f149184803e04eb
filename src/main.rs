use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use siwaht_media_server::catalog::{CatalogStore, SqliteCatalogStore};
use siwaht_media_server::config::{AppConfig, CliConfig, FileConfig};
use siwaht_media_server::ingestion::{FfmpegTranscoder, FileHandler, IngestionOrchestrator};
use siwaht_media_server::server::session::AdminAuth;
use siwaht_media_server::server::{metrics, run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the catalog database (and, by default, media/staging).
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Directory for derived media files (compressed/ and thumbnails/).
    #[clap(long, value_parser = parse_path)]
    pub media_dir: Option<PathBuf>,

    /// Directory for raw upload staging.
    #[clap(long, value_parser = parse_path)]
    pub staging_dir: Option<PathBuf>,

    /// Optional TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Cache-Control max-age for the public sample endpoints, in seconds.
    #[clap(long, default_value_t = 300)]
    pub samples_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Maximum accepted upload size in megabytes.
    #[clap(long, default_value_t = 500)]
    pub max_upload_mb: u64,

    /// Hard cap on a single ffmpeg run in seconds.
    #[clap(long, default_value_t = 600)]
    pub transcode_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        media_dir: cli_args.media_dir,
        staging_dir: cli_args.staging_dir,
        port: cli_args.port,
        metrics_port: cli_args.metrics_port,
        logging_level: cli_args.logging_level,
        samples_cache_age_sec: cli_args.samples_cache_age_sec,
        frontend_dir_path: cli_args.frontend_dir_path,
        max_upload_mb: cli_args.max_upload_mb,
        transcode_timeout_secs: cli_args.transcode_timeout_secs,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite catalog database at {:?}...",
        config.catalog_db_path()
    );
    let catalog_store = Arc::new(SqliteCatalogStore::open(&config.catalog_db_path())?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::init_catalog_metrics(catalog_store.count()?);

    // Env vars win over the config file for the credential material.
    let admin_password_hash = std::env::var("ADMIN_PASSWORD_HASH")
        .ok()
        .or_else(|| config.admin_password_hash.clone());
    let admin_password = std::env::var("ADMIN_PASSWORD").ok();
    let session_secret = std::env::var("SESSION_SECRET")
        .ok()
        .or_else(|| config.session_secret.clone());
    let admin_auth = AdminAuth::new(admin_password_hash, admin_password, session_secret)?;

    let transcoder = Arc::new(FfmpegTranscoder::new(
        &config.media_dir,
        config.transcoder.clone(),
    ));
    let file_handler = FileHandler::new(
        &config.staging_dir,
        &config.media_dir,
        config.max_upload_bytes,
    );
    let orchestrator = Arc::new(IngestionOrchestrator::new(
        catalog_store.clone(),
        transcoder,
        file_handler,
    ));
    orchestrator
        .init()
        .await
        .context("Failed to initialize media directories")?;

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);
    run_server(
        catalog_store,
        orchestrator,
        admin_auth,
        config.projection.clone(),
        config.logging_level.clone(),
        config.port,
        config.metrics_port,
        config.samples_cache_age_sec,
        config.media_dir.clone(),
        config.frontend_dir_path.clone(),
    )
    .await
}
