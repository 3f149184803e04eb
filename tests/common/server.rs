//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own catalog and media dirs.

use super::constants::*;
use super::fixtures::MockTranscoder;
use siwaht_media_server::catalog::{CatalogStore, SqliteCatalogStore};
use siwaht_media_server::ingestion::{FileHandler, IngestionOrchestrator};
use siwaht_media_server::projection::ProjectionDefaults;
use siwaht_media_server::server::session::AdminAuth;
use siwaht_media_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated catalog and media directories
///
/// When dropped, the server shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Catalog store for direct assertions in tests
    pub catalog_store: Arc<dyn CatalogStore>,

    /// Where derived files land (compressed/, thumbnails/)
    pub media_dir: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// The server uses the mock transcoder (no ffmpeg dependency), a
    /// file-backed sqlite catalog, and the shared `ADMIN_PASS` credential.
    pub async fn spawn() -> Self {
        Self::spawn_with_max_upload(64 * 1024 * 1024).await
    }

    /// Same as `spawn`, with a custom upload size cap in bytes.
    pub async fn spawn_with_max_upload(max_upload_bytes: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let media_dir = temp_dir.path().join("media");
        let staging_dir = temp_dir.path().join("staging");
        let db_path = temp_dir.path().join("catalog.db");

        let catalog_store: Arc<dyn CatalogStore> = Arc::new(
            SqliteCatalogStore::open(&db_path).expect("Failed to open catalog store"),
        );

        let orchestrator = Arc::new(IngestionOrchestrator::new(
            catalog_store.clone(),
            Arc::new(MockTranscoder::new(&media_dir)),
            FileHandler::new(&staging_dir, &media_dir, max_upload_bytes),
        ));
        orchestrator
            .init()
            .await
            .expect("Failed to init media directories");

        let admin_auth = AdminAuth::new(
            None,
            Some(ADMIN_PASS.to_string()),
            Some("e2e-test-secret".to_string()),
        )
        .expect("Failed to build admin auth");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            samples_cache_age_sec: 0, // Disable caching in tests
            media_dir: media_dir.clone(),
            frontend_dir_path: None,
        };

        let app = make_app(
            config,
            catalog_store.clone(),
            orchestrator,
            admin_auth,
            ProjectionDefaults::default(),
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            catalog_store,
            media_dir,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Resolve a public `/uploads/...` path to its on-disk location.
    pub fn media_fs_path(&self, public_path: &str) -> PathBuf {
        let rest = public_path
            .strip_prefix("/uploads/")
            .expect("not an uploads path");
        self.media_dir.join(rest)
    }

    /// Waits for the server to become ready by polling the stats endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS))
                        .await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
