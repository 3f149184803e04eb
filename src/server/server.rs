use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::info;

use tower_http::services::ServeDir;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::admin_routes::admin_routes;
use super::media_files::{serve_compressed, serve_thumbnail};
use super::sample_routes::sample_routes;
use super::session::AdminAuth;
use super::{log_requests, metrics, state::*, RequestsLoggingLevel, ServerConfig};
use crate::catalog::CatalogStore;
use crate::ingestion::IngestionOrchestrator;
use crate::projection::ProjectionDefaults;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub media_items: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        media_items: state.catalog_store.count().unwrap_or(0),
    };
    Json(stats)
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        orchestrator: GuardedOrchestrator,
        admin_auth: GuardedAdminAuth,
        projection_defaults: ProjectionDefaults,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            orchestrator,
            admin_auth,
            projection_defaults: Arc::new(projection_defaults),
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    orchestrator: GuardedOrchestrator,
    admin_auth: AdminAuth,
    projection_defaults: ProjectionDefaults,
) -> Result<Router> {
    let state = ServerState::new(
        config.clone(),
        catalog_store,
        orchestrator,
        Arc::new(admin_auth),
        projection_defaults,
    );

    let samples: Router = sample_routes(config.samples_cache_age_sec)
        .with_state(state.clone());

    let admin: Router = admin_routes().with_state(state.clone());

    let uploads: Router = Router::new()
        .route("/compressed/{filename}", get(serve_compressed))
        .route("/thumbnails/{filename}", get(serve_thumbnail))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router
        .nest("/api/samples", samples)
        .nest("/api/admin", admin)
        .nest("/uploads", uploads);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

#[allow(clippy::too_many_arguments)]
pub async fn run_server(
    catalog_store: Arc<dyn CatalogStore>,
    orchestrator: Arc<IngestionOrchestrator>,
    admin_auth: AdminAuth,
    projection_defaults: ProjectionDefaults,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    metrics_port: u16,
    samples_cache_age_sec: usize,
    media_dir: std::path::PathBuf,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        samples_cache_age_sec,
        media_dir,
        frontend_dir_path,
    };
    let app = make_app(
        config,
        catalog_store,
        orchestrator,
        admin_auth,
        projection_defaults,
    )?;

    // Metrics are scraped on their own port, away from the public surface.
    let metrics_app: Router = Router::new().route("/metrics", get(metrics::metrics_handler));
    tokio::spawn(async move {
        let listener =
            tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
                .await
                .expect("Failed to bind metrics port");
        if let Err(err) = axum::serve(listener, metrics_app).await {
            tracing::error!("Metrics server failed: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalogStore;
    use crate::ingestion::{FfmpegTranscoder, FileHandler, TranscoderConfig};
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt; // for `oneshot`

    fn make_test_app(temp: &tempfile::TempDir) -> Router {
        let media_dir = temp.path().join("media");
        let store: GuardedCatalogStore = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let orchestrator = Arc::new(IngestionOrchestrator::new(
            store.clone(),
            Arc::new(FfmpegTranscoder::new(&media_dir, TranscoderConfig::default())),
            FileHandler::new(temp.path().join("staging"), &media_dir, 1024),
        ));
        let admin_auth =
            AdminAuth::new(None, Some("pw".to_string()), Some("secret".to_string())).unwrap();

        make_app(
            ServerConfig {
                media_dir,
                ..Default::default()
            },
            store,
            orchestrator,
            admin_auth,
            ProjectionDefaults::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn responds_unauthorized_on_admin_routes() {
        let temp = tempfile::TempDir::new().unwrap();
        let app = make_test_app(&temp);

        let protected_routes = vec![
            ("GET", "/api/admin/media"),
            ("GET", "/api/admin/media/123"),
            ("PATCH", "/api/admin/media/123"),
            ("DELETE", "/api/admin/media/123"),
            ("POST", "/api/admin/media/upload"),
        ];

        for (method, route) in protected_routes.into_iter() {
            println!("Trying route {} {}", method, route);
            let request = Request::builder()
                .method(method)
                .uri(route)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn public_routes_do_not_require_a_session() {
        let temp = tempfile::TempDir::new().unwrap();
        let app = make_test_app(&temp);

        for route in [
            "/",
            "/api/samples/demo-videos",
            "/api/samples/avatars",
            "/api/samples/voice-samples",
            "/api/samples/edited-videos",
            "/api/samples/podcast-samples",
            "/api/admin/check-auth",
        ] {
            let request = Request::builder().uri(route).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "route {}", route);
        }
    }

    #[tokio::test]
    async fn unknown_media_file_is_not_found() {
        let temp = tempfile::TempDir::new().unwrap();
        let app = make_test_app(&temp);

        let request = Request::builder()
            .uri("/uploads/compressed/missing.mp4")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
