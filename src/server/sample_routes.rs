//! Public sample endpoints feeding the marketing site.
//!
//! One read-only endpoint per category shape:
//! - GET /demo-videos
//! - GET /avatars
//! - GET /voice-samples
//! - GET /edited-videos
//! - GET /podcast-samples
//!
//! All of them are pure reads over the catalog and sit behind the shared
//! Cache-Control layer.

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::error;

use super::http_layers::http_cache;
use super::state::ServerState;
use crate::catalog::{CatalogStore, Category};
use crate::projection::project;

async fn samples_for(category: Category, state: &ServerState) -> Response {
    match state.catalog_store.list_by_category(category) {
        Ok(records) => {
            let views = project(category, &records, &state.projection_defaults);
            Json(views).into_response()
        }
        Err(err) => {
            error!("Error fetching samples for {}: {}", category, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to fetch samples" })),
            )
                .into_response()
        }
    }
}

async fn get_demo_videos(state: axum::extract::State<ServerState>) -> Response {
    samples_for(Category::VideoStudio, &state).await
}

async fn get_avatars(state: axum::extract::State<ServerState>) -> Response {
    samples_for(Category::AvatarStudio, &state).await
}

async fn get_voice_samples(state: axum::extract::State<ServerState>) -> Response {
    samples_for(Category::VoiceAds, &state).await
}

async fn get_edited_videos(state: axum::extract::State<ServerState>) -> Response {
    samples_for(Category::VideoEditing, &state).await
}

async fn get_podcast_samples(state: axum::extract::State<ServerState>) -> Response {
    samples_for(Category::PodcastProduction, &state).await
}

pub fn sample_routes(cache_age_sec: usize) -> Router<ServerState> {
    Router::new()
        .route("/demo-videos", get(get_demo_videos))
        .route("/avatars", get(get_avatars))
        .route("/voice-samples", get(get_voice_samples))
        .route("/edited-videos", get(get_edited_videos))
        .route("/podcast-samples", get(get_podcast_samples))
        .layer(middleware::from_fn_with_state(cache_age_sec, http_cache))
}
