//! Admin HTTP routes.
//!
//! Provides endpoints for:
//! - Logging in/out of the admin dashboard (signed-cookie session)
//! - Uploading media for ingestion (multipart/form-data)
//! - Managing the media catalog (list, get, update metadata, delete)
//!
//! Everything except login/check-auth requires a valid session.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio_util::io::StreamReader;
use tracing::{info, warn};

use super::metrics::{record_ingestion, set_catalog_size};
use super::session::Session;
use super::state::{GuardedAdminAuth, GuardedCatalogStore, GuardedOrchestrator, ServerState};
use crate::catalog::{CatalogStore, MediaUpdate};
use crate::ingestion::{IngestionError, StagedUpload, UploadMeta};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginBody {
    pub password: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct CheckAuthResponse {
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Map an ingestion failure to a response. User-correctable problems carry
/// their message; server-side failures get a generic body so no internal
/// detail (paths, ffmpeg stderr) leaks to the client.
fn ingestion_error_response(err: &IngestionError) -> Response {
    match err {
        IngestionError::InvalidFileType(_) | IngestionError::Validation(_) => {
            error_json(StatusCode::BAD_REQUEST, err.to_string())
        }
        IngestionError::FileTooLarge(_) => {
            error_json(StatusCode::PAYLOAD_TOO_LARGE, err.to_string())
        }
        IngestionError::Transcode(transcode) if transcode.is_timeout() => {
            warn!("Transcode timed out: {}", transcode);
            error_json(
                StatusCode::GATEWAY_TIMEOUT,
                "Media processing timed out, please retry",
            )
        }
        IngestionError::Transcode(transcode) => {
            warn!("Transcode failed: {}", transcode);
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to upload and process media",
            )
        }
        IngestionError::FileHandler(inner) => {
            warn!("File handling failed: {}", inner);
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to upload and process media",
            )
        }
        IngestionError::Storage(inner) => {
            warn!("Storage failure during ingestion: {}", inner);
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to upload and process media",
            )
        }
    }
}

// =============================================================================
// Auth Routes
// =============================================================================

/// POST /login - verify the shared admin credential, set the session cookie
async fn login(
    State(auth): State<GuardedAdminAuth>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Response {
    if !auth.verify_password(&body.password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse {
                success: false,
                message: "Invalid credentials".to_string(),
            }),
        )
            .into_response();
    }

    match auth.issue_token() {
        Ok(token) => {
            let jar = jar.add(auth.session_cookie(token));
            (
                jar,
                Json(MessageResponse {
                    success: true,
                    message: "Login successful".to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            warn!("Failed to issue session token: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /logout - expire the session cookie
async fn logout(State(auth): State<GuardedAdminAuth>, jar: CookieJar) -> Response {
    let jar = jar.add(auth.removal_cookie());
    (
        jar,
        Json(MessageResponse {
            success: true,
            message: "Logout successful".to_string(),
        }),
    )
        .into_response()
}

/// GET /check-auth - session probe for the dashboard; never errors
async fn check_auth(session: Option<Session>) -> Json<CheckAuthResponse> {
    Json(CheckAuthResponse {
        authenticated: session.is_some(),
    })
}

// =============================================================================
// Media Routes
// =============================================================================

/// GET /media - list the whole catalog, most recent first
async fn list_media(_session: Session, State(store): State<GuardedCatalogStore>) -> Response {
    match store.list() {
        Ok(records) => Json(records).into_response(),
        Err(err) => {
            warn!("Error fetching media: {}", err);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch media")
        }
    }
}

/// GET /media/:id
async fn get_media(
    _session: Session,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    match store.get(&id) {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, "Media not found"),
        Err(err) => {
            warn!("Error fetching media {}: {}", id, err);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch media")
        }
    }
}

/// POST /media/upload - multipart upload, transcode, catalog
///
/// Fields: `file` (binary), `title`, `category`, optional `description`,
/// optional `audioMetadata` (JSON string). The file field is streamed into
/// staging as it arrives; the other fields may come in any order around it.
async fn upload_media(
    _session: Session,
    State(orchestrator): State<GuardedOrchestrator>,
    State(store): State<GuardedCatalogStore>,
    mut multipart: Multipart,
) -> Response {
    let start = Instant::now();

    let mut staged: Option<StagedUpload> = None;
    let mut meta = UploadMeta::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!("Failed to read multipart field: {}", err);
                if let Some(staged) = staged.take() {
                    orchestrator.discard(staged).await;
                }
                return error_json(StatusCode::BAD_REQUEST, "Malformed upload");
            }
        };

        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                if staged.is_some() {
                    continue;
                }
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload".to_string());
                let declared_mime = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                let reader = Box::pin(StreamReader::new(field.map_err(std::io::Error::other)));
                match orchestrator.stage(&filename, &declared_mime, reader).await {
                    Ok(upload) => staged = Some(upload),
                    Err(err) => return ingestion_error_response(&err),
                }
            }
            "title" => meta.title = field.text().await.unwrap_or_default(),
            "category" => meta.category = field.text().await.unwrap_or_default(),
            "description" => {
                meta.description = field.text().await.ok().filter(|s| !s.is_empty())
            }
            "audioMetadata" => {
                meta.audio_metadata_json = field.text().await.ok().filter(|s| !s.is_empty())
            }
            _ => {}
        }
    }

    let Some(staged) = staged else {
        return error_json(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let file_type = staged.file_type;
    match orchestrator.ingest(staged, meta).await {
        Ok(record) => {
            info!("Uploaded media {} ({})", record.id, record.title);
            record_ingestion("success", file_type.as_str(), start.elapsed());
            if let Ok(count) = store.count() {
                set_catalog_size(count);
            }
            Json(record).into_response()
        }
        Err(err) => {
            record_ingestion("failure", file_type.as_str(), start.elapsed());
            ingestion_error_response(&err)
        }
    }
}

/// PATCH /media/:id - update the mutable metadata subset
async fn update_media(
    _session: Session,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    // Deserialize by hand so unknown (immutable) fields are a clean 400
    // rather than a silent drop.
    let update: MediaUpdate = match serde_json::from_value(body) {
        Ok(update) => update,
        Err(err) => {
            return error_json(StatusCode::BAD_REQUEST, format!("Invalid data: {}", err))
        }
    };

    if let Err(msg) = update.validate() {
        return error_json(StatusCode::BAD_REQUEST, msg);
    }

    match store.update(&id, update) {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, "Media not found"),
        Err(err) => {
            warn!("Error updating media {}: {}", id, err);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update media")
        }
    }
}

/// DELETE /media/:id - remove the record and its derived files
async fn delete_media(
    _session: Session,
    State(orchestrator): State<GuardedOrchestrator>,
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    match orchestrator.delete_media(&id).await {
        Ok(true) => {
            if let Ok(count) = store.count() {
                set_catalog_size(count);
            }
            Json(MessageResponse {
                success: true,
                message: "Media deleted successfully".to_string(),
            })
            .into_response()
        }
        Ok(false) => error_json(StatusCode::NOT_FOUND, "Media not found"),
        Err(err) => {
            warn!("Error deleting media {}: {}", id, err);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete media")
        }
    }
}

// =============================================================================
// Router Construction
// =============================================================================

/// Build the admin routes.
///
/// Auth:
/// - POST /login, POST /logout, GET /check-auth
///
/// Catalog (session required):
/// - GET /media, GET /media/:id
/// - POST /media/upload (multipart)
/// - PATCH /media/:id, DELETE /media/:id
pub fn admin_routes() -> Router<ServerState> {
    // Generous transport limit; the real ceiling is enforced while staging.
    let upload_route = Router::new()
        .route("/media/upload", post(upload_media))
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024 * 1024));

    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/check-auth", get(check_auth))
        .route("/media", get(list_media))
        .route(
            "/media/{id}",
            get(get_media).patch(update_media).delete(delete_media),
        )
        .merge(upload_route)
}
