//! Cache-Control middleware for the public sample endpoints.
//!
//! Projection output changes only when the admin edits the catalog, so a
//! short shared max-age takes most of the read traffic off the server.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

pub async fn http_cache(
    State(max_age_sec): State<usize>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if max_age_sec > 0 && response.status().is_success() {
        if let Ok(value) =
            HeaderValue::from_str(&format!("public, max-age={}", max_age_sec))
        {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
    }

    response
}
