//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for the media server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows and the public endpoints.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in with the shared admin credential
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(ADMIN_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Admin authentication failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub async fn login(&self, password: &str) -> Response {
        self.client
            .post(format!("{}/api/admin/login", self.base_url))
            .json(&json!({ "password": password }))
            .send()
            .await
            .expect("login request failed")
    }

    pub async fn logout(&self) -> Response {
        self.client
            .post(format!("{}/api/admin/logout", self.base_url))
            .send()
            .await
            .expect("logout request failed")
    }

    pub async fn check_auth(&self) -> Response {
        self.client
            .get(format!("{}/api/admin/check-auth", self.base_url))
            .send()
            .await
            .expect("check-auth request failed")
    }

    // ========================================================================
    // Admin media
    // ========================================================================

    pub async fn list_media(&self) -> Response {
        self.client
            .get(format!("{}/api/admin/media", self.base_url))
            .send()
            .await
            .expect("list media request failed")
    }

    pub async fn get_media(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/api/admin/media/{}", self.base_url, id))
            .send()
            .await
            .expect("get media request failed")
    }

    pub async fn update_media(&self, id: &str, body: serde_json::Value) -> Response {
        self.client
            .patch(format!("{}/api/admin/media/{}", self.base_url, id))
            .json(&body)
            .send()
            .await
            .expect("update media request failed")
    }

    pub async fn delete_media(&self, id: &str) -> Response {
        self.client
            .delete(format!("{}/api/admin/media/{}", self.base_url, id))
            .send()
            .await
            .expect("delete media request failed")
    }

    /// Multipart upload with the standard field set.
    pub async fn upload_media(
        &self,
        bytes: &'static [u8],
        filename: &str,
        mime: &str,
        title: &str,
        category: &str,
        audio_metadata: Option<&str>,
    ) -> Response {
        let mut form = Form::new()
            .text("title", title.to_string())
            .text("category", category.to_string())
            .part(
                "file",
                Part::bytes(bytes)
                    .file_name(filename.to_string())
                    .mime_str(mime)
                    .expect("invalid test mime"),
            );

        if let Some(metadata) = audio_metadata {
            form = form.text("audioMetadata", metadata.to_string());
        }

        self.client
            .post(format!("{}/api/admin/media/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("upload request failed")
    }

    // ========================================================================
    // Public endpoints
    // ========================================================================

    pub async fn get_samples(&self, shape: &str) -> Response {
        self.client
            .get(format!("{}/api/samples/{}", self.base_url, shape))
            .send()
            .await
            .expect("samples request failed")
    }

    pub async fn get_file(&self, public_path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, public_path))
            .send()
            .await
            .expect("file request failed")
    }

    pub async fn get_file_range(&self, public_path: &str, range: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, public_path))
            .header("Range", range)
            .send()
            .await
            .expect("ranged file request failed")
    }
}
