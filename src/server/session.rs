//! Admin session gate: a single shared credential behind a signed cookie.
//!
//! Login verifies the password against an argon2 hash and issues a short
//! HS256 token in an HttpOnly cookie. Route handlers take `Session` as an
//! extractor; everything behind it is a boolean yes/no gate, there are no
//! per-user permissions.

use super::state::ServerState;

use anyhow::{bail, Context, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const COOKIE_SESSION_TOKEN_KEY: &str = "admin_session";

/// Session lifetime; matches the cookie max-age.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Holds the shared admin credential and the cookie signing key.
pub struct AdminAuth {
    password_hash: String,
    signing_secret: Vec<u8>,
}

impl AdminAuth {
    /// Build from either a precomputed argon2 PHC hash or a plaintext
    /// password (hashed at startup). Without a configured signing secret a
    /// random one is generated, which invalidates sessions on restart.
    pub fn new(
        password_hash: Option<String>,
        plain_password: Option<String>,
        signing_secret: Option<String>,
    ) -> Result<Self> {
        let password_hash = match (password_hash, plain_password) {
            (Some(hash), _) => {
                PasswordHash::new(&hash)
                    .map_err(|e| anyhow::anyhow!("Invalid admin password hash: {}", e))?;
                hash
            }
            (None, Some(password)) => {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?
                    .to_string()
            }
            (None, None) => {
                bail!("No admin credential configured (set ADMIN_PASSWORD or ADMIN_PASSWORD_HASH)")
            }
        };

        let signing_secret = match signing_secret {
            Some(secret) => secret.into_bytes(),
            None => {
                warn!("No session secret configured; sessions will not survive a restart");
                let mut bytes = vec![0u8; 32];
                rand::rng().fill_bytes(&mut bytes);
                bytes
            }
        };

        Ok(Self {
            password_hash,
            signing_secret,
        })
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Issue a signed session token.
    pub fn issue_token(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "admin".to_string(),
            iat: now,
            exp: now + SESSION_TTL_HOURS * 3600,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.signing_secret),
        )
        .context("Failed to sign session token")
    }

    /// Validate a session token (signature and expiry).
    pub fn verify_token(&self, token: &str) -> bool {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.signing_secret),
            &Validation::default(),
        )
        .is_ok()
    }

    /// Build the session cookie for a fresh token.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((COOKIE_SESSION_TOKEN_KEY, token))
            .path("/")
            .http_only(true)
            .same_site(axum_extra::extract::cookie::SameSite::Lax)
            .max_age(time::Duration::hours(SESSION_TTL_HOURS))
            .build()
    }

    /// An already-expired cookie that clears the session on the client.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::new(COOKIE_SESSION_TOKEN_KEY, "");
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_expires(time::OffsetDateTime::now_utc() - time::Duration::days(1));
        cookie
    }
}

/// Proof that the request carries a valid admin session.
#[derive(Debug)]
pub struct Session {}

pub struct SessionExtractionError {}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Authentication required" })),
        )
            .into_response()
    }
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Option<Session> {
    let jar = CookieJar::from_request_parts(parts, ctx)
        .await
        .expect("Could not read cookies into CookieJar.");

    let token = match jar.get(COOKIE_SESSION_TOKEN_KEY).map(Cookie::value) {
        None => {
            debug!("No session token cookie in request.");
            return None;
        }
        Some(x) => x,
    };

    if ctx.admin_auth.verify_token(token) {
        Some(Session {})
    } else {
        debug!("Session token failed validation.");
        None
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
            .await
            .ok_or(SessionExtractionError {})
    }
}

impl FromRequestParts<ServerState> for Option<Session> {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx).await)
    }
}
