//! Shared constants for end-to-end tests
//!
//! When test data changes (credentials, timeouts), update only this file.

// ============================================================================
// Admin Credential
// ============================================================================

/// The shared admin password every test server is configured with
pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Categories (the wire strings the dashboard submits)
// ============================================================================

pub const CATEGORY_VIDEO_STUDIO: &str = "AI Video Studio";
pub const CATEGORY_AVATARS: &str = "Avatar Studio";
pub const CATEGORY_VOICE_ADS: &str = "Professional Multilingual Voice Ads";
pub const CATEGORY_PODCASTS: &str = "AI Podcast Production";

// ============================================================================
// Timeouts
// ============================================================================

/// Per-request timeout for the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long to wait for a spawned server to accept requests
pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;

/// Poll interval while waiting for the server
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
