use super::RequestsLoggingLevel;
use std::path::PathBuf;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Cache-Control max-age for the public sample endpoints, in seconds.
    /// Catalog changes are rare relative to site traffic.
    pub samples_cache_age_sec: usize,
    /// Directory holding the derived files (`compressed/`, `thumbnails/`).
    pub media_dir: PathBuf,
    /// Static frontend bundle to serve at the root, if any.
    pub frontend_dir_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            samples_cache_age_sec: 300,
            media_dir: PathBuf::from("media"),
            frontend_dir_path: None,
        }
    }
}
