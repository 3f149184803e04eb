//! Derived media file serving with byte-range support.
//!
//! Video and audio playback depends on partial-content responses, so range
//! requests (including suffix ranges) are honored on every media path.
//! Derived filenames are unique and never rewritten, which makes long-lived
//! immutable caching safe.

use super::config::ServerConfig;
use super::state::ServerState;
use axum::{
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, BufReader, SeekFrom},
};
use tokio_util::io::ReaderStream;
use tracing::debug;

const HEADER_BYTE_RANGE: &str = "Range";
const STREAM_BUFFER_SIZE: usize = 4096 * 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start_inclusive: Option<u64>,
    end_inclusive: Option<u64>,
}

impl ByteRange {
    pub fn new(start_inclusive: Option<u64>, end_inclusive: Option<u64>) -> ByteRange {
        ByteRange {
            start_inclusive,
            end_inclusive,
        }
    }

    fn parse<S: AsRef<str>>(s: S) -> Option<ByteRange> {
        let v = s.as_ref();
        if !v.starts_with("bytes=") {
            return None;
        }

        let v = &v[6..];
        let parts: Vec<&str> = v.split('-').collect();
        if parts.len() != 2 {
            return None;
        }

        Some(ByteRange {
            start_inclusive: parts[0].parse::<u64>().ok(),
            end_inclusive: parts[1].parse::<u64>().ok(),
        })
    }

    /// Resolve against a file length to an inclusive window, or None when
    /// the range cannot be satisfied. `bytes=-N` means the last N bytes.
    fn resolve(&self, file_length: u64) -> Option<(u64, u64)> {
        if file_length == 0 {
            return None;
        }
        let last = file_length - 1;

        match (self.start_inclusive, self.end_inclusive) {
            (None, None) => Some((0, last)),
            (Some(start), None) => (start <= last).then_some((start, last)),
            (Some(start), Some(end)) => {
                (start <= end && start <= last).then_some((start, end.min(last)))
            }
            (None, Some(suffix)) => {
                (suffix > 0).then(|| (file_length.saturating_sub(suffix), last))
            }
        }
    }

    fn is_full(&self) -> bool {
        self.start_inclusive.is_none() && self.end_inclusive.is_none()
    }
}

pub struct ByteRangeExtractionError {}

impl IntoResponse for ByteRangeExtractionError {
    fn into_response(self) -> Response {
        StatusCode::BAD_REQUEST.into_response()
    }
}

impl FromRequestParts<ServerState> for Option<ByteRange> {
    type Rejection = ByteRangeExtractionError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(HEADER_BYTE_RANGE)
            .map(|x| x.to_str())
            .map(|x| x.ok())
            .and_then(|x| x.and_then(ByteRange::parse)))
    }
}

pub async fn serve_compressed(
    byte_range: Option<ByteRange>,
    State(config): State<ServerConfig>,
    Path(filename): Path<String>,
) -> Response {
    serve_media_file(config.media_dir.join("compressed"), filename, byte_range).await
}

pub async fn serve_thumbnail(
    byte_range: Option<ByteRange>,
    State(config): State<ServerConfig>,
    Path(filename): Path<String>,
) -> Response {
    serve_media_file(config.media_dir.join("thumbnails"), filename, byte_range).await
}

async fn serve_media_file(
    dir: PathBuf,
    filename: String,
    byte_range: Option<ByteRange>,
) -> Response {
    // The route parameter is a single path segment, but stay paranoid.
    if filename.contains('/') || filename.contains('\\') || filename.starts_with('.') {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = dir.join(&filename);
    let mut file = match File::open(&path).await {
        Ok(x) => x,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    let file_length = match file.metadata().await {
        Ok(x) => x.len(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    debug!("Serving media file {} ({} bytes)", filename, file_length);

    let range = byte_range.unwrap_or(ByteRange::new(None, None));

    if file_length == 0 && range.is_full() {
        return Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", content_type_for(&filename))
            .header("Accept-Ranges", "bytes")
            .header("Content-Length", 0)
            .body(Body::empty())
            .unwrap();
    }

    let Some((start, end)) = range.resolve(file_length) else {
        return Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header("Content-Range", format!("bytes */{}", file_length))
            .body(Body::empty())
            .unwrap();
    };

    if start > 0 && file.seek(SeekFrom::Start(start)).await.is_err() {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let chunk_size = end - start + 1;
    let status_code = if range.is_full() {
        StatusCode::OK
    } else {
        StatusCode::PARTIAL_CONTENT
    };

    let file_reader = BufReader::with_capacity(STREAM_BUFFER_SIZE, file.take(chunk_size));
    let stream = ReaderStream::with_capacity(file_reader, STREAM_BUFFER_SIZE);
    let body = Body::from_stream(stream);

    let mut builder = Response::builder()
        .status(status_code)
        .header("Content-Type", content_type_for(&filename))
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", chunk_size)
        // Derived names are unique and never overwritten in place
        .header("Cache-Control", "public, max-age=31536000, immutable");

    if status_code == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(
            "Content-Range",
            format!("bytes {}-{}/{}", start, end, file_length),
        );
    }

    builder.body(body).unwrap()
}

/// Content type by extension; the transcoder only ever emits these.
fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("");
    match ext {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}
