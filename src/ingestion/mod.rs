//! Media ingestion: staging, transcoding, and cataloging of admin uploads.
//!
//! Upload workflow:
//! 1. Admin uploads a video/audio file with title + category
//! 2. Declared type checked, content sniffed, bytes staged with a size cap
//! 3. ffmpeg compresses to a web-friendly format (+thumbnail for video)
//! 4. A catalog record referencing the derived artifacts is persisted
//! 5. Staging is cleaned up on every exit path

mod file_handler;
mod orchestrator;
mod transcoder;

pub use file_handler::{unique_output_name, FileHandler, FileHandlerError};
pub use orchestrator::{IngestionError, IngestionOrchestrator, StagedUpload, UploadMeta};
pub use transcoder::{
    FfmpegTranscoder, TranscodeError, TranscodeOutput, Transcoder, TranscoderConfig,
};
