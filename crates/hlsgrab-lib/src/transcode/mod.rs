mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;

use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Failed to start transcoder {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transcoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Converts an assembled container into the final output format.
pub trait Transcoder: Send + Sync {
    fn transcode<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<(), TranscodeError>>;
}
