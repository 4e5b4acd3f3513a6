use super::job::OutputTarget;
use crate::config::{Config, OutputConfig};
use crate::error::HlsGrabError;
use crate::fetch::{HttpFetcher, SegmentFetcher};
use crate::playlist::{HttpPlaylistResolver, PlaylistResolver};
use crate::scratch::ScratchDir;
use crate::transcode::{FfmpegTranscoder, Transcoder};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a worker needs to run jobs, shared by all workers of a pool.
#[derive(Clone)]
pub struct EngineContext {
    pub scratch: ScratchDir,
    pub resolver: Arc<dyn PlaylistResolver>,
    pub fetcher: Arc<dyn SegmentFetcher>,
    pub transcoder: Arc<dyn Transcoder>,
    pub output: OutputConfig,
}

impl EngineContext {
    pub fn new(
        scratch: ScratchDir,
        resolver: Arc<dyn PlaylistResolver>,
        fetcher: Arc<dyn SegmentFetcher>,
        transcoder: Arc<dyn Transcoder>,
        output: OutputConfig,
    ) -> Self {
        Self {
            scratch,
            resolver,
            fetcher,
            transcoder,
            output,
        }
    }

    /// Builds the HTTP and ffmpeg backed context described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, HlsGrabError> {
        let scratch = ScratchDir::from_config(config.scratch_dir.as_deref())?;
        let fetcher = HttpFetcher::new(&config.http)?;
        let resolver = HttpPlaylistResolver::new(fetcher.client().clone());
        let transcoder = FfmpegTranscoder::new(&config.transcode);

        tracing::info!(scratch = %scratch.path().display(), "Staging segments in scratch directory");

        Ok(Self::new(
            scratch,
            Arc::new(resolver),
            Arc::new(fetcher),
            Arc::new(transcoder),
            config.output.clone(),
        ))
    }

    pub fn container_path(&self, target: &OutputTarget) -> PathBuf {
        target.destination_directory.join(format!(
            "{}.{}",
            target.base_name, self.output.container_extension
        ))
    }

    pub fn output_path(&self, target: &OutputTarget) -> PathBuf {
        target
            .destination_directory
            .join(format!("{}.{}", target.base_name, self.output.extension))
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("scratch", &self.scratch)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
