use super::job::OutputTarget;
use crate::playlist::PlaylistError;
use crate::transcode::TranscodeError;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Failed to resolve playlist: {0}")]
    Resolve(#[from] PlaylistError),

    #[error("Playlist contains no segments")]
    EmptyPlaylist,

    #[error("Job queue closed before all segments were submitted")]
    QueueClosed,

    #[error("Destination directory {path} is unavailable: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create container {path}: {source}")]
    Container {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append segment {position} from {path}: {source}")]
    Assembly {
        position: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to transcode {input}: {source}")]
    Transcode {
        input: PathBuf,
        #[source]
        source: TranscodeError,
    },

    #[error("List job was dropped before reporting an outcome")]
    Abandoned,
}

/// What became of one list job.
#[derive(Debug)]
pub enum ListOutcome {
    /// Every segment was assembled and the container transcoded.
    Completed {
        container: PathBuf,
        output: PathBuf,
        segments: usize,
    },
    /// Assembly stopped at the first position without a staged segment.
    /// `container` holds positions `0..assembled`; `missing` lists the
    /// positions whose downloads failed.
    Incomplete {
        container: PathBuf,
        assembled: usize,
        missing: Vec<usize>,
    },
    Failed(ListError),
}

impl ListOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ListOutcome::Completed { .. })
    }
}

/// Resolves to the outcome of a submitted list job.
#[derive(Debug)]
pub struct ListHandle {
    source_url: String,
    target: OutputTarget,
    rx: oneshot::Receiver<ListOutcome>,
}

impl ListHandle {
    pub(crate) fn new(
        source_url: String,
        target: OutputTarget,
        rx: oneshot::Receiver<ListOutcome>,
    ) -> Self {
        Self {
            source_url,
            target,
            rx,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn target(&self) -> &OutputTarget {
        &self.target
    }
}

impl Future for ListHandle {
    type Output = ListOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| ListOutcome::Failed(ListError::Abandoned)))
    }
}
