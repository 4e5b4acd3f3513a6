//! In-memory collaborators for engine tests.

use super::context::EngineContext;
use crate::config::OutputConfig;
use crate::fetch::{FetchError, FetchResponse, SegmentFetcher};
use crate::playlist::{PlaylistError, PlaylistResolver};
use crate::scratch::ScratchDir;
use crate::transcode::{TranscodeError, Transcoder};
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Clone, Debug)]
enum Reply {
    Body(Vec<u8>),
    Status(u16),
    Truncated { body: Vec<u8>, declared: u64 },
}

#[derive(Debug, Default)]
pub struct FakeFetcher {
    replies: HashMap<String, Reply>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: &[u8]) -> Self {
        self.replies.insert(url.to_string(), Reply::Body(body.to_vec()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.replies.insert(url.to_string(), Reply::Status(status));
        self
    }

    pub fn with_truncated_body(mut self, url: &str, body: &[u8], declared: u64) -> Self {
        self.replies.insert(
            url.to_string(),
            Reply::Truncated {
                body: body.to_vec(),
                declared,
            },
        );
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn body_stream(body: Vec<u8>) -> futures::stream::BoxStream<'static, Result<Bytes, FetchError>> {
    // Split into a few chunks so writers see more than one poll.
    let chunks: Vec<Result<Bytes, FetchError>> = body
        .chunks(5)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    stream::iter(chunks).boxed()
}

impl SegmentFetcher for FakeFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, FetchError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            match self.replies.get(url).cloned() {
                Some(Reply::Body(body)) => Ok(FetchResponse {
                    status: 200,
                    content_length: Some(body.len() as u64),
                    body: body_stream(body),
                }),
                Some(Reply::Status(status)) => Ok(FetchResponse {
                    status,
                    content_length: Some(0),
                    body: body_stream(Vec::new()),
                }),
                Some(Reply::Truncated { body, declared }) => Ok(FetchResponse {
                    status: 200,
                    content_length: Some(declared),
                    body: body_stream(body),
                }),
                None => Err(FetchError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("no route to {url}"),
                ))),
            }
        }
        .boxed()
    }
}

#[derive(Debug, Default)]
pub struct FakeResolver {
    playlists: HashMap<String, Vec<String>>,
}

impl FakeResolver {
    pub fn with_playlist(mut self, url: &str, segments: &[&str]) -> Self {
        self.playlists.insert(
            url.to_string(),
            segments.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

impl PlaylistResolver for FakeResolver {
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<String>, PlaylistError>> {
        let result = self
            .playlists
            .get(url)
            .cloned()
            .ok_or_else(|| PlaylistError::Status {
                url: url.to_string(),
                status: 404,
            });
        futures::future::ready(result).boxed()
    }
}

/// Records every call; fails when `fail` is set.
#[derive(Debug, Default)]
pub struct RecordingTranscoder {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    fail: bool,
}

impl RecordingTranscoder {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::default(),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transcoder for RecordingTranscoder {
    fn transcode<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<(), TranscodeError>> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        let result = if self.fail {
            Err(TranscodeError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "invalid data found when processing input".to_string(),
            })
        } else {
            Ok(())
        };
        futures::future::ready(result).boxed()
    }
}

/// Temporary directories backing a test context; removed on drop.
pub struct TestDirs {
    pub scratch: TempDir,
    pub output: TempDir,
}

pub fn test_context(
    resolver: Arc<dyn PlaylistResolver>,
    fetcher: Arc<dyn SegmentFetcher>,
    transcoder: Arc<dyn Transcoder>,
) -> (EngineContext, TestDirs) {
    let dirs = TestDirs {
        scratch: tempfile::tempdir().unwrap(),
        output: tempfile::tempdir().unwrap(),
    };
    let ctx = EngineContext::new(
        ScratchDir::at(dirs.scratch.path()).unwrap(),
        resolver,
        fetcher,
        transcoder,
        OutputConfig::default(),
    );
    (ctx, dirs)
}
