use super::outcome::ListOutcome;
use super::wait_group::WaitGroup;
use itertools::Itertools;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

/// Where a list job's output lands: `<destination_directory>/<base_name>.<ext>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTarget {
    pub destination_directory: PathBuf,
    pub base_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    ListDownload,
    SegmentDownload,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::ListDownload => f.write_str("list"),
            JobKind::SegmentDownload => f.write_str("segment"),
        }
    }
}

#[derive(Debug)]
pub enum Job {
    List(ListJob),
    Segment(SegmentJob),
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::List(_) => JobKind::ListDownload,
            Job::Segment(_) => JobKind::SegmentDownload,
        }
    }

    pub fn source_url(&self) -> &str {
        match self {
            Job::List(job) => &job.source_url,
            Job::Segment(job) => &job.source_url,
        }
    }
}

#[derive(Debug)]
pub struct ListJob {
    pub source_url: String,
    pub target: OutputTarget,
    pub reply: oneshot::Sender<ListOutcome>,
    pub(crate) lease: NameLease,
}

/// Base names of the lists a pool is currently working on. Staged segments
/// are named after the base name, so only one live list may use each name.
#[derive(Debug, Default)]
pub(crate) struct ActiveNames {
    names: Mutex<HashSet<String>>,
}

impl ActiveNames {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        match self.names.lock() {
            Ok(names) => names,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Reserves `name` until the returned lease is dropped. `None` if another
    /// list holds it.
    pub fn claim(self: &Arc<Self>, name: &str) -> Option<NameLease> {
        if !self.lock().insert(name.to_string()) {
            return None;
        }
        Some(NameLease {
            names: Arc::clone(self),
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }
}

#[derive(Debug)]
pub(crate) struct NameLease {
    names: Arc<ActiveNames>,
    name: String,
}

impl Drop for NameLease {
    fn drop(&mut self) {
        self.names.lock().remove(&self.name);
    }
}

#[derive(Debug)]
pub struct SegmentJob {
    pub source_url: String,
    pub target: Arc<OutputTarget>,
    pub position: usize,
    pub report: SegmentReport,
}

/// Completion state shared between a list job and the segment jobs it spawned.
#[derive(Debug, Default)]
pub struct ListProgress {
    pending: WaitGroup,
    failed: Mutex<Vec<usize>>,
}

impl ListProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more outstanding segment. The returned report must travel
    /// with the segment job; dropping it is what marks the segment finished.
    pub fn register(self: &Arc<Self>, position: usize) -> SegmentReport {
        self.pending.add(1);
        SegmentReport {
            progress: Arc::clone(self),
            position,
            succeeded: false,
        }
    }

    pub fn outstanding(&self) -> usize {
        self.pending.count()
    }

    pub async fn wait(&self) {
        self.pending.wait().await;
    }

    /// Positions whose segment jobs finished without a staged file.
    pub fn failed_positions(&self) -> Vec<usize> {
        let failed = match self.failed.lock() {
            Ok(failed) => failed,
            Err(poisoned) => poisoned.into_inner(),
        };
        failed.iter().copied().sorted().collect()
    }

    fn finish(&self, position: usize, succeeded: bool) -> bool {
        if !succeeded {
            match self.failed.lock() {
                Ok(mut failed) => failed.push(position),
                Err(poisoned) => poisoned.into_inner().push(position),
            }
        }
        self.pending.done()
    }
}

/// A segment job's handle on its parent's [`ListProgress`].
///
/// Reports exactly once: when dropped, as a failure unless [`succeed`] was
/// called first.
///
/// [`succeed`]: SegmentReport::succeed
#[derive(Debug)]
pub struct SegmentReport {
    progress: Arc<ListProgress>,
    position: usize,
    succeeded: bool,
}

impl SegmentReport {
    pub fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for SegmentReport {
    fn drop(&mut self) {
        if self.progress.finish(self.position, self.succeeded) {
            tracing::trace!(position = self.position, "Last outstanding segment reported");
        }
    }
}
