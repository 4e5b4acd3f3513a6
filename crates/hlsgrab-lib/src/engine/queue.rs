use super::job::Job;
use super::wait_group::{WaitGroup, WaitGuard};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Source URL must not be empty")]
    EmptyUrl,

    #[error("Base name must be a plain, non-empty file name: {name:?}")]
    InvalidBaseName { name: String },

    #[error("Another list named {name:?} is still in progress")]
    NameInUse { name: String },

    #[error("Job queue is closed")]
    QueueClosed,
}

/// A job on its way through the queue, counted by the pool's lifetime
/// tracker until it is fully processed or dropped.
#[derive(Debug)]
pub(crate) struct QueuedJob {
    pub job: Job,
    pub tracked: WaitGuard,
}

pub(crate) type JobReceiver = Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>;

/// Creates the shared queue. The strong sender belongs to the pool handle;
/// workers only ever hold [`WeakSubmitter`]s, so dropping the handle's
/// sender closes the queue once it is drained.
pub(crate) fn job_queue(tracker: Arc<WaitGroup>) -> (Submitter, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Submitter { tx, tracker }, Arc::new(Mutex::new(rx)))
}

#[derive(Debug)]
pub(crate) struct Submitter {
    tx: mpsc::UnboundedSender<QueuedJob>,
    tracker: Arc<WaitGroup>,
}

impl Submitter {
    pub fn submit(&self, job: Job) -> Result<(), SubmitError> {
        send(&self.tx, &self.tracker, job)
    }

    pub fn downgrade(&self) -> WeakSubmitter {
        WeakSubmitter {
            tx: self.tx.downgrade(),
            tracker: Arc::clone(&self.tracker),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct WeakSubmitter {
    tx: mpsc::WeakUnboundedSender<QueuedJob>,
    tracker: Arc<WaitGroup>,
}

impl WeakSubmitter {
    pub fn submit(&self, job: Job) -> Result<(), SubmitError> {
        let tx = self.tx.upgrade().ok_or(SubmitError::QueueClosed)?;
        send(&tx, &self.tracker, job)
    }
}

fn send(
    tx: &mpsc::UnboundedSender<QueuedJob>,
    tracker: &Arc<WaitGroup>,
    job: Job,
) -> Result<(), SubmitError> {
    // Entered before the job is visible to workers.
    let queued = QueuedJob {
        job,
        tracked: tracker.enter(),
    };
    tx.send(queued).map_err(|_| SubmitError::QueueClosed)
}
