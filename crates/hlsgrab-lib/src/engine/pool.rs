use super::context::EngineContext;
use super::job::{ActiveNames, Job, ListJob, OutputTarget};
use super::outcome::ListHandle;
use super::queue::{JobReceiver, QueuedJob, SubmitError, Submitter, WeakSubmitter, job_queue};
use super::wait_group::WaitGroup;
use super::{list, segment};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Worker pool needs at least one worker")]
    NoWorkers,

    #[error("Worker {worker} stopped abnormally: {reason}")]
    WorkerPanicked { worker: usize, reason: String },
}

pub struct WorkerPool;

impl WorkerPool {
    /// Spawns `workers` workers on the current tokio runtime.
    pub fn start(ctx: Arc<EngineContext>, workers: usize) -> Result<PoolHandle, PoolError> {
        if workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let tracker = Arc::new(WaitGroup::new());
        let (submitter, receiver) = job_queue(Arc::clone(&tracker));

        let handles = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    ctx: Arc::clone(&ctx),
                    receiver: Arc::clone(&receiver),
                    submitter: submitter.downgrade(),
                };
                tokio::spawn(worker.work())
            })
            .collect();

        tracing::info!(workers, "Worker pool started");

        Ok(PoolHandle {
            submitter,
            tracker,
            active_names: Arc::new(ActiveNames::default()),
            workers: handles,
        })
    }
}

/// Owner of a running pool. Dropping it without calling [`shutdown`] closes
/// the queue; workers finish what is queued and exit.
///
/// [`shutdown`]: PoolHandle::shutdown
#[derive(Debug)]
pub struct PoolHandle {
    submitter: Submitter,
    tracker: Arc<WaitGroup>,
    active_names: Arc<ActiveNames>,
    workers: Vec<JoinHandle<()>>,
}

impl PoolHandle {
    /// Queues a top-level list job writing `<destination_directory>/<base_name>.*`.
    ///
    /// The base name also names the staged segments, so it is rejected while
    /// another list submitted to this pool still uses it.
    pub fn submit_list(
        &self,
        source_url: impl Into<String>,
        destination_directory: impl Into<PathBuf>,
        base_name: impl Into<String>,
    ) -> Result<ListHandle, SubmitError> {
        let source_url = source_url.into();
        let base_name = base_name.into();

        if source_url.trim().is_empty() {
            return Err(SubmitError::EmptyUrl);
        }
        if base_name.is_empty()
            || base_name == "."
            || base_name == ".."
            || base_name.contains(['/', '\\'])
        {
            return Err(SubmitError::InvalidBaseName { name: base_name });
        }
        let lease = self
            .active_names
            .claim(&base_name)
            .ok_or_else(|| SubmitError::NameInUse {
                name: base_name.clone(),
            })?;

        let target = OutputTarget {
            destination_directory: destination_directory.into(),
            base_name,
        };
        let (reply, rx) = oneshot::channel();
        self.submitter.submit(Job::List(ListJob {
            source_url: source_url.clone(),
            target: target.clone(),
            reply,
            lease,
        }))?;

        tracing::debug!(url = %source_url, name = %target.base_name, "Submitted list job");
        Ok(ListHandle::new(source_url, target, rx))
    }

    /// Jobs queued or running, including list jobs waiting on their segments.
    pub fn in_flight(&self) -> usize {
        self.tracker.count()
    }

    /// Waits until every queued and in-flight job has been fully processed.
    pub async fn drain(&self) {
        self.tracker.wait().await;
    }

    /// Drains, closes the queue, and waits for every worker to exit.
    pub async fn shutdown(self) -> Result<(), PoolError> {
        self.drain().await;

        let PoolHandle {
            submitter, workers, ..
        } = self;
        drop(submitter);

        let mut first_error = None;
        for (worker, handle) in workers.into_iter().enumerate() {
            if let Err(err) = handle.await {
                tracing::error!(worker, "Worker stopped abnormally: {}", err);
                first_error.get_or_insert(PoolError::WorkerPanicked {
                    worker,
                    reason: err.to_string(),
                });
            }
        }

        tracing::info!("Worker pool stopped");
        first_error.map_or(Ok(()), Err)
    }

    /// Waits for `signal`, then shuts down.
    pub async fn shutdown_on<F>(self, signal: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()>,
    {
        signal.await;
        tracing::info!(in_flight = self.in_flight(), "Shutdown requested, draining queue");
        self.shutdown().await
    }
}

struct Worker {
    id: usize,
    ctx: Arc<EngineContext>,
    receiver: JobReceiver,
    submitter: WeakSubmitter,
}

impl Worker {
    async fn work(self) {
        tracing::debug!(worker = self.id, "Worker is ready");

        while let Some(queued) = self.next_job().await {
            self.dispatch(queued).await;
        }

        tracing::debug!(worker = self.id, "Worker is out");
    }

    async fn next_job(&self) -> Option<QueuedJob> {
        // The lock is only held while waiting to receive, never while a job runs.
        self.receiver.lock().await.recv().await
    }

    async fn dispatch(&self, queued: QueuedJob) {
        let QueuedJob { job, tracked } = queued;
        let kind = job.kind();
        let url = job.source_url().to_string();
        tracing::trace!(worker = self.id, %kind, url = %url, "Dequeued job");

        let id = self.id;
        let ctx = Arc::clone(&self.ctx);
        let submitter = self.submitter.clone();

        // Each job runs as its own task so a panic is contained and reported
        // here instead of taking the worker down.
        let task = tokio::spawn(async move {
            match job {
                Job::List(job) => list::run(id, &ctx, &submitter, job, tracked).await,
                Job::Segment(job) => {
                    segment::run(id, &ctx, job).await;
                    drop(tracked);
                }
            }
        });

        if let Err(err) = task.await {
            tracing::error!(worker = self.id, %kind, url = %url, "Job aborted: {}", err);
        }
    }
}
