//! Job dispatch: a fixed pool of workers sharing one queue of list and
//! segment jobs. List jobs feed their segment jobs back into the same queue
//! and reassemble the staged segments once all of them have reported.

mod context;
mod job;
mod list;
mod outcome;
mod pool;
mod queue;
mod segment;
mod wait_group;

#[cfg(test)]
mod testing;

pub use context::EngineContext;
pub use job::{Job, JobKind, ListJob, ListProgress, OutputTarget, SegmentJob, SegmentReport};
pub use outcome::{ListError, ListHandle, ListOutcome};
pub use pool::{PoolError, PoolHandle, WorkerPool};
pub use queue::SubmitError;
pub use wait_group::{WaitGroup, WaitGuard};
