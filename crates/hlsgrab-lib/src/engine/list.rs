use super::context::EngineContext;
use super::job::{Job, ListJob, ListProgress, OutputTarget, SegmentJob};
use super::outcome::{ListError, ListOutcome};
use super::queue::WeakSubmitter;
use super::wait_group::WaitGuard;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Runs the worker-side half of a list job: resolve the playlist and queue one
/// segment job per entry.
///
/// Waiting for the segments, assembly, and transcoding happen on a separate
/// task holding `tracked`, so the worker goes back to the queue straight away
/// and can pick up this list's own segments.
pub(crate) async fn run(
    worker: usize,
    ctx: &Arc<EngineContext>,
    submitter: &WeakSubmitter,
    job: ListJob,
    tracked: WaitGuard,
) {
    let ListJob {
        source_url,
        target,
        reply,
        lease,
    } = job;

    tracing::info!(worker, url = %source_url, name = %target.base_name, "Resolving playlist");

    let segments = match ctx.resolver.resolve(&source_url).await {
        Ok(segments) if segments.is_empty() => {
            tracing::warn!(worker, url = %source_url, "Playlist contains no segments");
            drop(lease);
            let _ = reply.send(ListOutcome::Failed(ListError::EmptyPlaylist));
            return;
        }
        Ok(segments) => segments,
        Err(err) => {
            tracing::warn!(worker, url = %source_url, "Failed to resolve playlist: {}", err);
            drop(lease);
            let _ = reply.send(ListOutcome::Failed(ListError::Resolve(err)));
            return;
        }
    };

    let segment_count = segments.len();
    let target = Arc::new(target);
    let progress = Arc::new(ListProgress::new());
    let mut queue_closed = false;

    for (position, segment_url) in segments.into_iter().enumerate() {
        // Registered before submission: the segment may finish before the
        // loop moves on.
        let report = progress.register(position);
        let segment = Job::Segment(SegmentJob {
            source_url: segment_url,
            target: Arc::clone(&target),
            position,
            report,
        });
        if let Err(err) = submitter.submit(segment) {
            tracing::error!(worker, url = %source_url, position, "Failed to queue segment: {}", err);
            queue_closed = true;
            break;
        }
    }

    tracing::info!(worker, url = %source_url, segments = segment_count, "Queued segments");

    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        progress.wait().await;

        let outcome = if queue_closed {
            ListOutcome::Failed(ListError::QueueClosed)
        } else {
            tracing::info!(url = %source_url, segments = segment_count, "All segments finished");
            finish(&ctx, &target, segment_count, &progress).await
        };
        log_outcome(&source_url, &outcome);

        // Released before replying: a resolved handle means the name is free.
        drop(lease);
        let _ = reply.send(outcome);
        drop(tracked);
    });
}

fn log_outcome(source_url: &str, outcome: &ListOutcome) {
    match outcome {
        ListOutcome::Completed { output, .. } => {
            tracing::info!(url = %source_url, output = %output.display(), "Download available");
        }
        ListOutcome::Incomplete {
            container,
            assembled,
            missing,
        } => {
            tracing::warn!(
                url = %source_url,
                container = %container.display(),
                assembled,
                ?missing,
                "Assembly stopped at a missing segment"
            );
        }
        ListOutcome::Failed(err) => {
            tracing::warn!(url = %source_url, "List download failed: {}", err);
        }
    }
}

enum Assembly {
    Complete,
    Aborted { assembled: usize, missing: Vec<usize> },
}

async fn finish(
    ctx: &EngineContext,
    target: &OutputTarget,
    segment_count: usize,
    progress: &ListProgress,
) -> ListOutcome {
    let container = ctx.container_path(target);
    let output = ctx.output_path(target);

    match assemble(ctx, target, &container, segment_count, progress).await {
        Ok(Assembly::Complete) => {}
        Ok(Assembly::Aborted { assembled, missing }) => {
            return ListOutcome::Incomplete {
                container,
                assembled,
                missing,
            };
        }
        Err(err) => return ListOutcome::Failed(err),
    }

    tracing::info!(container = %container.display(), output = %output.display(), "Transcoding");
    match ctx.transcoder.transcode(&container, &output).await {
        Ok(()) => ListOutcome::Completed {
            container,
            output,
            segments: segment_count,
        },
        Err(source) => ListOutcome::Failed(ListError::Transcode {
            input: container,
            source,
        }),
    }
}

async fn ensure_destination(path: &Path) -> Result<(), ListError> {
    let destination_error = |source| ListError::Destination {
        path: path.to_path_buf(),
        source,
    };

    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(destination_error(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "not a directory",
        ))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::create_dir_all(path).await.map_err(destination_error)
        }
        Err(err) => Err(destination_error(err)),
    }
}

/// Concatenates staged segments into `container` in position order, deleting
/// each one once appended. Stops at the first segment that cannot be opened;
/// whatever was written so far stays, as do the later segments.
async fn assemble(
    ctx: &EngineContext,
    target: &OutputTarget,
    container: &Path,
    segment_count: usize,
    progress: &ListProgress,
) -> Result<Assembly, ListError> {
    ensure_destination(&target.destination_directory).await?;

    let mut out = tokio::fs::File::create(container)
        .await
        .map_err(|source| ListError::Container {
            path: container.to_path_buf(),
            source,
        })?;

    for position in 0..segment_count {
        let path = ctx.scratch.segment_path(&target.base_name, position);
        let assembly_error = |source| ListError::Assembly {
            position,
            path: path.clone(),
            source,
        };

        let mut input = match tokio::fs::File::open(&path).await {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!(path = %path.display(), position, "Can't open staged segment: {}", err);
                let mut missing = progress.failed_positions();
                if missing.is_empty() {
                    missing.push(position);
                }
                return Ok(Assembly::Aborted {
                    assembled: position,
                    missing,
                });
            }
        };

        tokio::io::copy(&mut input, &mut out)
            .await
            .map_err(assembly_error)?;
        out.flush().await.map_err(assembly_error)?;
        out.sync_data().await.map_err(assembly_error)?;
        drop(input);

        tokio::fs::remove_file(&path)
            .await
            .map_err(assembly_error)?;
        tracing::trace!(path = %path.display(), position, "Appended segment");
    }

    Ok(Assembly::Complete)
}
