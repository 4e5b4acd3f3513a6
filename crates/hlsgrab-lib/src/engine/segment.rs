use super::context::EngineContext;
use super::job::SegmentJob;
use crate::fetch::FetchResponse;
use eyre::{Result, WrapErr, bail};
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentStatus {
    AlreadyPresent,
    Downloaded { bytes: u64 },
}

/// Runs one segment job. The job's report is consumed on every path, so the
/// parent list hears about this segment exactly once.
pub(crate) async fn run(worker: usize, ctx: &EngineContext, job: SegmentJob) {
    let SegmentJob {
        source_url,
        target,
        position,
        report,
    } = job;

    tracing::debug!(worker, url = %source_url, name = %target.base_name, position, "Downloading segment");

    match stage_segment(ctx, &source_url, &target.base_name, position).await {
        Ok(SegmentStatus::AlreadyPresent) => {
            tracing::debug!(worker, name = %target.base_name, position, "Segment already staged, skipping download");
            report.succeed();
        }
        Ok(SegmentStatus::Downloaded { bytes }) => {
            tracing::info!(worker, name = %target.base_name, position, bytes, "Saved segment");
            report.succeed();
        }
        Err(err) => {
            tracing::warn!(worker, url = %source_url, name = %target.base_name, position, "Segment download failed: {:#}", err);
            drop(report);
        }
    }
}

pub(crate) async fn stage_segment(
    ctx: &EngineContext,
    url: &str,
    base_name: &str,
    position: usize,
) -> Result<SegmentStatus> {
    let destination = ctx.scratch.segment_path(base_name, position);

    // A staged file is trusted as-is.
    if tokio::fs::try_exists(&destination)
        .await
        .wrap_err_with(|| format!("Failed to check {}", destination.display()))?
    {
        return Ok(SegmentStatus::AlreadyPresent);
    }

    let response = ctx
        .fetcher
        .fetch(url)
        .await
        .wrap_err_with(|| format!("Failed to fetch {url}"))?;
    if !response.is_success() {
        bail!("{} returned HTTP status {}", url, response.status);
    }

    tokio::fs::create_dir_all(ctx.scratch.path())
        .await
        .wrap_err_with(|| format!("Failed to create directory: {}", ctx.scratch.path().display()))?;

    let partial = ctx.scratch.partial_segment_path(base_name, position);
    let bytes = match write_body(response, &partial).await {
        Ok(bytes) => bytes,
        Err(err) => {
            if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                tracing::debug!(path = %partial.display(), "Could not remove partial segment: {}", remove_err);
            }
            return Err(err);
        }
    };

    tokio::fs::rename(&partial, &destination)
        .await
        .wrap_err_with(|| {
            format!(
                "Failed to move {} to {}",
                partial.display(),
                destination.display()
            )
        })?;

    Ok(SegmentStatus::Downloaded { bytes })
}

async fn write_body(response: FetchResponse, path: &Path) -> Result<u64> {
    let FetchResponse {
        content_length,
        mut body,
        ..
    } = response;

    let file = tokio::fs::File::create(path)
        .await
        .wrap_err_with(|| format!("Failed to create segment file: {}", path.display()))?;
    let mut writer = tokio::io::BufWriter::new(file);

    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.wrap_err("Failed to read response body")?;
        writer
            .write_all(&chunk)
            .await
            .wrap_err_with(|| format!("Failed to write to {}", path.display()))?;
        written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .wrap_err_with(|| format!("Failed to flush {}", path.display()))?;

    match content_length {
        Some(expected) if expected != written => {
            bail!("Body length mismatch: expected {expected} bytes, received {written}")
        }
        _ => {}
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FakeFetcher, FakeResolver, RecordingTranscoder, test_context};
    use crate::engine::job::{ListProgress, OutputTarget};
    use std::sync::Arc;

    fn segment_job(progress: &Arc<ListProgress>, url: &str, position: usize) -> SegmentJob {
        SegmentJob {
            source_url: url.to_string(),
            target: Arc::new(OutputTarget {
                destination_directory: "/unused".into(),
                base_name: "show".to_string(),
            }),
            position,
            report: progress.register(position),
        }
    }

    #[tokio::test]
    async fn test_downloads_into_scratch_and_reports_success() {
        let fetcher = Arc::new(FakeFetcher::new().with_body("http://h/s0.ts", b"segment-zero"));
        let (ctx, _dirs) = test_context(
            Arc::new(FakeResolver::default()),
            fetcher.clone(),
            Arc::new(RecordingTranscoder::default()),
        );

        let progress = Arc::new(ListProgress::new());
        run(0, &ctx, segment_job(&progress, "http://h/s0.ts", 0)).await;

        let staged = ctx.scratch.segment_path("show", 0);
        assert_eq!(std::fs::read(&staged).unwrap(), b"segment-zero");
        assert!(!ctx.scratch.partial_segment_path("show", 0).exists());
        assert_eq!(progress.outstanding(), 0);
        assert!(progress.failed_positions().is_empty());
    }

    #[tokio::test]
    async fn test_existing_segment_skips_network_and_is_untouched() {
        let fetcher = Arc::new(FakeFetcher::new().with_body("http://h/s0.ts", b"fresh"));
        let (ctx, _dirs) = test_context(
            Arc::new(FakeResolver::default()),
            fetcher.clone(),
            Arc::new(RecordingTranscoder::default()),
        );
        let staged = ctx.scratch.segment_path("show", 0);
        std::fs::write(&staged, b"already here").unwrap();

        let progress = Arc::new(ListProgress::new());
        run(0, &ctx, segment_job(&progress, "http://h/s0.ts", 0)).await;

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(std::fs::read(&staged).unwrap(), b"already here");
        assert!(progress.failed_positions().is_empty());
    }

    #[tokio::test]
    async fn test_http_error_writes_nothing_and_reports_failure() {
        let fetcher = Arc::new(FakeFetcher::new().with_status("http://h/s1.ts", 404));
        let (ctx, _dirs) = test_context(
            Arc::new(FakeResolver::default()),
            fetcher.clone(),
            Arc::new(RecordingTranscoder::default()),
        );

        let progress = Arc::new(ListProgress::new());
        run(0, &ctx, segment_job(&progress, "http://h/s1.ts", 1)).await;

        assert_eq!(fetcher.calls(), 1);
        assert!(!ctx.scratch.segment_path("show", 1).exists());
        assert_eq!(progress.outstanding(), 0);
        assert_eq!(progress.failed_positions(), vec![1]);
    }

    #[tokio::test]
    async fn test_transport_error_reports_failure() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (ctx, _dirs) = test_context(
            Arc::new(FakeResolver::default()),
            fetcher.clone(),
            Arc::new(RecordingTranscoder::default()),
        );

        let progress = Arc::new(ListProgress::new());
        run(0, &ctx, segment_job(&progress, "http://h/unknown.ts", 2)).await;

        assert_eq!(progress.failed_positions(), vec![2]);
    }

    #[tokio::test]
    async fn test_short_body_is_not_staged() {
        let fetcher = Arc::new(
            FakeFetcher::new().with_truncated_body("http://h/s0.ts", b"half", 8),
        );
        let (ctx, _dirs) = test_context(
            Arc::new(FakeResolver::default()),
            fetcher.clone(),
            Arc::new(RecordingTranscoder::default()),
        );

        let result = stage_segment(&ctx, "http://h/s0.ts", "show", 0).await;

        assert!(result.is_err());
        assert!(!ctx.scratch.segment_path("show", 0).exists());
        assert!(!ctx.scratch.partial_segment_path("show", 0).exists());
    }
}
