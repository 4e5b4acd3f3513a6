use crate::cli::params::DownloadParams;
use crate::engine::{EngineContext, ListOutcome, WorkerPool};
use crate::error::HlsGrabError;
use itertools::Itertools;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing;

pub async fn run_download(params: DownloadParams) -> Result<(), HlsGrabError> {
    let DownloadParams {
        app_config,
        requests,
    } = params;

    let ctx = Arc::new(EngineContext::from_config(&app_config)?);
    let pool = WorkerPool::start(ctx, app_config.workers)?;

    tracing::info!("Submitting {} playlists", requests.len());
    let handles = requests
        .into_iter()
        .map(|request| pool.submit_list(request.url, request.output_dir, request.name))
        .collect::<Result<Vec<_>, _>>()?;
    let labels = handles
        .iter()
        .map(|handle| format!("{} ({})", handle.target().base_name, handle.source_url()))
        .collect_vec();

    let (finished_tx, finished_rx) = oneshot::channel();
    let waiter = tokio::spawn(async move {
        let outcomes = futures::future::join_all(handles).await;
        let _ = finished_tx.send(());
        outcomes
    });

    // Ctrl-C stops nothing in flight; it only moves the pool into draining.
    pool.shutdown_on(async {
        tokio::select! {
            _ = finished_rx => {}
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => tracing::warn!("Interrupted, waiting for queued downloads to finish"),
                Err(err) => tracing::warn!("Failed to listen for Ctrl-C: {}", err),
            },
        }
    })
    .await?;

    let outcomes = waiter
        .await
        .map_err(|e| eyre::eyre!("Download waiter failed: {}", e))?;

    let total = outcomes.len();
    let mut failed = 0;
    for (label, outcome) in labels.iter().zip(outcomes) {
        match outcome {
            ListOutcome::Completed { output, .. } => {
                tracing::info!("{}: saved to {}", label, output.display());
            }
            ListOutcome::Incomplete {
                container, missing, ..
            } => {
                failed += 1;
                tracing::error!(
                    "{}: segments {} failed, {} is incomplete",
                    label,
                    missing.iter().join(", "),
                    container.display()
                );
            }
            ListOutcome::Failed(err) => {
                failed += 1;
                tracing::error!("{}: {}", label, err);
            }
        }
    }

    if failed == 0 {
        tracing::info!("Download completed successfully");
        Ok(())
    } else {
        Err(HlsGrabError::DownloadsFailed { failed, total })
    }
}
