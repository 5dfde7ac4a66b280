//! Poll-driven "live mode" for the record source: tick on an interval (or
//! on an explicit nudge, e.g. after a confirmed submission) and ask the
//! controller for a fresh run. A failed run is logged and the last good
//! snapshot stands.

use crate::pipeline::PipelineController;
use crate::records::RecordSource;
use crate::resolver::ScoreResolver;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn run_watcher<S, R>(
    controller: Arc<PipelineController<S, R>>,
    poll_interval: Duration,
    mut refresh_rx: mpsc::Receiver<()>,
    cancel: CancellationToken,
) where
    S: RecordSource + Send + Sync,
    R: ScoreResolver + Send + Sync,
{
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(poll_interval_secs = poll_interval.as_secs(), "record watcher started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("record watcher stopped");
                break;
            }
            _ = interval.tick() => {
                debug!("record watcher tick");
            }
            nudge = refresh_rx.recv() => {
                if nudge.is_none() {
                    break;
                }
                debug!("refresh nudge received");
            }
        }

        match controller.refresh().await {
            Ok(outcome) => debug!(?outcome, "pipeline refresh finished"),
            Err(e) => warn!(error = %e, "pipeline refresh failed, keeping last snapshot"),
        }
    }
}
