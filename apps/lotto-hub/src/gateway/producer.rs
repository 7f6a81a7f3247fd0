//! Periodic producer feeding the broadcast queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::HubError;

use super::fanout::{BroadcastHub, Enqueued};

/// Handle to the spawned producer loop.
///
/// Each tick draws a fresh value set and enqueues it. The first tick fires
/// immediately. The loop ends on [`stop`](Self::stop) or hub shutdown.
pub struct Producer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Producer {
    pub fn start(hub: Arc<BroadcastHub>, interval: Duration) -> Self {
        let cancel = hub.shutdown_token().child_token();
        let handle = tokio::spawn(run_producer(hub, interval, cancel.clone()));
        Self { cancel, handle }
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await {
            tracing::error!(%err, "producer task failed");
        }
    }
}

async fn run_producer(hub: Arc<BroadcastHub>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(interval_ms = interval.as_millis() as u64, "producer started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let values = lotto_common::draw();
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = hub.enqueue(values) => result,
        };

        match result {
            Ok(Enqueued::Queued) => tracing::debug!(%values, "value set queued"),
            // Already logged by the hub.
            Ok(Enqueued::DroppedOldest) => {}
            Err(HubError::ShuttingDown) => break,
            Err(err) => tracing::warn!(%err, %values, "producer dropped value set"),
        }
    }

    tracing::info!("producer stopped");
}
