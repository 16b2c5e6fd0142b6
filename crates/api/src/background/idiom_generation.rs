//! Periodic draining of the idiom input queue.
//!
//! One input per tick, oldest first. A tick that runs long delays the next
//! one instead of overlapping it, so a single instance never generates the
//! same idiom twice concurrently.

use std::sync::Arc;
use std::time::Duration;

use idioms_pipeline::generator::{IdiomGenerator, QueueOutcome};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the generation loop until `cancel` is triggered.
pub async fn run(generator: Arc<IdiomGenerator>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Idiom generation job started");

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Idiom generation job stopping");
                break;
            }
            _ = interval.tick() => {
                tick(&generator).await;
            }
        }
    }
}

/// Process one queued input and log the outcome.
pub async fn tick(generator: &IdiomGenerator) {
    match generator.process_next_input().await {
        Ok(QueueOutcome::Empty) => {
            tracing::debug!("Idiom generation: queue empty");
        }
        Ok(QueueOutcome::Generated(id)) => {
            tracing::info!(idiom_id = %id, "Idiom generation: published");
        }
        Ok(QueueOutcome::Duplicate(id)) => {
            tracing::info!(idiom_id = %id, "Idiom generation: duplicate input removed");
        }
        Ok(QueueOutcome::Discarded { input_id, reason }) => {
            tracing::warn!(input_id = %input_id, reason = %reason, "Idiom generation: input discarded");
        }
        Err(e) => {
            tracing::error!(error = %e, "Idiom generation: tick failed, will retry");
        }
    }
}
