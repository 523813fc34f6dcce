//! Replay driver
//!
//! The control loop: pulls rows from the source through the normalizer,
//! paces emission, and pushes frames to the hub.
//!
//! The driver holds its place while nobody is watching: with zero viewers
//! it pauses instead of consuming records, so a viewer that connects later
//! receives the record the cursor is parked on.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::config::ReplayConfig;
use super::cursor::{ReplayCursor, Step};
use super::state::DriverPhase;
use crate::hub::{BroadcastFrame, Hub};
use crate::record::Normalizer;
use crate::source::RecordSource;
use crate::stats::ReplayMetrics;

/// Skipped rows processed between cooperative yields
const SKIP_YIELD_EVERY: u64 = 1024;

/// Drives one replay of a record source into a hub
pub struct ReplayDriver<S: RecordSource> {
    source: S,
    normalizer: Normalizer,
    hub: Arc<Hub>,
    config: ReplayConfig,
    cursor: ReplayCursor,
    metrics: Arc<ReplayMetrics>,
    delay: Duration,
}

impl<S: RecordSource> ReplayDriver<S> {
    /// Create a driver
    pub fn new(source: S, normalizer: Normalizer, hub: Arc<Hub>, config: ReplayConfig) -> Self {
        let delay = config.delay();

        Self {
            source,
            normalizer,
            hub,
            config,
            cursor: ReplayCursor::new(),
            metrics: Arc::new(ReplayMetrics::new()),
            delay,
        }
    }

    /// Report progress into existing metrics
    pub fn with_metrics(mut self, metrics: Arc<ReplayMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<ReplayMetrics> {
        &self.metrics
    }

    pub fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Run the driver on its own task
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Run until the sequence ends with looping disabled
    ///
    /// With looping enabled this never returns.
    pub async fn run(&mut self) {
        tracing::info!(
            delay_ms = self.delay.as_millis() as u64,
            looping = self.config.loop_replay,
            "Replay driver started"
        );

        self.await_source().await;
        self.cursor.rewind(&self.source);

        loop {
            let frame = match self.cursor.take_held() {
                Some(frame) => frame,
                None => match self.cursor.step(&self.normalizer).await {
                    Step::Record { sequence, record } => {
                        match BroadcastFrame::encode(sequence, &record) {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::debug!(sequence, error = %e, "Failed to encode record");
                                self.skip().await;
                                continue;
                            }
                        }
                    }
                    Step::Skipped => {
                        self.skip().await;
                        continue;
                    }
                    Step::Exhausted => {
                        self.metrics.record_pass();

                        if !self.config.loop_replay {
                            self.metrics.set_phase(DriverPhase::Finished);
                            tracing::info!(
                                passes = self.cursor.pass(),
                                "Replay finished, looping disabled"
                            );
                            return;
                        }

                        if self.cursor.records_in_pass() == 0 {
                            tracing::warn!(
                                source = %self.source.describe(),
                                "Pass produced no records"
                            );
                            tokio::time::sleep(self.config.discovery_poll).await;
                        }

                        self.cursor.rewind(&self.source);
                        tracing::debug!(pass = self.cursor.pass(), "Replay restarted");
                        continue;
                    }
                },
            };

            self.metrics.set_position(self.cursor.position());
            self.wait_for_viewers().await;

            let delivered = self.hub.broadcast(frame.clone()).await;
            if delivered == 0 {
                // Everyone left between the check and the send
                self.cursor.hold(frame);
                continue;
            }

            self.metrics.record_broadcast(delivered);
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Discover batches, polling until at least one exists
    async fn await_source(&mut self) {
        self.metrics.set_phase(DriverPhase::WaitingForSource);
        let mut attempts = 0u64;

        loop {
            attempts += 1;

            match self.source.discover() {
                Ok(0) if attempts == 1 => {
                    tracing::info!(
                        source = %self.source.describe(),
                        "No source files found, waiting"
                    );
                }
                Ok(0) => {}
                Ok(count) => {
                    tracing::info!(
                        files = count,
                        source = %self.source.describe(),
                        "Source discovered"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Source discovery failed");
                }
            }

            tokio::time::sleep(self.config.discovery_poll).await;
        }
    }

    /// Park until at least one viewer is connected
    async fn wait_for_viewers(&mut self) {
        if self.hub.has_viewers().await {
            self.metrics.set_phase(DriverPhase::Playing);
            return;
        }

        self.metrics.set_phase(DriverPhase::WaitingForViewers);
        tracing::debug!(position = self.cursor.position(), "No viewers, pausing replay");

        while !self.hub.has_viewers().await {
            tokio::time::sleep(self.config.idle_poll).await;
        }

        self.metrics.set_phase(DriverPhase::Playing);
        tracing::debug!(position = self.cursor.position(), "Viewer present, resuming replay");
    }

    async fn skip(&mut self) {
        self.metrics.record_skipped();

        // Long runs of filtered rows must not starve the viewer tasks
        if self.cursor.position() % SKIP_YIELD_EVERY == 0 {
            tokio::task::yield_now().await;
        }
    }
}
