//! The probe scheduler.
//!
//! A [`Probe`] owns a single control loop. Every tick it prepares both buckets sequentially and
//! then dispatches a latency check and a durability check as detached tasks. Dispatched checks
//! are not awaited by the loop, so runs of consecutive ticks may overlap when a check takes
//! longer than the tick interval.
//!
//! Cancellation is only observed while the loop is idle. A bucket preparation in progress, for
//! instance a long seeding run, completes before the probe stops. What happens to checks still in
//! flight at that point is governed by the [`InFlightPolicy`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::backend::SharedClient;
use crate::durability::{DEFAULT_SAMPLE_SIZE, DurabilityCheck};
use crate::error::{Error, Result};
use crate::latency::{LATENCY_OBJECT_SIZE, LatencyCheck};
use crate::metrics::SharedSink;
use crate::prepare::{BucketPreparer, Seeding};
use crate::recorder::Recorder;

/// The highest supported rate, one tick per millisecond.
pub const MAX_PROBE_RATE_PER_MIN: u32 = 60_000;

/// What to do with dispatched checks when the probe stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InFlightPolicy {
    /// Wait for running checks to finish, aborting those still running after `timeout`.
    Wait { timeout: Duration },
    /// Abort running checks immediately.
    Abort,
}

impl Default for InFlightPolicy {
    fn default() -> Self {
        Self::Wait {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration of a single [`Probe`].
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeConfig {
    /// Name of the probe, used as the `endpoint` label of all measurements.
    pub name: String,
    pub latency_bucket: String,
    pub durability_bucket: String,
    /// Number of ticks per minute, between 1 and [`MAX_PROBE_RATE_PER_MIN`].
    pub probe_rate_per_min: u32,
    pub seeding: Seeding,
    pub latency_object_size: usize,
    pub durability_sample_size: usize,
    pub in_flight: InFlightPolicy,
}

impl ProbeConfig {
    /// Creates a configuration with default sizes and a rate of one check per minute.
    pub fn new(
        name: impl Into<String>,
        latency_bucket: impl Into<String>,
        durability_bucket: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            latency_bucket: latency_bucket.into(),
            durability_bucket: durability_bucket.into(),
            probe_rate_per_min: 1,
            seeding: Seeding::default(),
            latency_object_size: LATENCY_OBJECT_SIZE,
            durability_sample_size: DEFAULT_SAMPLE_SIZE,
            in_flight: InFlightPolicy::default(),
        }
    }

    /// Checks the invariants a probe relies on.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(Error::InvalidConfig(message.to_owned()));

        if self.name.is_empty() {
            return invalid("probe name must not be empty");
        }
        if self.probe_rate_per_min == 0 {
            return invalid("probe rate must be greater than zero");
        }
        if self.probe_rate_per_min > MAX_PROBE_RATE_PER_MIN {
            return invalid("probe rate must not exceed one check per millisecond");
        }
        if self.latency_bucket.is_empty() || self.durability_bucket.is_empty() {
            return invalid("bucket names must not be empty");
        }
        if self.latency_bucket == self.durability_bucket {
            return invalid("latency and durability buckets must be distinct");
        }
        if self.seeding.population == 0 {
            return invalid("durability population must be greater than zero");
        }

        Ok(())
    }
}

/// Returns the time between two ticks at the given rate.
///
/// The rate must be greater than zero. Rates above [`MAX_PROBE_RATE_PER_MIN`] yield a zero
/// interval.
pub fn tick_interval(probe_rate_per_min: u32) -> Duration {
    Duration::from_millis(60_000 / u64::from(probe_rate_per_min))
}

/// Periodically probes one storage endpoint.
#[derive(Debug)]
pub struct Probe {
    name: Arc<str>,
    backend: &'static str,
    interval: Duration,
    in_flight: InFlightPolicy,
    preparer: BucketPreparer,
    latency: LatencyCheck,
    durability: DurabilityCheck,
    shutdown: CancellationToken,
}

impl Probe {
    /// Creates a probe, failing with [`Error::InvalidConfig`] if the configuration is unusable.
    pub fn new(
        config: ProbeConfig,
        client: SharedClient,
        sink: SharedSink,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;

        let name: Arc<str> = config.name.into();
        let backend = client.name();
        let recorder = Recorder::new(name.clone(), sink);

        let latency = LatencyCheck::new(client.clone(), recorder.clone(), &config.latency_bucket)
            .object_size(config.latency_object_size);
        let durability = DurabilityCheck::new(
            client.clone(),
            recorder,
            &config.durability_bucket,
            config.seeding.population,
            config.seeding.object_size,
        )
        .sample_size(config.durability_sample_size);
        let preparer = BucketPreparer::new(
            name.clone(),
            client,
            config.latency_bucket,
            config.durability_bucket,
            config.seeding,
        );

        Ok(Self {
            name,
            backend,
            interval: tick_interval(config.probe_rate_per_min),
            in_flight: config.in_flight,
            preparer,
            latency,
            durability,
            shutdown,
        })
    }

    /// Runs the probe until it is cancelled or bucket preparation fails.
    ///
    /// Returns `Ok` after cancellation and the preparation error otherwise. In both cases,
    /// dispatched checks are drained according to the [`InFlightPolicy`] before returning.
    pub async fn run(self) -> Result<()> {
        let mut tasks = JoinSet::new();
        tracing::info!(
            probe = %self.name,
            backend = self.backend,
            interval = ?self.interval,
            "Starting probe"
        );

        let result = loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break Ok(()),
                _ = tokio::time::sleep(self.interval) => {}
            }

            self.reap(&mut tasks);

            tracing::debug!(probe = %self.name, in_flight = tasks.len(), "Probe tick");
            if let Err(error) = self.tick(&mut tasks).await {
                tracing::error!(
                    error = &error as &dyn std::error::Error,
                    probe = %self.name,
                    "Failed to prepare buckets, stopping probe"
                );
                break Err(error);
            }
        };

        self.drain(tasks).await;
        tracing::info!(probe = %self.name, "Probe stopped");
        result
    }

    async fn tick(&self, tasks: &mut JoinSet<()>) -> Result<()> {
        self.preparer.ensure_latency_bucket().await?;
        self.preparer.ensure_durability_bucket().await?;

        let latency = self.latency.clone();
        tasks.spawn(async move {
            if let Err(error) = latency.run().await {
                tracing::debug!(
                    error = &error as &dyn std::error::Error,
                    "Latency check aborted"
                );
            }
        });

        let durability = self.durability.clone();
        tasks.spawn(async move {
            if let Err(error) = durability.run().await {
                tracing::error!(
                    error = &error as &dyn std::error::Error,
                    "Durability check failed"
                );
            }
        });

        Ok(())
    }

    /// Collects checks that finished since the last tick.
    fn reap(&self, tasks: &mut JoinSet<()>) {
        while let Some(joined) = tasks.try_join_next() {
            if let Err(error) = joined {
                tracing::error!(
                    error = &error as &dyn std::error::Error,
                    probe = %self.name,
                    "Check task panicked"
                );
            }
        }
    }

    async fn drain(&self, mut tasks: JoinSet<()>) {
        if tasks.is_empty() {
            return;
        }

        match self.in_flight {
            InFlightPolicy::Wait { timeout } => {
                tracing::info!(
                    probe = %self.name,
                    in_flight = tasks.len(),
                    "Waiting for running checks"
                );
                let joined = tokio::time::timeout(timeout, async {
                    while tasks.join_next().await.is_some() {}
                })
                .await;

                if joined.is_err() {
                    tracing::warn!(
                        probe = %self.name,
                        in_flight = tasks.len(),
                        "Running checks did not finish in time, aborting"
                    );
                    tasks.shutdown().await;
                }
            }
            InFlightPolicy::Abort => {
                tracing::info!(
                    probe = %self.name,
                    in_flight = tasks.len(),
                    "Aborting running checks"
                );
                tasks.shutdown().await;
            }
        }
    }
}
