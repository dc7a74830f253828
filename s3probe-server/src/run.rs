//! Runs the probes of all configured targets until termination.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use s3probe_service::{Probe, StorageClient};
use tokio::signal::unix::SignalKind;
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::state::{ServiceState, State, create_client, map_probe_config};
use crate::web::{self, App};

/// The outcome of a probe task, along with the probe's name.
type ProbeOutcome = (String, s3probe_service::Result<()>);

/// Runs the HTTP server and one probe per target.
///
/// Returns when a termination signal was received and all probes have drained their checks, or
/// when all probes or the HTTP server have stopped on their own. Fails if any probe or the HTTP
/// server stopped with an error.
pub async fn run(config: crate::config::Config) -> Result<()> {
    check_targets(&config.targets)?;

    tracing::info!(targets = ?config.targets, "Starting s3probe");
    merni::counter!("server.start": 1);

    let listener = web::listen(config.http_addr).context("failed to start TCP listener")?;
    let state = State::new(config)?;

    let mut probes = Supervisor::default();
    for target in &state.config.targets {
        let client = create_client(&state.config, target)?;
        probes.spawn(&state, target, Arc::new(client))?;
    }

    let server = tokio::spawn(App::new(state.clone()).graceful_shutdown(true).serve(listener));

    let shutdown = state.shutdown.clone();
    let guard = elegant_departure::get_shutdown_guard();
    tokio::spawn(async move {
        guard.wait().await;
        tracing::info!("Shutting down ...");
        shutdown.cancel();
    });

    let depart = elegant_departure::tokio::depart()
        .on_termination()
        .on_sigint()
        .on_signal(SignalKind::hangup())
        .on_signal(SignalKind::quit());

    let result = supervise(&state, probes, server, depart).await;
    tracing::info!("Shutdown complete");
    result
}

/// Rejects an empty target list and targets configured more than once.
///
/// Every probe reports under its target name, so two probes for the same target would write to
/// the same metric series and race each other when creating buckets.
fn check_targets(targets: &[String]) -> Result<()> {
    if targets.is_empty() {
        anyhow::bail!("no targets configured");
    }

    let mut seen = BTreeSet::new();
    for target in targets {
        if target.is_empty() {
            anyhow::bail!("target names must not be empty");
        }
        if !seen.insert(target.as_str()) {
            anyhow::bail!("target `{target}` is configured more than once");
        }
    }

    Ok(())
}

/// Waits for termination and stops the probes.
///
/// Terminates on `depart`, when all probes have stopped, or when the HTTP server exits. Probes
/// are always cancelled and drained before returning. The HTTP server is awaited only if it was
/// asked to shut down through `depart`.
async fn supervise(
    state: &State,
    mut probes: Supervisor,
    mut server: JoinHandle<Result<()>>,
    depart: impl Future,
) -> Result<()> {
    let mut depart = pin!(depart);
    let mut departed = false;
    let mut served = None;

    loop {
        tokio::select! {
            _ = &mut depart => {
                departed = true;
                break;
            }
            joined = &mut server => {
                let result = joined.map_err(From::from).flatten();
                match &result {
                    Ok(()) => tracing::error!("HTTP server stopped unexpectedly"),
                    Err(error) => tracing::error!(
                        error = &**error as &dyn std::error::Error,
                        "HTTP server failed"
                    ),
                }
                served = Some(result.and_then(|()| Err(anyhow::anyhow!("HTTP server stopped"))));
                break;
            }
            outcome = probes.join_next(state) => {
                if outcome.is_none() {
                    tracing::error!("All probes stopped");
                    break;
                }
            }
        }
    }

    // Stops probes if they were not stopped by the signal already.
    state.shutdown.cancel();
    while probes.join_next(state).await.is_some() {}

    let served = match served {
        Some(result) => result,
        None if departed => server.await.map_err(From::from).flatten(),
        None => {
            server.abort();
            Ok(())
        }
    };

    served.context("HTTP server failed")?;
    match probes.failed {
        0 => Ok(()),
        failed => anyhow::bail!("{failed} probe(s) failed"),
    }
}

/// Tracks the running probes.
#[derive(Debug, Default)]
struct Supervisor {
    tasks: JoinSet<ProbeOutcome>,
    failed: usize,
}

impl Supervisor {
    fn spawn(
        &mut self,
        state: &ServiceState,
        target: &str,
        client: Arc<dyn StorageClient>,
    ) -> Result<()> {
        let config = map_probe_config(&state.config, target);
        let probe = Probe::new(config, client, state.sink(), state.shutdown.clone())
            .with_context(|| format!("invalid configuration for probe `{target}`"))?;

        let name = target.to_owned();
        state.probe_started();
        self.tasks.spawn(async move { (name, probe.run().await) });

        Ok(())
    }

    /// Waits for the next probe to stop and logs its outcome.
    ///
    /// Returns `None` once no probes are left.
    async fn join_next(&mut self, state: &State) -> Option<()> {
        let joined = self.tasks.join_next().await?;
        state.probe_stopped();

        match joined {
            Ok((name, Ok(()))) => tracing::info!(probe = %name, "Probe finished"),
            Ok((name, Err(error))) => {
                self.failed += 1;
                tracing::error!(
                    error = &error as &dyn std::error::Error,
                    probe = %name,
                    "Probe failed"
                );
            }
            Err(error) => self.panicked(error),
        }

        Some(())
    }

    fn panicked(&mut self, error: JoinError) {
        self.failed += 1;
        tracing::error!(
            error = &error as &dyn std::error::Error,
            "Probe task panicked"
        );
    }
}
