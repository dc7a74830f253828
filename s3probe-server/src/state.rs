use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use s3probe_service::backend::{S3Backend, S3BackendConfig};
use s3probe_service::metrics::{DatadogSink, FanoutSink, PrometheusSink};
use s3probe_service::prepare::Seeding;
use s3probe_service::{InFlightPolicy, ProbeConfig, SharedSink};
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, InFlight};

/// Shared reference to the [server state](State).
pub type ServiceState = Arc<State>;

/// State shared between the probes and the HTTP handlers.
///
/// In request handlers, use `axum::extract::State<ServiceState>` to retrieve a shared reference to
/// this structure.
#[derive(Debug)]
pub struct State {
    /// The server configuration.
    pub config: Config,
    /// Sink holding the Prometheus instruments of all probes.
    pub prometheus: Arc<PrometheusSink>,
    /// Cancelled once the process shuts down.
    pub shutdown: CancellationToken,
    running: AtomicUsize,
}

impl State {
    pub fn new(config: Config) -> Result<ServiceState> {
        let prometheus = PrometheusSink::new().context("failed to register metrics")?;

        Ok(Arc::new(Self {
            config,
            prometheus: Arc::new(prometheus),
            shutdown: CancellationToken::new(),
            running: AtomicUsize::new(0),
        }))
    }

    /// The sink measurements of all probes are reported to.
    ///
    /// Datadog receives measurements only if metrics have been initialized.
    pub fn sink(&self) -> SharedSink {
        let sinks: Vec<SharedSink> = vec![self.prometheus.clone(), Arc::new(DatadogSink)];
        Arc::new(FanoutSink(sinks))
    }

    pub fn probe_started(&self) {
        self.running.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe_stopped(&self) {
        self.running.fetch_sub(1, Ordering::Relaxed);
    }

    /// Number of probes that are currently running.
    pub fn running_probes(&self) -> usize {
        self.running.load(Ordering::Relaxed)
    }

    /// Returns `true` while all configured probes are running and no shutdown was requested.
    pub fn is_ready(&self) -> bool {
        !self.shutdown.is_cancelled() && self.running_probes() == self.config.targets.len()
    }
}

/// Builds the probe configuration for a target.
pub fn map_probe_config(config: &Config, target: &str) -> ProbeConfig {
    let in_flight = match config.shutdown.in_flight {
        InFlight::Wait => InFlightPolicy::Wait {
            timeout: config.shutdown.drain_timeout,
        },
        InFlight::Abort => InFlightPolicy::Abort,
    };

    ProbeConfig {
        probe_rate_per_min: config.probe_rate_per_min,
        seeding: Seeding {
            population: config.durability.population,
            object_size: config.durability.object_size,
            retry: config.seeding_retry.policy(),
        },
        durability_sample_size: config.durability.sample_size,
        in_flight,
        ..ProbeConfig::new(target, &config.latency_bucket, &config.durability_bucket)
    }
}

/// Builds the storage client configuration for a target.
pub fn map_backend_config(config: &Config, target: &str) -> Result<S3BackendConfig> {
    let access_key = config
        .access_key
        .as_ref()
        .context("missing access_key")?;
    let secret_key = config
        .secret_key
        .as_ref()
        .context("missing secret_key")?;

    Ok(S3BackendConfig {
        endpoint: config.endpoint(target),
        region: config.region.clone(),
        access_key: access_key.expose_secret().as_str().to_owned(),
        secret_key: secret_key.expose_secret().as_str().to_owned(),
        request_timeout: Some(config.request_timeout),
    })
}

/// Creates the storage client for a target.
pub fn create_client(config: &Config, target: &str) -> Result<S3Backend> {
    let backend_config = map_backend_config(config, target)?;
    tracing::info!(probe = target, endpoint = %backend_config.endpoint, "Probe created");
    Ok(S3Backend::new(backend_config))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretBox;

    use crate::config::ConfigSecret;

    use super::*;

    fn config() -> Config {
        Config {
            targets: vec!["minio-a".into()],
            endpoint_suffix: ".storage:9000".into(),
            access_key: Some(secret("probe")),
            secret_key: Some(secret("hunter2")),
            ..Default::default()
        }
    }

    fn secret(value: &str) -> SecretBox<ConfigSecret> {
        SecretBox::new(Box::new(value.into()))
    }

    #[test]
    fn maps_probe_config() {
        let mut config = config();
        config.probe_rate_per_min = 4;
        config.shutdown.drain_timeout = Duration::from_secs(7);

        let probe = map_probe_config(&config, "minio-a");

        assert_eq!(probe.name, "minio-a");
        assert_eq!(probe.latency_bucket, "probe-latency");
        assert_eq!(probe.durability_bucket, "probe-durability");
        assert_eq!(probe.probe_rate_per_min, 4);
        assert_eq!(probe.seeding.population, 10_000);
        assert_eq!(
            probe.in_flight,
            InFlightPolicy::Wait {
                timeout: Duration::from_secs(7)
            }
        );
        probe.validate().unwrap();
    }

    #[test]
    fn maps_abort_policy() {
        let mut config = config();
        config.shutdown.in_flight = InFlight::Abort;

        let probe = map_probe_config(&config, "minio-a");
        assert_eq!(probe.in_flight, InFlightPolicy::Abort);
    }

    #[test]
    fn maps_backend_config() {
        let backend = map_backend_config(&config(), "minio-a").unwrap();

        assert_eq!(backend.endpoint, "http://minio-a.storage:9000");
        assert_eq!(backend.region, "us-east-1");
        assert_eq!(backend.access_key, "probe");
        assert_eq!(backend.secret_key, "hunter2");
    }

    #[test]
    fn requires_credentials() {
        let config = Config {
            secret_key: None,
            ..config()
        };
        assert!(map_backend_config(&config, "minio-a").is_err());
    }

    #[test]
    fn readiness_tracks_probes() {
        let state = State::new(config()).unwrap();
        assert!(!state.is_ready());

        state.probe_started();
        assert!(state.is_ready());

        state.shutdown.cancel();
        assert!(!state.is_ready());
    }
}
