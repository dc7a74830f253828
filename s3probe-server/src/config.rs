//! Configuration for the s3probe server.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Environment variables (prefixed with `S3PROBE__`)
//! 2. YAML configuration file (specified via `-c` or `--config` flag)
//! 3. Defaults
//!
//! See [`Config`] for a description of all configuration fields and their defaults.
//!
//! # Environment Variables
//!
//! Environment variables use `S3PROBE__` as a prefix and double underscores (`__`) to denote
//! nested configuration structures. For example:
//!
//! - `S3PROBE__TARGETS=[minio-a,minio-b]` sets the probed endpoints
//! - `S3PROBE__ENDPOINT_SUFFIX=.storage.internal:9000` sets the suffix appended to every target
//! - `S3PROBE__SHUTDOWN__IN_FLIGHT=abort` aborts running checks on shutdown
//!
//! # YAML Configuration File
//!
//! The above configuration in YAML format would look like this:
//!
//! ```yaml
//! targets:
//!   - minio-a
//!   - minio-b
//! endpoint_suffix: .storage.internal:9000
//!
//! shutdown:
//!   in_flight: abort
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use s3probe_service::retry::RetryPolicy;
use secrecy::{CloneableSecret, SecretBox, SerializableSecret, zeroize::Zeroize};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "S3PROBE__";

/// Newtype around `String` that may protect against accidental
/// logging of secrets in our configuration struct. Use with
/// [`secrecy::SecretBox`].
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl std::ops::Deref for ConfigSecret {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

impl CloneableSecret for ConfigSecret {}
impl SerializableSecret for ConfigSecret {}
impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// The durability bucket's seeded population and how it is verified.
///
/// Used in: [`Config::durability`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Durability {
    /// Number of objects seeded into a freshly created durability bucket.
    ///
    /// Changing this for an existing bucket has no effect on the seeded objects, but the sampling
    /// will then draw indices from the new range.
    ///
    /// # Default
    ///
    /// `10000`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__DURABILITY__POPULATION`
    pub population: u64,

    /// Size of every seeded object in bytes.
    ///
    /// # Default
    ///
    /// `1048576` (1 MiB)
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__DURABILITY__OBJECT_SIZE`
    pub object_size: usize,

    /// Number of seeded objects read back on every tick.
    ///
    /// # Default
    ///
    /// `10`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__DURABILITY__SAMPLE_SIZE`
    pub sample_size: usize,
}

impl Default for Durability {
    fn default() -> Self {
        Self {
            population: 10_000,
            object_size: 1024 * 1024,
            sample_size: 10,
        }
    }
}

/// Retry behavior for writes while seeding the durability bucket.
///
/// The delay starts at `initial_delay` and is multiplied by `multiplier` after every failed
/// attempt, up to `max_delay`. Seeding fails once `max_attempts` writes of the same object
/// failed or when the next attempt would start after `max_elapsed`.
///
/// Used in: [`Config::seeding_retry`]
///
/// # Environment Variables
///
/// - `S3PROBE__SEEDING_RETRY__INITIAL_DELAY=5s`
/// - `S3PROBE__SEEDING_RETRY__MULTIPLIER=2.0`
/// - `S3PROBE__SEEDING_RETRY__MAX_DELAY=1m`
/// - `S3PROBE__SEEDING_RETRY__MAX_ATTEMPTS=10`
/// - `S3PROBE__SEEDING_RETRY__MAX_ELAPSED=30m`
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedingRetry {
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    pub multiplier: f64,
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub max_elapsed: Option<Duration>,
}

impl Default for SeedingRetry {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            initial_delay: policy.initial_delay,
            multiplier: policy.multiplier,
            max_delay: policy.max_delay,
            max_attempts: policy.max_attempts,
            max_elapsed: policy.max_elapsed,
        }
    }
}

impl SeedingRetry {
    /// Returns the retry policy described by this configuration.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: self.initial_delay,
            multiplier: self.multiplier,
            max_delay: self.max_delay,
            max_attempts: self.max_attempts,
            max_elapsed: self.max_elapsed,
        }
    }
}

/// Treatment of checks that are still running when a probe stops.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InFlight {
    /// Wait for running checks, bounded by [`Shutdown::drain_timeout`].
    #[default]
    Wait,
    /// Abort running checks.
    Abort,
}

/// Shutdown behavior.
///
/// Used in: [`Config::shutdown`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Shutdown {
    /// What to do with running checks on shutdown.
    ///
    /// # Default
    ///
    /// `wait`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SHUTDOWN__IN_FLIGHT`
    pub in_flight: InFlight,

    /// Maximum time to wait for running checks before aborting them.
    ///
    /// Only used with `in_flight: wait`.
    ///
    /// # Default
    ///
    /// `30s`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SHUTDOWN__DRAIN_TIMEOUT`
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self {
            in_flight: InFlight::Wait,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// Runtime configuration for the Tokio async runtime.
///
/// Used in: [`Config::runtime`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Runtime {
    /// Number of worker threads for the server runtime.
    ///
    /// # Default
    ///
    /// Defaults to the number of CPU cores on the host machine.
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__RUNTIME__WORKER_THREADS`
    pub worker_threads: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
        }
    }
}

/// [Sentry](https://sentry.io/) error tracking configuration.
///
/// Sentry is disabled by default and only enabled when a DSN is provided. Warnings and errors are
/// reported as events, so failed measurements, lifecycle failures and lost durability objects
/// show up in Sentry.
///
/// Used in: [`Config::sentry`]
#[derive(Debug, Deserialize, Serialize)]
pub struct Sentry {
    /// Sentry DSN (Data Source Name).
    ///
    /// # Default
    ///
    /// `None` (Sentry disabled)
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SENTRY__DSN`
    pub dsn: Option<SecretBox<ConfigSecret>>,

    /// Environment name for this deployment.
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SENTRY__ENVIRONMENT`
    pub environment: Option<Cow<'static, str>>,

    /// Server name or identifier.
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SENTRY__SERVER_NAME`
    pub server_name: Option<Cow<'static, str>>,

    /// Error event sampling rate.
    ///
    /// # Default
    ///
    /// `1.0` (send all errors)
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SENTRY__SAMPLE_RATE`
    pub sample_rate: f32,

    /// Performance trace sampling rate.
    ///
    /// # Default
    ///
    /// `0.01` (send 1% of traces)
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SENTRY__TRACES_SAMPLE_RATE`
    pub traces_sample_rate: f32,

    /// Enable Sentry SDK debug mode.
    ///
    /// # Default
    ///
    /// `false`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SENTRY__DEBUG`
    pub debug: bool,

    /// Additional tags to attach to all Sentry events.
    ///
    /// # Environment Variables
    ///
    /// Each tag is set individually:
    /// - `S3PROBE__SENTRY__TAGS__FOO=foo`
    /// - `S3PROBE__SENTRY__TAGS__BAR=bar`
    pub tags: BTreeMap<String, String>,
}

impl Sentry {
    /// Returns whether Sentry integration is enabled.
    pub fn is_enabled(&self) -> bool {
        self.dsn.is_some()
    }
}

impl Default for Sentry {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            server_name: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.01,
            debug: false,
            tags: BTreeMap::new(),
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted. The format can be explicitly specified or
/// auto-detected based on whether output is to a TTY.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Pretty printing with colors.
    Pretty,

    /// Simplified plain text output.
    ///
    /// ```text
    /// 2025-03-04T12:10:32.123Z  INFO s3probe_service::probe: Starting probe probe=minio-a
    /// ```
    Simplified,

    /// Dump out JSON lines.
    Json,
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging configuration.
///
/// Logs are always written to stderr.
///
/// Used in: [`Config::logging`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// The `RUST_LOG` environment variable takes precedence if set.
    ///
    /// # Default
    ///
    /// `INFO`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format. See [`LogFormat`] for available options.
    ///
    /// # Default
    ///
    /// `auto`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__LOGGING__FORMAT`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Metrics configuration.
///
/// Measurements are always exposed in the Prometheus format on `/metrics`. In addition, they can
/// be submitted to Datadog.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Metrics {
    /// Datadog [API key] for metrics.
    ///
    /// # Default
    ///
    /// `None` (Datadog metrics disabled)
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__METRICS__DATADOG_KEY`
    ///
    /// [API key]: https://docs.datadoghq.com/account_management/api-app-keys/#api-keys
    pub datadog_key: Option<SecretBox<ConfigSecret>>,

    /// Global tags applied to all Datadog metrics.
    ///
    /// # Environment Variables
    ///
    /// - `S3PROBE__METRICS__TAGS__FOO=foo`
    pub tags: BTreeMap<String, String>,
}

/// Main configuration struct for the s3probe server.
///
/// Configuration is loaded from multiple sources with the following precedence (highest to
/// lowest):
///
/// 1. Environment variables (prefixed with `S3PROBE__`)
/// 2. YAML configuration file (if provided via `-c` flag)
/// 3. Default values
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Bind address of the HTTP server exposing `/metrics`, `/health` and `/ready`.
    ///
    /// # Default
    ///
    /// `0.0.0.0:8080`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__HTTP_ADDR`
    pub http_addr: SocketAddr,

    /// Names of the endpoints to probe.
    ///
    /// One probe is started per target. The name is the `endpoint` label of all metrics, and the
    /// host of the endpoint is the name followed by [`endpoint_suffix`](Self::endpoint_suffix).
    ///
    /// # Default
    ///
    /// Empty. At least one target is required to run.
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__TARGETS=[minio-a,minio-b]`
    pub targets: Vec<String>,

    /// Suffix appended to every target name to form the endpoint host, usually a domain and
    /// port such as `.storage.internal:9000`.
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__ENDPOINT_SUFFIX`
    pub endpoint_suffix: String,

    /// Whether endpoints are reached via HTTPS.
    ///
    /// # Default
    ///
    /// `false`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SECURE`
    pub secure: bool,

    /// Signing region.
    ///
    /// # Default
    ///
    /// `us-east-1`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__REGION`
    pub region: String,

    /// Access key used for all targets.
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__ACCESS_KEY`
    pub access_key: Option<SecretBox<ConfigSecret>>,

    /// Secret key used for all targets.
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__SECRET_KEY`
    pub secret_key: Option<SecretBox<ConfigSecret>>,

    /// Timeout of a single storage operation.
    ///
    /// # Default
    ///
    /// `30s`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__REQUEST_TIMEOUT`
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Bucket for latency checks. Objects in it expire after one day.
    ///
    /// # Default
    ///
    /// `probe-latency`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__LATENCY_BUCKET`
    pub latency_bucket: String,

    /// Bucket seeded once with the durability population.
    ///
    /// # Default
    ///
    /// `probe-durability`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__DURABILITY_BUCKET`
    pub durability_bucket: String,

    /// Number of checks per minute and target, between 1 and 60000.
    ///
    /// # Default
    ///
    /// `1`
    ///
    /// # Environment Variable
    ///
    /// `S3PROBE__PROBE_RATE_PER_MIN`
    pub probe_rate_per_min: u32,

    /// Durability bucket population and sampling. See [`Durability`].
    pub durability: Durability,

    /// Retries while seeding the durability bucket. See [`SeedingRetry`].
    pub seeding_retry: SeedingRetry,

    /// Shutdown behavior. See [`Shutdown`].
    pub shutdown: Shutdown,

    /// Configuration of the internal task runtime. See [`Runtime`].
    pub runtime: Runtime,

    /// Logging configuration. See [`Logging`].
    pub logging: Logging,

    /// Sentry error tracking configuration. See [`Sentry`].
    pub sentry: Sentry,

    /// Datadog metrics configuration. See [`Metrics`].
    pub metrics: Metrics,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),

            targets: Vec::new(),
            endpoint_suffix: String::new(),
            secure: false,
            region: "us-east-1".to_owned(),
            access_key: None,
            secret_key: None,
            request_timeout: Duration::from_secs(30),

            latency_bucket: "probe-latency".to_owned(),
            durability_bucket: "probe-durability".to_owned(),
            probe_rate_per_min: 1,
            durability: Durability::default(),
            seeding_retry: SeedingRetry::default(),
            shutdown: Shutdown::default(),

            runtime: Runtime::default(),
            logging: Logging::default(),
            sentry: Sentry::default(),
            metrics: Metrics::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the provided arguments.
    ///
    /// Configuration is merged in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. YAML configuration file (if provided)
    /// 3. Environment variables (prefixed with `S3PROBE__`)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Returns the endpoint URL of the given target.
    pub fn endpoint(&self, target: &str) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{target}{}", self.endpoint_suffix)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();

            assert!(config.targets.is_empty());
            assert_eq!(config.http_addr, "0.0.0.0:8080".parse().unwrap());
            assert_eq!(config.probe_rate_per_min, 1);
            assert_eq!(config.durability.population, 10_000);
            assert_eq!(config.durability.object_size, 1024 * 1024);
            assert_eq!(config.seeding_retry.policy(), RetryPolicy::default());
            assert_eq!(config.shutdown.in_flight, InFlight::Wait);
            assert_eq!(config.logging.level, LevelFilter::INFO);
            assert!(!config.sentry.is_enabled());

            Ok(())
        });
    }

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("S3PROBE__TARGETS", "[minio-a,minio-b]");
            jail.set_env("S3PROBE__ENDPOINT_SUFFIX", ".storage.internal:9000");
            jail.set_env("S3PROBE__ACCESS_KEY", "probe");
            jail.set_env("S3PROBE__SECRET_KEY", "hunter2");
            jail.set_env("S3PROBE__PROBE_RATE_PER_MIN", "6");
            jail.set_env("S3PROBE__DURABILITY__SAMPLE_SIZE", "25");
            jail.set_env("S3PROBE__SEEDING_RETRY__MAX_ELAPSED", "15m");
            jail.set_env("S3PROBE__SHUTDOWN__IN_FLIGHT", "abort");
            jail.set_env("S3PROBE__METRICS__TAGS__FOO", "bar");
            jail.set_env("S3PROBE__SENTRY__DSN", "abcde");
            jail.set_env("S3PROBE__LOGGING__LEVEL", "debug");

            let config = Config::load(None).unwrap();

            assert_eq!(dbg!(&config).targets, ["minio-a", "minio-b"]);
            assert_eq!(
                config.endpoint("minio-a"),
                "http://minio-a.storage.internal:9000"
            );
            assert_eq!(
                config.access_key.unwrap().expose_secret().as_str(),
                "probe"
            );
            assert_eq!(
                config.secret_key.unwrap().expose_secret().as_str(),
                "hunter2"
            );
            assert_eq!(config.probe_rate_per_min, 6);
            assert_eq!(config.durability.sample_size, 25);
            assert_eq!(config.durability.population, 10_000);
            assert_eq!(
                config.seeding_retry.max_elapsed,
                Some(Duration::from_secs(15 * 60))
            );
            assert_eq!(config.shutdown.in_flight, InFlight::Abort);
            assert_eq!(config.metrics.tags, [("foo".into(), "bar".into())].into());
            assert_eq!(config.sentry.dsn.unwrap().expose_secret().as_str(), "abcde");
            assert_eq!(config.logging.level, LevelFilter::DEBUG);

            Ok(())
        });
    }

    #[test]
    fn configurable_via_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            targets:
                - minio-a
            secure: true
            latency_bucket: latency
            durability_bucket: durability
            durability:
                population: 500
            seeding_retry:
                initial_delay: 1s
                max_attempts: 3
            shutdown:
                drain_timeout: 5s
            logging:
                format: json
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|_jail| {
            let config = Config::load(Some(tempfile.path())).unwrap();

            assert_eq!(dbg!(&config).targets, ["minio-a"]);
            assert_eq!(config.endpoint("minio-a"), "https://minio-a");
            assert_eq!(config.latency_bucket, "latency");
            assert_eq!(config.durability_bucket, "durability");
            assert_eq!(config.durability.population, 500);
            assert_eq!(config.durability.sample_size, 10);
            assert_eq!(config.seeding_retry.initial_delay, Duration::from_secs(1));
            assert_eq!(config.seeding_retry.max_attempts, Some(3));
            assert_eq!(config.seeding_retry.max_delay, Duration::from_secs(60));
            assert_eq!(config.shutdown.drain_timeout, Duration::from_secs(5));
            assert_eq!(config.logging.format, LogFormat::Json);

            Ok(())
        });
    }

    #[test]
    fn configured_with_env_and_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            targets:
                - minio-a
            probe_rate_per_min: 2
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|jail| {
            jail.set_env("S3PROBE__PROBE_RATE_PER_MIN", "12");

            let config = Config::load(Some(tempfile.path())).unwrap();

            // Env should overwrite the yaml config
            assert_eq!(config.probe_rate_per_min, 12);
            assert_eq!(config.targets, ["minio-a"]);

            Ok(())
        });
    }

    #[test]
    fn secrets_are_redacted() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("S3PROBE__SECRET_KEY", "hunter2");
            jail.set_env("S3PROBE__METRICS__DATADOG_KEY", "ddkey");

            let config = Config::load(None).unwrap();
            let debug = format!("{config:?}");

            assert!(!debug.contains("hunter2"));
            assert!(!debug.contains("ddkey"));

            Ok(())
        });
    }

    #[test]
    fn rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("S3PROBE__SHUTDOWN__IN_FLIGHT", "sometimes");
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }
}
