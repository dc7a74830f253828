//! Metric sinks receiving [`Measurement`]s.
//!
//! Every measured operation produces one [`Measurement`], which a [`MetricsSink`] turns into
//! three instruments keyed by `(operation, endpoint)`:
//!
//!  - a latency distribution,
//!  - a counter of all requests,
//!  - a counter of successful requests.
//!
//! Sinks are injected into each probe. Several probes can share one sink since all instruments
//! carry the endpoint label.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Histogram buckets for operation latencies, in seconds.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// The measured storage operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    ListBuckets,
    PutObject,
    GetObject,
    RemoveObject,
    /// Sampled reads of seeded objects in the durability bucket.
    DurabilityGetObject,
}

impl Operation {
    /// The label value of this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListBuckets => "list_buckets",
            Self::PutObject => "put_object",
            Self::GetObject => "get_object",
            Self::RemoveObject => "remove_object",
            Self::DurabilityGetObject => "durability_get_object",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single measured operation.
#[derive(Clone, Copy, Debug)]
pub struct Measurement<'a> {
    pub operation: Operation,
    pub endpoint: &'a str,
    pub elapsed: Duration,
    pub success: bool,
}

/// Receives measurements from probes.
///
/// Implementations are called concurrently from all running checks.
pub trait MetricsSink: fmt::Debug + Send + Sync + 'static {
    /// Records one operation: total count and latency always, success only if it succeeded.
    fn record(&self, measurement: &Measurement<'_>);

    /// Records objects of the durability bucket that could not be retrieved.
    fn record_missing_objects(&self, endpoint: &str, count: u64);
}

/// A shareable, type-erased [`MetricsSink`] instance.
pub type SharedSink = Arc<dyn MetricsSink>;

/// A [`MetricsSink`] backed by its own Prometheus registry.
///
/// Use [`encode`](Self::encode) to render the registry in the text exposition format.
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    latency: HistogramVec,
    total: IntCounterVec,
    success: IntCounterVec,
    missing: IntCounterVec,
}

impl PrometheusSink {
    /// Creates the instruments and registers them with a fresh registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let latency = HistogramVec::new(
            HistogramOpts::new("s3_latency_seconds", "Latency for operation on the S3 endpoint")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["operation", "endpoint"],
        )?;
        let total = IntCounterVec::new(
            Opts::new("s3_request_total", "Total number of requests on S3 endpoint"),
            &["operation", "endpoint"],
        )?;
        let success = IntCounterVec::new(
            Opts::new(
                "s3_request_success_total",
                "Total number of successful requests on S3 endpoint",
            ),
            &["operation", "endpoint"],
        )?;
        let missing = IntCounterVec::new(
            Opts::new(
                "s3_durability_missing_objects_total",
                "Total number of sampled durability objects that could not be retrieved",
            ),
            &["endpoint"],
        )?;

        registry.register(Box::new(latency.clone()))?;
        registry.register(Box::new(total.clone()))?;
        registry.register(Box::new(success.clone()))?;
        registry.register(Box::new(missing.clone()))?;

        Ok(Self {
            registry,
            latency,
            total,
            success,
            missing,
        })
    }

    /// Renders all metrics in the Prometheus text format.
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }

    /// Current value of the total-request counter.
    pub fn total(&self, operation: Operation, endpoint: &str) -> u64 {
        self.total
            .with_label_values(&[operation.as_str(), endpoint])
            .get()
    }

    /// Current value of the success counter.
    pub fn successes(&self, operation: Operation, endpoint: &str) -> u64 {
        self.success
            .with_label_values(&[operation.as_str(), endpoint])
            .get()
    }
}

impl fmt::Debug for PrometheusSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrometheusSink").finish_non_exhaustive()
    }
}

impl MetricsSink for PrometheusSink {
    fn record(&self, measurement: &Measurement<'_>) {
        let labels = [measurement.operation.as_str(), measurement.endpoint];

        self.total.with_label_values(&labels).inc();
        self.latency
            .with_label_values(&labels)
            .observe(measurement.elapsed.as_secs_f64());

        if measurement.success {
            self.success.with_label_values(&labels).inc();
        }
    }

    fn record_missing_objects(&self, endpoint: &str, count: u64) {
        self.missing.with_label_values(&[endpoint]).inc_by(count);
    }
}

/// A [`MetricsSink`] submitting to the globally initialized `merni` recorder.
///
/// Without an initialized recorder, all measurements are discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct DatadogSink;

impl MetricsSink for DatadogSink {
    fn record(&self, measurement: &Measurement<'_>) {
        let operation = measurement.operation.as_str();
        let endpoint = measurement.endpoint;

        merni::counter!("request.total": 1, "operation" => operation, "endpoint" => endpoint);
        merni::distribution!(
            "request.latency"@s: measurement.elapsed,
            "operation" => operation,
            "endpoint" => endpoint
        );
        if measurement.success {
            merni::counter!("request.success": 1, "operation" => operation, "endpoint" => endpoint);
        }
    }

    fn record_missing_objects(&self, endpoint: &str, count: u64) {
        merni::counter!("durability.missing": count, "endpoint" => endpoint);
    }
}

/// Forwards measurements to several sinks.
#[derive(Debug, Default)]
pub struct FanoutSink(pub Vec<SharedSink>);

impl MetricsSink for FanoutSink {
    fn record(&self, measurement: &Measurement<'_>) {
        for sink in &self.0 {
            sink.record(measurement);
        }
    }

    fn record_missing_objects(&self, endpoint: &str, count: u64) {
        for sink in &self.0 {
            sink.record_missing_objects(endpoint, count);
        }
    }
}

/// A measurement retained by [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded {
    pub operation: Operation,
    pub endpoint: String,
    pub success: bool,
}

/// A [`MetricsSink`] retaining all measurements in memory, for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    recorded: Mutex<Vec<Recorded>>,
    missing: Mutex<Vec<(String, u64)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All measurements in the order they were recorded.
    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The operations recorded so far, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.recorded().into_iter().map(|r| r.operation).collect()
    }

    /// Number of recorded invocations of `operation`.
    pub fn total(&self, operation: Operation) -> usize {
        self.recorded()
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// Number of successful invocations of `operation`.
    pub fn successes(&self, operation: Operation) -> usize {
        self.recorded()
            .iter()
            .filter(|r| r.operation == operation && r.success)
            .count()
    }

    /// Sum of all reported missing durability objects.
    pub fn missing_objects(&self) -> u64 {
        self.missing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, count)| count)
            .sum()
    }
}

impl MetricsSink for MemorySink {
    fn record(&self, measurement: &Measurement<'_>) {
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Recorded {
                operation: measurement.operation,
                endpoint: measurement.endpoint.to_owned(),
                success: measurement.success,
            });
    }

    fn record_missing_objects(&self, endpoint: &str, count: u64) {
        self.missing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((endpoint.to_owned(), count));
    }
}
