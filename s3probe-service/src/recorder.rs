use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;

use crate::metrics::{Measurement, MetricsSink, Operation, SharedSink};

/// Times operations against one endpoint and reports them to a [`MetricsSink`].
#[derive(Clone, Debug)]
pub struct Recorder {
    endpoint: Arc<str>,
    sink: SharedSink,
}

impl Recorder {
    pub fn new(endpoint: impl Into<Arc<str>>, sink: SharedSink) -> Self {
        Self {
            endpoint: endpoint.into(),
            sink,
        }
    }

    /// The endpoint label attached to all measurements.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn sink(&self) -> &dyn MetricsSink {
        self.sink.as_ref()
    }

    /// Runs `operation` and records its latency and outcome.
    ///
    /// The total counter and latency are recorded regardless of the outcome, the success counter
    /// only if the operation returned `Ok`. Errors are logged and handed back unchanged; retrying
    /// is up to the caller.
    pub async fn measure<T, E, F>(&self, operation: Operation, future: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        let start = Instant::now();
        let result = future.await;

        self.sink.record(&Measurement {
            operation,
            endpoint: &self.endpoint,
            elapsed: start.elapsed(),
            success: result.is_ok(),
        });

        if let Err(ref error) = result {
            tracing::warn!(
                error = error as &dyn Error,
                %operation,
                endpoint = %self.endpoint,
                "Error while executing operation"
            );
        }

        result
    }
}
