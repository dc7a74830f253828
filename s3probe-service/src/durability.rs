//! Sampled verification of the seeded durability bucket.
//!
//! Every run draws a handful of distinct indices from the seeded population and reads the
//! corresponding objects back. An object that is gone, or whose size no longer matches the
//! seeded size, is counted as lost. Reads that fail for other reasons are recorded as failed
//! measurements only, since they say nothing about whether the data still exists.

use crate::backend::SharedClient;
use crate::error::{Error, Result};
use crate::metrics::Operation;
use crate::payload::durability_object_name;
use crate::recorder::Recorder;

/// Number of objects sampled per run unless configured otherwise.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Outcome of a single durability run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DurabilityReport {
    /// Number of sampled objects.
    pub checked: usize,
    /// Keys of sampled objects that were absent or truncated.
    pub missing: Vec<String>,
    /// Number of sampled reads that failed without proving loss.
    pub errors: usize,
}

#[derive(Clone, Debug)]
pub struct DurabilityCheck {
    client: SharedClient,
    recorder: Recorder,
    bucket: String,
    population: u64,
    object_size: usize,
    sample_size: usize,
}

impl DurabilityCheck {
    pub fn new(
        client: SharedClient,
        recorder: Recorder,
        bucket: impl Into<String>,
        population: u64,
        object_size: usize,
    ) -> Self {
        Self {
            client,
            recorder,
            bucket: bucket.into(),
            population,
            object_size,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Sets the number of objects read per run. It is capped at the population size.
    pub fn sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    fn sample_indices(&self) -> Vec<u64> {
        let population = usize::try_from(self.population).unwrap_or(usize::MAX);
        let amount = self.sample_size.min(population);

        let mut rng = rand::rng();
        rand::seq::index::sample(&mut rng, population, amount)
            .into_iter()
            .map(|index| index as u64)
            .collect()
    }

    /// Samples the durability bucket and reports lost objects to the metrics sink.
    ///
    /// Fails with [`Error::BucketMissing`] if the bucket itself is gone, in which case the whole
    /// population is reported as missing.
    #[tracing::instrument(name = "durability_check", skip_all, fields(probe = %self.recorder.endpoint()))]
    pub async fn run(&self) -> Result<DurabilityReport> {
        let bucket = self.bucket.as_str();
        let endpoint = self.recorder.endpoint();

        if !self.client.bucket_exists(bucket).await? {
            tracing::error!(
                bucket,
                population = self.population,
                "Durability bucket disappeared"
            );
            self.recorder
                .sink()
                .record_missing_objects(endpoint, self.population);
            return Err(Error::BucketMissing {
                bucket: bucket.to_owned(),
            });
        }

        let indices = self.sample_indices();
        let mut report = DurabilityReport {
            checked: indices.len(),
            ..Default::default()
        };

        for index in indices {
            let key = durability_object_name(index);
            let read = self
                .recorder
                .measure(Operation::DurabilityGetObject, async {
                    match self.client.get_object(bucket, &key).await? {
                        Some(data) if data.len() == self.object_size => Ok(()),
                        _ => Err(Error::ObjectMissing {
                            bucket: bucket.to_owned(),
                            key: key.clone(),
                        }),
                    }
                })
                .await;

            match read {
                Ok(()) => {}
                Err(Error::ObjectMissing { .. }) => report.missing.push(key),
                Err(_) => report.errors += 1,
            }
        }

        if !report.missing.is_empty() {
            tracing::error!(
                bucket,
                missing = report.missing.len(),
                checked = report.checked,
                keys = ?report.missing,
                "Durability objects lost"
            );
            self.recorder
                .sink()
                .record_missing_objects(endpoint, report.missing.len() as u64);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::backend::InMemoryBackend;
    use crate::backend::in_memory::{Call, Fault};
    use crate::metrics::MemorySink;

    use super::*;

    const SIZE: usize = 16;

    fn seeded(population: u64) -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend.create_bucket("durability");
        for index in 0..population {
            let key = durability_object_name(index);
            backend.insert_object("durability", &key, Bytes::from(vec![0u8; SIZE]));
        }
        backend
    }

    fn check(backend: &InMemoryBackend, sink: &Arc<MemorySink>, population: u64) -> DurabilityCheck {
        let recorder = Recorder::new("minio-a", sink.clone());
        DurabilityCheck::new(Arc::new(backend.clone()), recorder, "durability", population, SIZE)
    }

    #[tokio::test]
    async fn intact_bucket_has_no_loss() {
        let backend = seeded(50);
        let sink = Arc::new(MemorySink::new());

        let report = check(&backend, &sink, 50).run().await.unwrap();

        assert_eq!(report.checked, DEFAULT_SAMPLE_SIZE);
        assert!(report.missing.is_empty());
        assert_eq!(report.errors, 0);
        assert_eq!(sink.successes(Operation::DurabilityGetObject), DEFAULT_SAMPLE_SIZE);
        assert_eq!(sink.missing_objects(), 0);
    }

    #[tokio::test]
    async fn samples_distinct_objects() {
        let backend = seeded(5);
        let sink = Arc::new(MemorySink::new());

        // A sample larger than the population reads every object exactly once.
        let report = check(&backend, &sink, 5).sample_size(100).run().await.unwrap();

        assert_eq!(report.checked, 5);
        assert_eq!(backend.calls(Call::GetObject), 5);
    }

    #[tokio::test]
    async fn detects_deleted_objects() {
        let backend = seeded(4);
        backend.delete_object("durability", "fake-item-1");
        backend.delete_object("durability", "fake-item-3");
        let sink = Arc::new(MemorySink::new());

        let mut report = check(&backend, &sink, 4).sample_size(4).run().await.unwrap();
        report.missing.sort();

        assert_eq!(report.missing, ["fake-item-1", "fake-item-3"]);
        assert_eq!(sink.missing_objects(), 2);
        assert_eq!(sink.total(Operation::DurabilityGetObject), 4);
        assert_eq!(sink.successes(Operation::DurabilityGetObject), 2);
    }

    #[tokio::test]
    async fn truncated_object_counts_as_missing() {
        let backend = seeded(1);
        backend.insert_object("durability", "fake-item-0", Bytes::from_static(b"short"));
        let sink = Arc::new(MemorySink::new());

        let report = check(&backend, &sink, 1).run().await.unwrap();

        assert_eq!(report.missing, ["fake-item-0"]);
    }

    #[tokio::test]
    async fn read_errors_are_not_loss() {
        let backend = seeded(3);
        backend.inject(Call::GetObject, Fault::FailAlways);
        let sink = Arc::new(MemorySink::new());

        let report = check(&backend, &sink, 3).run().await.unwrap();

        assert_eq!(report.errors, 3);
        assert!(report.missing.is_empty());
        assert_eq!(sink.missing_objects(), 0);
        assert_eq!(sink.successes(Operation::DurabilityGetObject), 0);
    }

    #[tokio::test]
    async fn missing_bucket_reports_whole_population() {
        let backend = InMemoryBackend::new();
        let sink = Arc::new(MemorySink::new());

        let result = check(&backend, &sink, 10_000).run().await;

        assert!(matches!(result, Err(Error::BucketMissing { .. })));
        assert_eq!(sink.missing_objects(), 10_000);
        assert_eq!(backend.calls(Call::GetObject), 0);
    }
}
