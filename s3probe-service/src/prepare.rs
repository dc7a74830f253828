//! Idempotent preparation of the latency and durability buckets.
//!
//! Both buckets are checked on every tick. A bucket that already exists is left untouched, so
//! the lifecycle policy of the latency bucket and the seeded population of the durability bucket
//! are only ever set up once, right after the bucket has been created.

use std::sync::Arc;

use crate::backend::{LifecyclePolicy, SharedClient};
use crate::error::{Error, Result};
use crate::payload::{durability_object_name, random_payload};
use crate::retry::RetryPolicy;

/// Objects in the latency bucket expire after this many days.
pub const LATENCY_EXPIRATION_DAYS: i32 = 1;

/// Seeding progress is logged whenever this many objects have been written.
const PROGRESS_INTERVAL: u64 = 100;

/// How the durability bucket is populated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Seeding {
    /// Number of objects written to the bucket.
    pub population: u64,
    /// Size of every object in bytes.
    pub object_size: usize,
    /// Retry policy for individual object writes.
    pub retry: RetryPolicy,
}

impl Default for Seeding {
    fn default() -> Self {
        Self {
            population: 10_000,
            object_size: 1024 * 1024,
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of a bucket preparation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BucketStatus {
    /// The bucket already existed, nothing was done.
    Existing,
    /// The latency bucket was created.
    ///
    /// Installing the lifecycle policy is best-effort; `lifecycle_applied` is `false` if it failed.
    Created { lifecycle_applied: bool },
    /// The durability bucket was created and populated with the given number of objects.
    Seeded { objects: u64 },
}

/// Ensures that the buckets used by a probe exist.
#[derive(Clone, Debug)]
pub struct BucketPreparer {
    probe: Arc<str>,
    client: SharedClient,
    latency_bucket: String,
    durability_bucket: String,
    seeding: Seeding,
}

impl BucketPreparer {
    pub fn new(
        probe: impl Into<Arc<str>>,
        client: SharedClient,
        latency_bucket: impl Into<String>,
        durability_bucket: impl Into<String>,
        seeding: Seeding,
    ) -> Self {
        Self {
            probe: probe.into(),
            client,
            latency_bucket: latency_bucket.into(),
            durability_bucket: durability_bucket.into(),
            seeding,
        }
    }

    /// Creates the latency bucket with an expiration policy unless it already exists.
    #[tracing::instrument(level = "debug", skip_all, fields(probe = %self.probe, bucket = %self.latency_bucket))]
    pub async fn ensure_latency_bucket(&self) -> Result<BucketStatus> {
        let bucket = self.latency_bucket.as_str();
        if self.client.bucket_exists(bucket).await? {
            return Ok(BucketStatus::Existing);
        }

        tracing::info!("Preparing latency bucket");
        self.client.make_bucket(bucket).await?;

        let policy = LifecyclePolicy::expire_after_days(LATENCY_EXPIRATION_DAYS);
        let lifecycle_applied = match self.client.set_bucket_lifecycle(bucket, &policy).await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(
                    error = &error as &dyn std::error::Error,
                    "Failed to set lifecycle policy, objects in the latency bucket will not expire"
                );
                false
            }
        };

        Ok(BucketStatus::Created { lifecycle_applied })
    }

    /// Creates and seeds the durability bucket unless it already exists.
    ///
    /// Every object write is retried according to the seeding retry policy. When the policy gives
    /// up, seeding is aborted with [`Error::SeedingExhausted`]. The bucket then exists but is only
    /// partially populated, and will not be seeded again.
    #[tracing::instrument(level = "debug", skip_all, fields(probe = %self.probe, bucket = %self.durability_bucket))]
    pub async fn ensure_durability_bucket(&self) -> Result<BucketStatus> {
        let bucket = self.durability_bucket.as_str();
        if self.client.bucket_exists(bucket).await? {
            return Ok(BucketStatus::Existing);
        }

        self.client.make_bucket(bucket).await?;
        tracing::info!(
            population = self.seeding.population,
            object_size = self.seeding.object_size,
            "Preparing durability bucket"
        );

        let total = self.seeding.population;
        for index in 0..total {
            let key = durability_object_name(index);
            let data = random_payload(self.seeding.object_size);

            self.seeding
                .retry
                .retry(
                    || self.client.put_object(bucket, &key, data.clone()),
                    |attempt, error, delay| {
                        tracing::warn!(
                            error = error as &dyn std::error::Error,
                            key = %key,
                            attempt,
                            "Failed to write durability object, retrying in {delay:?}"
                        );
                    },
                )
                .await
                .map_err(|exhausted| Error::SeedingExhausted {
                    key: key.clone(),
                    attempts: exhausted.attempts,
                    source: exhausted.error,
                })?;

            let written = index + 1;
            if written % PROGRESS_INTERVAL == 0 || written == total {
                tracing::info!("> {written} objects written ({}%)", written * 100 / total);
            }
        }

        Ok(BucketStatus::Seeded { objects: total })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::backend::in_memory::{Call, Fault};
    use crate::backend::InMemoryBackend;

    use super::*;

    fn preparer(backend: &InMemoryBackend, seeding: Seeding) -> BucketPreparer {
        BucketPreparer::new(
            "minio-a",
            Arc::new(backend.clone()),
            "latency",
            "durability",
            seeding,
        )
    }

    fn small_seeding(population: u64) -> Seeding {
        Seeding {
            population,
            object_size: 1024,
            retry: RetryPolicy::default(),
        }
    }

    #[test]
    fn default_seeding() {
        let seeding = Seeding::default();
        assert_eq!(seeding.population, 10_000);
        assert_eq!(seeding.object_size, 1024 * 1024);
    }

    #[tokio::test]
    async fn creates_latency_bucket_with_lifecycle() {
        let backend = InMemoryBackend::new();
        let preparer = preparer(&backend, small_seeding(1));

        let status = preparer.ensure_latency_bucket().await.unwrap();

        assert_eq!(
            status,
            BucketStatus::Created {
                lifecycle_applied: true
            }
        );
        let policy = backend.lifecycle("latency").unwrap();
        assert_eq!(policy.rule_id, "expire-bucket");
        assert!(policy.enabled);
        assert_eq!(policy.expiration_days, 1);
    }

    #[tokio::test]
    async fn latency_bucket_is_idempotent() {
        let backend = InMemoryBackend::new();
        let preparer = preparer(&backend, small_seeding(1));

        preparer.ensure_latency_bucket().await.unwrap();
        let status = preparer.ensure_latency_bucket().await.unwrap();

        assert_eq!(status, BucketStatus::Existing);
        assert_eq!(backend.calls(Call::MakeBucket), 1);
        assert_eq!(backend.calls(Call::SetBucketLifecycle), 1);
    }

    #[tokio::test]
    async fn existing_latency_bucket_keeps_its_lifecycle() {
        let backend = InMemoryBackend::new();
        backend.create_bucket("latency");
        let preparer = preparer(&backend, small_seeding(1));

        let status = preparer.ensure_latency_bucket().await.unwrap();

        assert_eq!(status, BucketStatus::Existing);
        assert_eq!(backend.lifecycle("latency"), None);
        assert_eq!(backend.calls(Call::SetBucketLifecycle), 0);
    }

    #[tokio::test]
    async fn lifecycle_failure_is_not_fatal() {
        let backend = InMemoryBackend::new();
        backend.inject(Call::SetBucketLifecycle, Fault::FailAlways);
        let preparer = preparer(&backend, small_seeding(1));

        let status = preparer.ensure_latency_bucket().await.unwrap();

        assert_eq!(
            status,
            BucketStatus::Created {
                lifecycle_applied: false
            }
        );
        assert!(backend.has_bucket("latency"));
    }

    #[tokio::test]
    async fn existence_check_failure_is_fatal() {
        let backend = InMemoryBackend::new();
        backend.inject(Call::BucketExists, Fault::FailAlways);
        let preparer = preparer(&backend, small_seeding(1));

        assert!(matches!(
            preparer.ensure_latency_bucket().await,
            Err(Error::Backend(_))
        ));
        assert!(matches!(
            preparer.ensure_durability_bucket().await,
            Err(Error::Backend(_))
        ));
        assert_eq!(backend.calls(Call::MakeBucket), 0);
    }

    #[tokio::test]
    async fn seeds_durability_bucket_once() {
        let backend = InMemoryBackend::new();
        let preparer = preparer(&backend, small_seeding(250));

        let status = preparer.ensure_durability_bucket().await.unwrap();
        assert_eq!(status, BucketStatus::Seeded { objects: 250 });

        let mut expected: Vec<_> = (0..250).map(durability_object_name).collect();
        expected.sort();
        assert_eq!(backend.keys("durability"), expected);
        for key in &expected {
            assert_eq!(backend.object("durability", key).unwrap().len(), 1024);
        }

        let status = preparer.ensure_durability_bucket().await.unwrap();
        assert_eq!(status, BucketStatus::Existing);
        assert_eq!(backend.calls(Call::PutObject), 250);
        assert_eq!(backend.calls(Call::MakeBucket), 1);
    }

    #[tokio::test]
    async fn seeded_objects_have_distinct_payloads() {
        let backend = InMemoryBackend::new();
        let preparer = preparer(&backend, small_seeding(2));

        preparer.ensure_durability_bucket().await.unwrap();

        assert_ne!(
            backend.object("durability", "fake-item-0"),
            backend.object("durability", "fake-item-1")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn seeding_retries_transient_failures() {
        let backend = InMemoryBackend::new();
        backend.inject(Call::PutObject, Fault::FailNext(3));
        let preparer = preparer(&backend, small_seeding(20));

        let status = preparer.ensure_durability_bucket().await.unwrap();

        assert_eq!(status, BucketStatus::Seeded { objects: 20 });
        assert_eq!(backend.keys("durability").len(), 20);
        assert_eq!(backend.calls(Call::PutObject), 23);
    }

    #[tokio::test(start_paused = true)]
    async fn seeding_gives_up_after_policy_is_exhausted() {
        let backend = InMemoryBackend::new();
        backend.inject(Call::PutObject, Fault::FailAlways);
        let seeding = Seeding {
            retry: RetryPolicy {
                initial_delay: Duration::from_secs(1),
                max_attempts: Some(3),
                ..Default::default()
            },
            ..small_seeding(5)
        };
        let preparer = preparer(&backend, seeding);

        let error = preparer.ensure_durability_bucket().await.unwrap_err();

        match error {
            Error::SeedingExhausted { key, attempts, .. } => {
                assert_eq!(key, "fake-item-0");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.calls(Call::PutObject), 3);
    }
}
