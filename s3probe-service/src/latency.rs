use crate::backend::SharedClient;
use crate::error::{Error, Result};
use crate::metrics::Operation;
use crate::payload::{random_object_name, random_payload};
use crate::recorder::Recorder;

/// Size of the object written by every latency check.
pub const LATENCY_OBJECT_SIZE: usize = 1024;

/// Measures the latency of a list, put, get and remove cycle against the latency bucket.
#[derive(Clone, Debug)]
pub struct LatencyCheck {
    client: SharedClient,
    recorder: Recorder,
    bucket: String,
    object_size: usize,
}

impl LatencyCheck {
    pub fn new(client: SharedClient, recorder: Recorder, bucket: impl Into<String>) -> Self {
        Self {
            client,
            recorder,
            bucket: bucket.into(),
            object_size: LATENCY_OBJECT_SIZE,
        }
    }

    /// Overrides the size of the written object.
    pub fn object_size(mut self, object_size: usize) -> Self {
        self.object_size = object_size;
        self
    }

    /// Runs one check with a fresh random object.
    ///
    /// Steps run strictly in order and the first failing step aborts the check. An object whose
    /// removal never ran is left to the bucket's lifecycle expiration.
    #[tracing::instrument(name = "latency_check", skip_all, fields(probe = %self.recorder.endpoint()))]
    pub async fn run(&self) -> Result<()> {
        let bucket = self.bucket.as_str();
        let key = random_object_name();
        let data = random_payload(self.object_size);

        self.recorder
            .measure(Operation::ListBuckets, self.client.list_buckets())
            .await?;

        self.recorder
            .measure(
                Operation::PutObject,
                self.client.put_object(bucket, &key, data),
            )
            .await?;

        self.recorder
            .measure(Operation::GetObject, async {
                match self.client.get_object(bucket, &key).await? {
                    Some(_) => Ok(()),
                    None => Err(Error::ObjectMissing {
                        bucket: bucket.to_owned(),
                        key: key.clone(),
                    }),
                }
            })
            .await?;

        self.recorder
            .measure(
                Operation::RemoveObject,
                self.client.remove_object(bucket, &key),
            )
            .await?;

        tracing::debug!("Latency check completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::backend::InMemoryBackend;
    use crate::backend::in_memory::{Call, Fault};
    use crate::metrics::MemorySink;

    use super::*;

    fn check(backend: &InMemoryBackend, sink: &Arc<MemorySink>) -> LatencyCheck {
        backend.create_bucket("latency");
        let recorder = Recorder::new("minio-a", sink.clone());
        LatencyCheck::new(Arc::new(backend.clone()), recorder, "latency")
    }

    #[tokio::test]
    async fn runs_all_steps_in_order() {
        let backend = InMemoryBackend::new();
        let sink = Arc::new(MemorySink::new());

        check(&backend, &sink).run().await.unwrap();

        assert_eq!(
            sink.operations(),
            [
                Operation::ListBuckets,
                Operation::PutObject,
                Operation::GetObject,
                Operation::RemoveObject,
            ]
        );
        assert!(sink.recorded().iter().all(|r| r.success));
        assert!(backend.keys("latency").is_empty());
    }

    #[tokio::test]
    async fn writes_one_kibibyte() {
        let backend = InMemoryBackend::new();
        backend.inject(Call::RemoveObject, Fault::FailAlways);
        let sink = Arc::new(MemorySink::new());

        assert!(check(&backend, &sink).run().await.is_err());

        let keys = backend.keys("latency");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].len(), 40);
        assert_eq!(backend.object("latency", &keys[0]).unwrap().len(), 1024);
    }

    #[tokio::test]
    async fn aborts_after_failed_put() {
        let backend = InMemoryBackend::new();
        backend.inject(Call::PutObject, Fault::FailNext(1));
        let sink = Arc::new(MemorySink::new());

        let result = check(&backend, &sink).run().await;

        assert!(matches!(result, Err(Error::Backend(_))));
        assert_eq!(
            sink.operations(),
            [Operation::ListBuckets, Operation::PutObject]
        );
        assert_eq!(sink.successes(Operation::ListBuckets), 1);
        assert_eq!(sink.successes(Operation::PutObject), 0);
        assert_eq!(backend.calls(Call::GetObject), 0);
        assert_eq!(backend.calls(Call::RemoveObject), 0);
    }

    #[tokio::test]
    async fn aborts_after_failed_list() {
        let backend = InMemoryBackend::new();
        backend.inject(Call::ListBuckets, Fault::FailNext(1));
        let sink = Arc::new(MemorySink::new());

        assert!(check(&backend, &sink).run().await.is_err());
        assert_eq!(sink.operations(), [Operation::ListBuckets]);
        assert_eq!(backend.calls(Call::PutObject), 0);
    }

    #[tokio::test]
    async fn uses_fresh_object_names() {
        let backend = InMemoryBackend::new();
        backend.inject(Call::RemoveObject, Fault::FailAlways);
        let sink = Arc::new(MemorySink::new());
        let check = check(&backend, &sink);

        let _ = check.run().await;
        let _ = check.run().await;

        assert_eq!(backend.keys("latency").len(), 2);
    }
}
