//! In-memory backend for tests.
//!
//! This provides a [`StorageClient`](super::common::StorageClient) backed by a `BTreeMap`,
//! removing the need for a running storage endpoint in tests. The backend is [`Clone`] so tests
//! can hold a handle for direct inspection and fault injection while the probe owns a shared copy.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use super::common::{BackendError, BackendResult, LifecyclePolicy, StorageClient};

/// The individual calls of the [`StorageClient`] trait, used to target faults and count calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Call {
    ListBuckets,
    BucketExists,
    MakeBucket,
    SetBucketLifecycle,
    PutObject,
    GetObject,
    RemoveObject,
}

/// A fault injected into a [`Call`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Fail the next `n` invocations, then succeed again.
    FailNext(usize),
    /// Fail every invocation.
    FailAlways,
    /// Never complete.
    Stall,
}

#[derive(Debug, Default)]
struct Bucket {
    lifecycle: Option<LifecyclePolicy>,
    objects: BTreeMap<String, Bytes>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, Bucket>,
    faults: HashMap<Call, Fault>,
    calls: HashMap<Call, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the state from the remaining assertions.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Injects a fault for the given call, replacing any previous fault.
    pub fn inject(&self, call: Call, fault: Fault) {
        self.lock().faults.insert(call, fault);
    }

    /// Removes the fault for the given call.
    pub fn clear_fault(&self, call: Call) {
        self.lock().faults.remove(&call);
    }

    /// Returns how often the given call has been invoked, including failed invocations.
    pub fn calls(&self, call: Call) -> usize {
        self.lock().calls.get(&call).copied().unwrap_or_default()
    }

    /// Creates a bucket directly, bypassing the `StorageClient` trait.
    pub fn create_bucket(&self, bucket: &str) {
        self.lock().buckets.entry(bucket.to_owned()).or_default();
    }

    /// Deletes a bucket and all of its objects directly.
    pub fn delete_bucket(&self, bucket: &str) {
        self.lock().buckets.remove(bucket);
    }

    /// Returns `true` if the bucket exists.
    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.lock().buckets.contains_key(bucket)
    }

    /// Returns the lifecycle policy installed on the bucket, if any.
    pub fn lifecycle(&self, bucket: &str) -> Option<LifecyclePolicy> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|b| b.lifecycle.clone())
    }

    /// Returns a clone of the stored object, if present.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    /// Returns the sorted keys of all objects in the bucket.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Stores an object directly, bypassing the `StorageClient` trait.
    ///
    /// Creates the bucket if needed.
    pub fn insert_object(&self, bucket: &str, key: &str, data: Bytes) {
        self.lock()
            .buckets
            .entry(bucket.to_owned())
            .or_default()
            .objects
            .insert(key.to_owned(), data);
    }

    /// Removes an object directly, bypassing the `StorageClient` trait.
    ///
    /// Useful for simulating data loss.
    pub fn delete_object(&self, bucket: &str, key: &str) {
        if let Some(b) = self.lock().buckets.get_mut(bucket) {
            b.objects.remove(key);
        }
    }

    /// Counts the call and applies any injected fault.
    async fn enter(&self, call: Call) -> BackendResult<()> {
        let fault = {
            let mut state = self.lock();
            *state.calls.entry(call).or_default() += 1;

            match state.faults.get(&call).copied() {
                Some(Fault::FailNext(n)) => {
                    if n <= 1 {
                        state.faults.remove(&call);
                    } else {
                        state.faults.insert(call, Fault::FailNext(n - 1));
                    }
                    Some(Fault::FailNext(n))
                }
                fault => fault,
            }
        };

        match fault {
            None => Ok(()),
            Some(Fault::FailNext(_)) | Some(Fault::FailAlways) => {
                Err(BackendError::Injected(format!("{call:?}")))
            }
            Some(Fault::Stall) => std::future::pending().await,
        }
    }
}

fn no_such_bucket(bucket: &str) -> BackendError {
    BackendError::Generic {
        context: format!("bucket `{bucket}` does not exist"),
        cause: None,
    }
}

#[async_trait::async_trait]
impl StorageClient for InMemoryBackend {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn list_buckets(&self) -> BackendResult<Vec<String>> {
        self.enter(Call::ListBuckets).await?;
        Ok(self.lock().buckets.keys().cloned().collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> BackendResult<bool> {
        self.enter(Call::BucketExists).await?;
        Ok(self.has_bucket(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> BackendResult<()> {
        self.enter(Call::MakeBucket).await?;
        let mut state = self.lock();
        if state.buckets.contains_key(bucket) {
            return Err(BackendError::Generic {
                context: format!("bucket `{bucket}` already exists"),
                cause: None,
            });
        }
        state.buckets.insert(bucket.to_owned(), Bucket::default());
        Ok(())
    }

    async fn set_bucket_lifecycle(
        &self,
        bucket: &str,
        policy: &LifecyclePolicy,
    ) -> BackendResult<()> {
        self.enter(Call::SetBucketLifecycle).await?;
        let mut state = self.lock();
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.lifecycle = Some(policy.clone());
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> BackendResult<()> {
        self.enter(Call::PutObject).await?;
        let mut state = self.lock();
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.objects.insert(key.to_owned(), data);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<Option<Bytes>> {
        self.enter(Call::GetObject).await?;
        let state = self.lock();
        let entry = state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        Ok(entry.objects.get(key).cloned())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        self.enter(Call::RemoveObject).await?;
        let mut state = self.lock();
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.objects.remove(key);
        Ok(())
    }
}
