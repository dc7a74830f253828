use std::fmt::Debug;

use bytes::Bytes;
use thiserror::Error;

/// A shareable, type-erased [`StorageClient`] instance.
pub type SharedClient = std::sync::Arc<dyn StorageClient>;

/// Lifecycle configuration installed on a bucket.
///
/// Models a single rule without a prefix filter, so it applies to every object in the bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Identifier of the rule.
    pub rule_id: String,
    /// Whether the rule is enabled.
    pub enabled: bool,
    /// Number of days after which objects expire.
    pub expiration_days: i32,
}

impl LifecyclePolicy {
    /// An enabled policy that expires all objects after the given number of days.
    pub fn expire_after_days(days: i32) -> Self {
        Self {
            rule_id: "expire-bucket".to_owned(),
            enabled: true,
            expiration_days: days,
        }
    }
}

/// The storage operations consumed by a probe.
///
/// All operations are independently failable. Implementations must be safe to call concurrently
/// from multiple check runs.
#[async_trait::async_trait]
pub trait StorageClient: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Lists the names of all buckets visible to the configured credentials.
    async fn list_buckets(&self) -> BackendResult<Vec<String>>;

    /// Returns `true` if the bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> BackendResult<bool>;

    /// Creates a new bucket.
    async fn make_bucket(&self, bucket: &str) -> BackendResult<()>;

    /// Replaces the lifecycle configuration of a bucket.
    async fn set_bucket_lifecycle(&self, bucket: &str, policy: &LifecyclePolicy)
    -> BackendResult<()>;

    /// Stores or overwrites an object.
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> BackendResult<()>;

    /// Retrieves the full contents of an object, or `None` if the key does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<Option<Bytes>>;

    /// Deletes an object.
    async fn remove_object(&self, bucket: &str, key: &str) -> BackendResult<()>;
}

/// Errors returned by [`StorageClient`] implementations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Errors from the S3 SDK, including network errors and error responses of the API itself.
    #[error("s3 error: {context}")]
    Sdk {
        context: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A failure injected by the in-memory backend.
    #[error("injected failure: {0}")]
    Injected(String),

    /// Any other error, which might be specific to a backend or to a certain operation.
    #[error("storage backend error: {context}")]
    Generic {
        context: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BackendError {
    /// Wraps an SDK error with a description of the failed operation.
    pub fn sdk<E>(context: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Sdk {
            context: context.into(),
            cause: Box::new(cause),
        }
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
