//! Storage clients consumed by the probe.

pub mod common;
pub mod in_memory;
pub mod s3;

pub use common::{BackendError, BackendResult, LifecyclePolicy, SharedClient, StorageClient};
pub use in_memory::InMemoryBackend;
pub use s3::{S3Backend, S3BackendConfig};
