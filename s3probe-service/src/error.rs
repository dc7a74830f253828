use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur while probing a storage endpoint.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the storage client.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The probe was constructed with an unusable configuration.
    #[error("invalid probe configuration: {0}")]
    InvalidConfig(String),

    /// Writing a durability object kept failing until the retry policy gave up.
    #[error("giving up on seeding `{key}` after {attempts} attempts")]
    SeedingExhausted {
        key: String,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    /// An object that was just written could not be read back.
    #[error("object `{bucket}/{key}` does not exist")]
    ObjectMissing { bucket: String, key: String },

    /// A bucket that is expected to exist is gone.
    #[error("bucket `{bucket}` does not exist")]
    BucketMissing { bucket: String },
}

/// Result type for probe operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
