//! The probing engine for S3-compatible object storage.
//!
//! A [`Probe`] periodically exercises a storage endpoint through a [`StorageClient`]:
//!
//!  - a latency check lists buckets, then writes, reads and removes a small random object in a
//!    dedicated latency bucket whose objects expire after a day,
//!  - a durability check samples objects from a durability bucket that was seeded once with a
//!    large, fixed population and verifies they are still retrievable.
//!
//! Every operation is timed and reported to a [`MetricsSink`]. The crate is designed as a library
//! to be used by the `server`, which wires up configuration, the HTTP metrics endpoint and the
//! process lifecycle.
#![warn(missing_debug_implementations)]

pub mod backend;
pub mod durability;
mod error;
pub mod latency;
pub mod metrics;
pub mod payload;
pub mod prepare;
pub mod probe;
pub mod recorder;
pub mod retry;

pub use backend::{SharedClient, StorageClient};
pub use error::{Error, Result};
pub use metrics::{MetricsSink, SharedSink};
pub use probe::{InFlightPolicy, Probe, ProbeConfig};
