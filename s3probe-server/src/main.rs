//! The s3probe binary.
//!
//! Probes S3-compatible storage endpoints for latency and durability and exposes the results as
//! Prometheus metrics. See [`s3probe_server::config`] for configuration options.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    s3probe_server::cli::execute()
}
