//! The s3probe server component.
//!
//! This builds on top of the [`s3probe_service`] engine. It loads the configuration, starts one
//! probe per configured target and exposes their measurements on an `HTTP` endpoint for
//! Prometheus to scrape.

pub mod cli;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod observability;
pub mod run;
pub mod state;
pub mod web;
