//! Contains all HTTP endpoint handlers.
//!
//! Use [`routes`] to create a router with all endpoints.

use axum::Router;

use crate::state::ServiceState;

pub mod health;
mod metrics;

pub fn routes() -> Router<ServiceState> {
    Router::new()
        .merge(health::router())
        .merge(metrics::router())
}
