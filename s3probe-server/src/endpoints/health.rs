use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Router, routing};

use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/health", routing::get(health))
        .route("/ready", routing::get(ready))
}

async fn health() -> impl IntoResponse {
    "OK"
}

async fn ready(State(state): State<ServiceState>) -> impl IntoResponse {
    if state.shutdown.is_cancelled() {
        tracing::debug!("Shutdown requested, failing readiness");
        return (StatusCode::SERVICE_UNAVAILABLE, "Shutting down");
    }

    if !state.is_ready() {
        tracing::debug!(
            running = state.running_probes(),
            configured = state.config.targets.len(),
            "Not all probes are running, failing readiness"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Probes stopped");
    }

    (StatusCode::OK, "OK")
}
