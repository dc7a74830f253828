use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Router, routing};

use crate::error::{ApiError, ApiResult};
use crate::state::ServiceState;

/// Content type of the Prometheus text exposition format.
const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn router() -> Router<ServiceState> {
    Router::new().route("/metrics", routing::get(metrics))
}

async fn metrics(State(state): State<ServiceState>) -> ApiResult<impl IntoResponse> {
    let body = state.prometheus.encode().map_err(ApiError::server)?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}
