//! Prometheus metrics
//!
//! 每個請求結束時記錄一次結果；`GET /metrics` 讀取全域 recorder。

use crate::utils::error::{PipelineError, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// 必須在任何 metrics 呼叫之前安裝
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| PipelineError::ConfigError {
            message: format!("Failed to install Prometheus recorder: {}", e),
        })
}

pub fn record_request(service: &'static str, status: StatusCode, started: Instant) {
    let status = status.as_u16().to_string();
    metrics::counter!(
        "cep_weather_requests_total",
        "service" => service,
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "cep_weather_request_duration_seconds",
        "service" => service,
        "status" => status
    )
    .record(started.elapsed().as_secs_f64());
}

/// 沒有 recorder 時不掛 `/metrics`
pub fn router(handle: Option<PrometheusHandle>) -> Router {
    match handle {
        Some(handle) => Router::new()
            .route("/metrics", get(prometheus_metrics))
            .with_state(MetricsState { handle }),
        None => Router::new(),
    }
}

async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    let body = state.handle.render();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
