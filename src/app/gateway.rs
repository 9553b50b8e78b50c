use crate::app::{health::health_check, metrics, trace};
use crate::core::gateway::GatewayService;
use crate::core::{ErrorEnvelope, WeatherLookup};
use crate::utils::error::PipelineError;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub struct GatewayState<A: WeatherLookup> {
    service: Arc<GatewayService<A>>,
}

impl<A: WeatherLookup> Clone for GatewayState<A> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

pub fn router<A: WeatherLookup + 'static>(
    service: GatewayService<A>,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let state = GatewayState {
        service: Arc::new(service),
    };

    Router::new()
        .route("/query", post(handle_query::<A>))
        .route("/consulta", post(handle_query::<A>))
        .with_state(state)
        .route("/health", get(|| health_check("gateway")))
        .merge(metrics::router(metrics_handle))
        .layer(TraceLayer::new_for_http().make_span_with(trace::request_span))
}

/// `POST /query`，body 為 `{"cep": "01001000"}`
async fn handle_query<A: WeatherLookup + 'static>(
    State(state): State<GatewayState<A>>,
    body: Bytes,
) -> Response {
    let started = Instant::now();

    let response = match state.service.handle(&body).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(e),
    };

    metrics::record_request("gateway", response.status(), started);
    response
}

/// Gateway 的錯誤一律是 `{"error": "..."}`
fn error_response(error: PipelineError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if error.is_client_error() {
        tracing::info!("Gateway request rejected ({}): {}", status, error);
    } else {
        tracing::error!("Gateway request failed ({}): {}", status, error);
    }

    (status, Json(ErrorEnvelope::message_only(error.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TracingConfig;
    use crate::core::{Result, WeatherResult};
    use crate::utils::telemetry;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderMap, Request};
    use std::sync::Mutex;
    use tower::ServiceExt;
    use tracing_subscriber::layer::SubscriberExt;

    const INCOMING: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    /// 記錄每次呼叫時會送往 Aggregation 的 trace 標頭
    #[derive(Default)]
    struct StubLookup {
        traces: Mutex<Vec<HeaderMap>>,
    }

    #[async_trait]
    impl WeatherLookup for Arc<StubLookup> {
        async fn lookup(&self, code: &str) -> Result<WeatherResult> {
            let mut headers = HeaderMap::new();
            telemetry::inject_current_span(&mut headers);
            self.traces.lock().unwrap().push(headers);
            match code {
                "00000000" => Err(PipelineError::UpstreamFailure {
                    status: 404,
                    message: "zip code not found".to_string(),
                }),
                _ => Ok(WeatherResult {
                    city: "São Paulo".to_string(),
                    temp_c: 25.3,
                    temp_f: 77.5,
                    temp_k: 298.5,
                }),
            }
        }
    }

    fn post_query(path: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .header("traceparent", INCOMING)
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_query_success() {
        let stub = Arc::new(StubLookup::default());
        let app = router(GatewayService::new(Arc::clone(&stub)), None);

        let response = app
            .oneshot(post_query("/query", r#"{"cep":"01001000"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            r#"{"city":"São Paulo","temp_C":25.3,"temp_F":77.5,"temp_K":298.5}"#
        );
    }

    #[tokio::test]
    async fn test_query_continues_caller_trace() {
        let provider =
            telemetry::build_tracer_provider(&TracingConfig::default(), "gateway").unwrap();
        let subscriber = tracing_subscriber::registry().with(telemetry::otel_layer(&provider));
        let _default = tracing::subscriber::set_default(subscriber);

        let stub = Arc::new(StubLookup::default());
        let app = router(GatewayService::new(Arc::clone(&stub)), None);

        let response = app
            .clone()
            .oneshot(post_query("/query", r#"{"cep":"01001000"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // 沒有 traceparent 的請求也會開始新的 trace
        let response = app
            .oneshot(
                Request::post("/query")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"cep":"01001000"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let traces = stub.traces.lock().unwrap();
        let continued = traces[0]["traceparent"].to_str().unwrap();
        assert!(continued.starts_with("00-4bf92f3577b34da6a3ce929d0e0e4736-"));
        assert!(!continued.contains("00f067aa0ba902b7"));

        let fresh = traces[1]["traceparent"].to_str().unwrap();
        assert!(fresh.starts_with("00-"));
        assert!(!fresh.contains("4bf92f3577b34da6a3ce929d0e0e4736"));
    }

    #[tokio::test]
    async fn test_query_errors_are_json() {
        let stub = Arc::new(StubLookup::default());
        let app = router(GatewayService::new(Arc::clone(&stub)), None);

        let cases = [
            ("not json", StatusCode::BAD_REQUEST, r#"{"error":"Failed to decode request body"}"#),
            (r#"{"cep":""}"#, StatusCode::BAD_REQUEST, r#"{"error":"CEP parameter is required"}"#),
            (r#"{"cep":"123"}"#, StatusCode::UNPROCESSABLE_ENTITY, r#"{"error":"invalid zipcode"}"#),
            (r#"{"cep":"00000000"}"#, StatusCode::NOT_FOUND, r#"{"error":"zip code not found"}"#),
        ];

        for (body, status, expected) in cases {
            let response = app
                .clone()
                .oneshot(post_query("/consulta", body))
                .await
                .unwrap();
            assert_eq!(response.status(), status, "body {}", body);
            assert_eq!(body_string(response).await, expected);
        }

        // 只有最後一個案例會呼叫上游
        assert_eq!(stub.traces.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_health_and_missing_metrics_route() {
        let app = router(GatewayService::new(Arc::new(StubLookup::default())), None);

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains(r#""service":"gateway""#));

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
