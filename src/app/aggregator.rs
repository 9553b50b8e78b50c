use crate::app::{health::health_check, metrics, trace};
use crate::core::aggregation::AggregationService;
use crate::core::{ErrorEnvelope, LocationResolver, WeatherResolver};
use crate::utils::error::PipelineError;
use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub struct AggregatorState<L: LocationResolver, W: WeatherResolver> {
    service: Arc<AggregationService<L, W>>,
}

impl<L: LocationResolver, W: WeatherResolver> Clone for AggregatorState<L, W> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

pub fn router<L, W>(
    service: AggregationService<L, W>,
    metrics_handle: Option<PrometheusHandle>,
) -> Router
where
    L: LocationResolver + 'static,
    W: WeatherResolver + 'static,
{
    let state = AggregatorState {
        service: Arc::new(service),
    };

    Router::new()
        .route("/weather", get(handle_weather::<L, W>))
        .route("/clima", get(handle_weather::<L, W>))
        .with_state(state)
        .route("/health", get(|| health_check("aggregator")))
        .merge(metrics::router(metrics_handle))
        .layer(TraceLayer::new_for_http().make_span_with(trace::request_span))
}

/// `GET /weather?cep=01001000`
async fn handle_weather<L, W>(
    State(state): State<AggregatorState<L, W>>,
    RawQuery(query): RawQuery,
) -> Response
where
    L: LocationResolver + 'static,
    W: WeatherResolver + 'static,
{
    let started = Instant::now();
    let code = postal_code_param(query.as_deref().unwrap_or_default());

    let response = match state.service.resolve(&code).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(e),
    };

    metrics::record_request("aggregator", response.status(), started);
    response
}

/// 取第一個 `cep`，重複或缺少都不會在這裡被拒絕
fn postal_code_param(query: &str) -> String {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "cep")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

/// 404 是 JSON envelope，其他錯誤是純文字
fn error_response(error: PipelineError) -> Response {
    if matches!(error, PipelineError::LocationNotFound) {
        let envelope = ErrorEnvelope::new(error.to_string(), StatusCode::NOT_FOUND.as_u16());
        return (StatusCode::NOT_FOUND, Json(envelope)).into_response();
    }

    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!("Aggregation request failed ({}): {}", status, error);
    } else {
        tracing::info!("Aggregation request rejected ({}): {}", status, error);
    }
    (status, error.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LocationRecord, WeatherSample};
    use crate::utils::error::LookupError;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct FixedLocations;

    #[async_trait]
    impl LocationResolver for FixedLocations {
        async fn resolve(&self, code: &str) -> Result<LocationRecord, LookupError> {
            match code {
                "01001000" => Ok(LocationRecord {
                    name: "São Paulo".to_string(),
                }),
                "80010000" => Ok(LocationRecord {
                    name: "Curitiba".to_string(),
                }),
                _ => Err(LookupError::NotFound),
            }
        }
    }

    struct FixedWeather;

    #[async_trait]
    impl WeatherResolver for FixedWeather {
        async fn resolve(&self, location: &str) -> Result<WeatherSample, LookupError> {
            match location {
                "São Paulo" => Ok(WeatherSample {
                    celsius: 25.3,
                    fahrenheit: 77.5,
                }),
                _ => Err(LookupError::transport("weather service returned 503 Service Unavailable")),
            }
        }
    }

    fn app() -> Router {
        router(AggregationService::new(FixedLocations, FixedWeather), None)
    }

    async fn call(uri: &str) -> (StatusCode, String, Option<String>) {
        let response = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), content_type)
    }

    #[tokio::test]
    async fn test_weather_success() {
        let (status, body, content_type) = call("/weather?cep=01001000").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"{"city":"São Paulo","temp_C":25.3,"temp_F":77.5,"temp_K":298.5}"#
        );
        assert_eq!(content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_weather_not_found_envelope() {
        let (status, body, _) = call("/clima?cep=00000000").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"error":"zip code not found","statuscode":404}"#);
    }

    #[tokio::test]
    async fn test_weather_invalid_code_is_plain_text_422() {
        for uri in ["/weather?cep=123", "/weather", "/weather?cep=010010001"] {
            let (status, body, content_type) = call(uri).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "uri {}", uri);
            assert_eq!(body, "invalid zipcode");
            assert!(content_type.unwrap().starts_with("text/plain"));
        }
    }

    #[tokio::test]
    async fn test_repeated_parameter_uses_first_value() {
        let (status, body, _) = call("/weather?cep=01001000&cep=x").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("São Paulo"));

        let (status, body, _) = call("/weather?cep=x&cep=01001000").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "invalid zipcode");
    }

    #[tokio::test]
    async fn test_multibyte_code_is_rejected_by_byte_length() {
        // "0100100é": 8 個字元、9 個位元組
        let (status, body, _) = call("/weather?cep=0100100%C3%A9").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "invalid zipcode");
    }

    #[test]
    fn test_postal_code_param() {
        assert_eq!(postal_code_param("cep=01001000"), "01001000");
        assert_eq!(postal_code_param("other=1&cep=01001000&cep=2"), "01001000");
        assert_eq!(postal_code_param("cep=01001%20000"), "01001 000");
        assert_eq!(postal_code_param(""), "");
        assert_eq!(postal_code_param("cep"), "");
    }

    #[tokio::test]
    async fn test_weather_failure_is_plain_text_500() {
        let (status, body, _) = call("/weather?cep=80010000").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "weather service returned 503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_metrics_route_renders_prometheus_text() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let app = router(
            AggregationService::new(FixedLocations, FixedWeather),
            Some(recorder.handle()),
        );

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
