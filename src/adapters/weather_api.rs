use crate::adapters::{join_segments, parse_base_url};
use crate::domain::model::WeatherSample;
use crate::domain::ports::WeatherResolver;
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::validate_secret;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.weatherapi.com/v1";

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
    temp_f: f64,
}

/// WeatherAPI 失敗時的 body: `{"error": {"code": 1006, "message": "..."}}`
#[derive(Debug, Deserialize)]
struct WeatherApiFailure {
    error: WeatherApiFailureDetail,
}

#[derive(Debug, Deserialize)]
struct WeatherApiFailureDetail {
    message: String,
}

#[derive(Clone)]
pub struct WeatherApiResolver {
    client: Client,
    endpoint: Url,
    api_key: String,
}

// 不能把 api_key 印到 log
impl std::fmt::Debug for WeatherApiResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiResolver")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl WeatherApiResolver {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Result<Self> {
        validate_secret("aggregator.weather_api_key", api_key)?;
        let base_url = parse_base_url("aggregator.weather_base_url", base_url)?;

        Ok(Self {
            client,
            endpoint: join_segments(&base_url, &["current.json"]),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl WeatherResolver for WeatherApiResolver {
    #[tracing::instrument(name = "weather.resolve", skip(self))]
    async fn resolve(&self, location: &str) -> std::result::Result<WeatherSample, LookupError> {
        tracing::debug!("Making weather request to: {}", self.endpoint);

        // query() 會做 form 編碼，城市名稱裡的空白與重音字元都會被跳脫
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str()), ("q", location)])
            .send()
            .await
            .map_err(|e| {
                LookupError::transport(format!(
                    "failed to fetch data from weather service: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        tracing::debug!("Weather response status: {}", status);

        let body = response.bytes().await.map_err(|e| {
            LookupError::transport(format!(
                "failed to read weather response: {}",
                e.without_url()
            ))
        })?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<WeatherApiFailure>(&body)
                .map(|failure| format!(": {}", failure.error.message))
                .unwrap_or_default();
            return Err(LookupError::transport(format!(
                "weather service returned {}{}",
                status, detail
            )));
        }

        let payload: WeatherPayload = serde_json::from_slice(&body).map_err(|e| {
            LookupError::transport(format!("failed to decode weather response: {}", e))
        })?;

        Ok(WeatherSample {
            celsius: payload.current.temp_c,
            fahrenheit: payload.current.temp_f,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PipelineError;
    use httpmock::prelude::*;

    fn resolver(server: &MockServer) -> WeatherApiResolver {
        WeatherApiResolver::new(Client::new(), &server.url("/v1"), "test-key").unwrap()
    }

    #[tokio::test]
    async fn test_resolve_parses_current_temperatures() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/current.json")
                .query_param("key", "test-key")
                .query_param("q", "Maceió");
            then.status(200).json_body(serde_json::json!({
                "location": { "name": "Maceio" },
                "current": { "temp_c": 25.3, "temp_f": 77.5, "humidity": 70 }
            }));
        });

        let sample = resolver(&server).resolve("Maceió").await.unwrap();

        mock.assert();
        assert_eq!(
            sample,
            WeatherSample {
                celsius: 25.3,
                fahrenheit: 77.5
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_reports_api_error_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/current.json");
            then.status(400).json_body(serde_json::json!({
                "error": { "code": 1006, "message": "No matching location found." }
            }));
        });

        let err = resolver(&server).resolve("Atlantis").await.unwrap_err();

        assert_eq!(
            err,
            LookupError::transport("weather service returned 400 Bad Request: No matching location found.")
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_current_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/current.json");
            then.status(200).json_body(serde_json::json!({ "location": {} }));
        });

        let err = resolver(&server).resolve("Recife").await.unwrap_err();
        assert!(err.to_string().starts_with("failed to decode weather response"));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_api_key() {
        let resolver =
            WeatherApiResolver::new(Client::new(), "http://127.0.0.1:9/v1", "super-secret")
                .unwrap();

        let err = resolver.resolve("Recife").await.unwrap_err();

        assert!(err.to_string().starts_with("failed to fetch data from weather service"));
        assert!(!err.to_string().contains("super-secret"));
        assert!(!format!("{:?}", resolver).contains("super-secret"));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = WeatherApiResolver::new(Client::new(), DEFAULT_WEATHER_BASE_URL, "").unwrap_err();
        assert!(matches!(err, PipelineError::MissingConfigError { .. }));
    }
}
