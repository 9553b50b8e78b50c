use crate::adapters::{join_segments, parse_base_url};
use crate::domain::model::{ErrorEnvelope, WeatherResult};
use crate::domain::ports::WeatherLookup;
use crate::utils::error::{PipelineError, Result};
use crate::utils::telemetry::inject_current_span;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use url::Url;

pub const DEFAULT_AGGREGATOR_URL: &str = "http://localhost:8081";

/// Gateway -> Aggregation 的 HTTP 呼叫
#[derive(Debug, Clone)]
pub struct AggregatorClient {
    client: Client,
    endpoint: Url,
}

impl AggregatorClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let base_url = parse_base_url("gateway.aggregator_url", base_url)?;
        Ok(Self {
            client,
            endpoint: join_segments(&base_url, &["weather"]),
        })
    }
}

#[async_trait]
impl WeatherLookup for AggregatorClient {
    #[tracing::instrument(name = "aggregator.lookup", skip(self))]
    async fn lookup(&self, code: &str) -> Result<WeatherResult> {
        let mut headers = HeaderMap::new();
        inject_current_span(&mut headers);

        let request = self
            .client
            .get(self.endpoint.clone())
            .query(&[("cep", code)])
            .headers(headers);

        let response = request.send().await.map_err(|e| {
            tracing::error!("Aggregation service unreachable: {}", e);
            PipelineError::upstream("Failed to communicate with aggregation service")
        })?;

        let status = response.status();
        tracing::debug!("Aggregation response status: {}", status);

        let body = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read aggregation response: {}", e);
            PipelineError::upstream("Failed to read response from aggregation service")
        })?;

        if !status.is_success() {
            // 只有 JSON 錯誤才能原樣轉送狀態碼
            return match serde_json::from_slice::<ErrorEnvelope>(&body) {
                Ok(envelope) => Err(PipelineError::UpstreamFailure {
                    status: status.as_u16(),
                    message: envelope.error,
                }),
                Err(_) => Err(PipelineError::upstream(
                    "Aggregation service failed to process the request",
                )),
            };
        }

        serde_json::from_slice::<WeatherResult>(&body).map_err(|e| {
            tracing::error!("Unexpected aggregation response: {}", e);
            PipelineError::UpstreamMalformed {
                message: "Failed to decode response from aggregation service".to_string(),
            }
        })
    }
}
