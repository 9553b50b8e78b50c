use crate::domain::model::{PostalCodeQuery, WeatherResult};
use crate::domain::ports::WeatherLookup;
use crate::utils::error::{PipelineError, Result};
use crate::utils::validation::validate_postal_code;

/// 入口服務：解析 body、檢查 CEP，再轉給 Aggregation
pub struct GatewayService<A: WeatherLookup> {
    upstream: A,
}

impl<A: WeatherLookup> GatewayService<A> {
    pub fn new(upstream: A) -> Self {
        Self { upstream }
    }

    /// 解析原始 body 的第一個 JSON 值，後面多餘的內容不理會；格式錯誤回 400
    pub fn parse_query(raw_body: &[u8]) -> Result<PostalCodeQuery> {
        let first = serde_json::Deserializer::from_slice(raw_body)
            .into_iter::<Option<PostalCodeQuery>>()
            .next();

        let query = match first {
            Some(Ok(query)) => query.unwrap_or_default(),
            Some(Err(e)) => {
                tracing::debug!("Rejecting request body: {}", e);
                return Err(PipelineError::malformed_input("Failed to decode request body"));
            }
            None => {
                tracing::debug!("Rejecting empty request body");
                return Err(PipelineError::malformed_input("Failed to decode request body"));
            }
        };

        if query.code.is_empty() {
            return Err(PipelineError::malformed_input("CEP parameter is required"));
        }

        Ok(query)
    }

    #[tracing::instrument(name = "gateway.handle", skip_all)]
    pub async fn handle(&self, raw_body: &[u8]) -> Result<WeatherResult> {
        let query = Self::parse_query(raw_body)?;
        validate_postal_code(&query.code)?;

        tracing::debug!("Forwarding postal code {}", query.code);
        self.upstream.lookup(&query.code).await
    }
}
