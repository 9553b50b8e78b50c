use crate::domain::model::{LocationRecord, WeatherResult, WeatherSample};
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;

/// CEP -> 城市名稱
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, code: &str) -> std::result::Result<LocationRecord, LookupError>;
}

/// 城市名稱 -> 目前氣溫
#[async_trait]
pub trait WeatherResolver: Send + Sync {
    async fn resolve(&self, location: &str) -> std::result::Result<WeatherSample, LookupError>;
}

/// Gateway 用來呼叫 Aggregation 服務的介面；trace context 隨目前的 span 傳遞
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn lookup(&self, code: &str) -> Result<WeatherResult>;
}

pub trait ConfigProvider: Send + Sync {
    fn directory_base_url(&self) -> &str;
    fn weather_base_url(&self) -> &str;
    fn weather_api_key(&self) -> &str;
    fn aggregator_url(&self) -> &str;
}
