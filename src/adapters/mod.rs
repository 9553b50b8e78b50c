// Adapters layer: concrete implementations for external systems (directory, weather, aggregation over HTTP).

pub mod aggregator_client;
pub mod directory;
pub mod weather_api;

pub use aggregator_client::AggregatorClient;
pub use directory::DirectoryResolver;
pub use weather_api::WeatherApiResolver;

use crate::utils::error::{PipelineError, Result};
use reqwest::Client;
use url::Url;

/// 整個 process 共用一個 client (連線池)，注入到各個 adapter
pub fn build_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("cep-weather/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PipelineError::ConfigError {
            message: format!("Failed to build HTTP client: {}", e),
        })
}

pub(crate) fn parse_base_url(field_name: &str, base: &str) -> Result<Url> {
    let url = Url::parse(base).map_err(|e| PipelineError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: base.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })?;

    if url.cannot_be_a_base() {
        return Err(PipelineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: base.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }

    Ok(url)
}

/// 在 base 後面接上路徑片段，片段內的 `/`、`?` 等字元會被跳脫
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
