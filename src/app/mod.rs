pub mod aggregator;
pub mod gateway;
pub mod health;
pub mod metrics;
pub mod server;
pub mod trace;

use crate::adapters::{AggregatorClient, DirectoryResolver, WeatherApiResolver};
use crate::core::aggregation::AggregationService;
use crate::core::gateway::GatewayService;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Client;

/// 組裝 Gateway：Aggregation 的 HTTP client 注入到服務中
pub fn build_gateway<C: ConfigProvider>(
    config: &C,
    client: Client,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<Router> {
    let upstream = AggregatorClient::new(client, config.aggregator_url())?;
    Ok(gateway::router(GatewayService::new(upstream), metrics_handle))
}

/// 組裝 Aggregation：兩個 resolver 共用同一個 client
pub fn build_aggregator<C: ConfigProvider>(
    config: &C,
    client: Client,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<Router> {
    let locations = DirectoryResolver::new(client.clone(), config.directory_base_url())?;
    let weather = WeatherApiResolver::new(
        client,
        config.weather_base_url(),
        config.weather_api_key(),
    )?;
    Ok(aggregator::router(
        AggregationService::new(locations, weather),
        metrics_handle,
    ))
}
