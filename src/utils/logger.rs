use crate::utils::telemetry::otel_layer;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cep_weather=debug,tower_http=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cep_weather=info"))
    }
}

pub fn init_logger(verbose: bool, provider: &SdkTracerProvider) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(otel_layer(provider))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// 容器部署時使用 JSON，方便收集器解析
pub fn init_json_logger(verbose: bool, provider: &SdkTracerProvider) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(otel_layer(provider))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
