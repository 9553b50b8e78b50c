//! OpenTelemetry 整合：span 匯出 (OTLP) 與 W3C trace context 傳遞
//!
//! tracer provider 一律會建立，讓 Gateway -> Aggregation 的 trace context
//! 在沒有收集器時也能串起來；`tracing.enabled` 只決定是否匯出。

use crate::config::TracingConfig;
use crate::utils::error::{PipelineError, Result};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

pub const EXPORTER_OTLP_HTTP: &str = "otlp_http";
pub const EXPORTER_OTLP_GRPC: &str = "otlp_grpc";
pub const DEFAULT_OTLP_HTTP_ENDPOINT: &str = "http://localhost:4318/v1/traces";

/// 程式結束時關閉 provider，把還在 batch 裡的 span 送出
pub struct TelemetryGuard {
    provider: SdkTracerProvider,
}

impl TelemetryGuard {
    pub fn provider(&self) -> &SdkTracerProvider {
        &self.provider
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("Error shutting down tracer provider: {:?}", e);
        }
    }
}

pub fn init_telemetry(config: &TracingConfig, service: &str) -> Result<TelemetryGuard> {
    Ok(TelemetryGuard {
        provider: build_tracer_provider(config, service)?,
    })
}

pub fn build_tracer_provider(config: &TracingConfig, service: &str) -> Result<SdkTracerProvider> {
    let service_name = config
        .service_name
        .clone()
        .unwrap_or_else(|| format!("cep-weather-{}", service));

    let resource = Resource::builder_empty()
        .with_attributes([
            KeyValue::new("service.name", service_name),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build();

    let builder = SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
        .with_resource(resource);

    if !config.enabled {
        return Ok(builder.build());
    }

    let exporter = build_exporter(config)?;
    Ok(builder.with_batch_exporter(exporter).build())
}

fn build_exporter(config: &TracingConfig) -> Result<opentelemetry_otlp::SpanExporter> {
    let built = match config.exporter.as_str() {
        EXPORTER_OTLP_HTTP => opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(config.endpoint.clone())
            .build(),
        EXPORTER_OTLP_GRPC => opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(config.endpoint.clone())
            .build(),
        other => {
            return Err(PipelineError::InvalidConfigValueError {
                field: "tracing.exporter".to_string(),
                value: other.to_string(),
                reason: "Unsupported span exporter".to_string(),
            })
        }
    };

    built.map_err(|e| PipelineError::ConfigError {
        message: format!("Failed to build OTLP exporter: {}", e),
    })
}

/// 掛到 `tracing_subscriber` 的 OpenTelemetry layer
pub fn otel_layer<S>(provider: &SdkTracerProvider) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_opentelemetry::layer().with_tracer(provider.tracer("cep-weather"))
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = HeaderName::from_bytes(key.as_bytes()) {
            if let Ok(value) = HeaderValue::from_str(&value) {
                self.0.insert(name, value);
            }
        }
    }
}

/// 以請求標頭中的 `traceparent` 作為 span 的 parent；沒有時 span 成為新的 root
pub fn set_parent_from_headers(span: &Span, headers: &HeaderMap) {
    let parent = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
    let _ = span.set_parent(parent);
}

/// 把目前 span 的 context 寫進對外請求的標頭
pub fn inject_current_span(headers: &mut HeaderMap) {
    let cx = Span::current().context();
    TraceContextPropagator::new().inject_context(&cx, &mut HeaderInjector(headers));
}
