use anyhow::Context;
use cep_weather::adapters::build_http_client;
use cep_weather::app::{self, metrics, server};
use cep_weather::utils::{logger, telemetry, validation::validate_listen_addr};
use cep_weather::{CliConfig, ServiceCommand};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 設定載入失敗時 logger 還沒初始化，直接輸出到 stderr
    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let service_name = match cli.service {
        ServiceCommand::Gateway(_) => "gateway",
        ServiceCommand::Aggregator(_) => "aggregator",
    };

    // 離開 main 時關閉 provider，送出剩餘的 span
    let telemetry_guard = match telemetry::init_telemetry(&config.tracing, service_name) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Failed to initialize tracing: {}", e);
            std::process::exit(1);
        }
    };

    if config.logging.json {
        logger::init_json_logger(config.logging.verbose, telemetry_guard.provider());
    } else {
        logger::init_logger(config.logging.verbose, telemetry_guard.provider());
    }
    tracing::debug!("Service config: {:?}", config);
    if config.tracing.enabled {
        tracing::info!(
            exporter = %config.tracing.exporter,
            endpoint = %config.tracing.endpoint,
            "🔭 Exporting spans"
        );
    }

    // 缺少 API key 等設定錯誤在啟動時就結束，不等到第一個請求
    let validated = match cli.service {
        ServiceCommand::Gateway(_) => config.validate_gateway(),
        ServiceCommand::Aggregator(_) => config.validate_aggregator(),
    };
    if let Err(e) = validated {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let metrics_handle = metrics::install_recorder().context("installing metrics recorder")?;
    tracing::info!("📊 Prometheus metrics recorder installed");

    let client = build_http_client().context("building HTTP client")?;

    match cli.service {
        ServiceCommand::Gateway(_) => {
            let addr = validate_listen_addr("gateway.listen_addr", &config.gateway.listen_addr)?;
            let router = app::build_gateway(&config, client, Some(metrics_handle))?;
            tracing::info!("Forwarding to aggregation service at {}", config.gateway.aggregator_url);
            server::serve(router, addr, service_name).await?;
        }
        ServiceCommand::Aggregator(_) => {
            let addr =
                validate_listen_addr("aggregator.listen_addr", &config.aggregator.listen_addr)?;
            let router = app::build_aggregator(&config, client, Some(metrics_handle))?;
            server::serve(router, addr, service_name).await?;
        }
    }

    Ok(())
}
