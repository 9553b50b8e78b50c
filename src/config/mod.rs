pub mod toml_config;

pub use toml_config::{AggregatorConfig, GatewayConfig, LoggingConfig, ServiceConfig, TracingConfig};

use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "cep-weather")]
#[command(about = "Resolve a Brazilian postal code (CEP) to the current temperature")]
pub struct CliConfig {
    #[arg(long, env = "CEP_WEATHER_CONFIG", help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        help = "Export spans to this OTLP collector endpoint"
    )]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub service: ServiceCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ServiceCommand {
    /// Entry service: POST /query {"cep": "..."}
    Gateway(GatewayArgs),
    /// Lookup service: GET /weather?cep=...
    Aggregator(AggregatorArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct GatewayArgs {
    #[arg(long, env = "GATEWAY_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    #[arg(long, env = "AGGREGATOR_URL")]
    pub aggregator_url: Option<String>,
}

#[derive(Clone, Default, Args)]
pub struct AggregatorArgs {
    #[arg(long, env = "AGGREGATOR_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    #[arg(long, env = "DIRECTORY_BASE_URL")]
    pub directory_base_url: Option<String>,

    #[arg(long, env = "WEATHER_BASE_URL")]
    pub weather_base_url: Option<String>,

    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,
}

impl std::fmt::Debug for AggregatorArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorArgs")
            .field("listen_addr", &self.listen_addr)
            .field("directory_base_url", &self.directory_base_url)
            .field("weather_base_url", &self.weather_base_url)
            .field(
                "weather_api_key",
                &self.weather_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl CliConfig {
    /// 設定檔為基礎，命令列參數與環境變數覆蓋
    pub fn load(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };

        config.logging.verbose |= self.verbose;
        config.logging.json |= self.json_logs;
        if let Some(endpoint) = &self.otlp_endpoint {
            config.tracing.enabled = true;
            config.tracing.endpoint = endpoint.clone();
        }

        match &self.service {
            ServiceCommand::Gateway(args) => args.apply(&mut config),
            ServiceCommand::Aggregator(args) => args.apply(&mut config),
        }

        Ok(config)
    }
}

impl GatewayArgs {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(addr) = &self.listen_addr {
            config.gateway.listen_addr = addr.clone();
        }
        if let Some(url) = &self.aggregator_url {
            config.gateway.aggregator_url = url.clone();
        }
    }
}

impl AggregatorArgs {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(addr) = &self.listen_addr {
            config.aggregator.listen_addr = addr.clone();
        }
        if let Some(url) = &self.directory_base_url {
            config.aggregator.directory_base_url = url.clone();
        }
        if let Some(url) = &self.weather_base_url {
            config.aggregator.weather_base_url = url.clone();
        }
        if let Some(key) = &self.weather_api_key {
            config.aggregator.weather_api_key = Some(key.clone());
        }
    }
}
