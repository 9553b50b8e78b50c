use crate::adapters::aggregator_client::DEFAULT_AGGREGATOR_URL;
use crate::adapters::directory::DEFAULT_DIRECTORY_BASE_URL;
use crate::adapters::weather_api::DEFAULT_WEATHER_BASE_URL;
use crate::core::ConfigProvider;
use crate::utils::error::{PipelineError, Result};
use crate::utils::telemetry::{DEFAULT_OTLP_HTTP_ENDPOINT, EXPORTER_OTLP_GRPC, EXPORTER_OTLP_HTTP};
use crate::utils::validation::{
    validate_listen_addr, validate_required_field, validate_secret, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub gateway: GatewayConfig,
    pub aggregator: AggregatorConfig,
    pub logging: LoggingConfig,
    pub tracing: TracingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub aggregator_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            aggregator_url: DEFAULT_AGGREGATOR_URL.to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub listen_addr: String,
    pub directory_base_url: String,
    pub weather_base_url: String,
    /// 沒有預設值，必須由設定檔或環境變數提供
    pub weather_api_key: Option<String>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8081".to_string(),
            directory_base_url: DEFAULT_DIRECTORY_BASE_URL.to_string(),
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            weather_api_key: None,
        }
    }
}

impl std::fmt::Debug for AggregatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorConfig")
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

/// span 匯出設定；關閉時仍會建立並傳遞 trace context，只是不送出
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    /// `otlp_http` 或 `otlp_grpc`
    pub exporter: String,
    pub endpoint: String,
    pub service_name: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            exporter: EXPORTER_OTLP_HTTP.to_string(),
            endpoint: DEFAULT_OTLP_HTTP_ENDPOINT.to_string(),
            service_name: None,
        }
    }
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PipelineError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PipelineError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${WEATHER_API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PipelineError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_gateway(&self) -> Result<()> {
        self.gateway.validate()?;
        self.tracing.validate()
    }

    /// API key 缺少時在啟動階段就失敗，而不是每個請求才失敗
    pub fn validate_aggregator(&self) -> Result<()> {
        self.aggregator.validate()?;
        self.tracing.validate()
    }
}

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<()> {
        validate_listen_addr("gateway.listen_addr", &self.listen_addr)?;
        validate_url("gateway.aggregator_url", &self.aggregator_url)?;
        Ok(())
    }
}

impl Validate for AggregatorConfig {
    fn validate(&self) -> Result<()> {
        validate_listen_addr("aggregator.listen_addr", &self.listen_addr)?;
        validate_url("aggregator.directory_base_url", &self.directory_base_url)?;
        validate_url("aggregator.weather_base_url", &self.weather_base_url)?;
        let api_key = validate_required_field("aggregator.weather_api_key", &self.weather_api_key)?;
        validate_secret("aggregator.weather_api_key", api_key)?;
        Ok(())
    }
}

impl Validate for TracingConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        match self.exporter.as_str() {
            EXPORTER_OTLP_HTTP | EXPORTER_OTLP_GRPC => {}
            other => {
                return Err(PipelineError::InvalidConfigValueError {
                    field: "tracing.exporter".to_string(),
                    value: other.to_string(),
                    reason: format!(
                        "Expected \"{}\" or \"{}\"",
                        EXPORTER_OTLP_HTTP, EXPORTER_OTLP_GRPC
                    ),
                })
            }
        }
        validate_url("tracing.endpoint", &self.endpoint)
    }
}

impl ConfigProvider for ServiceConfig {
    fn directory_base_url(&self) -> &str {
        &self.aggregator.directory_base_url
    }

    fn weather_base_url(&self) -> &str {
        &self.aggregator.weather_base_url
    }

    fn weather_api_key(&self) -> &str {
        self.aggregator.weather_api_key.as_deref().unwrap_or_default()
    }

    fn aggregator_url(&self) -> &str {
        &self.gateway.aggregator_url
    }
}
