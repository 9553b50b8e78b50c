use crate::utils::error::{PipelineError, Result};
use std::net::SocketAddr;
use url::Url;

/// CEP 只檢查長度，不檢查是否為數字
pub const POSTAL_CODE_LENGTH: usize = 8;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 長度以 UTF-8 位元組計算，非 ASCII 字元會讓長度超過 8
pub fn validate_postal_code(code: &str) -> Result<()> {
    if code.len() != POSTAL_CODE_LENGTH {
        return Err(PipelineError::InvalidFormat);
    }
    Ok(())
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(PipelineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(PipelineError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(PipelineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_listen_addr(field_name: &str, addr: &str) -> Result<SocketAddr> {
    addr.parse::<SocketAddr>()
        .map_err(|e| PipelineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: addr.to_string(),
            reason: format!("Invalid socket address: {}", e),
        })
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| PipelineError::MissingConfigError {
            field: field_name.to_string(),
        })
}

/// 祕密值不能回顯在錯誤訊息裡
pub fn validate_secret(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PipelineError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    // 環境變數沒設定時，TOML 替換會留下原本的 ${VAR}
    if value.starts_with("${") && value.ends_with('}') {
        return Err(PipelineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Environment variable placeholder was not resolved".to_string(),
        });
    }

    Ok(())
}
