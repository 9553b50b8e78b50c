use serde::{Deserialize, Deserializer, Serialize};

/// Gateway 收到的請求 body: `{"cep": "01001000"}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalCodeQuery {
    // 缺少欄位或 null 視同空字串，交給 required 檢查回 400
    #[serde(rename = "cep", default, deserialize_with = "null_as_empty")]
    pub code: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRecord {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    pub celsius: f64,
    pub fahrenheit: f64,
}

/// 最終回傳給呼叫端的結果，`temp_k` 一律由 `temp_c` 換算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
}

/// Aggregation 直接回應時帶 `statuscode`，Gateway 轉送時只保留 `error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(
        rename = "statuscode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            status_code: Some(status_code),
        }
    }

    pub fn message_only(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status_code: None,
        }
    }
}
