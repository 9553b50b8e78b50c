use crate::adapters::{join_segments, parse_base_url};
use crate::domain::model::LocationRecord;
use crate::domain::ports::LocationResolver;
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_DIRECTORY_BASE_URL: &str = "https://viacep.com.br/ws";

/// ViaCEP 格式的回應：`{"localidade": "...", "erro": true}`
#[derive(Debug, Deserialize)]
struct DirectoryPayload {
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    erro: NotFoundFlag,
}

/// 舊版回傳布林，新版回傳字串 "true"
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum NotFoundFlag {
    Bool(bool),
    Text(String),
    #[default]
    Absent,
}

impl NotFoundFlag {
    fn is_set(&self) -> bool {
        match self {
            NotFoundFlag::Bool(flag) => *flag,
            NotFoundFlag::Text(text) => text.eq_ignore_ascii_case("true"),
            NotFoundFlag::Absent => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    client: Client,
    base_url: Url,
}

impl DirectoryResolver {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: parse_base_url("aggregator.directory_base_url", base_url)?,
        })
    }

    fn lookup_url(&self, code: &str) -> Url {
        join_segments(&self.base_url, &[code, "json", ""])
    }
}

#[async_trait]
impl LocationResolver for DirectoryResolver {
    #[tracing::instrument(name = "directory.resolve", skip(self))]
    async fn resolve(&self, code: &str) -> std::result::Result<LocationRecord, LookupError> {
        let url = self.lookup_url(code);
        tracing::debug!("Making directory request to: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            LookupError::transport(format!(
                "failed to fetch data from directory service: {}",
                e.without_url()
            ))
        })?;

        let status = response.status();
        tracing::debug!("Directory response status: {}", status);
        if !status.is_success() {
            return Err(LookupError::transport(format!(
                "directory service returned {}",
                status
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            LookupError::transport(format!(
                "failed to read directory response: {}",
                e.without_url()
            ))
        })?;

        let payload: DirectoryPayload = serde_json::from_slice(&body).map_err(|e| {
            LookupError::transport(format!("failed to decode directory response: {}", e))
        })?;

        if payload.erro.is_set() || payload.localidade.trim().is_empty() {
            return Err(LookupError::NotFound);
        }

        Ok(LocationRecord {
            name: payload.localidade,
        })
    }
}
