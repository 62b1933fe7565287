//! Hosted PostgREST-style backend.
//!
//! Pages live in one table. Each row carries the meta columns plus `blocks`
//! and `scene` as JSON columns:
//!
//! ```text
//! GET   /rest/v1/<table>?id=eq.<id>&select=*
//! POST  /rest/v1/<table>                 Prefer: return=representation
//! PATCH /rest/v1/<table>?id=eq.<id>      Prefer: return=representation
//! ```
//!
//! Every request sends the key both as `apikey` and as a bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{PageContent, PageId, PageMeta, PersistenceAdapter};
use crate::blocks::Block;
use crate::canvas::Scene;
use crate::config::BackendConfig;
use crate::error::MemoriaError;

/// Wire form of a table row.
#[derive(Debug, Serialize, Deserialize)]
struct PageRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<serde_json::Value>,
    #[serde(flatten)]
    meta: PageMeta,
    #[serde(default)]
    blocks: Vec<Block>,
    #[serde(default)]
    scene: Option<Scene>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl PageRow {
    fn from_content(content: &PageContent) -> Self {
        Self {
            id: None,
            meta: content.meta.clone(),
            blocks: content.blocks.clone(),
            scene: content.scene.clone(),
            updated_at: Some(Utc::now()),
        }
    }

    fn page_id(&self) -> Option<PageId> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) => Some(PageId::new(s.clone())),
            serde_json::Value::Number(n) => Some(PageId::new(n.to_string())),
            _ => None,
        }
    }

    fn into_content(self) -> PageContent {
        PageContent {
            meta: self.meta,
            blocks: self.blocks,
            scene: self.scene,
            updated_at: self.updated_at,
        }
    }
}

pub struct RestStore {
    http_client: reqwest::Client,
    endpoint: String,
}

impl RestStore {
    pub fn new(config: &BackendConfig) -> Result<Self, MemoriaError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| MemoriaError::Persistence(format!("invalid API key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| MemoriaError::Persistence(format!("invalid API key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http_client = reqwest::Client::builder()
            .user_agent("memoria/0.1")
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MemoriaError::Persistence(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: table_endpoint(&config.url, &config.table),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn rows(response: reqwest::Response) -> Result<Vec<PageRow>, MemoriaError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoriaError::Persistence(format!(
                "backend returned HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        response
            .json::<Vec<PageRow>>()
            .await
            .map_err(|e| MemoriaError::Persistence(format!("unexpected backend response: {}", e)))
    }
}

fn table_endpoint(base: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base.trim_end_matches('/'), table)
}

fn request_error(e: reqwest::Error) -> MemoriaError {
    MemoriaError::Persistence(format!("backend request failed: {}", e))
}

#[async_trait]
impl PersistenceAdapter for RestStore {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn load(&self, id: &PageId) -> Result<Option<PageContent>, MemoriaError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())])
            .send()
            .await
            .map_err(request_error)?;
        let rows = Self::rows(response).await?;
        debug!(page = %id, found = !rows.is_empty(), "page loaded from backend");
        Ok(rows.into_iter().next().map(PageRow::into_content))
    }

    async fn save(
        &self,
        id: Option<&PageId>,
        content: &PageContent,
    ) -> Result<PageId, MemoriaError> {
        let row = PageRow::from_content(content);
        let request = match id {
            Some(id) => self
                .http_client
                .patch(&self.endpoint)
                .query(&[("id", format!("eq.{}", id))]),
            None => self.http_client.post(&self.endpoint),
        };
        let response = request
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(request_error)?;
        let rows = Self::rows(response).await?;

        let saved = match (id, rows.first().and_then(PageRow::page_id)) {
            (_, Some(saved)) => saved,
            (Some(id), None) if !rows.is_empty() => id.clone(),
            (Some(id), None) => return Err(MemoriaError::NotFound(id.to_string())),
            (None, None) => {
                return Err(MemoriaError::Persistence(
                    "backend did not return the new page id".to_string(),
                ));
            }
        };
        info!(page = %saved, created = id.is_none(), "page saved to backend");
        Ok(saved)
    }
}
