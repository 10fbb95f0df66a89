//! Web search providers.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::ParleyConfig;
use crate::error::ParleyError;
use crate::provider::http::{bearer_headers, build_client, status_to_error};
use crate::util::retry::RetryPolicy;

const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// A search backend returning raw result records.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run `query` and return the provider's result objects untouched.
    async fn search(&self, query: &str) -> Result<Vec<serde_json::Value>, ParleyError>;
}

/// Tavily search API client.
pub struct TavilySearch {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl TavilySearch {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, ParleyError> {
        Ok(Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_TAVILY_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: build_client()?,
            retry: RetryPolicy::default(),
        })
    }

    /// Build from config; fails when `TAVILY_API_KEY` is absent.
    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let api_key = config.require_api_key("tavily", "TAVILY_API_KEY")?;
        Self::new(api_key, config.get_base_url("tavily"))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn search_once(&self, query: &str) -> Result<Vec<serde_json::Value>, ParleyError> {
        let url = format!("{}/search", self.base_url);
        debug!(query, "Tavily search");

        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body));
        }

        let data: TavilyResponse = resp.json().await?;
        Ok(data.results)
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> Result<Vec<serde_json::Value>, ParleyError> {
        self.retry.execute(|| self.search_once(query)).await
    }
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}
