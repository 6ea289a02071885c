use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{PipelineError, Service};
use crate::search::SearchService;
use crate::types::SearchHit;

/// Tavily搜索API客户端
#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    config: SearchConfig,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl TavilyClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("failed to build search HTTP client")?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.config.api_base_url.trim_end_matches('/'))
    }

    fn map_error(&self, err: reqwest::Error) -> PipelineError {
        if err.is_timeout() {
            PipelineError::Timeout {
                service: Service::Search,
                seconds: self.config.timeout_seconds,
            }
        } else {
            PipelineError::transport(Service::Search, err.to_string())
        }
    }
}

#[async_trait]
impl SearchService for TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, PipelineError> {
        debug!(query, max_results, "calling search api");

        let request = SearchRequest {
            api_key: &self.config.api_key,
            query,
            max_results,
            search_depth: "basic",
        };

        let response = self
            .http
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?
            .error_for_status()
            .map_err(|e| self.map_error(e))?;

        let body: SearchResponse = response.json().await.map_err(|e| self.map_error(e))?;

        Ok(body.results.into_iter().take(max_results).collect())
    }
}
