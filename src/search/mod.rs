//! Web搜索服务接入

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::types::SearchHit;

pub mod tavily;

pub use tavily::TavilyClient;

/// Web搜索服务：输入查询语句与结果上限，返回结果摘要
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchHit>, PipelineError>;
}
