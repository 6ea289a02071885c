//! LLM服务接入
//!
//! 流水线只依赖 [`CompletionService`]，生产环境由 [`client::LLMClient`] 实现。

use async_trait::async_trait;

use crate::error::PipelineError;

pub mod client;

pub use client::LLMClient;

/// 文本补全服务：输入提示词，返回不可信的自由文本
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str)
    -> Result<String, PipelineError>;
}
