//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::error::{PipelineError, Service};
use crate::llm::CompletionService;

mod providers;

use providers::ProviderClient;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 通用重试逻辑，`retry_attempts` 为总尝试次数
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T, PipelineError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let max_attempts = self.config.retry_attempts.max(1);
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut attempts = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    attempts += 1;
                    if attempts >= max_attempts {
                        return Err(err);
                    }
                    warn!(
                        attempt = attempts,
                        max_attempts, "❌ LLM call failed, retrying: {}", err
                    );
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 单次调用，受 `timeout_seconds` 约束
    async fn prompt_once(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PipelineError> {
        let agent = self
            .client
            .create_agent(&self.config.model, system_prompt, &self.config);
        let seconds = self.config.timeout_seconds;

        match tokio::time::timeout(Duration::from_secs(seconds), agent.prompt(user_prompt)).await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(PipelineError::transport(Service::Llm, e.to_string())),
            Err(_) => Err(PipelineError::Timeout {
                service: Service::Llm,
                seconds,
            }),
        }
    }
}

#[async_trait]
impl CompletionService for LLMClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PipelineError> {
        debug!(
            model = %self.config.model,
            prompt_chars = system_prompt.len() + user_prompt.len(),
            "calling llm"
        );
        self.retry_with_backoff(|| self.prompt_once(system_prompt, user_prompt))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LLMProvider;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client_with_attempts(retry_attempts: u32) -> LLMClient {
        let config = LLMConfig {
            provider: LLMProvider::OpenAI,
            api_key: "sk-test".to_string(),
            api_base_url: Some("http://127.0.0.1:9".to_string()),
            retry_attempts,
            retry_delay_ms: 1,
            ..LLMConfig::default()
        };
        LLMClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_retry() {
        let client = client_with_attempts(1);
        let calls = AtomicU32::new(0);

        let result: Result<(), PipelineError> = client
            .retry_with_backoff(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PipelineError::transport(Service::Llm, "boom"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let client = client_with_attempts(3);
        let calls = AtomicU32::new(0);

        let result = client
            .retry_with_backoff(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(PipelineError::transport(Service::Llm, "flaky"))
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = client_with_attempts(1);
        let err = client.complete("system", "hello").await.unwrap_err();
        assert!(err.is_transport());
    }
}
