use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::llm::{CompletionService, LLMClient};
use crate::search::{SearchService, TavilyClient};

/// 一次运行所需的外部服务与配置，可在并发运行之间共享；
/// 每次运行的可变数据只存在于各自的 `IntelligenceState` 中。
#[derive(Clone)]
pub struct GeneratorContext {
    /// LLM调用器，用于与AI通信。
    pub llm_client: Arc<dyn CompletionService>,
    /// Web搜索服务
    pub search_client: Arc<dyn SearchService>,
    /// 配置
    pub config: Config,
}

impl GeneratorContext {
    /// 使用配置创建生产环境的服务客户端
    pub fn new(config: Config) -> Result<Self> {
        let llm_client = LLMClient::new(config.llm.clone())?;
        let search_client = TavilyClient::new(config.search.clone())?;

        Ok(Self {
            llm_client: Arc::new(llm_client),
            search_client: Arc::new(search_client),
            config,
        })
    }

    /// 注入自定义服务实现
    pub fn with_services(
        config: Config,
        llm_client: Arc<dyn CompletionService>,
        search_client: Arc<dyn SearchService>,
    ) -> Self {
        Self {
            llm_client,
            search_client,
            config,
        }
    }
}
