use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::PipelineError;
use crate::generator::blackboard::{AgentStatus, AgentType, AnalysisMode, IntelligenceState};
use crate::generator::context::GeneratorContext;
use crate::types::{Competitor, FeatureComparison, SearchSnippet};
use crate::utils::text::truncate_chars;

/// 数据源配置 - 从黑板上读取的数据
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// 原始输入（业务描述或URL）
    BusinessInput,
    /// 竞品列表
    Competitors,
    /// 竞争分析正文，截断到 `max_chars`
    CompetitiveAnalysis { max_chars: usize },
    /// 市场空白与竞品弱点
    MarketInsights,
}

impl DataSource {
    pub fn name(&self) -> &'static str {
        match self {
            DataSource::BusinessInput => "user_input",
            DataSource::Competitors => "competitors",
            DataSource::CompetitiveAnalysis { .. } => "competitive_analysis",
            DataSource::MarketInsights => "market_insights",
        }
    }

    pub fn is_available(&self, state: &IntelligenceState) -> bool {
        match self {
            DataSource::BusinessInput => !state.user_input.trim().is_empty(),
            DataSource::Competitors => !state.competitors.is_empty(),
            DataSource::CompetitiveAnalysis { .. } => !state.competitive_analysis.is_empty(),
            DataSource::MarketInsights => {
                !state.market_gaps.is_empty() || !state.competitor_weaknesses.is_empty()
            }
        }
    }
}

/// Agent数据配置 - 声明执行前必须就绪的数据源
#[derive(Debug, Clone, Default)]
pub struct AgentDataConfig {
    /// 必需的数据源 - 缺少时执行失败
    pub required_sources: Vec<DataSource>,
}

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 嵌入到提示词中的黑板数据
    pub data_sources: Vec<DataSource>,
    /// 结尾的强调性指令
    pub closing_instruction: String,
}

/// 通用数据格式化器
pub struct DataFormatter;

impl DataFormatter {
    pub fn format_business_input(input: &str, mode: AnalysisMode) -> String {
        match mode {
            AnalysisMode::Description => format!("Business: {}\n\n", input.trim()),
            AnalysisMode::Url => format!("Company website: {}\n\n", input.trim()),
        }
    }

    pub fn format_search_results(results: &[SearchSnippet], limit: usize) -> String {
        let shown = &results[..results.len().min(limit)];
        format!("Raw competitor data:\n{}\n\n", to_pretty_json(&shown))
    }

    pub fn format_competitors(competitors: &[Competitor]) -> String {
        format!("Competitors:\n{}\n\n", to_pretty_json(&competitors))
    }

    pub fn format_analysis(analysis: &str, max_chars: usize) -> String {
        format!(
            "Competitive Analysis Summary:\n{}\n\n",
            truncate_chars(analysis, max_chars)
        )
    }

    pub fn format_market_insights(gaps: &[String], weaknesses: &[String]) -> String {
        let mut content = String::from("Market gaps:\n");
        for gap in gaps {
            content.push_str(&format!("- {}\n", gap));
        }
        content.push_str("\nCompetitor weaknesses:\n");
        for weakness in weaknesses {
            content.push_str(&format!("- {}\n", weakness));
        }
        content.push('\n');
        content
    }

    pub fn format_feature_comparison(comparison: &FeatureComparison) -> String {
        format!("Feature Comparison:\n{}\n\n", to_pretty_json(comparison))
    }
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// 生成类型T的JSON Schema文本，嵌入提示词作为输出格式约束
pub fn json_schema_of<T: JsonSchema>() -> String {
    to_pretty_json(&schemars::schema_for!(T))
}

/// 标准的Agent Prompt构建器
pub struct GeneratorPromptBuilder {
    template: PromptTemplate,
}

impl GeneratorPromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// 构建系统提示词和用户提示词
    /// custom_content 会插入到数据区之后、结尾指令之前
    pub fn build_prompts(
        &self,
        state: &IntelligenceState,
        custom_content: Option<&str>,
    ) -> (String, String) {
        let mut prompt = String::new();

        prompt.push_str(&self.template.opening_instruction);
        prompt.push_str("\n\n");

        for source in &self.template.data_sources {
            let section = match source {
                DataSource::BusinessInput => {
                    DataFormatter::format_business_input(&state.user_input, state.analysis_mode)
                }
                DataSource::Competitors => DataFormatter::format_competitors(&state.competitors),
                DataSource::CompetitiveAnalysis { max_chars } => {
                    DataFormatter::format_analysis(&state.competitive_analysis, *max_chars)
                }
                DataSource::MarketInsights => DataFormatter::format_market_insights(
                    &state.market_gaps,
                    &state.competitor_weaknesses,
                ),
            };
            prompt.push_str(&section);
        }

        if let Some(custom) = custom_content {
            prompt.push_str(custom);
            prompt.push_str("\n\n");
        }

        prompt.push_str(&self.template.closing_instruction);

        (self.template.system_prompt.clone(), prompt)
    }
}

/// 按模板构建提示词并调用LLM
pub async fn complete_with_template(
    context: &GeneratorContext,
    agent: AgentType,
    template: PromptTemplate,
    state: &IntelligenceState,
    custom_content: Option<&str>,
) -> Result<String, PipelineError> {
    let (system_prompt, user_prompt) =
        GeneratorPromptBuilder::new(template).build_prompts(state, custom_content);
    debug!(%agent, prompt_chars = user_prompt.len(), "sending prompt");

    let response = context
        .llm_client
        .complete(&system_prompt, &user_prompt)
        .await?;
    debug!(%agent, response_chars = response.len(), "received response");
    Ok(response)
}

/// 流水线中的一个步骤
///
/// `run` 只读访问黑板并返回自有输出，`commit` 把输出写回该步骤拥有的字段，
/// 因而一个步骤不可能清除前序步骤写入的数据。
#[async_trait]
pub trait StepForwardAgent: Send + Sync {
    type Output: Send;

    /// Agent类型标识
    fn agent_type(&self) -> AgentType;

    /// 数据源配置
    fn data_config(&self) -> AgentDataConfig;

    /// 执行步骤逻辑；只有传输层失败会返回错误
    async fn run(
        &self,
        context: &GeneratorContext,
        state: &IntelligenceState,
    ) -> Result<Self::Output, PipelineError>;

    /// 将输出写入黑板
    fn commit(&self, output: Self::Output, state: &mut IntelligenceState);

    /// 默认实现：前置数据校验 + 状态迁移 + 执行 + 写回
    async fn execute(
        &self,
        context: &GeneratorContext,
        state: &mut IntelligenceState,
    ) -> Result<(), PipelineError> {
        let agent = self.agent_type();

        for source in &self.data_config().required_sources {
            if !source.is_available(state) {
                return Err(PipelineError::MissingInput {
                    agent,
                    source_name: source.name(),
                });
            }
        }

        state.agent_status.advance(agent, AgentStatus::Working)?;
        state.log(agent, format!("Starting {}", agent.task_description()));
        info!(%agent, "🤖 agent started");

        match self.run(context, state).await {
            Ok(output) => {
                self.commit(output, state);
                state.agent_status.advance(agent, AgentStatus::Complete)?;
                info!(%agent, "✅ agent complete");
                Ok(())
            }
            Err(err) => {
                state.agent_status.advance(agent, AgentStatus::Error)?;
                state.log(agent, format!("Failed: {}", err));
                error!(%agent, "❌ agent failed: {}", err);
                Err(err)
            }
        }
    }
}
