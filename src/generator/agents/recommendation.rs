use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::generator::blackboard::{AgentType, IntelligenceState};
use crate::generator::context::GeneratorContext;
use crate::generator::step_forward_agent::{
    AgentDataConfig, DataFormatter, DataSource, PromptTemplate, StepForwardAgent,
    complete_with_template, json_schema_of,
};
use crate::types::{FeatureComparison, FeatureEntry};
use crate::utils::json_extract::{JsonKind, extract_first};

/// 策略提示词中嵌入的分析正文长度上限
const ANALYSIS_CONTEXT_CHARS: usize = 2000;

pub const DEFAULT_RECOMMENDATIONS: &str =
    "Strategic recommendations unavailable: the model returned an empty response.";

/// 策略顾问 - 构建特性对比矩阵并给出战略建议
#[derive(Default)]
pub struct RecommendationAgent;

/// Recommendation阶段的产出
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOutput {
    pub feature_comparison: FeatureComparison,
    pub comparison_parsed: bool,
    pub strategic_recommendations: String,
}

impl RecommendationAgent {
    fn comparison_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a Comparison Agent creating structured competitor comparisons."
                .to_string(),
            opening_instruction: "Create a feature comparison matrix with 10-12 key features for the business below."
                .to_string(),
            data_sources: vec![DataSource::BusinessInput, DataSource::Competitors],
            closing_instruction: format!(
                "For every feature give yourOpportunity (what this business should do), \
                 implementationComplexity and strategicValue (Low, Medium or High), and a \
                 competitors map from competitor name to Yes, No, Partial or Premium.\n\n\
                 Return ONLY valid JSON matching this schema:\n{}",
                json_schema_of::<FeatureComparison>()
            ),
        }
    }

    fn strategy_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a strategy advisor creating strategic recommendations."
                .to_string(),
            opening_instruction: "Create strategic recommendations for the business below."
                .to_string(),
            data_sources: vec![
                DataSource::BusinessInput,
                DataSource::CompetitiveAnalysis {
                    max_chars: ANALYSIS_CONTEXT_CHARS,
                },
                DataSource::MarketInsights,
            ],
            closing_instruction: r#"Provide strategic recommendations in these categories:

## 🎯 Immediate Actions (0-3 months)
4-5 specific high-impact actions to take now.

## 📈 Strategic Initiatives (3-12 months)
4-5 longer-term strategic moves.

## 🏰 Competitive Moats to Build
4-5 sustainable competitive advantages to develop.

## 💎 Market Opportunities to Pursue
4-5 untapped market opportunities based on competitor gaps.

Be specific, actionable, and prioritized."#
                .to_string(),
        }
    }
}

#[async_trait]
impl StepForwardAgent for RecommendationAgent {
    type Output = RecommendationOutput;

    fn agent_type(&self) -> AgentType {
        AgentType::Recommendation
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![
                DataSource::Competitors,
                DataSource::CompetitiveAnalysis {
                    max_chars: ANALYSIS_CONTEXT_CHARS,
                },
            ],
        }
    }

    async fn run(
        &self,
        context: &GeneratorContext,
        state: &IntelligenceState,
    ) -> Result<RecommendationOutput, PipelineError> {
        let agent = self.agent_type();

        // 1. 特性对比矩阵
        info!("📊 Building feature comparison matrix...");
        let response =
            complete_with_template(context, agent, self.comparison_template(), state, None)
                .await?;
        let (feature_comparison, comparison_parsed) = match parse_feature_comparison(&response) {
            Some(comparison) => (comparison, true),
            None => {
                warn!("feature comparison could not be parsed, using fallback features");
                (FeatureComparison::fallback(), false)
            }
        };

        // 2. 战略建议，对比矩阵作为额外上下文
        info!("💡 Generating strategic recommendations...");
        let comparison_context = DataFormatter::format_feature_comparison(&feature_comparison);
        let response = complete_with_template(
            context,
            agent,
            self.strategy_template(),
            state,
            Some(comparison_context.trim_end()),
        )
        .await?;
        let strategic_recommendations = match response.trim() {
            "" => DEFAULT_RECOMMENDATIONS.to_string(),
            text => text.to_string(),
        };

        Ok(RecommendationOutput {
            feature_comparison,
            comparison_parsed,
            strategic_recommendations,
        })
    }

    fn commit(&self, output: RecommendationOutput, state: &mut IntelligenceState) {
        let agent = self.agent_type();
        if !output.comparison_parsed {
            state.log(agent, "Comparison unparseable, using generic features");
        }
        state.log(
            agent,
            format!(
                "Created comparison with {} features",
                output.feature_comparison.len()
            ),
        );
        state.log(agent, "Generated strategic recommendations");

        state.feature_comparison = output.feature_comparison;
        state.strategic_recommendations = output.strategic_recommendations;
    }
}

/// 解析特性对比：优先 `{"features": [...]}`，其次裸数组；
/// 丢弃形状不合法的条目，最多 MAX_FEATURES 个，没有合法条目时返回None
pub fn parse_feature_comparison(text: &str) -> Option<FeatureComparison> {
    let from_object = extract_first(text, JsonKind::Object, |v| {
        !well_shaped_features(v.get("features")).is_empty()
    })
    .map(|json| well_shaped_features(json.value.get("features")));

    let features = match from_object {
        Some(features) => features,
        None => {
            let json = extract_first(text, JsonKind::Array, |v| {
                !well_shaped_features(Some(v)).is_empty()
            })?;
            well_shaped_features(Some(&json.value))
        }
    };

    Some(FeatureComparison { features })
}

fn well_shaped_features(value: Option<&Value>) -> Vec<FeatureEntry> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<FeatureEntry>(item.clone()).ok())
                .filter(FeatureEntry::is_well_shaped)
                .take(FeatureComparison::MAX_FEATURES)
                .collect()
        })
        .unwrap_or_default()
}
