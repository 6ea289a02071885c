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
use crate::types::{Competitor, SearchSnippet};
use crate::utils::json_extract::{JsonKind, extract_first};

/// 规划的搜索语句上限
pub const MAX_QUERIES: usize = 4;
/// 实际执行搜索的语句数
pub const SEARCHED_QUERIES: usize = 3;
/// 每条语句的搜索结果上限
pub const RESULTS_PER_QUERY: usize = 3;
/// 排名后保留的竞品上限
pub const MAX_COMPETITORS: usize = 5;
/// 排名提示词中嵌入的搜索结果上限
const RANKING_SNIPPET_LIMIT: usize = 10;

/// 查询规划失败时使用的确定性查询
pub const FALLBACK_QUERIES: [&str; 3] = ["competitors", "alternatives", "similar products"];

/// 竞品发现员 - 规划搜索、执行Web搜索并对候选竞品排名
#[derive(Default)]
pub struct DiscoveryAgent;

/// Discovery阶段的产出
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOutput {
    pub search_queries: Vec<String>,
    pub queries_planned: bool,
    pub raw_results: Vec<SearchSnippet>,
    pub competitors: Vec<Competitor>,
    pub competitors_ranked: bool,
}

impl DiscoveryAgent {
    fn planning_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a discovery agent specialized in finding the competitors of a business."
                .to_string(),
            opening_instruction: "Create 4 diverse search queries to find competitors of the business below."
                .to_string(),
            data_sources: vec![DataSource::BusinessInput],
            closing_instruction: r#"Consider:
- Direct competitors (same product/service)
- Adjacent competitors (similar market)
- Alternative solutions
- Emerging players

Return ONLY a JSON array of search queries:
["query1", "query2", "query3", "query4"]"#
                .to_string(),
        }
    }

    fn ranking_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a discovery agent ranking candidate competitors by relevance."
                .to_string(),
            opening_instruction: "You are analyzing competitors for the business below.".to_string(),
            data_sources: vec![DataSource::BusinessInput],
            closing_instruction: format!(
                "Select the top {} most relevant competitors and enhance the data.\n\
                 relevanceScore is a number between 0.0 and 1.0; marketPosition is one of leader, challenger, emerging.\n\n\
                 Return ONLY a JSON array matching this schema:\n{}",
                MAX_COMPETITORS,
                json_schema_of::<Vec<Competitor>>()
            ),
        }
    }
}

#[async_trait]
impl StepForwardAgent for DiscoveryAgent {
    type Output = DiscoveryOutput;

    fn agent_type(&self) -> AgentType {
        AgentType::Discovery
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![DataSource::BusinessInput],
        }
    }

    async fn run(
        &self,
        context: &GeneratorContext,
        state: &IntelligenceState,
    ) -> Result<DiscoveryOutput, PipelineError> {
        let agent = self.agent_type();

        // 1. 规划搜索语句
        info!("📋 Planning search strategies...");
        let planning =
            complete_with_template(context, agent, self.planning_template(), state, None).await?;
        let (search_queries, queries_planned) = match parse_queries(&planning) {
            Some(queries) => (queries, true),
            None => {
                warn!("search query plan could not be parsed, using fallback queries");
                (
                    FALLBACK_QUERIES.iter().map(|q| q.to_string()).collect(),
                    false,
                )
            }
        };

        // 2. 执行Web搜索，搜索服务不可达时整个步骤失败
        let mut raw_results = Vec::new();
        for (i, query) in search_queries.iter().take(SEARCHED_QUERIES).enumerate() {
            let full_query = format!("{} {}", query, state.user_input.trim());
            info!("🌐 Search {}: {}", i + 1, full_query);
            let hits = context
                .search_client
                .search(&full_query, RESULTS_PER_QUERY)
                .await?;
            raw_results.extend(
                hits.into_iter()
                    .take(RESULTS_PER_QUERY)
                    .map(SearchSnippet::from_hit),
            );
        }

        // 3. 排名与筛选
        info!("📊 Ranking {} candidates...", raw_results.len());
        let candidates = DataFormatter::format_search_results(&raw_results, RANKING_SNIPPET_LIMIT);
        let ranking = complete_with_template(
            context,
            agent,
            self.ranking_template(),
            state,
            Some(&candidates),
        )
        .await?;
        let (competitors, competitors_ranked) = match parse_competitors(&ranking) {
            Some(competitors) => (competitors, true),
            None => {
                warn!("competitor ranking could not be parsed, using fallback competitors");
                (Competitor::fallback_list(), false)
            }
        };

        Ok(DiscoveryOutput {
            search_queries,
            queries_planned,
            raw_results,
            competitors,
            competitors_ranked,
        })
    }

    fn commit(&self, output: DiscoveryOutput, state: &mut IntelligenceState) {
        let agent = self.agent_type();
        if output.queries_planned {
            state.log(
                agent,
                format!("Planned {} search strategies", output.search_queries.len()),
            );
        } else {
            state.log(agent, "Search planning unparseable, using default queries");
        }
        state.log(
            agent,
            format!("Found {} potential competitors", output.raw_results.len()),
        );
        if !output.competitors_ranked {
            state.log(agent, "Ranking unparseable, using placeholder competitors");
        }
        state.log(
            agent,
            format!("Selected top {} competitors", output.competitors.len()),
        );

        state.search_queries = output.search_queries;
        state.raw_results = output.raw_results;
        state.competitors = output.competitors;
    }
}

/// 解析规划出的搜索语句，保留非空字符串，最多 MAX_QUERIES 条
pub fn parse_queries(text: &str) -> Option<Vec<String>> {
    let extracted = extract_first(text, JsonKind::Array, |v| !query_strings(v).is_empty())?;
    Some(query_strings(&extracted.value))
}

fn query_strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string)
                .take(MAX_QUERIES)
                .collect()
        })
        .unwrap_or_default()
}

/// 解析排名结果：丢弃形状不合法的条目，最多 MAX_COMPETITORS 个；
/// 没有任何合法条目时返回None
pub fn parse_competitors(text: &str) -> Option<Vec<Competitor>> {
    let extracted =
        extract_first(text, JsonKind::Array, |v| !well_shaped_competitors(v).is_empty())?;
    Some(well_shaped_competitors(&extracted.value))
}

fn well_shaped_competitors(value: &Value) -> Vec<Competitor> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<Competitor>(item.clone()).ok())
                .filter(Competitor::is_well_shaped)
                .take(MAX_COMPETITORS)
                .collect()
        })
        .unwrap_or_default()
}
