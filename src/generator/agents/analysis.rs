use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::generator::blackboard::{AgentType, IntelligenceState};
use crate::generator::context::GeneratorContext;
use crate::generator::step_forward_agent::{
    AgentDataConfig, DataSource, PromptTemplate, StepForwardAgent, complete_with_template,
};
use crate::utils::json_extract::{JsonKind, extract_first};

/// 市场空白 / 竞品弱点列表的上限
pub const MAX_INSIGHTS: usize = 5;
/// 从章节正文提取条目时，短于该长度的行会被忽略
const MIN_SECTION_LINE_CHARS: usize = 20;

const GAPS_SECTION: &str = "Market Positioning & Gaps";
const WEAKNESSES_SECTION: &str = "Competitor Weaknesses";

const GAP_KEYS: [&str; 2] = ["market_gaps", "marketGaps"];
const WEAKNESS_KEYS: [&str; 3] = ["competitor_weaknesses", "competitorWeaknesses", "weaknesses"];

pub const DEFAULT_MARKET_GAPS: [&str; 2] = [
    "Underserved market segments",
    "Feature gaps in existing solutions",
];
pub const DEFAULT_WEAKNESSES: [&str; 2] = ["Pricing complexity", "Limited features"];
pub const DEFAULT_NARRATIVE: &str =
    "Competitive analysis unavailable: the model returned an empty response.";

/// 竞争分析师 - 基于竞品列表生成定性分析
#[derive(Default)]
pub struct AnalysisAgent;

/// 列表条目的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightSource {
    Json,
    Section,
    Default,
}

/// Analysis阶段的产出
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub narrative: String,
    pub market_gaps: Vec<String>,
    pub gaps_source: InsightSource,
    pub competitor_weaknesses: Vec<String>,
    pub weaknesses_source: InsightSource,
}

impl AnalysisAgent {
    fn analysis_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are an Analysis Agent specialized in competitive intelligence."
                .to_string(),
            opening_instruction:
                "Provide a comprehensive competitive analysis for the business below.".to_string(),
            data_sources: vec![DataSource::BusinessInput, DataSource::Competitors],
            closing_instruction: r#"Structure the analysis with these sections:

## Market Positioning & Gaps
Analyze where competitors are positioned and what market gaps exist.

## Competitor Weaknesses
Identify specific weaknesses and vulnerabilities of each competitor.

## Pricing & Business Model Insights
Analyze pricing strategies and business models.

## Recommended Features
Based on gaps, what features should this business build?

## Growth Opportunities
What market opportunities exist based on competitive landscape?

## Key Strategic Insights
Most important strategic takeaways.

Provide detailed, specific analysis with actionable insights.

Finish with a JSON object listing at most 5 entries per key:
{"market_gaps": ["..."], "competitor_weaknesses": ["..."]}"#
                .to_string(),
        }
    }
}

#[async_trait]
impl StepForwardAgent for AnalysisAgent {
    type Output = AnalysisOutput;

    fn agent_type(&self) -> AgentType {
        AgentType::Analysis
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![DataSource::Competitors],
        }
    }

    async fn run(
        &self,
        context: &GeneratorContext,
        state: &IntelligenceState,
    ) -> Result<AnalysisOutput, PipelineError> {
        info!("🔍 Performing deep analysis...");
        let response = complete_with_template(
            context,
            self.agent_type(),
            self.analysis_template(),
            state,
            None,
        )
        .await?;

        let output = parse_analysis(&response);
        if output.gaps_source == InsightSource::Default {
            warn!("no market gaps found in analysis, using defaults");
        }
        if output.weaknesses_source == InsightSource::Default {
            warn!("no competitor weaknesses found in analysis, using defaults");
        }
        Ok(output)
    }

    fn commit(&self, output: AnalysisOutput, state: &mut IntelligenceState) {
        let agent = self.agent_type();
        state.log(agent, "Generated comprehensive analysis");
        state.log(
            agent,
            format!(
                "Identified {} market gaps and {} competitor weaknesses",
                output.market_gaps.len(),
                output.competitor_weaknesses.len()
            ),
        );

        state.competitive_analysis = output.narrative;
        state.market_gaps = output.market_gaps;
        state.competitor_weaknesses = output.competitor_weaknesses;
    }
}

/// 解析分析结果；两个列表各自独立回退：JSON键 -> 章节正文 -> 默认值
pub fn parse_analysis(response: &str) -> AnalysisOutput {
    let extracted = extract_first(response, JsonKind::Object, |v| {
        v.as_object()
            .is_some_and(|obj| has_list(obj, &GAP_KEYS) || has_list(obj, &WEAKNESS_KEYS))
    });

    let narrative = match &extracted {
        Some(json) => json.strip_from(response),
        None => response.trim().to_string(),
    };
    let object = extracted.as_ref().and_then(|json| json.value.as_object());

    let (market_gaps, gaps_source) = pick_list(
        object,
        &GAP_KEYS,
        &narrative,
        GAPS_SECTION,
        &DEFAULT_MARKET_GAPS,
    );
    let (competitor_weaknesses, weaknesses_source) = pick_list(
        object,
        &WEAKNESS_KEYS,
        &narrative,
        WEAKNESSES_SECTION,
        &DEFAULT_WEAKNESSES,
    );

    AnalysisOutput {
        narrative: if narrative.is_empty() {
            DEFAULT_NARRATIVE.to_string()
        } else {
            narrative
        },
        market_gaps,
        gaps_source,
        competitor_weaknesses,
        weaknesses_source,
    }
}

fn pick_list(
    object: Option<&Map<String, Value>>,
    keys: &[&str],
    narrative: &str,
    section: &str,
    defaults: &[&str],
) -> (Vec<String>, InsightSource) {
    let from_json = object.map(|obj| list_for_keys(obj, keys)).unwrap_or_default();
    if !from_json.is_empty() {
        return (from_json, InsightSource::Json);
    }

    let from_section = section_lines(narrative, section);
    if !from_section.is_empty() {
        return (from_section, InsightSource::Section);
    }

    (
        defaults.iter().map(|s| s.to_string()).collect(),
        InsightSource::Default,
    )
}

fn has_list(object: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter()
        .any(|key| object.get(*key).is_some_and(Value::is_array))
}

fn list_for_keys(object: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .take(MAX_INSIGHTS)
                .collect::<Vec<_>>()
        })
        .find(|list| !list.is_empty())
        .unwrap_or_default()
}

/// 提取标题包含 `title` 的章节下的条目，直到下一个标题为止
pub fn section_lines(markdown: &str, title: &str) -> Vec<String> {
    markdown
        .lines()
        .skip_while(|line| !(line.trim_start().starts_with('#') && line.contains(title)))
        .skip(1)
        .take_while(|line| !line.trim_start().starts_with('#'))
        .map(strip_list_marker)
        .filter(|line| line.chars().count() > MIN_SECTION_LINE_CHARS)
        .filter(|line| !line.starts_with("```"))
        .map(str::to_string)
        .take(MAX_INSIGHTS)
        .collect()
}

/// 去掉一个 `-`、`*`、`•`、`1.` 之类的列表前缀；前缀后必须跟空白，
/// 因此 `**粗体**` 开头的行保持原样
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();
    let unbulleted = ["-", "*", "•"]
        .iter()
        .find_map(|marker| followed_by_space(trimmed.strip_prefix(marker)?))
        .unwrap_or(trimmed);

    let unnumbered = match unbulleted.find(['.', ')']) {
        Some(pos) if pos > 0 && unbulleted[..pos].chars().all(|c| c.is_ascii_digit()) => {
            followed_by_space(&unbulleted[pos + 1..]).unwrap_or(unbulleted)
        }
        _ => unbulleted,
    };
    unnumbered.trim()
}

fn followed_by_space(rest: &str) -> Option<&str> {
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKDOWN: &str = "## Market Positioning & Gaps
Most tools target large enterprises.
- Small remote agencies lack an affordable async-first planner
- Nobody offers timezone-aware sprint planning out of the box
short line

## Competitor Weaknesses
1. Asana pricing escalates quickly for growing teams
2) Monday.com has a steep learning curve for new users
* ok

## Key Strategic Insights
Focus on async collaboration for distributed teams.";

    #[test]
    fn test_json_lists_take_precedence() {
        let response = format!(
            "{}\n\n```json\n{{\"market_gaps\": [\"Gap from json\", \"\", 7], \"competitorWeaknesses\": [\"Weakness from json\"]}}\n```",
            MARKDOWN
        );
        let output = parse_analysis(&response);

        assert_eq!(output.market_gaps, vec!["Gap from json"]);
        assert_eq!(output.gaps_source, InsightSource::Json);
        assert_eq!(output.competitor_weaknesses, vec!["Weakness from json"]);
        assert_eq!(output.weaknesses_source, InsightSource::Json);
        assert!(!output.narrative.contains("```"));
        assert!(!output.narrative.contains("Gap from json"));
        assert!(output.narrative.ends_with("Focus on async collaboration for distributed teams."));
    }

    #[test]
    fn test_lists_fall_back_independently() {
        let response = format!(
            "{}\n\n{{\"market_gaps\": [\"Only gaps in json\"]}}",
            MARKDOWN
        );
        let output = parse_analysis(&response);

        assert_eq!(output.gaps_source, InsightSource::Json);
        assert_eq!(output.weaknesses_source, InsightSource::Section);
        assert_eq!(
            output.competitor_weaknesses,
            vec![
                "Asana pricing escalates quickly for growing teams",
                "Monday.com has a steep learning curve for new users"
            ]
        );
    }

    #[test]
    fn test_section_lines_strip_markers_and_short_lines() {
        let gaps = section_lines(MARKDOWN, GAPS_SECTION);

        assert_eq!(
            gaps,
            vec![
                "Most tools target large enterprises.",
                "Small remote agencies lack an affordable async-first planner",
                "Nobody offers timezone-aware sprint planning out of the box"
            ]
        );
    }

    #[test]
    fn test_section_lines_keep_bold_text() {
        let markdown = "## Competitor Weaknesses
**Pricing** is opaque across every major competitor
- **Onboarding** takes weeks for mid-sized teams
1.5x slower sync than native apps on large boards";

        assert_eq!(
            section_lines(markdown, WEAKNESSES_SECTION),
            vec![
                "**Pricing** is opaque across every major competitor",
                "**Onboarding** takes weeks for mid-sized teams",
                "1.5x slower sync than native apps on large boards"
            ]
        );
    }

    #[test]
    fn test_section_lines_capped() {
        let mut markdown = String::from("## Competitor Weaknesses\n");
        for i in 0..8 {
            markdown.push_str(&format!("- Weakness number {} is fairly long\n", i));
        }
        assert_eq!(section_lines(&markdown, WEAKNESSES_SECTION).len(), MAX_INSIGHTS);
    }

    #[test]
    fn test_json_lists_capped() {
        let response = r#"{"market_gaps": ["a", "b", "c", "d", "e", "f", "g"], "competitor_weaknesses": ["x"]}"#;
        let output = parse_analysis(response);
        assert_eq!(output.market_gaps.len(), MAX_INSIGHTS);
    }

    #[test]
    fn test_unstructured_response_uses_defaults() {
        let output = parse_analysis("The market is crowded.");

        assert_eq!(output.narrative, "The market is crowded.");
        assert_eq!(output.market_gaps, DEFAULT_MARKET_GAPS.to_vec());
        assert_eq!(output.competitor_weaknesses, DEFAULT_WEAKNESSES.to_vec());
        assert_eq!(output.gaps_source, InsightSource::Default);
    }

    #[test]
    fn test_empty_response_uses_default_narrative() {
        let output = parse_analysis("   ");

        assert_eq!(output.narrative, DEFAULT_NARRATIVE);
        assert!(!output.market_gaps.is_empty());
        assert!(!output.competitor_weaknesses.is_empty());
    }
}
