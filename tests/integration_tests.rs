use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use competitor_intel::config::Config;
use competitor_intel::error::{PipelineError, Service};
use competitor_intel::generator::agents::analysis::{DEFAULT_MARKET_GAPS, DEFAULT_WEAKNESSES};
use competitor_intel::generator::agents::discovery::FALLBACK_QUERIES;
use competitor_intel::generator::context::GeneratorContext;
use competitor_intel::llm::CompletionService;
use competitor_intel::search::SearchService;
use competitor_intel::types::{Competitor, FeatureComparison, SearchHit};
use competitor_intel::{AgentStatus, AgentType, AnalysisMode, IntelligenceOrchestrator};

const SCENARIO_INPUT: &str = "AI project management tool for remote teams";

/// 按系统提示词区分调用阶段，返回预置的响应
#[derive(Default)]
struct ScriptedLlm {
    planning: String,
    ranking: String,
    analysis: String,
    comparison: String,
    strategy: String,
    fail_analysis: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionService for ScriptedLlm {
    async fn complete(&self, system_prompt: &str, _user_prompt: &str) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let response = if system_prompt.contains("finding the competitors") {
            &self.planning
        } else if system_prompt.contains("ranking candidate competitors") {
            &self.ranking
        } else if system_prompt.contains("Analysis Agent") {
            if self.fail_analysis {
                return Err(PipelineError::Timeout {
                    service: Service::Llm,
                    seconds: 120,
                });
            }
            &self.analysis
        } else if system_prompt.contains("Comparison Agent") {
            &self.comparison
        } else {
            &self.strategy
        };
        Ok(response.clone())
    }
}

/// 每个查询返回固定数量的结果，并记录收到的查询
struct ScriptedSearch {
    hits_per_query: usize,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    fn new(hits_per_query: usize) -> Self {
        Self {
            hits_per_query,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0)
        }
    }

    fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchService for ScriptedSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, PipelineError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(PipelineError::transport(Service::Search, "HTTP status 503"));
        }
        Ok((0..self.hits_per_query.min(max_results))
            .map(|i| SearchHit {
                title: format!("Hit {} for {}", i, query),
                url: format!("https://example.com/{}", i),
                content: "x".repeat(500),
                score: Some(0.9),
            })
            .collect())
    }
}

fn create_test_config() -> Config {
    let mut config = Config::default();
    config.llm.api_key = "sk-test".to_string();
    config.search.api_key = "tvly-test".to_string();
    config
}

fn create_context(llm: Arc<ScriptedLlm>, search: Arc<ScriptedSearch>) -> GeneratorContext {
    GeneratorContext::with_services(create_test_config(), llm, search)
}

fn competitor_array(count: usize) -> String {
    let entries: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"name": "Rival {}", "url": "https://rival{}.io", "description": "Tool {}", "category": "Project management", "marketPosition": "challenger", "relevanceScore": {}, "relevanceReason": "Same audience"}}"#,
                i,
                i,
                i,
                0.9 - i as f64 * 0.05
            )
        })
        .collect();
    format!("[{}]", entries.join(",\n"))
}

fn feature_object(count: usize) -> String {
    let entries: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"name": "Feature {}", "yourOpportunity": "Build", "implementationComplexity": "Medium", "strategicValue": "High", "competitors": {{"Rival 0": "Yes"}}}}"#,
                i
            )
        })
        .collect();
    format!(r#"{{"features": [{}]}}"#, entries.join(","))
}

fn well_formed_llm() -> ScriptedLlm {
    ScriptedLlm {
        planning: r#"["project management software", "asana alternatives", "remote collaboration tools", "kanban for distributed teams"]"#.to_string(),
        ranking: format!("Here are the competitors:\n```json\n{}\n```", competitor_array(5)),
        analysis: "## Market Positioning & Gaps\nCrowded.\n\n## Competitor Weaknesses\nPricing.\n\n{\"market_gaps\": [\"Async-first planning for small agencies\"], \"competitor_weaknesses\": [\"Seat-based pricing punishes growth\"]}".to_string(),
        comparison: feature_object(11),
        strategy: "## 🎯 Immediate Actions (0-3 months)\n- Launch a free tier".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_missing_credentials_fail_before_any_call() {
    let llm = Arc::new(well_formed_llm());
    let search = Arc::new(ScriptedSearch::new(3));
    let mut config = create_test_config();
    config.llm.api_key = String::new();
    let context = GeneratorContext::with_services(config, llm.clone(), search.clone());

    let err = IntelligenceOrchestrator
        .run(&context, SCENARIO_INPUT, AnalysisMode::Description)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::MissingCredential("llm.api_key")));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    assert_eq!(search.call_count(), 0);
}

#[tokio::test]
async fn test_well_formed_run() {
    let llm = Arc::new(well_formed_llm());
    let search = Arc::new(ScriptedSearch::new(5));
    let context = create_context(llm.clone(), search.clone());

    let state = IntelligenceOrchestrator
        .run(&context, SCENARIO_INPUT, AnalysisMode::Description)
        .await
        .unwrap();

    assert!(state.agent_status.all_complete());
    assert_eq!(state.search_queries.len(), 4);

    // 只搜索前三条，每条最多3个结果
    let queries = search.queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![
            format!("project management software {}", SCENARIO_INPUT),
            format!("asana alternatives {}", SCENARIO_INPUT),
            format!("remote collaboration tools {}", SCENARIO_INPUT),
        ]
    );
    assert_eq!(state.raw_results.len(), 9);
    assert!(state.raw_results.iter().all(|r| r.content.chars().count() == 200));

    let expected: Vec<Competitor> = serde_json::from_str(&competitor_array(5)).unwrap();
    assert_eq!(state.competitors, expected);

    assert_eq!(state.market_gaps, vec!["Async-first planning for small agencies"]);
    assert_eq!(state.competitor_weaknesses, vec!["Seat-based pricing punishes growth"]);
    assert!(state.competitive_analysis.starts_with("## Market Positioning & Gaps"));
    assert!(!state.competitive_analysis.contains("market_gaps"));

    assert_eq!(state.feature_comparison.len(), 11);
    assert!(state.strategic_recommendations.contains("Launch a free tier"));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 5);

    assert_eq!(
        state.messages.first().map(String::as_str),
        Some("[Discovery Agent] Starting competitor discovery")
    );
    assert_eq!(
        state.messages.last().map(String::as_str),
        Some("[Recommendation Agent] Generated strategic recommendations")
    );
}

#[tokio::test]
async fn test_unparseable_responses_use_fallbacks() {
    let llm = Arc::new(ScriptedLlm {
        planning: "Sure, I can help with that.".to_string(),
        ranking: "These are the best ones, trust me.".to_string(),
        analysis: "The market is crowded.".to_string(),
        comparison: "I cannot produce a table.".to_string(),
        strategy: String::new(),
        ..Default::default()
    });
    let search = Arc::new(ScriptedSearch::new(1));
    let context = create_context(llm, search);

    let state = IntelligenceOrchestrator
        .run(&context, SCENARIO_INPUT, AnalysisMode::Description)
        .await
        .unwrap();

    assert!(state.agent_status.all_complete());
    assert_eq!(state.search_queries, FALLBACK_QUERIES.to_vec());
    assert_eq!(state.competitors, Competitor::fallback_list());
    assert_eq!(state.market_gaps, DEFAULT_MARKET_GAPS.to_vec());
    assert_eq!(state.competitor_weaknesses, DEFAULT_WEAKNESSES.to_vec());
    assert_eq!(state.competitive_analysis, "The market is crowded.");
    assert_eq!(state.feature_comparison, FeatureComparison::fallback());
    assert!(!state.strategic_recommendations.is_empty());
}

#[tokio::test]
async fn test_malformed_ranking_scenario() {
    let llm = Arc::new(ScriptedLlm {
        ranking: r#"[{"name": "Asana", "url": "asana.com",}, {"name": "Trello"]"#.to_string(),
        ..well_formed_llm()
    });
    let search = Arc::new(ScriptedSearch::new(1));
    let context = create_context(llm, search);

    let state = IntelligenceOrchestrator
        .run(&context, SCENARIO_INPUT, AnalysisMode::Description)
        .await
        .unwrap();

    assert_eq!(state.raw_results.len(), 3);
    assert_eq!(state.competitors, Competitor::fallback_list());
    assert_eq!(state.agent_status.discovery, AgentStatus::Complete);
    assert!(
        state
            .messages
            .contains(&"[Discovery Agent] Ranking unparseable, using placeholder competitors".to_string())
    );
}

#[tokio::test]
async fn test_lists_are_capped() {
    let gaps: Vec<String> = (0..9).map(|i| format!("\"Gap {}\"", i)).collect();
    let llm = Arc::new(ScriptedLlm {
        ranking: competitor_array(8),
        analysis: format!(
            "Narrative.\n{{\"market_gaps\": [{}], \"competitor_weaknesses\": [{}]}}",
            gaps.join(","),
            gaps.join(",")
        ),
        comparison: feature_object(15),
        ..well_formed_llm()
    });
    let context = create_context(llm, Arc::new(ScriptedSearch::new(3)));

    let state = IntelligenceOrchestrator
        .run(&context, SCENARIO_INPUT, AnalysisMode::Url)
        .await
        .unwrap();

    assert_eq!(state.competitors.len(), 5);
    assert_eq!(state.competitors[4].name, "Rival 4");
    assert_eq!(state.market_gaps.len(), 5);
    assert_eq!(state.competitor_weaknesses.len(), 5);
    assert_eq!(state.feature_comparison.len(), FeatureComparison::MAX_FEATURES);
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let mut serialized = Vec::new();
    for _ in 0..2 {
        let context = create_context(Arc::new(well_formed_llm()), Arc::new(ScriptedSearch::new(2)));
        let state = IntelligenceOrchestrator
            .run(&context, SCENARIO_INPUT, AnalysisMode::Description)
            .await
            .unwrap();
        serialized.push(serde_json::to_string(&state).unwrap());
    }

    assert_eq!(serialized[0], serialized[1]);
}

#[tokio::test]
async fn test_search_failure_aborts_pipeline() {
    let llm = Arc::new(well_formed_llm());
    let search = Arc::new(ScriptedSearch::failing());
    let context = create_context(llm.clone(), search.clone());

    let err = IntelligenceOrchestrator
        .run(&context, SCENARIO_INPUT, AnalysisMode::Description)
        .await
        .unwrap_err();

    match &err {
        PipelineError::StepFailed { agent, state, source } => {
            assert_eq!(*agent, AgentType::Discovery);
            assert!(source.is_transport());
            assert_eq!(state.agent_status.discovery, AgentStatus::Error);
            assert_eq!(state.agent_status.analysis, AgentStatus::Pending);
            assert_eq!(state.agent_status.recommendation, AgentStatus::Pending);
            assert!(state.competitors.is_empty());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_transport());
    // 只调用了查询规划
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(search.call_count(), 1);
}

#[tokio::test]
async fn test_analysis_failure_keeps_discovery_results() {
    let llm = Arc::new(ScriptedLlm {
        fail_analysis: true,
        ..well_formed_llm()
    });
    let context = create_context(llm, Arc::new(ScriptedSearch::new(3)));

    let err = IntelligenceOrchestrator
        .run(&context, SCENARIO_INPUT, AnalysisMode::Description)
        .await
        .unwrap_err();

    let state = err.partial_state().unwrap();
    assert_eq!(state.agent_status.discovery, AgentStatus::Complete);
    assert_eq!(state.agent_status.analysis, AgentStatus::Error);
    assert_eq!(state.agent_status.recommendation, AgentStatus::Pending);
    assert_eq!(state.competitors.len(), 5);
    assert_eq!(state.raw_results.len(), 9);
    assert!(state.competitive_analysis.is_empty());
    assert!(
        state
            .messages
            .last()
            .unwrap()
            .starts_with("[Analysis Agent] Failed:")
    );
}
