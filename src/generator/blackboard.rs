//! 共享黑板：一次分析运行的全部输入、中间结果与最终输出
//!
//! 每个Agent以只读方式读取黑板，产出自己的结果后再由 `commit` 写回它拥有的字段。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::types::{Competitor, FeatureComparison, SearchSnippet};

/// 流水线中的三个Agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Discovery,
    Analysis,
    Recommendation,
}

impl AgentType {
    /// 固定的执行顺序
    pub const PIPELINE: [AgentType; 3] = [
        AgentType::Discovery,
        AgentType::Analysis,
        AgentType::Recommendation,
    ];

    /// 写入消息日志时使用的名称
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::Discovery => "Discovery Agent",
            AgentType::Analysis => "Analysis Agent",
            AgentType::Recommendation => "Recommendation Agent",
        }
    }

    pub fn task_description(&self) -> &'static str {
        match self {
            AgentType::Discovery => "competitor discovery",
            AgentType::Analysis => "competitive analysis",
            AgentType::Recommendation => "feature comparison and strategy",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentType::Discovery => write!(f, "discovery"),
            AgentType::Analysis => write!(f, "analysis"),
            AgentType::Recommendation => write!(f, "recommendation"),
        }
    }
}

/// 单个Agent的执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Pending,
    Working,
    Complete,
    Error,
}

impl AgentStatus {
    /// pending -> working -> complete | error
    pub fn can_transition_to(self, next: AgentStatus) -> bool {
        matches!(
            (self, next),
            (AgentStatus::Pending, AgentStatus::Working)
                | (AgentStatus::Working, AgentStatus::Complete)
                | (AgentStatus::Working, AgentStatus::Error)
        )
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Pending => write!(f, "pending"),
            AgentStatus::Working => write!(f, "working"),
            AgentStatus::Complete => write!(f, "complete"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// 状态表，键固定为三个Agent
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusBoard {
    pub discovery: AgentStatus,
    pub analysis: AgentStatus,
    pub recommendation: AgentStatus,
}

impl StatusBoard {
    pub fn get(&self, agent: AgentType) -> AgentStatus {
        match agent {
            AgentType::Discovery => self.discovery,
            AgentType::Analysis => self.analysis,
            AgentType::Recommendation => self.recommendation,
        }
    }

    /// 推进状态，非法迁移会被拒绝且不修改状态
    pub fn advance(&mut self, agent: AgentType, next: AgentStatus) -> Result<(), PipelineError> {
        let slot = match agent {
            AgentType::Discovery => &mut self.discovery,
            AgentType::Analysis => &mut self.analysis,
            AgentType::Recommendation => &mut self.recommendation,
        };
        if !slot.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                agent,
                from: *slot,
                to: next,
            });
        }
        *slot = next;
        Ok(())
    }

    /// 第一个处于error状态的Agent
    pub fn failed_agent(&self) -> Option<AgentType> {
        AgentType::PIPELINE
            .into_iter()
            .find(|agent| self.get(*agent) == AgentStatus::Error)
    }

    pub fn all_complete(&self) -> bool {
        AgentType::PIPELINE
            .into_iter()
            .all(|agent| self.get(agent) == AgentStatus::Complete)
    }
}

/// 输入类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Description,
    Url,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Description => write!(f, "description"),
            AnalysisMode::Url => write!(f, "url"),
        }
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "description" => Ok(AnalysisMode::Description),
            "url" => Ok(AnalysisMode::Url),
            _ => Err(format!("Unknown analysis mode: {}", s)),
        }
    }
}

/// 一次分析运行的黑板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceState {
    /// 原始输入：业务描述或公司URL
    pub user_input: String,
    pub analysis_mode: AnalysisMode,

    /// Agent间通信日志，只追加
    pub messages: Vec<String>,

    // Discovery Agent
    pub search_queries: Vec<String>,
    pub raw_results: Vec<SearchSnippet>,
    pub competitors: Vec<Competitor>,

    // Analysis Agent
    pub competitive_analysis: String,
    pub market_gaps: Vec<String>,
    pub competitor_weaknesses: Vec<String>,

    // Recommendation Agent
    pub feature_comparison: FeatureComparison,
    pub strategic_recommendations: String,

    pub agent_status: StatusBoard,
}

impl IntelligenceState {
    pub fn new(user_input: impl Into<String>, analysis_mode: AnalysisMode) -> Self {
        Self {
            user_input: user_input.into(),
            analysis_mode,
            messages: Vec::new(),
            search_queries: Vec::new(),
            raw_results: Vec::new(),
            competitors: Vec::new(),
            competitive_analysis: String::new(),
            market_gaps: Vec::new(),
            competitor_weaknesses: Vec::new(),
            feature_comparison: FeatureComparison::default(),
            strategic_recommendations: String::new(),
            agent_status: StatusBoard::default(),
        }
    }

    /// 以 `[Agent名称] 消息` 的格式追加一条日志
    pub fn log(&mut self, agent: AgentType, message: impl AsRef<str>) {
        self.messages
            .push(format!("[{}] {}", agent.display_name(), message.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_pending_and_empty() {
        let state = IntelligenceState::new("CRM for dentists", AnalysisMode::Description);

        assert_eq!(state.agent_status, StatusBoard::default());
        for agent in AgentType::PIPELINE {
            assert_eq!(state.agent_status.get(agent), AgentStatus::Pending);
        }
        assert!(state.messages.is_empty());
        assert!(state.competitors.is_empty());
        assert!(state.feature_comparison.is_empty());
    }

    #[test]
    fn test_status_happy_path() {
        let mut board = StatusBoard::default();
        board.advance(AgentType::Analysis, AgentStatus::Working).unwrap();
        board.advance(AgentType::Analysis, AgentStatus::Complete).unwrap();

        assert_eq!(board.analysis, AgentStatus::Complete);
        assert_eq!(board.discovery, AgentStatus::Pending);
    }

    #[test]
    fn test_error_only_reachable_from_working() {
        let mut board = StatusBoard::default();
        let err = board
            .advance(AgentType::Discovery, AgentStatus::Error)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::InvalidTransition {
                from: AgentStatus::Pending,
                to: AgentStatus::Error,
                ..
            }
        ));
        assert_eq!(board.discovery, AgentStatus::Pending);

        board.advance(AgentType::Discovery, AgentStatus::Working).unwrap();
        board.advance(AgentType::Discovery, AgentStatus::Error).unwrap();
        assert_eq!(board.failed_agent(), Some(AgentType::Discovery));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut board = StatusBoard::default();
        board.advance(AgentType::Recommendation, AgentStatus::Working).unwrap();
        board.advance(AgentType::Recommendation, AgentStatus::Complete).unwrap();

        assert!(board.advance(AgentType::Recommendation, AgentStatus::Working).is_err());
        assert!(board.advance(AgentType::Recommendation, AgentStatus::Error).is_err());
        assert!(!board.all_complete());
    }

    #[test]
    fn test_status_board_serializes_fixed_keys() {
        let value = serde_json::to_value(StatusBoard::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "discovery": "pending",
                "analysis": "pending",
                "recommendation": "pending"
            })
        );
    }

    #[test]
    fn test_log_prefixes_agent_name() {
        let mut state = IntelligenceState::new("x", AnalysisMode::Url);
        state.log(AgentType::Discovery, "Starting competitor discovery");
        state.log(AgentType::Analysis, "Done");

        assert_eq!(
            state.messages,
            vec![
                "[Discovery Agent] Starting competitor discovery",
                "[Analysis Agent] Done"
            ]
        );
    }

    #[test]
    fn test_analysis_mode_parse() {
        assert_eq!("URL".parse::<AnalysisMode>().unwrap(), AnalysisMode::Url);
        assert_eq!(
            "description".parse::<AnalysisMode>().unwrap(),
            AnalysisMode::Description
        );
        assert!("website".parse::<AnalysisMode>().is_err());
    }
}
