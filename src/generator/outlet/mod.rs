use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use crate::generator::blackboard::{AnalysisMode, IntelligenceState, StatusBoard};
use crate::types::{Competitor, FeatureComparison};

pub mod text_report;

pub use text_report::render_text;

/// 控制台输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// 人类可读的分节报告
    #[default]
    Text,
    /// 完整黑板的JSON
    Json,
}

pub trait Outlet {
    async fn save(&self, state: &IntelligenceState) -> Result<()>;
}

/// 导出到文件的报告结构
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportExport<'a> {
    pub input: &'a str,
    pub mode: AnalysisMode,
    pub generated_at: String,
    pub competitors: &'a [Competitor],
    pub analysis: &'a str,
    pub market_gaps: &'a [String],
    pub competitor_weaknesses: &'a [String],
    pub comparison: &'a FeatureComparison,
    pub recommendations: &'a str,
    pub agent_status: &'a StatusBoard,
    pub messages: &'a [String],
}

impl<'a> ReportExport<'a> {
    pub fn from_state(state: &'a IntelligenceState, generated_at: DateTime<Utc>) -> Self {
        Self {
            input: &state.user_input,
            mode: state.analysis_mode,
            generated_at: generated_at.to_rfc3339(),
            competitors: &state.competitors,
            analysis: &state.competitive_analysis,
            market_gaps: &state.market_gaps,
            competitor_weaknesses: &state.competitor_weaknesses,
            comparison: &state.feature_comparison,
            recommendations: &state.strategic_recommendations,
            agent_status: &state.agent_status,
            messages: &state.messages,
        }
    }
}

/// 把报告写入JSON文件
pub struct JsonFileOutlet {
    path: PathBuf,
}

impl JsonFileOutlet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Outlet for JsonFileOutlet {
    async fn save(&self, state: &IntelligenceState) -> Result<()> {
        if let Some(parent_dir) = self.path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                tokio::fs::create_dir_all(parent_dir)
                    .await
                    .with_context(|| format!("Failed to create {}", parent_dir.display()))?;
            }
        }

        let report = ReportExport::from_state(state, Utc::now());
        let content = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write report to {}", self.path.display()))?;

        info!("💾 Results saved to: {}", self.path.display());
        Ok(())
    }
}

/// 把报告打印到标准输出
pub struct ConsoleOutlet {
    format: OutputFormat,
}

impl ConsoleOutlet {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn render(&self, state: &IntelligenceState) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(render_text(state)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(state)?),
        }
    }
}

impl Outlet for ConsoleOutlet {
    async fn save(&self, state: &IntelligenceState) -> Result<()> {
        println!("{}", self.render(state)?);
        Ok(())
    }
}
