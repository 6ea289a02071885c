use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::Config;
use crate::generator::blackboard::{AnalysisMode, IntelligenceState};
use crate::generator::context::GeneratorContext;
use crate::generator::orchestrator::IntelligenceOrchestrator;
use crate::generator::outlet::{ConsoleOutlet, JsonFileOutlet, Outlet, OutputFormat};

/// 一次命令行分析的参数
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeOptions {
    pub input: String,
    pub analysis_mode: AnalysisMode,
    pub format: OutputFormat,
    pub output_path: Option<PathBuf>,
}

/// 启动竞品分析工作流
pub async fn launch(config: &Config, options: &AnalyzeOptions) -> Result<IntelligenceState> {
    // 凭证缺失时不创建任何客户端
    config.ensure_credentials()?;
    let context = GeneratorContext::new(config.clone())?;
    run_with_context(&context, options).await
}

/// 使用给定的服务上下文执行分析并输出结果
pub async fn run_with_context(
    context: &GeneratorContext,
    options: &AnalyzeOptions,
) -> Result<IntelligenceState> {
    info!("📋 Input: {}", options.input);
    info!("📋 Mode: {}", options.analysis_mode);

    let result = IntelligenceOrchestrator
        .run(context, &options.input, options.analysis_mode)
        .await;

    let state = match result {
        Ok(state) => state,
        Err(err) => {
            if let Some(partial) = err.partial_state() {
                for message in &partial.messages {
                    error!("  {}", message);
                }
            }
            return Err(err).context("Competitor analysis failed");
        }
    };

    ConsoleOutlet::new(options.format).save(&state).await?;

    if let Some(path) = &options.output_path {
        JsonFileOutlet::new(path).save(&state).await?;
    }

    Ok(state)
}
