use std::time::Instant;

use tracing::{info, info_span, Instrument};

use crate::error::PipelineError;
use crate::generator::agents::{AnalysisAgent, DiscoveryAgent, RecommendationAgent};
use crate::generator::blackboard::{AnalysisMode, IntelligenceState};
use crate::generator::context::GeneratorContext;
use crate::generator::step_forward_agent::StepForwardAgent;

/// 竞品情报流水线编排器：discovery -> analysis -> recommendation
#[derive(Default)]
pub struct IntelligenceOrchestrator;

impl IntelligenceOrchestrator {
    /// 执行完整的分析流程
    ///
    /// 凭证缺失时在任何网络调用之前返回 `MissingCredential`；
    /// 某一步失败时返回 `StepFailed`，其中携带失败时的部分黑板。
    pub async fn run(
        &self,
        context: &GeneratorContext,
        user_input: &str,
        analysis_mode: AnalysisMode,
    ) -> Result<IntelligenceState, PipelineError> {
        context.config.ensure_credentials()?;

        let mut state = IntelligenceState::new(user_input.trim(), analysis_mode);
        let started = Instant::now();
        info!(mode = %analysis_mode, "🚀 Starting competitor intelligence pipeline");

        self.execute_agent(&DiscoveryAgent, context, &mut state)
            .await?;
        self.execute_agent(&AnalysisAgent, context, &mut state)
            .await?;
        self.execute_agent(&RecommendationAgent, context, &mut state)
            .await?;

        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            competitors = state.competitors.len(),
            features = state.feature_comparison.len(),
            "✓ Pipeline complete"
        );
        Ok(state)
    }

    /// 执行单个智能体，失败时附带当前黑板
    async fn execute_agent<T>(
        &self,
        agent: &T,
        context: &GeneratorContext,
        state: &mut IntelligenceState,
    ) -> Result<(), PipelineError>
    where
        T: StepForwardAgent,
    {
        let agent_type = agent.agent_type();
        let started = Instant::now();

        let result = agent
            .execute(context, state)
            .instrument(info_span!("agent", agent = %agent_type))
            .await;

        match result {
            Ok(()) => {
                info!(
                    agent = %agent_type,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "{} finished",
                    agent_type.display_name()
                );
                Ok(())
            }
            Err(err) => Err(PipelineError::StepFailed {
                agent: agent_type,
                state: Box::new(state.clone()),
                source: Box::new(err),
            }),
        }
    }
}
