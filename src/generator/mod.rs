pub mod agents;
pub mod blackboard;
pub mod context;
pub mod orchestrator;
pub mod outlet;
pub mod step_forward_agent;
pub mod workflow;

pub use blackboard::{AgentStatus, AgentType, AnalysisMode, IntelligenceState, StatusBoard};
pub use context::GeneratorContext;
pub use orchestrator::IntelligenceOrchestrator;
