pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod search;
pub mod server;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::PipelineError;
pub use generator::IntelligenceOrchestrator;
pub use generator::blackboard::{AgentStatus, AgentType, AnalysisMode, IntelligenceState};
pub use generator::workflow::launch;
