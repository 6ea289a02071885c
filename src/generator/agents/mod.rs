pub mod analysis;
pub mod discovery;
pub mod recommendation;

pub use analysis::AnalysisAgent;
pub use discovery::DiscoveryAgent;
pub use recommendation::RecommendationAgent;
