pub mod comparison;
pub mod competitor;
pub mod lenient;
pub mod search;

pub use comparison::{FeatureComparison, FeatureEntry, Level};
pub use competitor::Competitor;
pub use search::{SearchHit, SearchSnippet};
