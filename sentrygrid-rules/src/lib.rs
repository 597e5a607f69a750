pub mod engine;
pub mod presence;
pub mod stats;

pub use engine::{RuleEngine, RuleEngineConfig};
pub use stats::RuleEngineStats;
