//! Pipeline stage implementations.

mod pattern_technique;
mod pattern_weakness;
mod tactic_technique;
mod vulnerability;

pub use pattern_technique::PatternTechniqueStage;
pub use pattern_weakness::PatternWeaknessStage;
pub use tactic_technique::TacticTechniqueStage;
pub use vulnerability::VulnerabilityStage;
