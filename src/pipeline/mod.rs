//! 4-stage graph-assembly pipeline.
//!
//! The pipeline grows one unified knowledge graph across four strictly
//! sequential stages, one per cross-taxonomy relation:
//! 1. Tactic-Technique - techniques keyed by id, tactics keyed by name
//! 2. Pattern-Technique - extends the technique registry from stage 1
//! 3. Pattern-Weakness - extends the pattern registry from stage 2
//! 4. Vulnerability-Platform/Weakness - CVE records with CPE decomposition

mod execution;
mod stages;
mod types;

pub use execution::{BuildOutput, GraphPipeline};
pub use types::{BuildStage, StageContext};

pub use stages::{
    PatternTechniqueStage, PatternWeaknessStage, TacticTechniqueStage, VulnerabilityStage,
};
