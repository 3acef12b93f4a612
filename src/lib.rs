// Library exports for the NORB graph builder
pub mod cpe;
pub mod graph;
pub mod pipeline;
pub mod registry;
pub mod sources;

// Re-export key types for convenience
pub use cpe::{decompose, CpeError, CpeParts};
pub use graph::{get_or_create_node, get_or_create_tactic, EntityType, NodeAttrs, ThreatGraph};
pub use pipeline::{
    BuildOutput, BuildStage, GraphPipeline, PatternTechniqueStage, PatternWeaknessStage,
    StageContext, TacticTechniqueStage, VulnerabilityStage,
};
pub use registry::{IdAllocator, IdRegistry, RegistrySet};
