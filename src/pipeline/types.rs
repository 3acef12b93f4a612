//! Pipeline types and trait definitions.

use anyhow::Result;
use std::path::PathBuf;

use crate::graph::{EntityType, ThreatGraph};
use crate::registry::{IdAllocator, RegistrySet};

/// State threaded through the pipeline stages: the graph under construction,
/// the per-type identifier registries, and the shared allocator.
#[derive(Debug, Default)]
pub struct StageContext {
    /// Folder holding the source mappings and name tables
    pub input_dir: PathBuf,

    /// Folder receiving the graph and registry documents
    pub save_dir: PathBuf,

    /// Use the 2015-2020-restricted vulnerability corpus
    pub recent_cves: bool,

    pub graph: ThreatGraph,
    pub registries: RegistrySet,
    pub allocator: IdAllocator,
}

impl StageContext {
    pub fn new(input_dir: PathBuf, save_dir: PathBuf, recent_cves: bool) -> Self {
        Self {
            input_dir,
            save_dir,
            recent_cves,
            graph: ThreatGraph::new(),
            registries: RegistrySet::new(),
            allocator: IdAllocator::new(),
        }
    }
}

/// Trait for pipeline stages
pub trait BuildStage {
    /// Name of this stage
    fn name(&self) -> &str;

    /// Registries this stage creates or extends; the runner persists them
    /// after the stage completes.
    fn touches(&self) -> &'static [EntityType];

    /// Execute this stage, growing the graph and registries in place
    fn execute(&self, ctx: &mut StageContext) -> Result<()>;
}
