//! Pipeline execution engine.

use anyhow::{Context as AnyhowContext, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use super::stages::{
    PatternTechniqueStage, PatternWeaknessStage, TacticTechniqueStage, VulnerabilityStage,
};
use super::types::{BuildStage, StageContext};

/// File name of the serialized graph under the save path.
pub const GRAPH_FILE: &str = "NORB.json";

/// Summary of a completed pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    pub graph_path: PathBuf,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Sequential graph-assembly pipeline
pub struct GraphPipeline {
    stages: Vec<Box<dyn BuildStage>>,
}

impl GraphPipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage to the pipeline
    pub fn add_stage(mut self, stage: Box<dyn BuildStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// The four standard stages in their required order.
    pub fn standard() -> Self {
        Self::new()
            .add_stage(Box::new(TacticTechniqueStage))
            .add_stage(Box::new(PatternTechniqueStage))
            .add_stage(Box::new(PatternWeaknessStage))
            .add_stage(Box::new(VulnerabilityStage))
    }

    /// Run every stage in sequence, persisting each stage's registries as it
    /// completes, then serialize the final graph.
    pub fn run(&self, mut ctx: StageContext) -> Result<BuildOutput> {
        info!("Starting pipeline with {} stages", self.stages.len());
        fs::create_dir_all(&ctx.save_dir)
            .with_context(|| format!("creating save directory {}", ctx.save_dir.display()))?;

        for (idx, stage) in self.stages.iter().enumerate() {
            info!(
                "Running stage {}/{}: {}",
                idx + 1,
                self.stages.len(),
                stage.name()
            );

            stage
                .execute(&mut ctx)
                .with_context(|| format!("Stage '{}' failed", stage.name()))?;

            ctx.registries
                .persist(&ctx.save_dir, stage.touches())
                .with_context(|| format!("Persisting registries for stage '{}'", stage.name()))?;

            debug!(
                stage = stage.name(),
                nodes = ctx.graph.node_count(),
                edges = ctx.graph.edge_count(),
                "stage complete"
            );
        }

        let graph_path = ctx.save_dir.join(GRAPH_FILE);
        ctx.graph.save(&graph_path)?;

        info!("Pipeline completed successfully");
        Ok(BuildOutput {
            graph_path,
            node_count: ctx.graph.node_count(),
            edge_count: ctx.graph.edge_count(),
        })
    }
}

impl Default for GraphPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
