//! Stage 1 - tactic/technique edges.

use anyhow::Result;
use tracing::info;

use crate::graph::{get_or_create_node, get_or_create_tactic, EntityType};
use crate::pipeline::types::{BuildStage, StageContext};
use crate::sources::{self, NameMap, TacticMap};
use serde_json::Map;

/// Creates technique and tactic nodes and links every (technique, tactic)
/// pair. Tactics have no native identifier and are deduplicated by name.
pub struct TacticTechniqueStage;

impl BuildStage for TacticTechniqueStage {
    fn name(&self) -> &str {
        "tactic-technique"
    }

    fn touches(&self) -> &'static [EntityType] {
        &[EntityType::Technique, EntityType::Tactic]
    }

    fn execute(&self, ctx: &mut StageContext) -> Result<()> {
        let tactic_map: TacticMap = sources::load(&ctx.input_dir, sources::TACTIC_MAP)?;
        let technique_names: NameMap = sources::load(&ctx.input_dir, sources::TECHNIQUE_NAMES)?;
        info!(techniques = tactic_map.len(), "linking tactics to techniques");

        for (technique_id, tactics) in &tactic_map {
            let technique_key = get_or_create_node(
                &mut ctx.graph,
                &mut ctx.registries.technique,
                &mut ctx.allocator,
                EntityType::Technique,
                technique_id,
                Some(&technique_names),
                Map::new(),
            );
            for tactic_name in tactics {
                let tactic_key = get_or_create_tactic(
                    &mut ctx.graph,
                    &mut ctx.registries.tactic,
                    &mut ctx.allocator,
                    tactic_name,
                );
                ctx.graph.link(&tactic_key, &technique_key);
            }
        }
        Ok(())
    }
}
