//! Stage 2 - attack-pattern/technique edges.

use anyhow::Result;
use tracing::info;

use crate::graph::{get_or_create_node, EntityType};
use crate::pipeline::types::{BuildStage, StageContext};
use crate::sources::{self, NameMap, PatternTechniqueMap};
use serde_json::Map;

/// Links attack patterns to the techniques they map onto. The technique
/// registry from stage 1 keeps growing here: techniques first referenced by
/// the pattern map are created on the spot.
pub struct PatternTechniqueStage;

impl BuildStage for PatternTechniqueStage {
    fn name(&self) -> &str {
        "pattern-technique"
    }

    fn touches(&self) -> &'static [EntityType] {
        &[EntityType::Technique, EntityType::AttackPattern]
    }

    fn execute(&self, ctx: &mut StageContext) -> Result<()> {
        let attack_map: PatternTechniqueMap = sources::load(&ctx.input_dir, sources::ATTACK_MAP)?;
        let pattern_names: NameMap = sources::load(&ctx.input_dir, sources::PATTERN_NAMES)?;
        let technique_names: NameMap = sources::load(&ctx.input_dir, sources::TECHNIQUE_NAMES)?;
        info!(patterns = attack_map.len(), "linking patterns to techniques");

        for (pattern_id, techniques) in &attack_map {
            let pattern_key = get_or_create_node(
                &mut ctx.graph,
                &mut ctx.registries.attack_pattern,
                &mut ctx.allocator,
                EntityType::AttackPattern,
                pattern_id,
                Some(&pattern_names),
                Map::new(),
            );
            for technique_id in techniques {
                let technique_key = get_or_create_node(
                    &mut ctx.graph,
                    &mut ctx.registries.technique,
                    &mut ctx.allocator,
                    EntityType::Technique,
                    technique_id,
                    Some(&technique_names),
                    Map::new(),
                );
                ctx.graph.link(&technique_key, &pattern_key);
            }
        }
        Ok(())
    }
}
