//! Stage 3 - attack-pattern/weakness edges.

use anyhow::Result;
use tracing::info;

use crate::graph::{get_or_create_node, EntityType};
use crate::pipeline::types::{BuildStage, StageContext};
use crate::sources::{self, NameMap, PatternWeaknessDoc};
use serde_json::Map;

/// Links attack patterns to the weaknesses they exploit. The source document
/// is keyed by pattern, each entry holding the associated weakness ids; the
/// pattern registry from stage 2 keeps growing here.
pub struct PatternWeaknessStage;

impl BuildStage for PatternWeaknessStage {
    fn name(&self) -> &str {
        "pattern-weakness"
    }

    fn touches(&self) -> &'static [EntityType] {
        &[EntityType::AttackPattern, EntityType::Weakness]
    }

    fn execute(&self, ctx: &mut StageContext) -> Result<()> {
        let doc: PatternWeaknessDoc =
            sources::load(&ctx.input_dir, sources::PATTERN_WEAKNESS_MAP)?;
        let pattern_names: NameMap = sources::load(&ctx.input_dir, sources::PATTERN_NAMES)?;
        let weakness_names: NameMap = sources::load(&ctx.input_dir, sources::WEAKNESS_NAMES)?;
        info!(patterns = doc.capec_cwe.len(), "linking patterns to weaknesses");

        for (pattern_id, entry) in &doc.capec_cwe {
            let pattern_key = get_or_create_node(
                &mut ctx.graph,
                &mut ctx.registries.attack_pattern,
                &mut ctx.allocator,
                EntityType::AttackPattern,
                pattern_id,
                Some(&pattern_names),
                Map::new(),
            );
            for weakness_id in &entry.cwes {
                let weakness_key = get_or_create_node(
                    &mut ctx.graph,
                    &mut ctx.registries.weakness,
                    &mut ctx.allocator,
                    EntityType::Weakness,
                    weakness_id,
                    Some(&weakness_names),
                    Map::new(),
                );
                ctx.graph.link(&pattern_key, &weakness_key);
            }
        }
        Ok(())
    }
}
