//! Stage 4 - vulnerability/platform and vulnerability/weakness edges.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cpe;
use crate::graph::{get_or_create_node, EntityType};
use crate::pipeline::types::{BuildStage, StageContext};
use crate::sources::{self, CveMap, NameMap};
use serde_json::{json, Map, Value};

/// Creates a node per vulnerability (carrying its severity score and
/// description), decomposes and links every platform identifier, and links
/// the numeric weakness identifiers. The full or 2015-2020-restricted CVE
/// corpus is selected by the context flag.
pub struct VulnerabilityStage;

/// Weakness references without any digit are catalog placeholders such as
/// `NVD-CWE-Other` or `NVD-CWE-noinfo`, not real weakness ids.
fn is_weakness_placeholder(weakness_id: &str) -> bool {
    !weakness_id.chars().any(|c| c.is_ascii_digit())
}

impl BuildStage for VulnerabilityStage {
    fn name(&self) -> &str {
        "vulnerability-platform-weakness"
    }

    fn touches(&self) -> &'static [EntityType] {
        &[
            EntityType::Weakness,
            EntityType::Vulnerability,
            EntityType::Platform,
        ]
    }

    fn execute(&self, ctx: &mut StageContext) -> Result<()> {
        let corpus = if ctx.recent_cves {
            sources::CVE_MAP_2015_2020
        } else {
            sources::CVE_MAP
        };
        let cve_map: CveMap = sources::load(&ctx.input_dir, corpus)?;
        let weakness_names: NameMap = sources::load(&ctx.input_dir, sources::WEAKNESS_NAMES)?;
        info!(
            vulnerabilities = cve_map.len(),
            corpus, "linking vulnerabilities to platforms and weaknesses"
        );

        for (cve_id, record) in &cve_map {
            let mut metadata = Map::new();
            metadata.insert("weight".to_string(), json!(record.score));
            metadata.insert(
                "description".to_string(),
                Value::String(record.description.clone()),
            );
            let cve_key = get_or_create_node(
                &mut ctx.graph,
                &mut ctx.registries.vulnerability,
                &mut ctx.allocator,
                EntityType::Vulnerability,
                cve_id,
                None,
                metadata,
            );

            for cpe_id in &record.cpes {
                let parts = cpe::decompose(cpe_id)
                    .with_context(|| format!("decomposing platform identifier for {cve_id}"))?;
                let cpe_key = get_or_create_node(
                    &mut ctx.graph,
                    &mut ctx.registries.platform,
                    &mut ctx.allocator,
                    EntityType::Platform,
                    cpe_id,
                    None,
                    parts.into_metadata(),
                );
                ctx.graph.link(&cve_key, &cpe_key);
            }

            for weakness_id in &record.cwes {
                if is_weakness_placeholder(weakness_id) {
                    debug!(%cve_id, %weakness_id, "skipping placeholder weakness reference");
                    continue;
                }
                let weakness_key = get_or_create_node(
                    &mut ctx.graph,
                    &mut ctx.registries.weakness,
                    &mut ctx.allocator,
                    EntityType::Weakness,
                    weakness_id,
                    Some(&weakness_names),
                    Map::new(),
                );
                ctx.graph.link(&weakness_key, &cve_key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        assert!(is_weakness_placeholder("NVD-CWE-Other"));
        assert!(is_weakness_placeholder("NVD-CWE-noinfo"));
        assert!(is_weakness_placeholder(""));
        assert!(!is_weakness_placeholder("CWE-79"));
        assert!(!is_weakness_placeholder("79"));
    }
}
