//! Synthetic identifier allocation and per-entity-type registries.
//!
//! Every entity encountered by the pipeline gets one 5-digit zero-padded
//! synthetic identifier from a single shared counter. Each entity type keeps
//! its own registry mapping the source taxonomy's original identifier (or,
//! for tactics, the tactic name) to the synthetic identifier.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

use crate::graph::EntityType;

/// Subdirectory under the save path holding the per-type registry documents.
pub const REGISTRY_DIR: &str = "NORB/original_id_to_norb_id";

/// Issues fresh synthetic identifiers from one monotonic counter shared
/// across every entity type in a run.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a fresh, previously-unused 5-digit zero-padded identifier.
    /// The first identifier issued is `"00001"`.
    pub fn allocate(&mut self) -> String {
        self.next += 1;
        format!("{:05}", self.next)
    }
}

/// Mapping from original identifier to synthetic identifier for one entity
/// type. Insertion-ordered so persisted documents are deterministic for a
/// given input.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdRegistry {
    map: IndexMap<String, String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, original_id: &str) -> Option<&str> {
        self.map.get(original_id).map(String::as_str)
    }

    pub fn contains(&self, original_id: &str) -> bool {
        self.map.contains_key(original_id)
    }

    /// Return the synthetic identifier for `original_id`, allocating and
    /// recording a new one on first encounter.
    pub fn lookup_or_create(&mut self, alloc: &mut IdAllocator, original_id: &str) -> String {
        if let Some(norb_id) = self.map.get(original_id) {
            return norb_id.clone();
        }
        let norb_id = alloc.allocate();
        self.map.insert(original_id.to_string(), norb_id.clone());
        norb_id
    }

    pub fn insert(&mut self, original_id: &str, norb_id: String) {
        self.map.insert(original_id.to_string(), norb_id);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }
}

/// One registry per entity type, threaded through the pipeline stages in
/// memory and persisted after every stage that touches it.
#[derive(Debug, Default)]
pub struct RegistrySet {
    pub tactic: IdRegistry,
    pub technique: IdRegistry,
    pub attack_pattern: IdRegistry,
    pub weakness: IdRegistry,
    pub vulnerability: IdRegistry,
    pub platform: IdRegistry,
}

impl RegistrySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self, datatype: EntityType) -> &IdRegistry {
        match datatype {
            EntityType::Tactic => &self.tactic,
            EntityType::Technique => &self.technique,
            EntityType::AttackPattern => &self.attack_pattern,
            EntityType::Weakness => &self.weakness,
            EntityType::Vulnerability => &self.vulnerability,
            EntityType::Platform => &self.platform,
        }
    }

    /// Write the registries for `types` under `<save_dir>/NORB/original_id_to_norb_id/`,
    /// one flat JSON document per type, overwriting any prior content.
    pub fn persist(&self, save_dir: &Path, types: &[EntityType]) -> Result<()> {
        let dir = save_dir.join(REGISTRY_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating registry directory {}", dir.display()))?;
        for &datatype in types {
            let path = dir.join(datatype.registry_file());
            let file = File::create(&path)
                .with_context(|| format!("writing registry {}", path.display()))?;
            serde_json::to_writer(BufWriter::new(file), self.registry(datatype))
                .with_context(|| format!("serializing registry {}", path.display()))?;
            debug!(
                datatype = datatype.as_str(),
                entries = self.registry(datatype).len(),
                "persisted registry"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_allocator_zero_pads_to_five_digits() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.allocate(), "00001");
        assert_eq!(alloc.allocate(), "00002");
    }

    #[test]
    fn test_allocator_is_monotonic() {
        let mut alloc = IdAllocator::new();
        let a: u32 = alloc.allocate().parse().unwrap();
        let b: u32 = alloc.allocate().parse().unwrap();
        let c: u32 = alloc.allocate().parse().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_lookup_or_create_is_stable() {
        let mut alloc = IdAllocator::new();
        let mut reg = IdRegistry::new();
        let first = reg.lookup_or_create(&mut alloc, "T1059");
        let second = reg.lookup_or_create(&mut alloc, "T1059");
        assert_eq!(first, second);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_counter_is_shared_across_registries() {
        let mut alloc = IdAllocator::new();
        let mut techniques = IdRegistry::new();
        let mut weaknesses = IdRegistry::new();
        let t = techniques.lookup_or_create(&mut alloc, "T1059");
        let w = weaknesses.lookup_or_create(&mut alloc, "79");
        assert_ne!(t, w);
        assert_eq!(w, "00002");
    }

    #[test]
    fn test_persist_writes_flat_documents() {
        let mut alloc = IdAllocator::new();
        let mut set = RegistrySet::new();
        set.technique.lookup_or_create(&mut alloc, "T1059");
        set.tactic.lookup_or_create(&mut alloc, "execution");

        let dir = tempfile::tempdir().unwrap();
        set.persist(dir.path(), &[EntityType::Technique, EntityType::Tactic])
            .unwrap();

        let technique_path = dir
            .path()
            .join(REGISTRY_DIR)
            .join("technique_id_to_norb_id.json");
        let content = std::fs::read_to_string(technique_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["T1059"], "00001");

        let tactic_path = dir
            .path()
            .join(REGISTRY_DIR)
            .join("tactic_name_to_norb_id.json");
        let content = std::fs::read_to_string(tactic_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["execution"], "00002");
    }

    #[test]
    fn test_persist_overwrites_prior_content() {
        let mut alloc = IdAllocator::new();
        let mut set = RegistrySet::new();
        set.weakness.lookup_or_create(&mut alloc, "79");

        let dir = tempfile::tempdir().unwrap();
        set.persist(dir.path(), &[EntityType::Weakness]).unwrap();
        set.weakness.lookup_or_create(&mut alloc, "89");
        set.persist(dir.path(), &[EntityType::Weakness]).unwrap();

        let path = dir.path().join(REGISTRY_DIR).join("weakness_id_to_norb_id.json");
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_distinct_ids_get_distinct_synthetic_ids(
            ids in proptest::collection::hash_set("[A-Z]{1,4}-?[0-9]{1,4}", 1..50)
        ) {
            let mut alloc = IdAllocator::new();
            let mut reg = IdRegistry::new();
            let mut seen = HashSet::new();
            for id in &ids {
                let norb_id = reg.lookup_or_create(&mut alloc, id);
                prop_assert_eq!(norb_id.len(), 5);
                prop_assert!(norb_id.chars().all(|c| c.is_ascii_digit()));
                prop_assert!(seen.insert(norb_id));
            }
        }
    }
}
