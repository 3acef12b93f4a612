//! Graph model: taxonomy node attributes, symmetric edge insertion, and the
//! serialized node/edge-list document.
//!
//! The graph is directed, but every relation is inserted as a mutual pair of
//! edges so it behaves as undirected. Node handles are strings of the form
//! `"<entity_type>_<synthetic_id>"`; they are internal to the pipeline and
//! never exposed beyond the serialized document.

use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::registry::{IdAllocator, IdRegistry};
use crate::sources::NameMap;

/// Display-name sentinel used whenever a name-table lookup misses.
pub const NAME_FALLBACK: &str = "Name not found";

/// The six taxonomy entity types in the unified graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Tactic,
    Technique,
    AttackPattern,
    Weakness,
    Vulnerability,
    Platform,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Tactic => "tactic",
            EntityType::Technique => "technique",
            EntityType::AttackPattern => "attack_pattern",
            EntityType::Weakness => "weakness",
            EntityType::Vulnerability => "vulnerability",
            EntityType::Platform => "platform",
        }
    }

    /// File name of this type's persisted registry document. Tactics have no
    /// native identifier and are registered by name.
    pub fn registry_file(self) -> &'static str {
        match self {
            EntityType::Tactic => "tactic_name_to_norb_id.json",
            EntityType::Technique => "technique_id_to_norb_id.json",
            EntityType::AttackPattern => "attack_pattern_id_to_norb_id.json",
            EntityType::Weakness => "weakness_id_to_norb_id.json",
            EntityType::Vulnerability => "vulnerability_id_to_norb_id.json",
            EntityType::Platform => "platform_id_to_norb_id.json",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes stored on every node, serialized with the on-disk key names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAttrs {
    /// Source taxonomy's native identifier; empty for tactics.
    pub original_id: String,
    pub datatype: EntityType,
    /// Resolved display name; empty for vulnerabilities and platforms.
    pub name: String,
    /// Free-form metadata; `{weight, description}` for vulnerabilities,
    /// `{vendor, product, version}` for platforms, empty otherwise.
    pub metadata: Map<String, Value>,
}

/// The unified threat knowledge graph under construction.
#[derive(Debug, Default)]
pub struct ThreatGraph {
    nodes: IndexMap<String, NodeAttrs>,
    edges: IndexSet<(String, String)>,
}

impl ThreatGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, key: String, attrs: NodeAttrs) {
        self.nodes.insert(key, attrs);
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&NodeAttrs> {
        self.nodes.get(key)
    }

    pub fn has_edge(&self, src: &str, dst: &str) -> bool {
        self.edges.contains(&(src.to_string(), dst.to_string()))
    }

    /// Insert a mutual relation between two nodes: `a -> b` if absent and
    /// `b -> a` if absent. Re-linking an existing pair is a no-op, and
    /// self-loops are rejected.
    pub fn link(&mut self, key_a: &str, key_b: &str) {
        if key_a == key_b {
            return;
        }
        self.edges.insert((key_a.to_string(), key_b.to_string()));
        self.edges.insert((key_b.to_string(), key_a.to_string()));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&String, &NodeAttrs)> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &(String, String)> {
        self.edges.iter()
    }

    /// Write the graph as `{nodes: [[key, attrs]...], edges: [[src, dst, {}]...]}`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let document = GraphDocument {
            nodes: self.nodes.iter().collect(),
            edges: self
                .edges
                .iter()
                .map(|(u, v)| (u, v, Map::new()))
                .collect(),
        };
        let file = File::create(path)
            .with_context(|| format!("writing graph to {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &document)
            .with_context(|| format!("serializing graph to {}", path.display()))?;
        Ok(())
    }
}

/// On-disk shape of the final graph. Tuples serialize as JSON arrays, which
/// yields the `[[key, attrs], ...]` node list and `[[src, dst, attrs], ...]`
/// edge list.
#[derive(Serialize)]
struct GraphDocument<'a> {
    nodes: Vec<(&'a String, &'a NodeAttrs)>,
    edges: Vec<(&'a String, &'a String, Map<String, Value>)>,
}

fn node_key(datatype: EntityType, norb_id: &str) -> String {
    format!("{}_{}", datatype.as_str(), norb_id)
}

/// Get-or-create the node for `original_id`. When the identifier is already
/// registered, the existing key is returned and the graph is untouched.
/// Otherwise a synthetic identifier is allocated, the display name resolved
/// (`names` lookup with the [`NAME_FALLBACK`] sentinel; `None` for types that
/// carry no name), and the node inserted and registered.
pub fn get_or_create_node(
    graph: &mut ThreatGraph,
    registry: &mut IdRegistry,
    alloc: &mut IdAllocator,
    datatype: EntityType,
    original_id: &str,
    names: Option<&NameMap>,
    metadata: Map<String, Value>,
) -> String {
    if let Some(norb_id) = registry.get(original_id) {
        return node_key(datatype, norb_id);
    }
    let norb_id = alloc.allocate();
    let key = node_key(datatype, &norb_id);
    let name = match names {
        Some(table) => table
            .get(original_id)
            .cloned()
            .unwrap_or_else(|| NAME_FALLBACK.to_string()),
        None => String::new(),
    };
    graph.add_node(
        key.clone(),
        NodeAttrs {
            original_id: original_id.to_string(),
            datatype,
            name,
            metadata,
        },
    );
    registry.insert(original_id, norb_id);
    key
}

/// Get-or-create a tactic node. Tactics have no native identifier: the
/// registry is keyed by tactic name, the node's `original_id` is empty, and
/// the name doubles as the display name.
pub fn get_or_create_tactic(
    graph: &mut ThreatGraph,
    registry: &mut IdRegistry,
    alloc: &mut IdAllocator,
    name: &str,
) -> String {
    if let Some(norb_id) = registry.get(name) {
        return node_key(EntityType::Tactic, norb_id);
    }
    let norb_id = alloc.allocate();
    let key = node_key(EntityType::Tactic, &norb_id);
    graph.add_node(
        key.clone(),
        NodeAttrs {
            original_id: String::new(),
            datatype: EntityType::Tactic,
            name: name.to_string(),
            metadata: Map::new(),
        },
    );
    registry.insert(name, norb_id);
    key
}
