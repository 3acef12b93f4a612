//! Named-dataset loading.
//!
//! Each pipeline stage reads one or two source mappings plus name-lookup
//! tables from the input data folder. Files are plain JSON, optionally
//! gzip-compressed with a `.gz` suffix.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

pub const TACTIC_MAP: &str = "technique_tactic_map.json";
pub const TECHNIQUE_NAMES: &str = "technique_name_map.json";
pub const ATTACK_MAP: &str = "capec_technique_map.json";
pub const PATTERN_NAMES: &str = "capec_names.json";
pub const PATTERN_WEAKNESS_MAP: &str = "capec_cwe_mapping.json";
pub const WEAKNESS_NAMES: &str = "cwe_names.json";
pub const CVE_MAP: &str = "cve_map_cpe_cwe_score.json";
pub const CVE_MAP_2015_2020: &str = "cve_map_cpe_cwe_score_2015_2020.json";

/// Display-name lookup table: original identifier to human-readable name.
pub type NameMap = HashMap<String, String>;

/// Technique id to the list of tactic names it implements.
pub type TacticMap = IndexMap<String, Vec<String>>;

/// Attack-pattern id to the list of technique ids it maps onto.
pub type PatternTechniqueMap = IndexMap<String, Vec<String>>;

/// Wrapper document of `capec_cwe_mapping.json`: the pairs live under a
/// `capec_cwe` key.
#[derive(Debug, Deserialize)]
pub struct PatternWeaknessDoc {
    pub capec_cwe: IndexMap<String, WeaknessList>,
}

#[derive(Debug, Deserialize)]
pub struct WeaknessList {
    pub cwes: Vec<String>,
}

/// Vulnerability id to its platform list, weakness list, severity score and
/// description.
pub type CveMap = IndexMap<String, CveRecord>;

#[derive(Debug, Deserialize)]
pub struct CveRecord {
    pub cpes: Vec<String>,
    pub cwes: Vec<String>,
    pub score: f64,
    pub description: String,
}

/// Load a named dataset from the input folder. When `file_name` is absent on
/// disk but `<file_name>.gz` exists, the compressed variant is read instead.
/// Missing or malformed files abort the run with the failing path in the
/// error chain.
pub fn load<T: DeserializeOwned>(input_dir: &Path, file_name: &str) -> Result<T> {
    let mut path = input_dir.join(file_name);
    if !path.exists() {
        let gz = input_dir.join(format!("{file_name}.gz"));
        if gz.exists() {
            path = gz;
        }
    }
    debug!(path = %path.display(), "loading dataset");
    let file =
        File::open(&path).with_context(|| format!("opening dataset {}", path.display()))?;
    let reader = BufReader::new(file);
    let parsed = if path.extension().is_some_and(|ext| ext == "gz") {
        serde_json::from_reader(GzDecoder::new(reader))
    } else {
        serde_json::from_reader(reader)
    };
    parsed.with_context(|| format!("parsing dataset {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_load_plain_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TECHNIQUE_NAMES),
            r#"{"T1059": "Command and Scripting Interpreter"}"#,
        )
        .unwrap();
        let names: NameMap = load(dir.path(), TECHNIQUE_NAMES).unwrap();
        assert_eq!(names["T1059"], "Command and Scripting Interpreter");
    }

    #[test]
    fn test_load_falls_back_to_gzip_variant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("{TACTIC_MAP}.gz"));
        let file = std::fs::File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(br#"{"T1059": ["execution"]}"#)
            .unwrap();
        encoder.finish().unwrap();

        let map: TacticMap = load(dir.path(), TACTIC_MAP).unwrap();
        assert_eq!(map["T1059"], vec!["execution"]);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load::<NameMap>(dir.path(), CVE_MAP).unwrap_err();
        assert!(err.to_string().contains(CVE_MAP));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(WEAKNESS_NAMES), "{not json").unwrap();
        let err = load::<NameMap>(dir.path(), WEAKNESS_NAMES).unwrap_err();
        assert!(err.to_string().contains("parsing dataset"));
    }

    #[test]
    fn test_cve_record_shape() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CVE_MAP),
            r#"{"CVE-2020-0001": {"cpes": ["cpe:2.3:a:acme:widget:1.2:*:*:*:*:*:*:*"],
                 "cwes": ["79"], "score": 7.5, "description": "demo"}}"#,
        )
        .unwrap();
        let map: CveMap = load(dir.path(), CVE_MAP).unwrap();
        let record = &map["CVE-2020-0001"];
        assert_eq!(record.cpes.len(), 1);
        assert_eq!(record.score, 7.5);
    }
}
