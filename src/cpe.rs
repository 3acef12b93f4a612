//! CPE 2.3 platform-identifier decomposition.
//!
//! A CPE string looks like `cpe:2.3:a:acme:widget:1.2:*:*:*:*:*:*:*`; after
//! the literal `cpe:2.3:` prefix the colon-separated fields are part, vendor,
//! product, version. Only vendor, product and version are kept as node
//! metadata.

use serde_json::{Map, Value};
use thiserror::Error;

const CPE_PREFIX: &str = "cpe:2.3:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpeError {
    #[error("platform identifier does not start with `{CPE_PREFIX}`: {0:?}")]
    MissingPrefix(String),
    #[error("platform identifier has {found} fields after `{CPE_PREFIX}`, expected at least 4: {input:?}")]
    TruncatedFields { input: String, found: usize },
}

/// Vendor/product/version fields decomposed from a CPE 2.3 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpeParts {
    pub vendor: String,
    pub product: String,
    pub version: String,
}

impl CpeParts {
    pub fn into_metadata(self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("vendor".to_string(), Value::String(self.vendor));
        metadata.insert("product".to_string(), Value::String(self.product));
        metadata.insert("version".to_string(), Value::String(self.version));
        metadata
    }
}

/// Decompose a CPE 2.3 identifier into vendor, product and version.
pub fn decompose(cpe: &str) -> Result<CpeParts, CpeError> {
    let rest = cpe
        .strip_prefix(CPE_PREFIX)
        .ok_or_else(|| CpeError::MissingPrefix(cpe.to_string()))?;
    let fields: Vec<&str> = rest.split(':').collect();
    if fields.len() < 4 {
        return Err(CpeError::TruncatedFields {
            input: cpe.to_string(),
            found: fields.len(),
        });
    }
    Ok(CpeParts {
        vendor: fields[1].to_string(),
        product: fields[2].to_string(),
        version: fields[3].to_string(),
    })
}
