use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw intelligence report: post id -> post record. This is the only
/// bit-relevant external contract.
pub type IntelReport = BTreeMap<String, PostRecord>;

/// One post as it appears on the wire. `author` and `page_url` are required;
/// every other key holds a list of per-sentence extraction records.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRecord {
    pub author: String,
    pub page_url: String,
    #[serde(flatten)]
    pub sentences: BTreeMap<String, Vec<Extraction>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub entity: Vec<String>,
}

/// Load and decode a JSON intelligence report. A post missing a required
/// field aborts the whole run; there is no partial recovery.
pub fn load_report(path: &Path) -> Result<IntelReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file: {}", path.display()))?;
    let report: IntelReport = serde_json::from_str(&content)
        .with_context(|| format!("Failed to decode report JSON: {}", path.display()))?;
    Ok(report)
}
