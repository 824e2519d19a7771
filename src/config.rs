use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::bfs::Direction;

/// TOML-backed run configuration loaded once up front.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Seed-entity selection, re-evaluated after clustering.
    pub root_node_spec: FilterSpec,
    /// Ordered cluster passes; later entries see the index already mutated
    /// by earlier ones.
    #[serde(default)]
    pub cluster_spec: Vec<ClusterSpec>,
    /// Filters applied sequentially, each on the previous stage's output.
    #[serde(default)]
    pub filter_spec: Vec<FilterSpec>,

    pub search_depth: u32,
    pub directions: Vec<Direction>,
    pub layout_name: Layout,
    pub max_nodes: usize,
    /// 0 disables name truncation.
    #[serde(default)]
    pub max_node_text_length: usize,
    /// Minimum post count for a post group to survive aggregation.
    #[serde(default)]
    pub filter_post_freq: Option<usize>,

    #[serde(default)]
    pub entity_prefix_map: Vec<CategoryRule>,
    #[serde(default)]
    pub colour_map: std::collections::BTreeMap<String, String>,
    /// Categories whose node names are replaced with hashed tags.
    #[serde(default)]
    pub pseudonymize: Vec<String>,
    /// Debug aid: keep full entity identifiers as display names.
    #[serde(default)]
    pub preserve_node_prefix: bool,
}

/// Two-branch entity filter. Both branches are structurally required; a spec
/// missing either one is rejected at load time.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSpec {
    #[serde(rename = "match")]
    pub match_branch: MatchBranch,
    pub avoid: MatchBranch,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchBranch {
    #[serde(default)]
    pub entity: Option<Vec<String>>,
    #[serde(default)]
    pub entity_freq_range: Option<FreqRange>,
}

/// Inclusive bounds on an entity's total outgoing edge weight.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FreqRange {
    #[serde(default)]
    pub min: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSpec {
    pub id: String,
    pub filter: FilterSpec,
}

/// First matching prefix wins; rules are checked in declared order.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub prefixes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Spring,
    Random,
    Shell,
    Spectral,
}

/// Load and parse the TOML run configuration. Unknown layout names and
/// structurally incomplete filter specs are rejected here, before any work
/// starts.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    if config.directions.is_empty() {
        bail!("config error: directions must name forward, backward, or both");
    }
    Ok(config)
}
