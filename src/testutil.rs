//! Shared fixtures for module tests.

use serde_json::Value;

use crate::bfs::Direction;
use crate::config::{AppConfig, FilterSpec, FreqRange, Layout, MatchBranch};
use crate::entity::EntityId;
use crate::index::EntityIndex;
use crate::report::IntelReport;

pub fn entity(raw: &str) -> EntityId {
    EntityId::parse(raw)
}

pub fn report_from_json(value: Value) -> IntelReport {
    serde_json::from_value(value).unwrap()
}

/// Build an index from (from, to, weight) triples given in legacy string form.
pub fn index_from_edges(edges: &[(&str, &str, u64)]) -> EntityIndex {
    let mut index = EntityIndex::default();
    for (from, to, weight) in edges {
        index.set_edge(&entity(from), &entity(to), *weight);
    }
    index
}

pub fn branch(patterns: Option<&[&str]>, range: Option<(Option<u64>, Option<u64>)>) -> MatchBranch {
    MatchBranch {
        entity: patterns.map(|ps| ps.iter().map(|p| p.to_string()).collect()),
        entity_freq_range: range.map(|(min, max)| FreqRange { min, max }),
    }
}

pub fn spec(match_branch: MatchBranch, avoid: MatchBranch) -> FilterSpec {
    FilterSpec {
        match_branch,
        avoid,
    }
}

/// Spec that matches the given patterns and avoids nothing.
pub fn match_only(patterns: &[&str]) -> FilterSpec {
    spec(branch(Some(patterns), None), branch(None, None))
}

/// Minimal forward-only config with the given root patterns.
pub fn app_config(root_patterns: &[&str]) -> AppConfig {
    AppConfig {
        root_node_spec: match_only(root_patterns),
        cluster_spec: Vec::new(),
        filter_spec: Vec::new(),
        search_depth: 2,
        directions: vec![Direction::Forward],
        layout_name: Layout::Spring,
        max_nodes: 100,
        max_node_text_length: 0,
        filter_post_freq: None,
        entity_prefix_map: Vec::new(),
        colour_map: Default::default(),
        pseudonymize: Vec::new(),
        preserve_node_prefix: false,
    }
}
