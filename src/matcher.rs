use std::collections::BTreeSet;

use crate::config::{FilterSpec, FreqRange, MatchBranch};
use crate::entity::EntityId;
use crate::index::EntityIndex;

/// Match one entity-name pattern against a rendered entity identifier.
///
/// Pattern forms: exact, `foo*` prefix, `*foo` suffix, and `?:foo`, which
/// compares the identifier after its first colon against the pattern after
/// the `?:` tag (identifiers without a colon never match that form).
fn pattern_matches(pattern: &str, entity: &str) -> bool {
    if let Some(stripped) = pattern.strip_prefix("?:") {
        return match entity.split_once(':') {
            Some((_, rest)) => plain_pattern_matches(stripped, rest),
            None => false,
        };
    }
    plain_pattern_matches(pattern, entity)
}

fn plain_pattern_matches(pattern: &str, entity: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        entity.starts_with(prefix)
    } else if let Some(suffix) = pattern.strip_prefix('*') {
        entity.ends_with(suffix)
    } else {
        pattern == entity
    }
}

/// Inclusive bounds on an entity's total outgoing weight. An absent range
/// (or an absent bound) constrains nothing.
fn within_range(freq: u64, range: Option<&FreqRange>) -> bool {
    let Some(range) = range else { return true };
    if let Some(max) = range.max {
        if freq > max {
            return false;
        }
    }
    if let Some(min) = range.min {
        if freq < min {
            return false;
        }
    }
    true
}

/// A range with neither bound set constrains nothing and counts as absent.
fn effective_range(branch: &MatchBranch) -> Option<&FreqRange> {
    branch
        .entity_freq_range
        .as_ref()
        .filter(|range| range.min.is_some() || range.max.is_some())
}

fn branch_selects(branch: &MatchBranch, index: &EntityIndex, id: &EntityId) -> bool {
    let range = effective_range(branch);
    match &branch.entity {
        Some(patterns) => {
            let rendered = id.to_string();
            patterns.iter().any(|p| pattern_matches(p, &rendered))
                && within_range(index.out_weight(id), range)
        }
        // no pattern list: the frequency range alone decides
        None => within_range(index.out_weight(id), range),
    }
}

/// Evaluate a filter specification against the index and return the matching
/// entities. A match branch with neither a pattern list nor a frequency range
/// matches nothing. The avoid branch only ever bans entities the match branch
/// already selected. No result ordering is guaranteed.
pub fn match_entities(index: &EntityIndex, spec: &FilterSpec) -> Vec<EntityId> {
    let match_branch = &spec.match_branch;
    if match_branch.entity.is_none() && effective_range(match_branch).is_none() {
        return Vec::new();
    }

    let candidates: BTreeSet<&EntityId> = index
        .entities()
        .filter(|id| branch_selects(match_branch, index, id))
        .collect();

    let avoid = &spec.avoid;
    let banned: BTreeSet<&EntityId> =
        if avoid.entity.is_none() && effective_range(avoid).is_none() {
            BTreeSet::new()
        } else {
            candidates
                .iter()
                .filter(|id| branch_selects(avoid, index, id))
                .copied()
                .collect()
        };

    candidates
        .difference(&banned)
        .map(|id| (*id).clone())
        .collect()
}

/// Seed entities for traversal, per the configured root-node specification.
/// Re-run after clustering: a matched root may now be a cluster identifier.
pub fn select_root_nodes(index: &EntityIndex, root_node_spec: &FilterSpec) -> Vec<EntityId> {
    match_entities(index, root_node_spec)
}
