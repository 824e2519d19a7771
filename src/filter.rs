use std::collections::BTreeSet;

use tracing::debug;

use crate::config::FilterSpec;
use crate::entity::EntityId;
use crate::index::EntityIndex;
use crate::matcher::match_entities;

/// Prune matched entities (and every edge pointing at them) from the index.
/// Root nodes are never removed, even when they match the filter's own
/// patterns. Returns a new index; the caller's snapshot stays valid.
pub fn filter_index(
    index: &EntityIndex,
    root_nodes: &[EntityId],
    filter_spec: &FilterSpec,
) -> EntityIndex {
    let mut out = index.clone();

    let mut doomed: BTreeSet<EntityId> =
        match_entities(&out, filter_spec).into_iter().collect();
    for root in root_nodes {
        doomed.remove(root);
    }

    for target in &doomed {
        out.strip_edges_to(target);
        out.remove(target);
    }
    debug!(
        "filter applied - removed={}, remaining={}",
        doomed.len(),
        out.len()
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{branch, entity, index_from_edges, match_only, spec};

    #[test]
    fn test_removes_entities_and_incident_edges() {
        let index = index_from_edges(&[
            ("entity:a", "entity:x", 2),
            ("entity:b", "entity:x", 1),
            ("entity:b", "entity:y", 1),
        ]);

        let out = filter_index(&index, &[], &match_only(&["entity:x"]));

        assert!(!out.contains(&entity("entity:x")));
        assert!(out.adjacency(&entity("entity:a")).unwrap().is_empty());
        assert_eq!(out.adjacency(&entity("entity:b")).unwrap().len(), 1);
        assert!(out.is_closed());
    }

    #[test]
    fn test_root_nodes_survive_matching_filters() {
        let index = index_from_edges(&[("entity:a", "entity:x", 1)]);
        let roots = vec![entity("entity:a")];

        let out = filter_index(&index, &roots, &match_only(&["entity:*"]));

        assert!(out.contains(&entity("entity:a")));
        assert!(!out.contains(&entity("entity:x")));
    }

    #[test]
    fn test_sequential_composition() {
        let index = index_from_edges(&[
            ("entity:a", "entity:x", 1),
            ("entity:a", "entity:y", 1),
        ]);

        let first = filter_index(&index, &[], &match_only(&["entity:x"]));
        let second = filter_index(&first, &[], &match_only(&["entity:y"]));

        assert!(second.contains(&entity("entity:a")));
        assert_eq!(second.adjacency(&entity("entity:a")).unwrap().len(), 0);
        // earlier snapshots are still intact
        assert!(first.adjacency(&entity("entity:a")).unwrap().contains_key(&entity("entity:y")));
        assert!(index.contains(&entity("entity:x")));
    }

    #[test]
    fn test_freq_banded_filter() {
        let index = index_from_edges(&[
            ("entity:hub", "entity:x", 9),
            ("entity:leaf", "entity:x", 1),
        ]);

        // prune anything with outgoing weight 5 or more
        let out = filter_index(
            &index,
            &[],
            &spec(branch(None, Some((Some(5), None))), branch(None, None)),
        );

        assert!(!out.contains(&entity("entity:hub")));
        assert!(out.contains(&entity("entity:leaf")));
    }
}
