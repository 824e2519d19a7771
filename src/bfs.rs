use std::collections::{BTreeSet, VecDeque};

use serde::Deserialize;

use crate::entity::EntityId;
use crate::graph::VizGraph;
use crate::index::EntityIndex;

/// Traversal direction over the index. Forward follows an entity's own
/// adjacency targets; backward finds every entity whose adjacency contains
/// it (an index-wide scan, the index keeps no reverse mapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// Depth-limited breadth-first traversal from one root, accumulating into
/// the shared graph.
///
/// A node is expanded only while its level is strictly below `search_depth`,
/// and each endpoint is visited at most once: first discovery wins, later
/// paths to an already-visited node still record their edge but never
/// re-expand it. Edges carry weight 1 here; frequency-like weights appear
/// later, at aggregation. Everything found is inserted in one bulk call.
pub fn bfs_populate(
    graph: &mut VizGraph,
    root: &EntityId,
    index: &EntityIndex,
    search_depth: u32,
    directions: &[Direction],
) {
    let mut bunch: Vec<(EntityId, EntityId, u64)> = Vec::new();
    let mut seen_pairs: BTreeSet<(EntityId, EntityId)> = BTreeSet::new();
    let mut visited: BTreeSet<EntityId> = BTreeSet::new();
    let mut queue: VecDeque<(EntityId, u32)> = VecDeque::new();

    visited.insert(root.clone());
    queue.push_back((root.clone(), 0));

    while let Some((node, level)) = queue.pop_front() {
        if level >= search_depth {
            continue;
        }

        for other in connected_entities(&node, index, directions) {
            let pair = if node <= other {
                (node.clone(), other.clone())
            } else {
                (other.clone(), node.clone())
            };
            // one traversal records each edge once, whichever end found it
            if seen_pairs.insert(pair) {
                bunch.push((node.clone(), other.clone(), 1));
            }
            if visited.insert(other.clone()) {
                queue.push_back((other, level + 1));
            }
        }
    }

    graph.add_weighted_edges(bunch);
}

fn connected_entities(
    entity: &EntityId,
    index: &EntityIndex,
    directions: &[Direction],
) -> Vec<EntityId> {
    let mut found = Vec::new();
    if directions.contains(&Direction::Forward) {
        if let Some(adjacency) = index.adjacency(entity) {
            found.extend(adjacency.keys().cloned());
        }
    }
    if directions.contains(&Direction::Backward) {
        for (source, adjacency) in index.iter() {
            if adjacency.contains_key(entity) {
                found.push(source.clone());
            }
        }
    }
    found
}
