use std::collections::BTreeMap;

use tracing::debug;

use crate::entity::EntityId;
use crate::graph::VizGraph;

/// Collapse graph nodes that share a base identity but differ only by
/// per-post suffix (`posts[author]@@@p1`, `posts[author]@@@p2`, ...).
///
/// Each author bucket keeps its first node (lexicographic) and relocates
/// every other member's edges onto it, summing weights for shared
/// neighbors. When `filter_post_freq` is set, buckets with fewer posts than
/// the threshold are removed outright instead of merged. Nodes left without
/// edges afterwards are widows and are dropped. Root nodes get no special
/// treatment here.
pub fn aggregate_post_nodes(
    graph: &mut VizGraph,
    root_nodes: &[EntityId],
    filter_post_freq: Option<usize>,
) {
    let mut buckets: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
    for id in graph.entities() {
        if let Some(author) = id.post_author() {
            buckets.entry(author.to_string()).or_default().push(id);
        }
    }

    for (author, mut members) in buckets {
        members.sort();

        if let Some(min_posts) = filter_post_freq {
            if members.len() < min_posts {
                debug!(
                    "weak post group removed - author={}, posts={}",
                    author,
                    members.len()
                );
                for member in &members {
                    graph.remove_node(member);
                }
                continue;
            }
        }

        if members.len() == 1 {
            continue;
        }

        let survivor = members[0].clone();
        for duplicate in &members[1..] {
            if root_nodes.contains(duplicate) {
                debug!("root node merged during aggregation - node={}", duplicate);
            }
            for (neighbor, weight) in graph.neighbors(duplicate) {
                if neighbor == survivor {
                    continue;
                }
                graph.bump_or_add_edge(&survivor, &neighbor, weight);
            }
            graph.remove_node(duplicate);
        }
    }

    let widows: Vec<EntityId> = graph
        .entities()
        .into_iter()
        .filter(|id| graph.degree(id) == 0)
        .collect();
    for widow in &widows {
        graph.remove_node(widow);
    }
    if !widows.is_empty() {
        debug!("widow nodes removed # {}", widows.len());
    }
}
