use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::config::ClusterSpec;
use crate::entity::EntityId;
use crate::index::{Adjacency, EntityIndex};
use crate::matcher::match_entities;

/// Merge matched entity groups into synthetic cluster nodes.
///
/// Cluster specifications are processed in list order over one evolving
/// snapshot: later clusters see the index already mutated by earlier ones,
/// so an entity absorbed early is no longer matchable later. Root nodes are
/// never absorbed. The caller's index is left untouched.
pub fn cluster_index(
    index: &EntityIndex,
    root_nodes: &[EntityId],
    cluster_spec: &[ClusterSpec],
) -> EntityIndex {
    let mut out = index.clone();

    for spec in cluster_spec {
        let cluster_id = EntityId::parse(&spec.id);

        let mut members: BTreeSet<EntityId> =
            match_entities(&out, &spec.filter).into_iter().collect();
        for root in root_nodes {
            members.remove(root);
        }
        info!("cluster {} # {} entities", spec.id, members.len());

        // the cluster starts from an empty adjacency, clobbering any
        // same-named entity already in the index
        out.replace_adjacency(&cluster_id, []);

        // redirect every edge aimed at a member onto the cluster id
        for (_, adjacency) in out.iter_mut() {
            let hits: Vec<EntityId> = adjacency
                .keys()
                .filter(|target| members.contains(target))
                .cloned()
                .collect();
            for target in hits {
                if let Some(freq) = adjacency.remove(&target) {
                    *adjacency.entry(cluster_id.clone()).or_insert(0) += freq;
                }
            }
        }

        // fold member adjacency onto the cluster, dropping intra-cluster
        // edges (redirection has already turned those into member->cluster
        // entries, which must not become self loops)
        let mut folded: Adjacency = Adjacency::new();
        for member in &members {
            if let Some(adjacency) = out.adjacency(member) {
                for (target, freq) in adjacency {
                    if members.contains(target) || *target == cluster_id {
                        continue;
                    }
                    *folded.entry(target.clone()).or_insert(0) += freq;
                }
            }
        }
        for (target, freq) in folded {
            out.bump_edge(&cluster_id, &target, freq);
        }

        for member in &members {
            out.remove(member);
        }
        debug!("cluster {} folded - index_entities={}", spec.id, out.len());
    }

    out
}
