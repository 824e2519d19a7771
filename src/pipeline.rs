use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate_post_nodes;
use crate::bfs::bfs_populate;
use crate::cluster::cluster_index;
use crate::config::AppConfig;
use crate::entity::EntityId;
use crate::filter::filter_index;
use crate::graph::VizGraph;
use crate::index::{index_report, EntityIndex};
use crate::matcher::select_root_nodes;
use crate::report::IntelReport;

/// Final index snapshot plus the recomputed root set, handed to the
/// traversal and the viz export.
pub struct PipelineOutput {
    pub index: EntityIndex,
    pub root_nodes: Vec<EntityId>,
    pub stats: StageStats,
}

/// Per-stage entity counts, surfaced in the run summary file.
#[derive(Debug, Clone, Serialize)]
pub struct StageStats {
    pub source_entities: usize,
    pub initial_roots: usize,
    pub clustered_entities: usize,
    pub filtered_entities: usize,
    pub roots: usize,
}

/// Index -> roots -> clusters -> roots (again) -> filters.
///
/// Every stage takes the previous snapshot and returns a new one; the
/// pre-clustering index stays valid so roots can be recomputed against the
/// clustered identities (a matched root may now be a cluster id).
pub fn build_filtered_index(report: &IntelReport, config: &AppConfig) -> PipelineOutput {
    let start = Instant::now();

    let index = index_report(report);
    info!("index entities (source) # {}", index.len());

    let initial_roots = select_root_nodes(&index, &config.root_node_spec);
    info!("root nodes (source) # {}", initial_roots.len());

    let clustered = cluster_index(&index, &initial_roots, &config.cluster_spec);
    info!("index entities (post clustering) # {}", clustered.len());

    let root_nodes = select_root_nodes(&clustered, &config.root_node_spec);
    info!("root nodes (post clustering) # {}", root_nodes.len());
    if root_nodes.is_empty() {
        warn!("root node spec matched nothing; the graph will be empty");
    }

    let clustered_entities = clustered.len();
    let mut filtered = clustered;
    for spec in &config.filter_spec {
        filtered = filter_index(&filtered, &root_nodes, spec);
    }
    info!("index entities (post filtering) # {}", filtered.len());

    let stats = StageStats {
        source_entities: index.len(),
        initial_roots: initial_roots.len(),
        clustered_entities,
        filtered_entities: filtered.len(),
        roots: root_nodes.len(),
    };
    debug!(
        "index stages completed - duration={:.2}s",
        start.elapsed().as_secs_f32()
    );

    PipelineOutput {
        index: filtered,
        root_nodes,
        stats,
    }
}

/// Walk the final index from every root and consolidate per-post duplicates.
pub fn build_graph(output: &PipelineOutput, config: &AppConfig) -> VizGraph {
    let start = Instant::now();
    let mut graph = VizGraph::default();

    for root in &output.root_nodes {
        bfs_populate(
            &mut graph,
            root,
            &output.index,
            config.search_depth,
            &config.directions,
        );
    }
    info!("graph nodes # {}", graph.node_count());

    aggregate_post_nodes(&mut graph, &output.root_nodes, config.filter_post_freq);
    info!("graph nodes after aggregation # {}", graph.node_count());
    debug!(
        "graph build completed - duration={:.2}s, edges={}",
        start.elapsed().as_secs_f32(),
        graph.edge_count()
    );

    graph
}
