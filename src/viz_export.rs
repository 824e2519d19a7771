// src/viz_export.rs
use std::cmp::Reverse;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

use crate::config::{AppConfig, CategoryRule, Layout};
use crate::entity::EntityId;
use crate::graph::VizGraph;
use crate::pipeline::PipelineOutput;

/* -------------------------------------------------------------------------- */
/* Entry point                                                                */
/* -------------------------------------------------------------------------- */

/// Public entry point: cap the graph to the configured node budget and write
/// the D3-ready bundle into `out_dir`.
pub fn write_all_viz(
    out_dir: &Path,
    graph: &mut VizGraph,
    output: &PipelineOutput,
    config: &AppConfig,
) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    let removed = enforce_node_cap(graph, &output.root_nodes, config.max_nodes);
    if removed > 0 {
        info!("max nodes exceeded # {} nodes removed", removed);
    }

    let bundle = build_bundle(graph, output, config);
    write_json(out_dir.join("viz.graph.json"), &bundle)?;

    let summary = json!({
        "version": 1,
        "layout": config.layout_name,
        "stages": output.stats,
        "graph": { "nodes": graph.node_count(), "edges": graph.edge_count() },
        "files": [ "viz.graph.json" ],
    });
    write_json(out_dir.join("viz.index.json"), &summary)?;

    debug!("viz bundle written - directory={}", out_dir.display());
    Ok(())
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .map(|_| ())
        .map_err(|e| e.into())
}

/* -------------------------------------------------------------------------- */
/* Node budget                                                                */
/* -------------------------------------------------------------------------- */

/// Drop everything ranked below the top `max_nodes` by connection density,
/// keeping root nodes wherever they rank. Returns how many nodes went.
pub fn enforce_node_cap(
    graph: &mut VizGraph,
    root_nodes: &[EntityId],
    max_nodes: usize,
) -> usize {
    if graph.node_count() <= max_nodes {
        return 0;
    }

    let ordered = density_ordered(graph);
    let mut removed = 0;
    for (id, _) in ordered.iter().skip(max_nodes) {
        if root_nodes.contains(id) {
            continue;
        }
        graph.remove_node(id);
        removed += 1;
    }
    removed
}

/// Nodes ordered by summed incident edge weight, densest first.
fn density_ordered(graph: &VizGraph) -> Vec<(EntityId, u64)> {
    let mut ordered: Vec<(EntityId, u64)> = graph
        .entities()
        .into_iter()
        .map(|id| {
            let density = graph.strength(&id);
            (id, density)
        })
        .collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ordered
}

/* -------------------------------------------------------------------------- */
/* Bundle                                                                     */
/* -------------------------------------------------------------------------- */

#[derive(Serialize)]
struct VNode {
    id: String,
    label: String,
    category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    colour: Option<String>,
    size: u32,
    root: bool,
}

#[derive(Serialize)]
struct VLink {
    source: String,
    target: String,
    weight: u64,
}

#[derive(Serialize)]
struct VMeta {
    layout: Layout,
    node_count: usize,
    edge_count: usize,
    root_count: usize,
}

#[derive(Serialize)]
struct VGraphBundle {
    meta: VMeta,
    nodes: Vec<VNode>,
    links: Vec<VLink>,
}

fn build_bundle(graph: &VizGraph, output: &PipelineOutput, config: &AppConfig) -> VGraphBundle {
    let mut nodes = Vec::with_capacity(graph.node_count());
    for (id, density) in density_ordered(graph) {
        let category = category_for(&id, &output.root_nodes, &config.entity_prefix_map);
        let label = display_name(&id, &category, config);
        nodes.push(VNode {
            id: id.to_string(),
            label,
            colour: config.colour_map.get(&category).cloned(),
            category,
            size: size_for(density),
            root: output.root_nodes.contains(&id),
        });
    }

    let mut links: Vec<VLink> = graph
        .edges()
        .into_iter()
        .map(|(a, b, weight)| VLink {
            source: a.to_string(),
            target: b.to_string(),
            weight,
        })
        .collect();
    links.sort_by_key(|l| (Reverse(l.weight), l.source.clone(), l.target.clone()));

    VGraphBundle {
        meta: VMeta {
            layout: config.layout_name,
            node_count: nodes.len(),
            edge_count: links.len(),
            root_count: output.root_nodes.len(),
        },
        nodes,
        links,
    }
}

/* -------------------------------------------------------------------------- */
/* Categories, names, sizes                                                   */
/* -------------------------------------------------------------------------- */

/// Root beats everything; otherwise the first prefix rule that matches the
/// rendered identifier wins; otherwise `unknown`.
fn category_for(id: &EntityId, root_nodes: &[EntityId], rules: &[CategoryRule]) -> String {
    if root_nodes.contains(id) {
        return "root".to_string();
    }
    let rendered = id.to_string();
    for rule in rules {
        if rule.prefixes.iter().any(|p| rendered.starts_with(p.as_str())) {
            return rule.category.clone();
        }
    }
    "unknown".to_string()
}

fn size_for(density: u64) -> u32 {
    if density < 10 {
        200
    } else if density < 20 {
        400
    } else if density < 50 {
        800
    } else {
        1600
    }
}

/// Short stable tag for pseudonymised names.
fn pseudo_tag(name: &str) -> String {
    format!("{:04x}", xxh3_64(name.as_bytes()) & 0xffff)
}

fn display_name(id: &EntityId, category: &str, config: &AppConfig) -> String {
    // debug aid: show raw identifiers, untouched
    if config.preserve_node_prefix {
        return id.to_string();
    }

    let mut name = id.short_name();

    if config.pseudonymize.iter().any(|c| c == category) && !name.is_empty() {
        let tag = pseudo_tag(&name);
        name = if let Some(kind) = category.strip_prefix("entity_") {
            format!("{}_{}", kind, tag)
        } else if category == "root" {
            format!("target_{}", tag)
        } else if name.starts_with("thread[") {
            format!("thread_{}", tag)
        } else {
            format!("{}_{}", category, tag)
        };
    }

    // page URLs and the like run long; 0 disables
    if config.max_node_text_length != 0 {
        name = name.chars().take(config.max_node_text_length).collect();
    }
    name
}
