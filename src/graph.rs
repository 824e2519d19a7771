use std::collections::BTreeMap;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Undirected;

use crate::entity::EntityId;

/// Undirected weighted graph the BFS materializes into, backed by a stable
/// petgraph so aggregation can delete nodes without invalidating indices.
/// Inserting an edge that already exists adds the weights together.
#[derive(Debug, Default)]
pub struct VizGraph {
    graph: StableGraph<EntityId, u64, Undirected>,
    nodes: BTreeMap<EntityId, NodeIndex>,
}

impl VizGraph {
    fn ensure_node(&mut self, id: &EntityId) -> NodeIndex {
        if let Some(ix) = self.nodes.get(id) {
            return *ix;
        }
        let ix = self.graph.add_node(id.clone());
        self.nodes.insert(id.clone(), ix);
        ix
    }

    /// Bulk edge insertion; one call per BFS root.
    pub fn add_weighted_edges<I>(&mut self, bunch: I)
    where
        I: IntoIterator<Item = (EntityId, EntityId, u64)>,
    {
        for (a, b, weight) in bunch {
            self.bump_or_add_edge(&a, &b, weight);
        }
    }

    /// Add `weight` onto an existing edge, or create it.
    pub fn bump_or_add_edge(&mut self, a: &EntityId, b: &EntityId, weight: u64) {
        let a_ix = self.ensure_node(a);
        let b_ix = self.ensure_node(b);
        match self.graph.find_edge(a_ix, b_ix) {
            Some(edge) => {
                if let Some(existing) = self.graph.edge_weight_mut(edge) {
                    *existing += weight;
                }
            }
            None => {
                self.graph.add_edge(a_ix, b_ix, weight);
            }
        }
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn entities(&self) -> Vec<EntityId> {
        self.nodes.keys().cloned().collect()
    }

    /// Incident (neighbor, weight) pairs for a node; empty if absent.
    pub fn neighbors(&self, id: &EntityId) -> Vec<(EntityId, u64)> {
        let Some(&ix) = self.nodes.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges(ix)
            .map(|edge| {
                let other = if edge.source() == ix { edge.target() } else { edge.source() };
                (self.graph[other].clone(), *edge.weight())
            })
            .collect()
    }

    /// Summed incident edge weight; the node's connection density.
    pub fn strength(&self, id: &EntityId) -> u64 {
        self.neighbors(id).iter().map(|(_, w)| w).sum()
    }

    pub fn degree(&self, id: &EntityId) -> usize {
        match self.nodes.get(id) {
            Some(&ix) => self.graph.edges(ix).count(),
            None => 0,
        }
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&mut self, id: &EntityId) {
        if let Some(ix) = self.nodes.remove(id) {
            self.graph.remove_node(ix);
        }
    }

    /// Every edge as (a, b, weight); endpoint order is not meaningful.
    pub fn edges(&self) -> Vec<(EntityId, EntityId, u64)> {
        self.graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                    *edge.weight(),
                )
            })
            .collect()
    }
}
