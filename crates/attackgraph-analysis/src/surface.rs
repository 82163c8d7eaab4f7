//! Chokepoints and attack surfaces.
//!
//! Chokepoints are nodes whose betweenness is above this graph's mean.
//! Attack surfaces are entry nodes ranked by how much of the graph they can
//! reach.

use std::cmp::Ordering;

use attackgraph_core::NodeKind;

use crate::centrality::betweenness_scores;
use crate::graph::{reachable_from, AttackGraph, EdgeKind};
use crate::types::{AttackSurface, Chokepoint};

/// Rank nodes by betweenness and flag the ones above the mean.
///
/// The threshold is recomputed for every call from the graph at hand.
pub fn find_chokepoints(graph: &AttackGraph, top_n: usize) -> Vec<Chokepoint> {
    let scores = betweenness_scores(graph);
    if scores.is_empty() {
        return Vec::new();
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;

    let mut rows: Vec<Chokepoint> = graph
        .nodes()
        .iter()
        .map(|node| {
            let score = scores[node.index];
            Chokepoint {
                id: node.id.clone(),
                label: node.label.clone(),
                node_type: node.kind,
                betweenness_score: score,
                is_critical: score > mean,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.betweenness_score
            .partial_cmp(&a.betweenness_score)
            .unwrap_or(Ordering::Equal)
    });
    rows.truncate(top_n);

    tracing::debug!(
        mean_betweenness = mean,
        critical = rows.iter().filter(|r| r.is_critical).count(),
        "find_chokepoints"
    );
    rows
}

/// Entry-point indices: nodes with no inbound edge, plus hosts with no
/// inbound network edge. Insertion order.
pub(crate) fn entry_points(graph: &AttackGraph) -> Vec<usize> {
    graph
        .nodes()
        .iter()
        .filter(|node| {
            graph.in_degree(node.index) == 0
                || (node.kind == NodeKind::Host
                    && !graph
                        .in_edges(node.index)
                        .any(|e| e.kind == EdgeKind::Network))
        })
        .map(|node| node.index)
        .collect()
}

/// List entry points with the number of nodes each can reach.
///
/// `reachable_nodes` counts every node on some directed path from the entry
/// point, whatever its kind; only the entry point itself is excluded.
///
/// Sorted by `reachable_nodes` descending, then `out_degree` descending,
/// then insertion order.
pub fn find_attack_surfaces(graph: &AttackGraph) -> Vec<AttackSurface> {
    let mut rows: Vec<AttackSurface> = entry_points(graph)
        .into_iter()
        .map(|index| {
            let node = graph.node(index);
            AttackSurface {
                id: node.id.clone(),
                label: node.label.clone(),
                node_type: node.kind,
                reachable_nodes: reachable_from(graph, index).len(),
                out_degree: graph.out_degree(index),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.reachable_nodes
            .cmp(&a.reachable_nodes)
            .then_with(|| b.out_degree.cmp(&a.out_degree))
    });
    rows
}
