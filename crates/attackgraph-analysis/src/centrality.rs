//! Centrality rankings: degree, betweenness, closeness and PageRank.
//!
//! Each ranking is sorted by descending score; ties keep node insertion
//! order. Only the first `top_n` rows are returned.

use std::cmp::Ordering;
use std::collections::VecDeque;

use attackgraph_core::config::PageRankConfig;

use crate::graph::AttackGraph;
use crate::types::{DegreeCentrality, NodeScore};

/// Rank nodes by `in_degree + out_degree`. Parallel edges count
/// individually.
pub fn degree_centrality(graph: &AttackGraph, top_n: usize) -> Vec<DegreeCentrality> {
    let mut rows: Vec<DegreeCentrality> = graph
        .nodes()
        .iter()
        .map(|node| {
            let in_degree = graph.in_degree(node.index);
            let out_degree = graph.out_degree(node.index);
            let total_degree = in_degree + out_degree;
            DegreeCentrality {
                id: node.id.clone(),
                label: node.label.clone(),
                node_type: node.kind,
                in_degree,
                out_degree,
                total_degree,
                criticality_score: total_degree,
            }
        })
        .collect();

    // Stable sort keeps insertion order among equal scores.
    rows.sort_by(|a, b| b.criticality_score.cmp(&a.criticality_score));
    rows.truncate(top_n);
    rows
}

/// Rank nodes by normalized directed betweenness (Brandes).
pub fn betweenness_centrality(graph: &AttackGraph, top_n: usize) -> Vec<NodeScore> {
    rank(graph, &betweenness_scores(graph), top_n)
}

/// Rank nodes by outward closeness: reachable count over total distance.
pub fn closeness_centrality(graph: &AttackGraph, top_n: usize) -> Vec<NodeScore> {
    rank(graph, &closeness_scores(graph), top_n)
}

/// Rank nodes by PageRank with damping `alpha` and default tolerance and
/// iteration ceiling.
pub fn pagerank(graph: &AttackGraph, top_n: usize, alpha: f64) -> Vec<NodeScore> {
    let config = PageRankConfig {
        alpha,
        ..PageRankConfig::default()
    };
    pagerank_with(graph, top_n, &config)
}

/// Rank nodes by PageRank with explicit iteration parameters.
pub fn pagerank_with(graph: &AttackGraph, top_n: usize, config: &PageRankConfig) -> Vec<NodeScore> {
    rank(graph, &pagerank_scores(graph, config), top_n)
}

/// Betweenness of every node, normalized by `1 / ((n-1)(n-2))` when
/// `n > 2`.
pub(crate) fn betweenness_scores(graph: &AttackGraph) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];

    for source in 0..n {
        // Single-source shortest paths, counting shortest paths per node.
        let mut order: Vec<usize> = Vec::with_capacity(n);
        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist: Vec<Option<usize>> = vec![None; n];
        sigma[source] = 1.0;
        dist[source] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            let dv = dist[v].unwrap_or(0);
            for &w in graph.successors(v) {
                if dist[w].is_none() {
                    dist[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if dist[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    parents[w].push(v);
                }
            }
        }

        // Dependency accumulation in reverse BFS order.
        let mut delta = vec![0.0_f64; n];
        while let Some(w) = order.pop() {
            for &v in &parents[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for value in &mut centrality {
            *value *= scale;
        }
    }
    centrality
}

fn closeness_scores(graph: &AttackGraph) -> Vec<f64> {
    let n = graph.node_count();
    (0..n)
        .map(|source| {
            let mut dist: Vec<Option<usize>> = vec![None; n];
            dist[source] = Some(0);
            let mut queue = VecDeque::from([source]);
            let mut reached = 0usize;
            let mut total = 0usize;

            while let Some(v) = queue.pop_front() {
                let dv = dist[v].unwrap_or(0);
                for &w in graph.successors(v) {
                    if dist[w].is_none() {
                        dist[w] = Some(dv + 1);
                        reached += 1;
                        total += dv + 1;
                        queue.push_back(w);
                    }
                }
            }

            if total == 0 {
                0.0
            } else {
                reached as f64 / total as f64
            }
        })
        .collect()
}

fn pagerank_scores(graph: &AttackGraph, config: &PageRankConfig) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let alpha = config.alpha;
    let uniform = 1.0 / n as f64;
    let dangling: Vec<usize> = (0..n).filter(|&i| graph.out_degree(i) == 0).collect();
    let mut rank = vec![uniform; n];

    for iteration in 0..config.max_iterations {
        let previous = std::mem::replace(&mut rank, vec![0.0; n]);

        let dangling_mass: f64 = alpha * dangling.iter().map(|&i| previous[i]).sum::<f64>();
        for (node, &value) in previous.iter().enumerate() {
            let out_degree = graph.out_degree(node);
            if out_degree == 0 {
                continue;
            }
            let share = alpha * value / out_degree as f64;
            for edge in graph.out_edges(node) {
                rank[edge.target] += share;
            }
        }

        let base = (dangling_mass + 1.0 - alpha) * uniform;
        for value in &mut rank {
            *value += base;
        }

        let error: f64 = rank
            .iter()
            .zip(&previous)
            .map(|(a, b)| (a - b).abs())
            .sum();
        if error < n as f64 * config.tolerance {
            tracing::debug!(iterations = iteration + 1, "PageRank converged");
            return rank;
        }
    }

    tracing::warn!(
        max_iterations = config.max_iterations,
        "PageRank did not converge; returning last iterate"
    );
    rank
}

/// Sort node scores descending (stable) and keep `top_n`.
fn rank(graph: &AttackGraph, scores: &[f64], top_n: usize) -> Vec<NodeScore> {
    let mut rows: Vec<NodeScore> = graph
        .nodes()
        .iter()
        .map(|node| NodeScore {
            id: node.id.clone(),
            label: node.label.clone(),
            node_type: node.kind,
            score: scores[node.index],
        })
        .collect();

    rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    rows.truncate(top_n);
    rows
}
