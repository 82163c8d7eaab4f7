//! Vulnerability impact scoring.
//!
//! Formula: `impact = w_s × severity + w_r × 10 × (reachable / node_count)`,
//! clamped to `[0, max_score]`. With both weights positive the score rises
//! with severity and with reachability.

use attackgraph_core::config::ImpactConfig;
use attackgraph_core::NodeKind;

use crate::error::{AnalysisError, Result};
use crate::graph::{reachable_from, AttackGraph};
use crate::surface::entry_points;
use crate::types::VulnerabilityImpact;

/// Score a vulnerability with the default weights.
pub fn vulnerability_impact_score(graph: &AttackGraph, vuln_id: &str) -> Result<VulnerabilityImpact> {
    vulnerability_impact_score_with(graph, vuln_id, &ImpactConfig::default())
}

/// Score a vulnerability with explicit weights and path cutoff.
///
/// Rejects weights that are not positive and a `max_score` outside `(0, 10]`.
pub fn vulnerability_impact_score_with(
    graph: &AttackGraph,
    vuln_id: &str,
    config: &ImpactConfig,
) -> Result<VulnerabilityImpact> {
    config.validate()?;
    let index = graph.resolve(vuln_id)?;
    let node = graph.node(index);
    let severity = node
        .entity
        .severity()
        .ok_or_else(|| AnalysisError::WrongNodeKind {
            node_id: vuln_id.to_string(),
            expected: NodeKind::Vulnerability,
            actual: node.kind,
        })?;

    let reachable = reachable_from(graph, index);
    let affected_hosts = reachable
        .iter()
        .filter(|&&i| graph.kind(i) == NodeKind::Host)
        .count();
    let paths_through = count_paths_through(graph, index, config.path_cutoff);

    let reach_fraction = reachable.len() as f64 / graph.node_count() as f64;
    let raw = config.severity_weight * severity + config.reachability_weight * 10.0 * reach_fraction;
    let impact_score = raw.clamp(0.0, config.max_score);

    tracing::debug!(
        vulnerability = vuln_id,
        severity,
        reachable = reachable.len(),
        paths_through,
        impact_score,
        "vulnerability_impact_score"
    );

    Ok(VulnerabilityImpact {
        vulnerability_id: vuln_id.to_string(),
        cvss_score: severity,
        impact_score,
        reachable_nodes: reachable.len(),
        affected_hosts,
        paths_through,
    })
}

/// Count simple paths of at most `cutoff` edges that start at an entry
/// point, pass through `via` and end on a privilege node.
fn count_paths_through(graph: &AttackGraph, via: usize, cutoff: usize) -> usize {
    let n = graph.node_count();

    // Nodes that can still reach `via`; branches outside this set are dead
    // until `via` is on the path.
    let mut leads_to_via = vec![false; n];
    leads_to_via[via] = true;
    let mut stack = vec![via];
    while let Some(node) = stack.pop() {
        for &prev in graph.predecessors(node) {
            if !leads_to_via[prev] {
                leads_to_via[prev] = true;
                stack.push(prev);
            }
        }
    }

    let mut count = 0usize;
    let mut on_path = vec![false; n];

    for entry in entry_points(graph) {
        if !leads_to_via[entry] {
            continue;
        }

        on_path[entry] = true;
        let mut path = vec![entry];
        let mut cursors = vec![0usize];

        while let Some(&node) = path.last() {
            let frame = path.len() - 1;
            let successors = graph.successors(node);

            if frame < cutoff && cursors[frame] < successors.len() {
                let next = successors[cursors[frame]];
                cursors[frame] += 1;
                if on_path[next] {
                    continue;
                }
                let through = on_path[via] || next == via;
                if !through && !leads_to_via[next] {
                    continue;
                }
                if through && graph.kind(next) == NodeKind::Privilege {
                    count += 1;
                }
                path.push(next);
                on_path[next] = true;
                cursors.push(0);
            } else {
                on_path[node] = false;
                path.pop();
                cursors.pop();
            }
        }
    }
    count
}
