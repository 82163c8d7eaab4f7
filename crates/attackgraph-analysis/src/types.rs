//! Result records returned by the analyzers.
//!
//! All records are flat and serialize to plain JSON.

use std::collections::BTreeMap;

use attackgraph_core::NodeKind;
use serde::{Deserialize, Serialize};

/// Degree-based ranking row. `criticality_score` equals `total_degree`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DegreeCentrality {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeKind,
    pub in_degree: usize,
    pub out_degree: usize,
    pub total_degree: usize,
    pub criticality_score: usize,
}

/// A node with a real-valued centrality score (betweenness, closeness,
/// PageRank).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeScore {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeKind,
    pub score: f64,
}

/// Betweenness-ranked chokepoint candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chokepoint {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeKind,
    pub betweenness_score: f64,
    /// Betweenness strictly above this graph's mean.
    pub is_critical: bool,
}

/// An entry point and how much of the graph it reaches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttackSurface {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeKind,
    pub reachable_nodes: usize,
    pub out_degree: usize,
}

/// Impact of one vulnerability given its position in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VulnerabilityImpact {
    pub vulnerability_id: String,
    pub cvss_score: f64,
    pub impact_score: f64,
    pub reachable_nodes: usize,
    pub affected_hosts: usize,
    pub paths_through: usize,
}

/// Statistics about a built snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub density: f64,
    pub diameter: usize,
    pub cycle_count: usize,
    pub component_count: usize,
}

/// Everything the engine computes for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub snapshot_id: String,
    pub fingerprint: String,
    pub graph_stats: GraphStats,
    pub degree_centrality: Vec<DegreeCentrality>,
    pub betweenness_centrality: Vec<NodeScore>,
    pub closeness_centrality: Vec<NodeScore>,
    pub pagerank: Vec<NodeScore>,
    pub chokepoints: Vec<Chokepoint>,
    pub attack_surfaces: Vec<AttackSurface>,
    pub vulnerability_impacts: Vec<VulnerabilityImpact>,
    pub computation_ms: u64,
}
