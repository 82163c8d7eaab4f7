//! attackgraph-analysis: Attack graph construction and analysis.
//!
//! Builds an immutable in-memory attack graph from typed entities and runs
//! structural queries over it: path enumeration, centrality rankings,
//! cycles and components, chokepoints, attack surfaces and vulnerability
//! impact. Every analyzer borrows the snapshot read-only, so queries against
//! one snapshot can run on several threads at once.

pub mod centrality;
pub mod error;
pub mod graph;
pub mod impact;
pub mod paths;
pub mod structure;
pub mod surface;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use error::AnalysisError;
pub use graph::{build, AttackGraph, EdgeKind, GraphBuilder, SnapshotId};
pub use types::{AnalysisReport, GraphStats};

use std::collections::BTreeMap;
use std::time::Instant;

use attackgraph_core::config::AnalysisConfig;
use attackgraph_core::loader::{self, InputFormat};
use attackgraph_core::{EntitySet, NodeKind};

/// Runs the analyzers with one configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    config: AnalysisConfig,
}

impl AnalysisEngine {
    /// Create a new engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom analysis configuration.
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Build a fresh snapshot, honouring `reference_edges`.
    pub fn build(&self, entities: &EntitySet) -> error::Result<AttackGraph> {
        GraphBuilder::new()
            .with_reference_edges(self.config.reference_edges)
            .build(entities)
    }

    /// Parse an entity document and build a snapshot from it.
    ///
    /// The format is detected from the text when `format` is `None`.
    pub fn load(&self, text: &str, format: Option<InputFormat>) -> error::Result<AttackGraph> {
        let format = format.unwrap_or_else(|| InputFormat::detect(text));
        let entities = loader::parse_entities(text, format)?;
        self.build(&entities)
    }

    /// Size, density, diameter, cycle and component counts.
    pub fn graph_stats(&self, graph: &AttackGraph) -> GraphStats {
        let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for node in graph.nodes() {
            *nodes_by_type.entry(node.kind.to_string()).or_default() += 1;
        }

        GraphStats {
            total_nodes: graph.node_count(),
            total_edges: graph.edge_count(),
            nodes_by_type,
            density: structure::graph_density(graph),
            diameter: structure::diameter(graph),
            cycle_count: structure::find_cycles_limited(graph, self.config.max_cycles).len(),
            component_count: structure::strongly_connected_components(graph).len(),
        }
    }

    /// Run every analyzer over a snapshot.
    ///
    /// Rankings keep the configured `top_n`; vulnerability impacts cover all
    /// vulnerabilities, highest impact first.
    pub fn report(&self, graph: &AttackGraph) -> error::Result<AnalysisReport> {
        let start = Instant::now();
        let top_n = self.config.top_n;

        let mut vulnerability_impacts = graph
            .nodes_of_kind(NodeKind::Vulnerability)
            .into_iter()
            .map(|index| {
                impact::vulnerability_impact_score_with(
                    graph,
                    &graph.node(index).id,
                    &self.config.impact,
                )
            })
            .collect::<error::Result<Vec<_>>>()?;
        vulnerability_impacts.sort_by(|a, b| {
            b.impact_score
                .partial_cmp(&a.impact_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let report = AnalysisReport {
            snapshot_id: graph.id().to_string(),
            fingerprint: graph.fingerprint(),
            graph_stats: self.graph_stats(graph),
            degree_centrality: centrality::degree_centrality(graph, top_n),
            betweenness_centrality: centrality::betweenness_centrality(graph, top_n),
            closeness_centrality: centrality::closeness_centrality(graph, top_n),
            pagerank: centrality::pagerank_with(graph, top_n, &self.config.pagerank),
            chokepoints: surface::find_chokepoints(graph, top_n),
            attack_surfaces: surface::find_attack_surfaces(graph),
            vulnerability_impacts,
            computation_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            snapshot = %graph.id(),
            nodes = report.graph_stats.total_nodes,
            edges = report.graph_stats.total_edges,
            computation_ms = report.computation_ms,
            "Analysis report computed"
        );
        Ok(report)
    }
}
