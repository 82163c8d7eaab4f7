//! Attack graph snapshot and its builder.
//!
//! Every entity becomes one node in a dense arena (`0..N-1`); edges are
//! stored once in an edge arena and indexed from both endpoints, so the
//! graph supports parallel edges, self-loops and O(1) adjacency lookups in
//! either direction. A snapshot is never mutated after `build` returns.

use std::collections::{HashMap, HashSet};
use std::fmt;

use attackgraph_core::loader;
use attackgraph_core::{Entity, EntitySet, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AnalysisError, Result};

/// Identity of one built snapshot. Every build gets a fresh id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SnapshotId(pub Uuid);

impl SnapshotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why an edge exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Host-to-host network reachability.
    Network,
    /// `precondition → exploit`.
    Precondition,
    /// `exploit → postcondition`.
    Postcondition,
    /// `vulnerability → affected host` (reference edges only).
    Affects,
    /// `vulnerability → exploit` (reference edges only).
    Enables,
    /// `host → service` (reference edges only).
    Exposes,
    /// `privilege → host` (reference edges only).
    Grants,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Network => "NETWORK",
            EdgeKind::Precondition => "PRECONDITION",
            EdgeKind::Postcondition => "POSTCONDITION",
            EdgeKind::Affects => "AFFECTS",
            EdgeKind::Enables => "ENABLES",
            EdgeKind::Exposes => "EXPOSES",
            EdgeKind::Grants => "GRANTS",
        }
    }
}

/// Node metadata stored in the arena.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Dense index (0..N-1), equal to insertion order.
    pub index: usize,
    /// Entity id.
    pub id: String,
    /// Display label (entity label, or the id when unlabeled).
    pub label: String,
    pub kind: NodeKind,
    /// The source record.
    pub entity: Entity,
}

/// One directed edge. Parallel edges are distinct entries.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub kind: EdgeKind,
    pub label: Option<String>,
}

/// An immutable attack graph snapshot.
#[derive(Debug)]
pub struct AttackGraph {
    id: SnapshotId,
    built_at: DateTime<Utc>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    /// `outgoing[i]` = indices into `edges` leaving node `i`.
    outgoing: Vec<Vec<usize>>,
    /// `incoming[i]` = indices into `edges` entering node `i`.
    incoming: Vec<Vec<usize>>,
    /// Distinct successor nodes in first-insertion order.
    successors: Vec<Vec<usize>>,
    /// Distinct predecessor nodes in first-insertion order.
    predecessors: Vec<Vec<usize>>,
    node_index: HashMap<String, usize>,
}

impl AttackGraph {
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, counting parallel edges individually.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &GraphNode {
        &self.nodes[index]
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn kind(&self, index: usize) -> NodeKind {
        self.nodes[index].kind
    }

    /// Dense index of a node id, if present.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Dense index of a node id, or `NodeNotFound`.
    pub fn resolve(&self, id: &str) -> Result<usize> {
        self.index_of(id).ok_or_else(|| AnalysisError::NodeNotFound {
            node_id: id.to_string(),
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn successors(&self, index: usize) -> &[usize] {
        &self.successors[index]
    }

    pub fn predecessors(&self, index: usize) -> &[usize] {
        &self.predecessors[index]
    }

    pub fn out_edges(&self, index: usize) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.outgoing[index].iter().map(move |&e| &self.edges[e])
    }

    pub fn in_edges(&self, index: usize) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.incoming[index].iter().map(move |&e| &self.edges[e])
    }

    pub fn out_degree(&self, index: usize) -> usize {
        self.outgoing[index].len()
    }

    pub fn in_degree(&self, index: usize) -> usize {
        self.incoming[index].len()
    }

    /// Indices of all nodes of one kind, in insertion order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.index)
            .collect()
    }

    /// Translate a path of indices into node ids.
    pub fn path_ids(&self, path: &[usize]) -> Vec<String> {
        path.iter().map(|&i| self.nodes[i].id.clone()).collect()
    }

    /// BLAKE3 digest of the node list (id, kind) and edge list
    /// (source id, target id, kind, label), in insertion order.
    ///
    /// Two snapshots built from the same entities share a fingerprint even
    /// though their snapshot ids differ.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"nodes");
        for node in &self.nodes {
            hash_field(&mut hasher, node.id.as_bytes());
            hash_field(&mut hasher, node.kind.as_str().as_bytes());
        }
        hasher.update(b"edges");
        for edge in &self.edges {
            hash_field(&mut hasher, self.nodes[edge.source].id.as_bytes());
            hash_field(&mut hasher, self.nodes[edge.target].id.as_bytes());
            hash_field(&mut hasher, edge.kind.as_str().as_bytes());
            hash_field(&mut hasher, edge.label.as_deref().unwrap_or("").as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Structural equality: same nodes, kinds and edges in the same order.
    pub fn same_structure(&self, other: &AttackGraph) -> bool {
        self.fingerprint() == other.fingerprint()
    }

    fn add_edge(&mut self, source: usize, target: usize, kind: EdgeKind, label: Option<String>) {
        let index = self.edges.len();
        self.edges.push(GraphEdge {
            index,
            source,
            target,
            kind,
            label,
        });
        self.outgoing[source].push(index);
        self.incoming[target].push(index);
        if !self.successors[source].contains(&target) {
            self.successors[source].push(target);
            self.predecessors[target].push(source);
        }
    }
}

/// Length-prefixed update so adjacent fields cannot run together.
fn hash_field(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Assembles an [`AttackGraph`] from an [`EntitySet`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    reference_edges: bool,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also turn entity references into edges: `AFFECTS`, `ENABLES`,
    /// `EXPOSES` and `GRANTS`.
    pub fn with_reference_edges(mut self, enabled: bool) -> Self {
        self.reference_edges = enabled;
        self
    }

    /// Validate every field and reference, then build a fresh snapshot.
    ///
    /// Fails on the first invalid field, duplicate id or unresolved
    /// reference; no partial graph is returned.
    pub fn build(&self, entities: &EntitySet) -> Result<AttackGraph> {
        loader::validate(entities)?;

        let capacity = entities.entity_count();
        let mut node_index: HashMap<String, usize> = HashMap::with_capacity(capacity);
        let mut nodes: Vec<GraphNode> = Vec::with_capacity(capacity);

        for (index, entity) in entities.entities().enumerate() {
            if let Some(&existing) = node_index.get(entity.id()) {
                return Err(AnalysisError::DuplicateId {
                    id: entity.id().to_string(),
                    first: nodes[existing].kind,
                    second: entity.kind(),
                });
            }
            node_index.insert(entity.id().to_string(), index);
            nodes.push(GraphNode {
                index,
                id: entity.id().to_string(),
                label: entity.label().to_string(),
                kind: entity.kind(),
                entity,
            });
        }

        let resolver = Resolver {
            nodes: &nodes,
            node_index: &node_index,
        };

        // Resolve everything before creating a single edge.
        let mut reference_edges: Vec<(usize, usize, EdgeKind)> = Vec::new();

        for vuln in &entities.vulnerabilities {
            let host =
                resolver.resolve(&vuln.id, "affected_host", &vuln.affected_host, Some(NodeKind::Host))?;
            reference_edges.push((resolver.index(&vuln.id), host, EdgeKind::Affects));
        }
        for privilege in &entities.privileges {
            if let Some(host_id) = &privilege.host {
                let host = resolver.resolve(&privilege.id, "host", host_id, Some(NodeKind::Host))?;
                reference_edges.push((resolver.index(&privilege.id), host, EdgeKind::Grants));
            }
        }
        for service in &entities.services {
            let host = resolver.resolve(&service.id, "host", &service.host, Some(NodeKind::Host))?;
            reference_edges.push((host, resolver.index(&service.id), EdgeKind::Exposes));
        }

        let mut network_edges = Vec::with_capacity(entities.network_edges.len());
        for edge in &entities.network_edges {
            let name = format!("{}->{}", edge.from, edge.to);
            let from = resolver.resolve(&name, "from", &edge.from, Some(NodeKind::Host))?;
            let to = resolver.resolve(&name, "to", &edge.to, Some(NodeKind::Host))?;
            network_edges.push((from, to, edge.label.clone()));
        }

        let mut exploit_edges = Vec::with_capacity(entities.exploits.len());
        for exploit in &entities.exploits {
            let this = resolver.index(&exploit.id);
            if let Some(vuln_id) = &exploit.vulnerability {
                let vuln = resolver.resolve(
                    &exploit.id,
                    "vulnerability",
                    vuln_id,
                    Some(NodeKind::Vulnerability),
                )?;
                reference_edges.push((vuln, this, EdgeKind::Enables));
            }
            let pre = resolver.resolve_state(&exploit.id, "precondition", &exploit.precondition)?;
            let post = resolver.resolve_state(&exploit.id, "postcondition", &exploit.postcondition)?;
            exploit_edges.push((pre, this, post));
        }

        let n = nodes.len();
        let mut graph = AttackGraph {
            id: SnapshotId::new(),
            built_at: Utc::now(),
            nodes,
            edges: Vec::with_capacity(network_edges.len() + 2 * exploit_edges.len()),
            outgoing: vec![Vec::new(); n],
            incoming: vec![Vec::new(); n],
            successors: vec![Vec::new(); n],
            predecessors: vec![Vec::new(); n],
            node_index,
        };

        for (from, to, label) in network_edges {
            graph.add_edge(from, to, EdgeKind::Network, label);
        }
        for (pre, exploit, post) in exploit_edges {
            graph.add_edge(pre, exploit, EdgeKind::Precondition, None);
            graph.add_edge(exploit, post, EdgeKind::Postcondition, None);
        }
        if self.reference_edges {
            for (source, target, kind) in reference_edges {
                graph.add_edge(source, target, kind, None);
            }
        }

        tracing::debug!(
            snapshot = %graph.id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            reference_edges = self.reference_edges,
            "Built attack graph snapshot"
        );

        Ok(graph)
    }
}

/// Build a snapshot with the default edge set.
pub fn build(entities: &EntitySet) -> Result<AttackGraph> {
    GraphBuilder::new().build(entities)
}

/// Reference lookups against the node arena while it is being built.
struct Resolver<'a> {
    nodes: &'a [GraphNode],
    node_index: &'a HashMap<String, usize>,
}

impl Resolver<'_> {
    /// Index of an entity that is known to be in the arena.
    fn index(&self, id: &str) -> usize {
        self.node_index[id]
    }

    fn resolve(
        &self,
        entity_id: &str,
        field: &'static str,
        target_id: &str,
        expected: Option<NodeKind>,
    ) -> Result<usize> {
        let index = self.node_index.get(target_id).copied().ok_or_else(|| {
            AnalysisError::UnresolvedReference {
                entity_id: entity_id.to_string(),
                field,
                missing_id: target_id.to_string(),
            }
        })?;

        if let Some(expected) = expected {
            let actual = self.nodes[index].kind;
            if actual != expected {
                return Err(AnalysisError::ReferenceKind {
                    entity_id: entity_id.to_string(),
                    field,
                    target_id: target_id.to_string(),
                    expected,
                    actual,
                });
            }
        }
        Ok(index)
    }

    /// Exploit pre/postconditions name attacker states: a host or a privilege.
    fn resolve_state(&self, entity_id: &str, field: &'static str, target_id: &str) -> Result<usize> {
        let index = self.resolve(entity_id, field, target_id, None)?;
        let actual = self.nodes[index].kind;
        if !matches!(actual, NodeKind::Host | NodeKind::Privilege) {
            return Err(AnalysisError::ConditionKind {
                entity_id: entity_id.to_string(),
                field,
                target_id: target_id.to_string(),
                actual,
            });
        }
        Ok(index)
    }
}

/// Nodes reachable from `start` by a directed path, in discovery order.
/// `start` itself is never included, even when it sits on a cycle.
pub(crate) fn reachable_from(graph: &AttackGraph, start: usize) -> Vec<usize> {
    let mut seen: HashSet<usize> = HashSet::new();
    seen.insert(start);
    let mut stack = vec![start];
    let mut reached = Vec::new();

    while let Some(node) = stack.pop() {
        for &next in graph.successors(node) {
            if seen.insert(next) {
                reached.push(next);
                stack.push(next);
            }
        }
    }
    reached
}
