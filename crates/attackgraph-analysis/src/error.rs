//! Error types for the attackgraph-analysis crate.

use attackgraph_core::{CoreError, NodeKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{entity_id} references missing node {missing_id} via `{field}`")]
    UnresolvedReference {
        entity_id: String,
        field: &'static str,
        missing_id: String,
    },

    #[error("{entity_id} references {target_id} via `{field}`: expected a {expected}, found a {actual}")]
    ReferenceKind {
        entity_id: String,
        field: &'static str,
        target_id: String,
        expected: NodeKind,
        actual: NodeKind,
    },

    #[error("{entity_id} references {target_id} via `{field}`: expected a host or privilege, found a {actual}")]
    ConditionKind {
        entity_id: String,
        field: &'static str,
        target_id: String,
        actual: NodeKind,
    },

    #[error("Duplicate node id {id}: defined as both {first} and {second}")]
    DuplicateId {
        id: String,
        first: NodeKind,
        second: NodeKind,
    },

    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: String },

    #[error("Node {node_id} is a {actual}, expected a {expected}")]
    WrongNodeKind {
        node_id: String,
        expected: NodeKind,
        actual: NodeKind,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
