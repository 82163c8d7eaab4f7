//! attackgraph-core: Entity model, input loading and configuration for attack graphs.
//!
//! This crate provides the foundational pieces used by the analysis engine:
//! - Entity records (Host, Vulnerability, Privilege, Service, Exploit, NetworkEdge)
//! - Boundary conversion from JSON/TOML/YAML text into typed entities
//! - Analysis configuration management
//! - The core error type

pub mod config;
pub mod error;
pub mod loader;
pub mod types;

pub use error::CoreError;
pub use types::*;
