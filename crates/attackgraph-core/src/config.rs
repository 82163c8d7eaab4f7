//! Configuration for attack graph analysis.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`ATTACKGRAPH__ANALYSIS__` prefix)
//! 2. Config file (`attackgraph.toml`, `[analysis]` section)
//! 3. Defaults

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// Top-level analysis configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Maximum number of paths returned by path enumeration.
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,

    /// Maximum number of edges in an enumerated path.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Number of paths returned by k-shortest-paths.
    #[serde(default = "default_k_paths")]
    pub k_paths: usize,

    /// Edge cutoff for lazy all-paths enumeration.
    #[serde(default = "default_path_cutoff")]
    pub path_cutoff: usize,

    /// Rows kept in every ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Stop cycle enumeration after this many cycles.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,

    /// Also add edges for entity references (vulnerability → host, etc.).
    #[serde(default)]
    pub reference_edges: bool,

    #[serde(default)]
    pub pagerank: PageRankConfig,

    #[serde(default)]
    pub impact: ImpactConfig,
}

/// PageRank iteration parameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PageRankConfig {
    /// Damping factor (default 0.85).
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Per-node L1 convergence tolerance (default 1e-6).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Iteration ceiling (default 100).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

/// Vulnerability impact weighting.
///
/// `impact = severity_weight × severity + reachability_weight × 10 × reach`,
/// clamped to `[0, max_score]`. Both weights must stay positive.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ImpactConfig {
    #[serde(default = "default_severity_weight")]
    pub severity_weight: f64,
    #[serde(default = "default_reachability_weight")]
    pub reachability_weight: f64,
    /// Edge cutoff when counting entry → vulnerability → privilege paths.
    #[serde(default = "default_path_cutoff")]
    pub path_cutoff: usize,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

fn default_max_paths() -> usize {
    10
}

fn default_max_depth() -> usize {
    20
}

fn default_k_paths() -> usize {
    5
}

fn default_path_cutoff() -> usize {
    10
}

fn default_top_n() -> usize {
    10
}

fn default_max_cycles() -> usize {
    1_000
}

fn default_alpha() -> f64 {
    0.85
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_max_iterations() -> usize {
    100
}

fn default_severity_weight() -> f64 {
    0.7
}

fn default_reachability_weight() -> f64 {
    0.3
}

fn default_max_score() -> f64 {
    10.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_paths: default_max_paths(),
            max_depth: default_max_depth(),
            k_paths: default_k_paths(),
            path_cutoff: default_path_cutoff(),
            top_n: default_top_n(),
            max_cycles: default_max_cycles(),
            reference_edges: false,
            pagerank: PageRankConfig::default(),
            impact: ImpactConfig::default(),
        }
    }
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            severity_weight: default_severity_weight(),
            reachability_weight: default_reachability_weight(),
            path_cutoff: default_path_cutoff(),
            max_score: default_max_score(),
        }
    }
}

impl AnalysisConfig {
    /// Load from `<file_prefix>.{toml,json,yaml}` and `ATTACKGRAPH__` variables.
    ///
    /// A missing file or a missing `[analysis]` section yields the defaults.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("ATTACKGRAPH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config = match cfg.get::<AnalysisConfig>("analysis") {
            Ok(c) => c,
            Err(config::ConfigError::NotFound(_)) => AnalysisConfig::default(),
            Err(e) => return Err(e.into()),
        };
        config.impact.validate()?;
        Ok(config)
    }
}

impl ImpactConfig {
    /// Both weights must be positive and `max_score` within `(0, 10]`.
    pub fn validate(&self) -> Result<()> {
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(invalid(field, format!("{value} must be a positive number")))
            }
        };
        positive("severity_weight", self.severity_weight)?;
        positive("reachability_weight", self.reachability_weight)?;

        if !(self.max_score > 0.0 && self.max_score <= 10.0) {
            return Err(invalid(
                "max_score",
                format!("{} is outside (0, 10]", self.max_score),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> CoreError {
    CoreError::InvalidField {
        entity_id: "analysis.impact".to_string(),
        field,
        reason,
    }
}
