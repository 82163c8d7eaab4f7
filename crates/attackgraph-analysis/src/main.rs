//! CLI entry point for the attackgraph analysis engine.
//!
//! Reads an entity document (JSON, TOML or YAML) from stdin and writes the
//! query result as JSON to stdout.

use std::io::Write;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use attackgraph_analysis::{centrality, impact, paths, structure, surface, AnalysisEngine};
use attackgraph_core::config::AnalysisConfig;
use attackgraph_core::loader::InputFormat;

#[derive(Parser)]
#[command(name = "attackgraph-analysis")]
#[command(about = "Build an attack graph from security entities and analyse it")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Input format: json, toml or yaml (detected when omitted).
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Config file prefix (default: attackgraph).
    #[arg(short, long, default_value = "attackgraph", global = true)]
    config: String,

    /// Also derive edges from entity references (AFFECTS, ENABLES, ...).
    #[arg(long, global = true)]
    reference_edges: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Full analysis report.
    Report,
    /// Depth-bounded simple paths between two nodes.
    Paths {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        max_paths: Option<usize>,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Every simple path up to a cutoff, one JSON array per line.
    AllPaths {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        cutoff: Option<usize>,
    },
    /// Shortest path by edge count.
    Shortest {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
    },
    /// The k shortest simple paths.
    KShortest {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Rank nodes by a centrality measure.
    Centrality {
        #[arg(value_enum)]
        measure: Measure,
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Elementary cycles.
    Cycles {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Strongly connected components.
    Components,
    /// Nodes with above-average betweenness.
    Chokepoints {
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Entry points ranked by reachability.
    Surfaces,
    /// Impact score of one vulnerability.
    Impact {
        #[arg(long)]
        vuln: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Measure {
    Degree,
    Betweenness,
    Closeness,
    Pagerank,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let mut config = AnalysisConfig::load(&cli.config)?;
    config.reference_edges |= cli.reference_edges;
    let format = match cli.format.as_deref() {
        Some(name) => Some(
            InputFormat::from_name(name)
                .ok_or_else(|| anyhow::anyhow!("unknown input format: {name}"))?,
        ),
        None => None,
    };

    let input = std::io::read_to_string(std::io::stdin())?;
    let engine = AnalysisEngine::new().with_config(config);
    let graph = engine.load(&input, format)?;
    let config = engine.config();

    match cli.command {
        Command::Report => emit(&engine.report(&graph)?)?,
        Command::Paths {
            ref source,
            ref target,
            max_paths,
            max_depth,
        } => {
            let result = paths::find_paths(
                &graph,
                source,
                target,
                max_paths.unwrap_or(config.max_paths),
                max_depth.unwrap_or(config.max_depth),
            )?;
            emit(&result)?;
        }
        Command::AllPaths {
            ref source,
            ref target,
            cutoff,
        } => {
            let cutoff = cutoff.unwrap_or(config.path_cutoff);
            let mut out = std::io::stdout().lock();
            for path in paths::all_paths_between(&graph, source, target, cutoff)? {
                writeln!(out, "{}", serde_json::to_string(&path)?)?;
            }
        }
        Command::Shortest {
            ref source,
            ref target,
        } => emit(&paths::shortest_path(&graph, source, target)?)?,
        Command::KShortest {
            ref source,
            ref target,
            k,
        } => {
            let k = k.unwrap_or(config.k_paths);
            emit(&paths::k_shortest_paths(&graph, source, target, k)?)?;
        }
        Command::Centrality { measure, top_n } => {
            let top_n = top_n.unwrap_or(config.top_n);
            match measure {
                Measure::Degree => emit(&centrality::degree_centrality(&graph, top_n))?,
                Measure::Betweenness => emit(&centrality::betweenness_centrality(&graph, top_n))?,
                Measure::Closeness => emit(&centrality::closeness_centrality(&graph, top_n))?,
                Measure::Pagerank => {
                    emit(&centrality::pagerank_with(&graph, top_n, &config.pagerank))?
                }
            }
        }
        Command::Cycles { limit } => {
            let limit = limit.unwrap_or(config.max_cycles);
            emit(&structure::find_cycles_limited(&graph, limit))?;
        }
        Command::Components => emit(&structure::strongly_connected_components(&graph))?,
        Command::Chokepoints { top_n } => {
            emit(&surface::find_chokepoints(&graph, top_n.unwrap_or(config.top_n)))?
        }
        Command::Surfaces => emit(&surface::find_attack_surfaces(&graph))?,
        Command::Impact { ref vuln } => emit(&impact::vulnerability_impact_score_with(
            &graph,
            vuln,
            &config.impact,
        )?)?,
    }

    Ok(())
}

fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
