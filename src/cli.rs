// CLI - command-line surface of the mesh binary

use crate::logging::LogFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use utxomesh::config::DEFAULT_PARTICIPANTS;

/// UTXO gossip mesh simulator
#[derive(Parser, Debug)]
#[command(name = "mesh", version, propagate_version = true)]
pub struct MeshCli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every node in-process until each one stops
    Simulate(SimulateArgs),
    /// Print a topology as a YAML adjacency list
    Graph(GraphArgs),
}

/// Shape of a generated topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TopologyKind {
    Full,
    Ring,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// YAML run configuration; flags below override its values
    #[arg(long, short = 'c', env = "MESH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of participants
    #[arg(long, short = 'n')]
    pub nodes: Option<u32>,

    /// Tolerated number of faulty nodes
    #[arg(long)]
    pub max_faulty: Option<u32>,

    /// Node that issues the double spend
    #[arg(long)]
    pub starter: Option<u32>,

    /// Treat inputs missing from the local ledger as conflicts
    #[arg(long)]
    pub strict: bool,

    /// Stop a node after this many milliseconds without inbound messages
    #[arg(long)]
    pub idle_timeout_ms: Option<u64>,

    /// Generated topology shape, ignored when --topology-file is given
    #[arg(long, value_enum, default_value_t = TopologyKind::Full)]
    pub topology: TopologyKind,

    /// YAML adjacency list to load instead of generating one
    #[arg(long)]
    pub topology_file: Option<PathBuf>,

    /// Directory to write one `node-<id>.yml` summary per node into
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Number of nodes
    #[arg(long, short = 'n', default_value_t = DEFAULT_PARTICIPANTS)]
    pub nodes: u32,

    /// Topology shape
    #[arg(long, value_enum, default_value_t = TopologyKind::Full)]
    pub kind: TopologyKind,

    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}
