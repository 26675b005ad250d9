// mesh - runs the UTXO gossip simulation in-process

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use utxomesh::config::NodeConfig;
use utxomesh::sync::ValidationMode;
use utxomesh::transport::Topology;
use utxomesh::NodeId;

use cli::{Commands, GraphArgs, MeshCli, SimulateArgs, TopologyKind};
use logging::DEFAULT_LOG_FILTER;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MeshCli::parse();
    logging::init_logging(DEFAULT_LOG_FILTER, cli.log_format);

    match cli.command {
        Commands::Simulate(args) => run_simulation(args).await,
        Commands::Graph(args) => write_graph(args),
    }
}

async fn run_simulation(args: SimulateArgs) -> Result<()> {
    let config = build_config(&args)?;
    let topology = match &args.topology_file {
        Some(path) => Topology::from_yaml_file(path)
            .with_context(|| format!("failed to load topology from {}", path.display()))?,
        None => generate(args.topology, config.participants),
    };

    tracing::info!(
        participants = config.participants,
        max_faulty = config.max_faulty,
        starter = %config.starter,
        validation = %config.gossip.validation,
        "starting simulation"
    );

    let summaries = utxomesh::simulate(&config, &topology)
        .await
        .context("simulation failed")?;

    for summary in &summaries {
        println!("{}", summary);
        if let Some(dir) = &args.output_dir {
            let path = summary
                .write_to_dir(dir)
                .with_context(|| format!("failed to write summary into {}", dir.display()))?;
            tracing::debug!(path = %path.display(), "summary written");
        }
    }

    let detected = summaries.iter().filter(|s| s.conflicts_detected > 0).count();
    tracing::info!(nodes = summaries.len(), detected, "simulation finished");
    Ok(())
}

fn build_config(args: &SimulateArgs) -> Result<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => NodeConfig::default(),
    };

    if let Some(nodes) = args.nodes {
        config = config.with_participants(nodes);
    }
    if let Some(max_faulty) = args.max_faulty {
        config = config.with_max_faulty(max_faulty);
    }
    if let Some(starter) = args.starter {
        config = config.with_starter(NodeId::new(starter));
    }
    if args.strict {
        config = config.with_validation(ValidationMode::Strict);
    }
    if let Some(ms) = args.idle_timeout_ms {
        config = config.with_idle_timeout_ms(ms);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn generate(kind: TopologyKind, nodes: u32) -> Topology {
    match kind {
        TopologyKind::Full => Topology::fully_connected(nodes),
        TopologyKind::Ring => Topology::ring(nodes),
    }
}

fn write_graph(args: GraphArgs) -> Result<()> {
    let yaml = generate(args.kind, args.nodes)
        .to_yaml_string()
        .context("failed to encode topology")?;
    match &args.output {
        Some(path) => std::fs::write(path, yaml)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", yaml),
    }
    Ok(())
}
