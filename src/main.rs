use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use norb::{GraphPipeline, StageContext};

/// Create NORB graph from threat data
#[derive(Parser)]
#[command(name = "norb")]
#[command(version, about = "Create NORB graph from threat data", long_about = None)]
struct Cli {
    /// Folder path to input threat data
    #[arg(long)]
    input_data_folder: PathBuf,

    /// Folder path to save NORB graph and registry files
    #[arg(long)]
    save_path: PathBuf,

    /// Make NORB with CVEs from 2015 to 2020 only
    #[arg(long)]
    only_recent_cves: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Verbosity comes from RUST_LOG; default keeps the run quiet
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("norb v{}", env!("CARGO_PKG_VERSION"));

    let ctx = StageContext::new(cli.input_data_folder, cli.save_path, cli.only_recent_cves);
    let output = GraphPipeline::standard().run(ctx)?;

    println!();
    println!("{}", "NORB graph built".bright_green().bold());
    println!("  Nodes: {}", output.node_count);
    println!("  Edges: {}", output.edge_count);
    println!("  Graph: {}", output.graph_path.display());

    Ok(())
}
