mod aggregate;
mod bfs;
mod cluster;
mod config;
mod entity;
mod filter;
mod graph;
mod index;
mod matcher;
mod pipeline;
mod report;
#[cfg(test)]
mod testutil;
mod viz_export;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

/// osint_graph - entity co-occurrence graph builder for intelligence reports
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML run configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Path to the JSON intelligence report (post id -> post record)
    #[arg(short, long)]
    report: PathBuf,

    /// Output directory for the viz bundle (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting osint_graph");

    let args = Args::parse();

    // Friendlier errors than a bare open() failure
    check_exists(&args.config, "config file")?;
    check_exists(&args.report, "report file")?;

    debug!("config_file={}", args.config.display());
    let cfg = config::load_config(&args.config)?;

    debug!("report_file={}", args.report.display());
    let report = report::load_report(&args.report)?;
    info!("report loaded - posts={}", report.len());

    let output = pipeline::build_filtered_index(&report, &cfg);
    let mut graph = pipeline::build_graph(&output, &cfg);

    viz_export::write_all_viz(&args.output_dir, &mut graph, &output, &cfg)?;
    info!(
        "finished - nodes={}, edges={}, output_dir={}",
        graph.node_count(),
        graph.edge_count(),
        args.output_dir.display()
    );
    Ok(())
}

fn check_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        anyhow::bail!(
            "{} not found at {}\nPass an existing path; nothing is created implicitly.",
            what,
            path.display()
        );
    }
    Ok(())
}
