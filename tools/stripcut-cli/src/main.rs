//! stripcut CLI: compile a strip description into a Cinelerra timeline.
//!
//! Usage:
//!   stripcut <TIMELINE> <STRIPS>              Write the compiled document to stdout
//!   stripcut <TIMELINE> <STRIPS> -o out.xml   Write it to a file
//!   stripcut <TIMELINE> <STRIPS> --summary    Also list placed strips on stderr

use std::path::PathBuf;

use clap::Parser;
use stripcut_common::config::{CompilerConfig, LoggingConfig};
use stripcut_render_engine::CompileJob;

mod commands;

#[derive(Parser)]
#[command(
    name = "stripcut",
    about = "Compile declarative strip descriptions into Cinelerra timelines",
    version,
    author
)]
struct Cli {
    /// Template timeline document (Cinelerra XML)
    timeline: PathBuf,

    /// Strip description (JSON, or YAML for .yml/.yaml files)
    strips: PathBuf,

    /// Compiler configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the compiled document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List placed strips on stderr before compiling
    #[arg(long)]
    summary: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CompilerConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => CompilerConfig::default(),
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    stripcut_common::logging::init_logging(&LoggingConfig {
        level,
        json: config.logging.json,
    });

    let job = CompileJob {
        timeline_path: cli.timeline,
        strips_path: cli.strips,
        config,
    };

    if cli.summary {
        commands::summary::run(&job)?;
    }
    commands::compile::run(&job, cli.output)
}
