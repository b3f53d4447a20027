//! WemProbe CLI - Command-line interface for Wwise Vorbis containers

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "wemprobe")]
#[command(about = "WemProbe: Wwise Vorbis (.wem) header and stream inspection", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the WemProbe CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
