use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::codebook::{CodebookLibraryId, CodebookRegistry};
use crate::config::ProbeConfig;

pub mod describe;
pub mod inspect;
pub mod packets;

/// Where to find configuration and codebook libraries
#[derive(Args, Debug, Clone, Default)]
pub struct CodebookArgs {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the packed codebook libraries
    #[arg(long)]
    pub codebooks: Option<PathBuf>,

    /// Only try this codebook library (standard, aotuv603)
    #[arg(long)]
    pub force_codebooks: Option<CodebookLibraryId>,
}

impl CodebookArgs {
    /// Configuration file with command-line overrides applied.
    pub fn load_config(&self) -> anyhow::Result<ProbeConfig> {
        let mut config = match &self.config {
            Some(path) => ProbeConfig::load(path)?,
            None => ProbeConfig::load_default()?,
        };
        if let Some(dir) = &self.codebooks {
            config.codebooks.dir = Some(dir.display().to_string());
        }
        if self.force_codebooks.is_some() {
            config.codebooks.force = self.force_codebooks;
        }
        Ok(config)
    }

    /// Codebook libraries from the effective configuration.
    pub fn load_registry(&self) -> anyhow::Result<CodebookRegistry> {
        Ok(self.load_config()?.codebooks.load_registry()?)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Describe one or more .wem files (directories are searched recursively)
    Describe {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Byte bound for each description (default from config, else 256)
        #[arg(long)]
        max_length: Option<usize>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Drop smpl loop points
        #[arg(long)]
        ignore_loops: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,

        #[command(flatten)]
        codebooks: CodebookArgs,
    },

    /// Show the parsed Wwise header of a .wem file
    Inspect {
        /// WEM file
        path: PathBuf,

        #[command(flatten)]
        codebooks: CodebookArgs,
    },

    /// List audio packets in standard Vorbis form
    Packets {
        /// WEM file
        path: PathBuf,

        /// Stop after this many packets
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[command(flatten)]
        codebooks: CodebookArgs,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Describe {
                paths,
                max_length,
                json,
                ignore_loops,
                quiet,
                codebooks,
            } => describe::execute(
                paths,
                &describe::DescribeOptions {
                    max_length: *max_length,
                    json: *json,
                    ignore_loops: *ignore_loops,
                    progress: !*quiet,
                },
                codebooks,
            ),
            Commands::Inspect { path, codebooks } => inspect::execute(path, codebooks),
            Commands::Packets {
                path,
                limit,
                codebooks,
            } => packets::execute(path, *limit, codebooks),
        }
    }
}
