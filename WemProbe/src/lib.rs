//! # WemProbe
//!
//! A pure-Rust library for reading Audiokinetic Wwise Vorbis (`.wem`) containers.
//!
//! ## What It Does
//!
//! - **Header parsing** - RIFF/RIFX chunk walk, every known `vorb` layout
//!   (header triad, standard, modified, embedded), loop points and packet geometry
//! - **Setup rebuild** - Turns Wwise's stripped setup packet back into a
//!   standard Vorbis setup packet, using the packed codebook libraries
//! - **Decode state** - Hands the rebuilt identification/setup packets to a
//!   Vorbis backend (`lewton`) and iterates audio packets in standard form
//! - **Description** - A bounded, human-readable summary of each stream
//!
//! ## Quick Start
//!
//! ```no_run
//! use wemprobe::codebook::CodebookRegistry;
//! use wemprobe::prelude::*;
//!
//! let registry = CodebookRegistry::load_dir("codebooks/")?;
//! let mut source = StreamSource::open("Music_Theme.wem")?;
//!
//! let header = parse_with(&mut source, &registry, &ParseOptions::default())?;
//! let state = init(&mut source, header)?;
//! println!("{}", render(&describe(&state, DEFAULT_MAX_LENGTH)));
//! # Ok::<(), wemprobe::Error>(())
//! ```
//!
//! ### Batch Processing
//!
//! ```no_run
//! use wemprobe::prelude::*;
//!
//! let config = ProbeConfig::load_default()?;
//! let registry = config.codebooks.load_registry()?;
//! let files = find_wem_files("Localized/English/");
//!
//! let batch = describe_files(&files, &registry, &ParseOptions::default(), 256, |_| {});
//! println!("{} described, {} failed", batch.success_count, batch.fail_count);
//! # Ok::<(), wemprobe::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `wemprobe` command-line binary

pub mod batch;
pub mod bits;
pub mod codebook;
pub mod codec;
pub mod config;
pub mod describe;
pub mod error;
pub mod source;
pub mod wwise;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::source::StreamSource;

    pub use crate::wwise::{LoopInfo, ParseOptions, WwiseHeader, parse, parse_with};
    pub use crate::codebook::{CodebookLibrary, CodebookLibraryId, CodebookRegistry};
    pub use crate::codec::{AudioPacket, CodecSetup, DecodeState, init, init_with};
    pub use crate::describe::{DEFAULT_MAX_LENGTH, Description, describe, render};

    pub use crate::batch::{BatchProbeResult, ProbeResult, describe_files, find_wem_files, probe_file};
    pub use crate::config::ProbeConfig;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "cli")]
pub mod cli;
