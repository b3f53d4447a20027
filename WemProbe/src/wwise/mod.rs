//! Wwise RIFF/RIFX Vorbis containers
//!
//! - [`riff`]: prologue and chunk table
//! - [`variant`]: header sub-variants and packet framing
//! - [`setup`]: identification/setup packet reconstruction
//! - [`header`]: the parser tying them together

pub mod header;
pub mod riff;
pub mod setup;
pub mod variant;

pub use header::{
    LoopInfo, MAX_CHANNELS, ParseOptions, WwiseHeader, parse, parse_with,
};
pub use riff::Endian;
pub use setup::SetupKind;
pub use variant::{HeaderVariant, PacketHeader};
