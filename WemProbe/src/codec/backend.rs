//! Vorbis decoder collaborators
//!
//! The crate never decodes audio itself. A [`VorbisBackend`] takes the
//! reconstructed identification and setup packets and hands back a
//! [`CodecSetup`], the handle a decoder would keep for every audio packet.

use std::fmt;

use lewton::header::{IdentHeader, SetupHeader, read_header_ident, read_header_setup};

use crate::error::{Error, Result};

/// A decoder configured from a stream's header packets.
pub trait CodecSetup: fmt::Debug {
    fn channels(&self) -> u8;
    fn sample_rate(&self) -> u32;
    /// Short and long blocksize exponents.
    fn blocksizes(&self) -> (u8, u8);
}

/// Builds a [`CodecSetup`] from standard Vorbis header packets.
pub trait VorbisBackend {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns [`Error::CodecSetupFailed`] if either packet is rejected.
    fn setup(&self, identification: &[u8], setup: &[u8]) -> Result<Box<dyn CodecSetup>>;
}

/// Backend using `lewton`'s header readers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LewtonBackend;

/// Parsed `lewton` headers, ready for `lewton::audio::read_audio_packet`.
pub struct LewtonSetup {
    ident: IdentHeader,
    setup: SetupHeader,
}

impl LewtonSetup {
    #[must_use]
    pub fn ident(&self) -> &IdentHeader {
        &self.ident
    }

    #[must_use]
    pub fn setup(&self) -> &SetupHeader {
        &self.setup
    }
}

impl fmt::Debug for LewtonSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LewtonSetup")
            .field("channels", &self.ident.audio_channels)
            .field("sample_rate", &self.ident.audio_sample_rate)
            .field("blocksize_0", &self.ident.blocksize_0)
            .field("blocksize_1", &self.ident.blocksize_1)
            .finish_non_exhaustive()
    }
}

impl CodecSetup for LewtonSetup {
    fn channels(&self) -> u8 {
        self.ident.audio_channels
    }

    fn sample_rate(&self) -> u32 {
        self.ident.audio_sample_rate
    }

    fn blocksizes(&self) -> (u8, u8) {
        (self.ident.blocksize_0, self.ident.blocksize_1)
    }
}

impl VorbisBackend for LewtonBackend {
    fn name(&self) -> &'static str {
        "lewton"
    }

    fn setup(&self, identification: &[u8], setup: &[u8]) -> Result<Box<dyn CodecSetup>> {
        let ident = read_header_ident(identification)
            .map_err(|e| Error::CodecSetupFailed(format!("identification packet rejected: {e:?}")))?;
        let setup = read_header_setup(
            setup,
            ident.audio_channels,
            (ident.blocksize_0, ident.blocksize_1),
        )
        .map_err(|e| Error::CodecSetupFailed(format!("setup packet rejected: {e:?}")))?;

        Ok(Box::new(LewtonSetup { ident, setup }))
    }
}
