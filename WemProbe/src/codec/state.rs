//! Decode state initialization

use std::fs::File;
use std::io::{BufReader, Read, Seek};

use crate::codec::backend::{CodecSetup, LewtonBackend, VorbisBackend};
use crate::error::{Error, Result};
use crate::source::StreamSource;
use crate::wwise::WwiseHeader;

/// A codec setup bound to a packet cursor over one source.
///
/// Borrows the source mutably for its whole lifetime, so the source always
/// outlives it and no second state can be built on the same source while
/// this one is alive.
#[derive(Debug)]
pub struct DecodeState<'a, R: Read + Seek = BufReader<File>> {
    pub(crate) header: WwiseHeader,
    pub(crate) codec: Box<dyn CodecSetup>,
    pub(crate) source: &'a mut StreamSource<R>,
    /// Window flag of the previous long/short decision, for modified packets.
    pub(crate) prev_blockflag: bool,
    pub(crate) packets_read: u64,
}

/// Initialize a decode state with the `lewton` backend.
pub fn init<R: Read + Seek>(source: &mut StreamSource<R>, header: WwiseHeader) -> Result<DecodeState<'_, R>> {
    init_with(source, header, &LewtonBackend)
}

/// Initialize a decode state with an explicit backend.
///
/// # Errors
///
/// - [`Error::InvalidState`] if the source is closed or already bound to a
///   decode state (call [`StreamSource::rewind`] first)
/// - [`Error::CodecSetupFailed`] if the backend rejects the header packets or
///   disagrees with the container on channels or sample rate
pub fn init_with<'a, R: Read + Seek>(
    source: &'a mut StreamSource<R>,
    header: WwiseHeader,
    backend: &dyn VorbisBackend,
) -> Result<DecodeState<'a, R>> {
    if source.is_closed() {
        return Err(Error::InvalidState(format!("{} is closed", source.name())));
    }
    if source.is_bound() {
        return Err(Error::InvalidState(format!(
            "{} already has a decode state; rewind it first",
            source.name()
        )));
    }

    let codec = backend.setup(&header.identification_packet, &header.setup_packet)?;
    if codec.channels() != header.channel_count {
        return Err(Error::CodecSetupFailed(format!(
            "{} reports {} channels, container has {}",
            backend.name(),
            codec.channels(),
            header.channel_count
        )));
    }
    if codec.sample_rate() != header.sample_rate {
        return Err(Error::CodecSetupFailed(format!(
            "{} reports {} Hz, container has {} Hz",
            backend.name(),
            codec.sample_rate(),
            header.sample_rate
        )));
    }

    source.bind(header.data_region_offset)?;
    tracing::debug!(
        "{}: {} setup ok, packets start at {:#x}",
        source.name(),
        backend.name(),
        header.data_region_offset
    );

    Ok(DecodeState {
        header,
        codec,
        source,
        prev_blockflag: false,
        packets_read: 0,
    })
}

impl<R: Read + Seek> DecodeState<'_, R> {
    #[must_use]
    pub fn header(&self) -> &WwiseHeader {
        &self.header
    }

    #[must_use]
    pub fn codec(&self) -> &dyn CodecSetup {
        self.codec.as_ref()
    }

    /// Absolute offset of the next packet header.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.source.cursor()
    }

    #[must_use]
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}
