//! Wwise RIFF header parsing
//!
//! Turns a container into a [`WwiseHeader`]: stream parameters from `fmt `,
//! sample count and packet layout from the vorb block, loop points from
//! `smpl`, and standard identification/setup packets ready for a Vorbis
//! decoder.

use std::io::{Read, Seek};

use serde::Serialize;

use crate::codebook::{CodebookLibraryId, CodebookRegistry};
use crate::error::{Error, Result};
use crate::source::StreamSource;
use crate::wwise::riff::{Chunk, ChunkTable, Endian};
use crate::wwise::setup::{self, RebuiltSetup, SetupKind};
use crate::wwise::variant::{EMBEDDED_VORB_OFFSET, HeaderVariant, PacketHeader};

/// Wwise Vorbis codec id in `fmt `.
pub const WWISE_VORBIS_CODEC: u16 = 0xFFFF;

/// Highest channel count accepted.
pub const MAX_CHANNELS: u8 = 64;

/// Accepted sample rate range, in Hz.
pub const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 300..=96000;

/// Valid blocksize exponents (64 to 8192 samples).
pub const BLOCKSIZE_RANGE: std::ops::RangeInclusive<u8> = 6..=13;

/// Setups above this size with no standard codebook sync hold inline codebooks.
const INLINE_SETUP_THRESHOLD: u32 = 0x200;

const EXTENSIBLE_GUID: [u8; 16] = [1, 0, 0, 0, 0, 0, 0x10, 0, 0x80, 0, 0, 0xAA, 0, 0x38, 0x9B, 0x71];

/// Loop region, in samples. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoopInfo {
    pub start: u64,
    pub end: u64,
}

/// Knobs for [`parse_with`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Drop `smpl` loop points.
    pub ignore_loops: bool,
    /// Name reported for the stream instead of the source name.
    pub stream_name: Option<String>,
}

/// Everything a decoder needs from a Wwise Vorbis container.
#[derive(Debug, Clone)]
pub struct WwiseHeader {
    pub endian: Endian,
    pub variant: HeaderVariant,
    pub packet_header: PacketHeader,
    /// Audio packets have their type bit and window flags stripped.
    pub modified_packets: bool,
    pub setup_kind: SetupKind,
    /// Library the external codebooks were rebuilt from.
    pub codebook_library: Option<CodebookLibraryId>,

    pub sample_rate: u32,
    pub channel_count: u8,
    /// `dwChannelMask` from `WAVEFORMATEXTENSIBLE`, 0 when absent.
    pub channel_layout: u32,
    pub avg_bytes_per_sec: u32,
    pub total_samples: u64,
    pub loop_info: Option<LoopInfo>,
    pub uid: Option<u32>,
    pub blocksize_0: u8,
    pub blocksize_1: u8,
    pub cue_count: u32,

    pub identification_packet: Vec<u8>,
    pub setup_packet: Vec<u8>,
    /// Block flag per mode, needed to restore modified packets.
    pub mode_blockflags: Vec<bool>,

    /// Absolute offset of the first audio packet.
    pub data_region_offset: u64,
    /// Bytes from the first audio packet to the end of `data`.
    pub data_region_length: u64,
    pub data_chunk_offset: u64,
    pub data_chunk_size: u64,

    pub container_length: u64,
    pub stream_name: String,
}

impl WwiseHeader {
    #[must_use]
    pub fn loop_start(&self) -> Option<u64> {
        self.loop_info.map(|l| l.start)
    }

    #[must_use]
    pub fn loop_end(&self) -> Option<u64> {
        self.loop_info.map(|l| l.end)
    }

    /// Nominal bitrate advertised in `fmt `, in bits per second.
    #[must_use]
    pub fn nominal_bitrate(&self) -> u32 {
        self.avg_bytes_per_sec.saturating_mul(8)
    }

    /// Width of the mode number at the start of each audio packet.
    #[must_use]
    pub fn mode_bits(&self) -> u32 {
        setup::mode_bits(self.mode_blockflags.len())
    }
}

/// Parse with no codebook libraries. Only header triad, inline and full
/// setups succeed.
pub fn parse<R: Read + Seek>(source: &mut StreamSource<R>) -> Result<WwiseHeader> {
    parse_with(source, &CodebookRegistry::new(), &ParseOptions::default())
}

/// Parse a Wwise Vorbis container.
///
/// Only reads from `source`; its cursor is left untouched.
///
/// # Errors
///
/// - [`Error::UnsupportedFormat`] for other containers/codecs, unknown
///   header variants or missing codebooks
/// - [`Error::CorruptHeader`] for inconsistent sizes, offsets or loop points
/// - [`Error::OutOfRange`]/[`Error::Io`] from the source
pub fn parse_with<R: Read + Seek>(
    source: &mut StreamSource<R>,
    codebooks: &CodebookRegistry,
    options: &ParseOptions,
) -> Result<WwiseHeader> {
    let table = ChunkTable::read(source)?;
    let endian = table.endian;

    let fmt_chunk = table
        .find(b"fmt ")
        .ok_or_else(|| Error::corrupt("missing 'fmt ' chunk"))?;
    let data_chunk = table
        .find(b"data")
        .ok_or_else(|| Error::corrupt("missing 'data' chunk"))?;
    let fmt = read_chunk(source, fmt_chunk)?;
    let format = FmtChunk::parse(&fmt, endian)?;

    let vorb_chunk = table.find(b"vorb");
    let variant = HeaderVariant::detect(vorb_chunk.map(|c| c.size), fmt_chunk.size)?;
    let vorb = match vorb_chunk {
        Some(chunk) => read_chunk(source, chunk)?,
        None => fmt[EMBEDDED_VORB_OFFSET..].to_vec(),
    };
    if vorb.len() < variant.vorb_len() {
        return Err(Error::corrupt(format!(
            "vorb block is {:#x} bytes, {} layout needs {:#x}",
            vorb.len(),
            variant.name(),
            variant.vorb_len()
        )));
    }

    let offsets = variant.offsets();
    let total_samples = u64::from(endian.u32_at(&vorb, offsets.sample_count)?);
    let setup_offset = u64::from(endian.u32_at(&vorb, offsets.setup_packet)?);
    let first_audio_offset = u64::from(endian.u32_at(&vorb, offsets.first_audio_packet)?);
    let uid = offsets.uid.map(|o| endian.u32_at(&vorb, o)).transpose()?;
    let mod_signal = offsets.mod_signal.map(|o| endian.u32_at(&vorb, o)).transpose()?;

    check_stream_params(&format, total_samples)?;

    let loop_info = if options.ignore_loops {
        None
    } else {
        match table.find(b"smpl") {
            Some(chunk) => read_loop(&read_chunk(source, chunk)?, endian, total_samples)?,
            None => None,
        }
    };
    let cue_count = match table.find(b"cue ") {
        Some(chunk) if chunk.size >= 4 => endian.u32_at(&read_chunk_prefix(source, chunk, 4)?, 0)?,
        _ => 0,
    };

    let data_end = data_chunk.end();
    if data_end > source.len() {
        return Err(Error::corrupt(format!(
            "data region ends at {data_end:#x}, past the container end {:#x}",
            source.len()
        )));
    }
    if setup_offset >= u64::from(data_chunk.size) || first_audio_offset >= u64::from(data_chunk.size) {
        return Err(Error::corrupt(format!(
            "setup ({setup_offset:#x}) or first audio packet ({first_audio_offset:#x}) lies outside the {:#x}-byte data chunk",
            data_chunk.size
        )));
    }

    let packet_header = variant.packet_header();
    let first_audio = data_chunk.offset + first_audio_offset;
    let layout = PacketLayout {
        endian,
        packet_header,
        data: data_chunk,
    };

    let (identification_packet, rebuilt, setup_kind, codebook_library, blocksizes) = match variant {
        HeaderVariant::Triad { .. } => {
            let triad = read_header_triad(source, &layout, data_chunk.offset + setup_offset)?;
            let blocksizes = setup::identification_blocksizes(&triad.identification)?;
            let rebuilt = RebuiltSetup {
                packet: triad.setup,
                mode_blockflags: Vec::new(),
            };
            (triad.identification, rebuilt, SetupKind::HeaderTriad, None, blocksizes)
        }
        _ => {
            let (b0, b1) = offsets.blocksizes.unwrap_or((0, 0));
            let blocksizes = (vorb[b0], vorb[b1]);
            let stripped = layout.read_packet(source, data_chunk.offset + setup_offset)?;
            if stripped.frame_granule.unwrap_or(0) != 0 {
                return Err(Error::corrupt("setup packet has a nonzero granule"));
            }
            if stripped.next != first_audio {
                return Err(Error::corrupt(format!(
                    "first audio packet at {first_audio:#x} does not follow the setup packet (ends at {:#x})",
                    stripped.next
                )));
            }

            let setup_kind = classify_setup(variant, &stripped.data);
            let (rebuilt, library) =
                rebuild_with_candidates(&stripped.data, setup_kind, variant, &format, codebooks)?;
            let identification = setup::identification_packet(
                format.channels,
                format.sample_rate,
                format.avg_bytes_per_sec.saturating_mul(8),
                blocksizes.0,
                blocksizes.1,
            );
            (identification, rebuilt, setup_kind, library, blocksizes)
        }
    };

    check_blocksizes(blocksizes)?;
    let modified_packets = variant.modified_packets(mod_signal, blocksizes);
    tracing::debug!(
        "{}: {} setup, {}-byte packet headers, modified packets: {}",
        source.name(),
        setup_kind.name(),
        packet_header.size(),
        modified_packets
    );

    Ok(WwiseHeader {
        endian,
        variant,
        packet_header,
        modified_packets,
        setup_kind,
        codebook_library,
        sample_rate: format.sample_rate,
        channel_count: format.channels,
        channel_layout: format.channel_layout,
        avg_bytes_per_sec: format.avg_bytes_per_sec,
        total_samples,
        loop_info,
        uid,
        blocksize_0: blocksizes.0,
        blocksize_1: blocksizes.1,
        cue_count,
        identification_packet,
        setup_packet: rebuilt.packet,
        mode_blockflags: rebuilt.mode_blockflags,
        data_region_offset: first_audio,
        data_region_length: data_end - first_audio,
        data_chunk_offset: data_chunk.offset,
        data_chunk_size: u64::from(data_chunk.size),
        container_length: source.len(),
        stream_name: options
            .stream_name
            .clone()
            .unwrap_or_else(|| source.name().to_string()),
    })
}

/// Blocksize exponents must lie in 6..=13, short no larger than long.
fn check_blocksizes((short, long): (u8, u8)) -> Result<()> {
    if !(BLOCKSIZE_RANGE.contains(&short) && BLOCKSIZE_RANGE.contains(&long)) || short > long {
        return Err(Error::corrupt(format!("invalid blocksize exponents {short}/{long}")));
    }
    Ok(())
}

/// The `fmt ` fields the parser keeps.
#[derive(Debug, Clone)]
struct FmtChunk {
    channels: u8,
    sample_rate: u32,
    avg_bytes_per_sec: u32,
    channel_layout: u32,
}

impl FmtChunk {
    fn parse(fmt: &[u8], endian: Endian) -> Result<Self> {
        let size = fmt.len();
        if size < 0x12 {
            return Err(Error::corrupt(format!("fmt chunk is only {size:#x} bytes")));
        }

        let codec = endian.u16_at(fmt, 0x00)?;
        if codec != WWISE_VORBIS_CODEC {
            return Err(Error::unsupported(format!(
                "codec {codec:#06x} is not Wwise Vorbis"
            )));
        }

        let channels = endian.u16_at(fmt, 0x02)?;
        let sample_rate = endian.u32_at(fmt, 0x04)?;
        let avg_bytes_per_sec = endian.u32_at(fmt, 0x08)?;
        if endian.u16_at(fmt, 0x0C)? != 0 {
            return Err(Error::corrupt("block align must be 0"));
        }
        if endian.u16_at(fmt, 0x0E)? != 0 {
            return Err(Error::corrupt("bits per sample must be 0"));
        }
        let extra_len = usize::from(endian.u16_at(fmt, 0x10)?);
        if extra_len != size - 0x12 {
            return Err(Error::corrupt(format!(
                "fmt extra length {extra_len:#x} does not match chunk size {size:#x}"
            )));
        }
        let channel_layout = if extra_len >= 6 {
            endian.u32_at(fmt, 0x14)?
        } else {
            0
        };
        if size == 0x28 && fmt[0x18..0x28] != EXTENSIBLE_GUID {
            return Err(Error::corrupt("fmt extensible GUID mismatch"));
        }

        if channels == 0 {
            return Err(Error::corrupt("zero channels"));
        }
        if channels > u16::from(MAX_CHANNELS) {
            return Err(Error::unsupported(format!(
                "{channels} channels (maximum is {MAX_CHANNELS})"
            )));
        }

        Ok(Self {
            channels: channels as u8,
            sample_rate,
            avg_bytes_per_sec,
            channel_layout,
        })
    }
}

fn check_stream_params(format: &FmtChunk, total_samples: u64) -> Result<()> {
    if !SAMPLE_RATE_RANGE.contains(&format.sample_rate) {
        return Err(Error::corrupt(format!(
            "sample rate {} Hz outside {}..={}",
            format.sample_rate,
            SAMPLE_RATE_RANGE.start(),
            SAMPLE_RATE_RANGE.end()
        )));
    }
    if total_samples == 0 {
        return Err(Error::corrupt("stream has no samples"));
    }
    Ok(())
}

/// First loop of a `smpl` chunk, normalized to an exclusive end.
fn read_loop(smpl: &[u8], endian: Endian, total_samples: u64) -> Result<Option<LoopInfo>> {
    if smpl.len() < 0x24 {
        return Ok(None);
    }
    let loop_count = endian.u32_at(smpl, 0x1C)?;
    if loop_count == 0 {
        return Ok(None);
    }
    if loop_count > 1 {
        tracing::warn!("smpl chunk has {} loops, using the first", loop_count);
    }

    let raw_start = u64::from(endian.u32_at(smpl, 0x2C)?);
    let raw_end = u64::from(endian.u32_at(smpl, 0x30)?);
    if raw_end != 0 && raw_end < raw_start {
        return Err(Error::corrupt(format!(
            "loop end {raw_end} is before loop start {raw_start}"
        )));
    }

    let end = if raw_end == 0 { total_samples } else { raw_end + 1 };
    if raw_start >= total_samples || end > total_samples {
        return Err(Error::corrupt(format!(
            "loop {raw_start}..{end} outside the {total_samples}-sample stream"
        )));
    }
    Ok(Some(LoopInfo {
        start: raw_start,
        end,
    }))
}

/// Decide how a stripped setup packet stores its codebooks.
fn classify_setup(variant: HeaderVariant, setup: &[u8]) -> SetupKind {
    if variant != (HeaderVariant::Standard { vorb_size: 0x34 }) {
        return SetupKind::ExternalCodebooks;
    }
    // First codebook right after the count byte starts with "BCV"
    if setup.get(1..4) == Some(b"BCV".as_slice()) {
        SetupKind::FullSetup
    } else if setup.len() > INLINE_SETUP_THRESHOLD as usize {
        SetupKind::InlineCodebooks
    } else {
        SetupKind::ExternalCodebooks
    }
}

fn rebuild_with_candidates(
    stripped: &[u8],
    kind: SetupKind,
    variant: HeaderVariant,
    format: &FmtChunk,
    codebooks: &CodebookRegistry,
) -> Result<(RebuiltSetup, Option<CodebookLibraryId>)> {
    if kind != SetupKind::ExternalCodebooks {
        return Ok((setup::rebuild_setup(stripped, kind, format.channels, None)?, None));
    }

    let candidates = codebooks.candidates(variant.codebook_candidates());
    if candidates.is_empty() {
        let wanted: Vec<&str> = match codebooks.force() {
            Some(id) => vec![id.name()],
            None => variant.codebook_candidates().iter().map(|id| id.name()).collect(),
        };
        return Err(Error::unsupported(format!(
            "no codebook library registered (wanted {})",
            wanted.join(" or ")
        )));
    }

    let mut last_err = None;
    for (id, library) in candidates {
        match setup::rebuild_setup(stripped, kind, format.channels, Some(library)) {
            Ok(rebuilt) => {
                tracing::debug!("Setup rebuilt with {} codebooks", id);
                return Ok((rebuilt, Some(id)));
            }
            Err(e @ (Error::UnsupportedFormat(_) | Error::CorruptHeader(_))) => {
                tracing::debug!("Setup rebuild with {} codebooks failed: {}", id, e);
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| Error::unsupported("no codebook library matched")))
}

fn read_chunk<R: Read + Seek>(source: &mut StreamSource<R>, chunk: Chunk) -> Result<Vec<u8>> {
    source.read(chunk.offset, chunk.size)
}

fn read_chunk_prefix<R: Read + Seek>(source: &mut StreamSource<R>, chunk: Chunk, len: u32) -> Result<Vec<u8>> {
    source.read(chunk.offset, chunk.size.min(len))
}

/// Packet framing inside one `data` chunk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PacketLayout {
    pub endian: Endian,
    pub packet_header: PacketHeader,
    pub data: Chunk,
}

/// A framed packet read from `data`.
#[derive(Debug, Clone)]
pub(crate) struct RawPacket {
    pub frame_granule: Option<u32>,
    pub data: Vec<u8>,
    /// Offset of the following packet header.
    pub next: u64,
}

impl PacketLayout {
    /// Read the packet whose header starts at `offset`.
    pub fn read_packet<R: Read + Seek>(&self, source: &mut StreamSource<R>, offset: u64) -> Result<RawPacket> {
        let header_len = self.packet_header.size();
        let payload = offset + header_len;
        if payload > self.data.end() {
            return Err(Error::corrupt(format!("packet header at {offset:#x} runs past the data chunk")));
        }
        let header = source.read(offset, header_len as u32)?;
        let frame = self.packet_header.parse(&header, self.endian)?;
        let next = payload + u64::from(frame.size);
        if next > self.data.end() {
            return Err(Error::corrupt(format!(
                "{}-byte packet at {offset:#x} runs past the data chunk",
                frame.size
            )));
        }
        Ok(RawPacket {
            frame_granule: frame.granule,
            data: source.read(payload, frame.size)?,
            next,
        })
    }
}

struct HeaderTriad {
    identification: Vec<u8>,
    setup: Vec<u8>,
}

fn read_header_triad<R: Read + Seek>(
    source: &mut StreamSource<R>,
    layout: &PacketLayout,
    offset: u64,
) -> Result<HeaderTriad> {
    let identification = layout.read_packet(source, offset)?;
    setup::check_packet_preamble(&identification.data, setup::IDENTIFICATION_TYPE)?;
    let comment = layout.read_packet(source, identification.next)?;
    setup::check_packet_preamble(&comment.data, setup::COMMENT_TYPE)?;
    let setup_packet = layout.read_packet(source, comment.next)?;
    setup::check_packet_preamble(&setup_packet.data, setup::SETUP_TYPE)?;

    Ok(HeaderTriad {
        identification: identification.data,
        setup: setup_packet.data,
    })
}
