//! Wwise Vorbis header sub-variants
//!
//! Each Wwise SDK generation lays out the `vorb` block differently. The
//! variant is decided once from the `vorb` chunk size (or the `fmt ` size
//! when the block is embedded) and everything downstream works from the
//! offset table, packet framing and codebook preferences it hands out.

use serde::Serialize;

use crate::codebook::CodebookLibraryId;
use crate::error::{Error, Result};
use crate::wwise::riff::Endian;

/// `fmt ` size of SDKs that embed the vorb block at `fmt + 0x18`.
pub const EMBEDDED_FMT_SIZE: u32 = 0x42;

/// Offset of the embedded vorb block inside the `fmt ` chunk.
pub const EMBEDDED_VORB_OFFSET: usize = 0x18;

/// Mod signals whose audio packets keep standard Vorbis framing.
const UNMODIFIED_SIGNALS: [u32; 4] = [0x4A, 0x4B, 0x69, 0x70];

/// The header layout generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HeaderVariant {
    /// Oldest SDKs: the full identification/comment/setup triad sits in `data`.
    Triad { vorb_size: u32 },
    /// Stripped setup, standard audio packets with 6-byte headers.
    Standard { vorb_size: u32 },
    /// Stripped setup, 2-byte packet headers, usually modified audio packets.
    Modified,
    /// Same as [`Modified`](Self::Modified) with the vorb block inside `fmt `.
    Embedded,
}

/// Audio/setup packet framing inside the `data` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketHeader {
    /// `u16` size.
    Short,
    /// `u16` size + `u32` granule.
    Medium,
    /// `u32` size + `u32` granule.
    Long,
}

impl PacketHeader {
    #[must_use]
    pub fn size(self) -> u64 {
        match self {
            PacketHeader::Short => 2,
            PacketHeader::Medium => 6,
            PacketHeader::Long => 8,
        }
    }

    /// Decode a packet header from the first [`size`](Self::size) bytes of `bytes`.
    pub fn parse(self, bytes: &[u8], endian: Endian) -> Result<PacketFrame> {
        Ok(match self {
            PacketHeader::Short => PacketFrame {
                size: u32::from(endian.u16_at(bytes, 0)?),
                granule: None,
            },
            PacketHeader::Medium => PacketFrame {
                size: u32::from(endian.u16_at(bytes, 0)?),
                granule: Some(endian.u32_at(bytes, 2)?),
            },
            PacketHeader::Long => PacketFrame {
                size: endian.u32_at(bytes, 0)?,
                granule: Some(endian.u32_at(bytes, 4)?),
            },
        })
    }
}

/// A decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketFrame {
    /// Payload size in bytes, excluding the header itself.
    pub size: u32,
    pub granule: Option<u32>,
}

/// Field offsets inside the vorb block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VorbOffsets {
    pub sample_count: usize,
    pub mod_signal: Option<usize>,
    pub setup_packet: usize,
    pub first_audio_packet: usize,
    pub uid: Option<usize>,
    pub blocksizes: Option<(usize, usize)>,
}

impl HeaderVariant {
    /// Pick the variant from the vorb chunk size, falling back to the fmt size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for any other size.
    pub fn detect(vorb_size: Option<u32>, fmt_size: u32) -> Result<Self> {
        let variant = match vorb_size {
            Some(size @ (0x28 | 0x2C)) => HeaderVariant::Triad { vorb_size: size },
            Some(size @ (0x32 | 0x34)) => HeaderVariant::Standard { vorb_size: size },
            Some(0x2A) => HeaderVariant::Modified,
            Some(size) => {
                return Err(Error::unsupported(format!("unknown vorb chunk size {size:#x}")));
            }
            None if fmt_size == EMBEDDED_FMT_SIZE => HeaderVariant::Embedded,
            None => {
                return Err(Error::unsupported(format!(
                    "no vorb chunk and fmt size {fmt_size:#x} does not embed one"
                )));
            }
        };
        tracing::debug!("Header variant: {}", variant.name());
        Ok(variant)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            HeaderVariant::Triad { .. } => "header triad",
            HeaderVariant::Standard { .. } => "standard",
            HeaderVariant::Modified => "modified",
            HeaderVariant::Embedded => "embedded",
        }
    }

    #[must_use]
    pub fn offsets(self) -> VorbOffsets {
        match self {
            HeaderVariant::Triad { .. } => VorbOffsets {
                sample_count: 0x00,
                mod_signal: None,
                setup_packet: 0x18,
                first_audio_packet: 0x1C,
                uid: None,
                blocksizes: None,
            },
            HeaderVariant::Standard { .. } => VorbOffsets {
                sample_count: 0x00,
                mod_signal: None,
                setup_packet: 0x18,
                first_audio_packet: 0x1C,
                uid: Some(0x2C),
                blocksizes: Some((0x30, 0x31)),
            },
            HeaderVariant::Modified | HeaderVariant::Embedded => VorbOffsets {
                sample_count: 0x00,
                mod_signal: Some(0x04),
                setup_packet: 0x10,
                first_audio_packet: 0x14,
                uid: Some(0x24),
                blocksizes: Some((0x28, 0x29)),
            },
        }
    }

    /// Bytes of vorb data the offset table reaches into.
    #[must_use]
    pub fn vorb_len(self) -> usize {
        match self {
            HeaderVariant::Triad { .. } => 0x20,
            HeaderVariant::Standard { .. } => 0x32,
            HeaderVariant::Modified | HeaderVariant::Embedded => 0x2A,
        }
    }

    #[must_use]
    pub fn packet_header(self) -> PacketHeader {
        match self {
            HeaderVariant::Triad { .. } => PacketHeader::Long,
            HeaderVariant::Standard { .. } => PacketHeader::Medium,
            HeaderVariant::Modified | HeaderVariant::Embedded => PacketHeader::Short,
        }
    }

    /// Whether audio packets have their type bit and window flags stripped.
    #[must_use]
    pub fn modified_packets(self, mod_signal: Option<u32>, blocksizes: (u8, u8)) -> bool {
        match self {
            HeaderVariant::Modified | HeaderVariant::Embedded => {
                let standard_signal = mod_signal.is_some_and(|s| UNMODIFIED_SIGNALS.contains(&s));
                !standard_signal && blocksizes.0 != blocksizes.1
            }
            _ => false,
        }
    }

    /// Codebook libraries to try for external codebook ids, most likely first.
    #[must_use]
    pub fn codebook_candidates(self) -> &'static [CodebookLibraryId] {
        match self {
            HeaderVariant::Embedded => &[CodebookLibraryId::AoTuV603, CodebookLibraryId::Standard],
            _ => &[CodebookLibraryId::Standard],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(
            HeaderVariant::detect(Some(0x2C), 0x18).unwrap(),
            HeaderVariant::Triad { vorb_size: 0x2C }
        );
        assert_eq!(
            HeaderVariant::detect(Some(0x34), 0x18).unwrap(),
            HeaderVariant::Standard { vorb_size: 0x34 }
        );
        assert_eq!(HeaderVariant::detect(Some(0x2A), 0x18).unwrap(), HeaderVariant::Modified);
        assert_eq!(HeaderVariant::detect(None, 0x42).unwrap(), HeaderVariant::Embedded);
    }

    #[test]
    fn test_detect_unknown_sizes() {
        assert!(matches!(HeaderVariant::detect(Some(0x30), 0x18), Err(Error::UnsupportedFormat(_))));
        assert!(matches!(HeaderVariant::detect(None, 0x28), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_offsets_fit_vorb_len() {
        for variant in [
            HeaderVariant::Triad { vorb_size: 0x28 },
            HeaderVariant::Standard { vorb_size: 0x32 },
            HeaderVariant::Modified,
            HeaderVariant::Embedded,
        ] {
            let o = variant.offsets();
            assert!(o.first_audio_packet + 4 <= variant.vorb_len());
            if let Some((_, b1)) = o.blocksizes {
                assert!(b1 < variant.vorb_len());
            }
        }
    }

    #[test]
    fn test_modified_packets() {
        let v = HeaderVariant::Embedded;
        assert!(v.modified_packets(Some(0x1234), (8, 11)));
        assert!(!v.modified_packets(Some(0x4A), (8, 11)));
        assert!(!v.modified_packets(Some(0x1234), (8, 8)));
        assert!(!HeaderVariant::Standard { vorb_size: 0x32 }.modified_packets(None, (8, 11)));
    }

    #[test]
    fn test_packet_header_sizes() {
        assert_eq!(HeaderVariant::Modified.packet_header().size(), 2);
        assert_eq!(HeaderVariant::Standard { vorb_size: 0x34 }.packet_header().size(), 6);
        assert_eq!(HeaderVariant::Triad { vorb_size: 0x28 }.packet_header().size(), 8);
    }

    #[test]
    fn test_parse_packet_frames() {
        let bytes = [0x10, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            PacketHeader::Short.parse(&bytes, Endian::Little).unwrap(),
            PacketFrame { size: 0x10, granule: None }
        );
        assert_eq!(
            PacketHeader::Medium.parse(&bytes, Endian::Little).unwrap(),
            PacketFrame { size: 0x10, granule: Some(0x20) }
        );
        assert_eq!(
            PacketHeader::Long.parse(&bytes, Endian::Little).unwrap(),
            PacketFrame { size: 0x0020_0010, granule: Some(0) }
        );
        assert_eq!(PacketHeader::Short.parse(&bytes, Endian::Big).unwrap().size, 0x1000);
        assert!(PacketHeader::Long.parse(&bytes[..4], Endian::Little).is_err());
    }
}
