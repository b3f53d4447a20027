//! SPDX-FileCopyrightText: 2025 `CyberDeco`, 2011 hcs (`ww2ogg`, BSD-3-Clause)
//!
//! SPDX-License-Identifier: BSD-3-Clause
//!
//! Standard Vorbis header packet reconstruction
//!
//! Wwise drops the identification packet entirely and stores the setup
//! packet with narrowed fields: floor/mapping/mode type fields removed,
//! residue types shrunk to 2 bits and codebooks replaced by library ids.
//! [`rebuild_setup`] widens everything back out and validates every index
//! against the counts it has seen so far.

use serde::Serialize;

use crate::bits::{BitReader, BitWriter, ilog};
use crate::codebook::{self, CodebookLibrary};
use crate::error::{Error, Result};

const VORBIS: &[u8; 6] = b"vorbis";

/// Vorbis header packet types.
pub const IDENTIFICATION_TYPE: u8 = 1;
pub const COMMENT_TYPE: u8 = 3;
pub const SETUP_TYPE: u8 = 5;

/// How the setup packet is stored in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupKind {
    /// Standard packets stored verbatim.
    HeaderTriad,
    /// Codebooks referenced by 10-bit library id.
    ExternalCodebooks,
    /// Packed codebooks stored inline in the setup packet.
    InlineCodebooks,
    /// Standard codebooks and a standard setup body, minus the packet preamble.
    FullSetup,
}

impl SetupKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SetupKind::HeaderTriad => "header triad",
            SetupKind::ExternalCodebooks => "external codebooks",
            SetupKind::InlineCodebooks => "inline codebooks",
            SetupKind::FullSetup => "full setup",
        }
    }
}

/// A rebuilt setup packet plus what audio packet restoration needs from it.
#[derive(Debug, Clone)]
pub struct RebuiltSetup {
    pub packet: Vec<u8>,
    /// Block flag of every mode, in mode order. Empty for full setups.
    pub mode_blockflags: Vec<bool>,
}

#[must_use]
pub fn mode_bits(mode_count: usize) -> u32 {
    ilog(mode_count.saturating_sub(1) as u32)
}

/// Synthesize a Vorbis identification packet.
///
/// `nominal_bitrate` is in bits per second; the blocksizes are exponents.
#[must_use]
pub fn identification_packet(
    channels: u8,
    sample_rate: u32,
    nominal_bitrate: u32,
    blocksize_0: u8,
    blocksize_1: u8,
) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write_bits(u32::from(IDENTIFICATION_TYPE), 8);
    w.write_bytes(VORBIS);
    w.write_bits(0, 32); // version
    w.write_bits(u32::from(channels), 8);
    w.write_bits(sample_rate, 32);
    w.write_bits(0, 32); // bitrate maximum
    w.write_bits(nominal_bitrate, 32);
    w.write_bits(0, 32); // bitrate minimum
    w.write_bits(u32::from(blocksize_0), 4);
    w.write_bits(u32::from(blocksize_1), 4);
    w.write_bit(true); // framing
    w.into_bytes()
}

/// Check a verbatim header packet's type byte and `vorbis` magic.
pub fn check_packet_preamble(packet: &[u8], packet_type: u8) -> Result<()> {
    if packet.len() < 7 || packet[0] != packet_type || &packet[1..7] != VORBIS {
        return Err(Error::corrupt(format!(
            "expected Vorbis header packet type {packet_type}"
        )));
    }
    Ok(())
}

/// Blocksize exponents of a standard identification packet.
pub fn identification_blocksizes(packet: &[u8]) -> Result<(u8, u8)> {
    check_packet_preamble(packet, IDENTIFICATION_TYPE)?;
    let byte = packet
        .get(28)
        .ok_or_else(|| Error::corrupt("identification packet is truncated"))?;
    Ok((byte & 0x0F, byte >> 4))
}

/// Rebuild a stripped Wwise setup packet into a standard one.
///
/// `library` is required for [`SetupKind::ExternalCodebooks`] and ignored
/// otherwise.
///
/// # Errors
///
/// - [`Error::UnsupportedFormat`] if a codebook id is missing from `library`
/// - [`Error::CorruptHeader`] if any index is out of range or the packet is
///   not consumed exactly
pub fn rebuild_setup(
    stripped: &[u8],
    kind: SetupKind,
    channels: u8,
    library: Option<&CodebookLibrary>,
) -> Result<RebuiltSetup> {
    let mut input = BitReader::new(stripped);
    let mut out = BitWriter::new();
    out.write_bits(u32::from(SETUP_TYPE), 8);
    out.write_bytes(VORBIS);

    let codebook_count = input.read_bits(8)? + 1;
    out.write_bits(codebook_count - 1, 8);

    match kind {
        SetupKind::ExternalCodebooks => {
            let library = library
                .ok_or_else(|| Error::unsupported("external codebooks need a codebook library"))?;
            for _ in 0..codebook_count {
                let id = input.read_bits(10)?;
                library.rebuild(id, &mut out)?;
            }
        }
        SetupKind::InlineCodebooks => {
            for _ in 0..codebook_count {
                codebook::rebuild_packed(&mut input, 0, &mut out)?;
            }
        }
        SetupKind::FullSetup => {
            for _ in 0..codebook_count {
                codebook::copy_standard(&mut input, &mut out)?;
            }
        }
        SetupKind::HeaderTriad => {
            return Err(Error::InvalidState(
                "header triad setups are stored verbatim".to_string(),
            ));
        }
    }

    let mut mode_blockflags = Vec::new();
    if kind == SetupKind::FullSetup {
        // Time domain, floors, residues, mappings and modes are already standard
        let total = stripped.len() * 8;
        while input.bits_read() < total {
            out.write_bit(input.read_bit()?);
        }
    } else {
        // Time domain transforms: one placeholder
        out.write_bits(0, 6);
        out.write_bits(0, 16);

        let floor_count = rebuild_floors(&mut input, &mut out, codebook_count)?;
        let residue_count = rebuild_residues(&mut input, &mut out, codebook_count)?;
        let mapping_count =
            rebuild_mappings(&mut input, &mut out, channels, floor_count, residue_count)?;
        mode_blockflags = rebuild_modes(&mut input, &mut out, mapping_count)?;
        out.write_bit(true); // framing
    }

    let consumed = input.bits_read().div_ceil(8);
    if consumed != stripped.len() {
        return Err(Error::corrupt(format!(
            "setup packet is {} bytes but the rebuild consumed {consumed}",
            stripped.len()
        )));
    }

    tracing::trace!(
        "Rebuilt {} setup: {} codebooks, {} modes, {} bytes",
        kind.name(),
        codebook_count,
        mode_blockflags.len(),
        out.bits_written().div_ceil(8)
    );

    Ok(RebuiltSetup {
        packet: out.into_bytes(),
        mode_blockflags,
    })
}

fn copy(input: &mut BitReader<'_>, out: &mut BitWriter, bits: u32) -> Result<u32> {
    let value = input.read_bits(bits)?;
    out.write_bits(value, bits);
    Ok(value)
}

fn rebuild_floors(input: &mut BitReader<'_>, out: &mut BitWriter, codebook_count: u32) -> Result<u32> {
    let floor_count = copy(input, out, 6)? + 1;

    for _ in 0..floor_count {
        out.write_bits(1, 16); // floor type 1

        let partitions = copy(input, out, 5)?;
        let mut partition_classes = Vec::with_capacity(partitions as usize);
        for _ in 0..partitions {
            partition_classes.push(copy(input, out, 4)?);
        }
        let max_class = partition_classes.iter().copied().max();

        let mut class_dimensions = Vec::new();
        if let Some(max_class) = max_class {
            for _ in 0..=max_class {
                class_dimensions.push(copy(input, out, 3)? + 1);

                let subclasses = copy(input, out, 2)?;
                if subclasses != 0 {
                    let masterbook = copy(input, out, 8)?;
                    if masterbook >= codebook_count {
                        return Err(Error::corrupt(format!("floor masterbook {masterbook} out of range")));
                    }
                }
                for _ in 0..(1u32 << subclasses) {
                    let book_plus1 = copy(input, out, 8)?;
                    if book_plus1 > codebook_count {
                        return Err(Error::corrupt(format!(
                            "floor subclass book {} out of range",
                            book_plus1 - 1
                        )));
                    }
                }
            }
        }

        copy(input, out, 2)?; // multiplier - 1
        let rangebits = copy(input, out, 4)?;
        for class in partition_classes {
            for _ in 0..class_dimensions[class as usize] {
                copy(input, out, rangebits)?;
            }
        }
    }
    Ok(floor_count)
}

fn rebuild_residues(input: &mut BitReader<'_>, out: &mut BitWriter, codebook_count: u32) -> Result<u32> {
    let residue_count = copy(input, out, 6)? + 1;

    for _ in 0..residue_count {
        let residue_type = input.read_bits(2)?;
        if residue_type > 2 {
            return Err(Error::corrupt(format!("invalid residue type {residue_type}")));
        }
        out.write_bits(residue_type, 16);

        copy(input, out, 24)?; // begin
        copy(input, out, 24)?; // end
        copy(input, out, 24)?; // partition size - 1
        let classifications = copy(input, out, 6)? + 1;
        let classbook = copy(input, out, 8)?;
        if classbook >= codebook_count {
            return Err(Error::corrupt(format!("residue classbook {classbook} out of range")));
        }

        let mut cascade = Vec::with_capacity(classifications as usize);
        for _ in 0..classifications {
            let low = copy(input, out, 3)?;
            let high = if copy(input, out, 1)? == 1 {
                copy(input, out, 5)?
            } else {
                0
            };
            cascade.push(high * 8 + low);
        }

        for bits in cascade {
            for k in 0..8 {
                if bits & (1 << k) != 0 {
                    let book = copy(input, out, 8)?;
                    if book >= codebook_count {
                        return Err(Error::corrupt(format!("residue book {book} out of range")));
                    }
                }
            }
        }
    }
    Ok(residue_count)
}

fn rebuild_mappings(
    input: &mut BitReader<'_>,
    out: &mut BitWriter,
    channels: u8,
    floor_count: u32,
    residue_count: u32,
) -> Result<u32> {
    let mapping_count = copy(input, out, 6)? + 1;
    let channels = u32::from(channels);

    for _ in 0..mapping_count {
        out.write_bits(0, 16); // mapping type 0

        let submaps = if copy(input, out, 1)? == 1 {
            copy(input, out, 4)? + 1
        } else {
            1
        };

        if copy(input, out, 1)? == 1 {
            let coupling_steps = copy(input, out, 8)? + 1;
            let width = ilog(channels.saturating_sub(1));
            for _ in 0..coupling_steps {
                let magnitude = copy(input, out, width)?;
                let angle = copy(input, out, width)?;
                if magnitude == angle || magnitude >= channels || angle >= channels {
                    return Err(Error::corrupt(format!(
                        "invalid channel coupling {magnitude}/{angle}"
                    )));
                }
            }
        }

        if copy(input, out, 2)? != 0 {
            return Err(Error::corrupt("mapping reserved field is nonzero"));
        }

        if submaps > 1 {
            for _ in 0..channels {
                let mux = copy(input, out, 4)?;
                if mux >= submaps {
                    return Err(Error::corrupt(format!("mapping mux {mux} out of range")));
                }
            }
        }

        for _ in 0..submaps {
            copy(input, out, 8)?; // time config
            let floor = copy(input, out, 8)?;
            if floor >= floor_count {
                return Err(Error::corrupt(format!("mapping floor {floor} out of range")));
            }
            let residue = copy(input, out, 8)?;
            if residue >= residue_count {
                return Err(Error::corrupt(format!("mapping residue {residue} out of range")));
            }
        }
    }
    Ok(mapping_count)
}

fn rebuild_modes(input: &mut BitReader<'_>, out: &mut BitWriter, mapping_count: u32) -> Result<Vec<bool>> {
    let mode_count = copy(input, out, 6)? + 1;
    let mut blockflags = Vec::with_capacity(mode_count as usize);

    for _ in 0..mode_count {
        blockflags.push(copy(input, out, 1)? == 1);
        out.write_bits(0, 16); // window type
        out.write_bits(0, 16); // transform type
        let mapping = copy(input, out, 8)?;
        if mapping >= mapping_count {
            return Err(Error::corrupt(format!("mode mapping {mapping} out of range")));
        }
    }
    Ok(blockflags)
}
