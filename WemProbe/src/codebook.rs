//! SPDX-FileCopyrightText: 2025 `CyberDeco`, 2011 hcs (`ww2ogg`, BSD-3-Clause)
//!
//! SPDX-License-Identifier: BSD-3-Clause
//!
//! Shared Vorbis codebook libraries
//!
//! Wwise strips codebooks out of most setup packets and stores only a 10-bit
//! index into a library shared by every file encoded with the same SDK. The
//! libraries use the packed layout popularized by ww2ogg: codebook bodies
//! back to back, followed by a little-endian offset table whose own offset is
//! the final `u32` of the file.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::bits::{BitReader, BitWriter, ilog};
use crate::error::{Error, Result};

/// Standard Vorbis codebook sync pattern ("BCV").
pub const CODEBOOK_SYNC: u32 = 0x564342;

/// Known codebook libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodebookLibraryId {
    /// Codebooks shipped with most Wwise SDKs.
    Standard,
    /// aoTuV 6.03 codebooks, used by later SDKs that embed the vorb data in `fmt `.
    AoTuV603,
}

impl CodebookLibraryId {
    pub const ALL: [CodebookLibraryId; 2] = [CodebookLibraryId::Standard, CodebookLibraryId::AoTuV603];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CodebookLibraryId::Standard => "standard",
            CodebookLibraryId::AoTuV603 => "aotuv603",
        }
    }

    /// File name the library is conventionally distributed under.
    #[must_use]
    pub fn default_file_name(self) -> &'static str {
        match self {
            CodebookLibraryId::Standard => "packed_codebooks.bin",
            CodebookLibraryId::AoTuV603 => "packed_codebooks_aoTuV_603.bin",
        }
    }
}

impl fmt::Display for CodebookLibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodebookLibraryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(CodebookLibraryId::Standard),
            "aotuv603" | "aotuv" => Ok(CodebookLibraryId::AoTuV603),
            other => Err(Error::unsupported(format!("unknown codebook library '{other}'"))),
        }
    }
}

/// One packed codebook library, held fully in memory.
#[derive(Clone)]
pub struct CodebookLibrary {
    data: Vec<u8>,
    offsets: Vec<u32>,
}

impl fmt::Debug for CodebookLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodebookLibrary")
            .field("data_len", &self.data.len())
            .field("count", &self.count())
            .finish()
    }
}

impl CodebookLibrary {
    /// Parse a packed library from memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] if the trailing offset table does not
    /// fit inside the buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(Error::corrupt("codebook library shorter than its offset table"));
        }
        let offset_offset = LittleEndian::read_u32(&bytes[bytes.len() - 4..]) as usize;
        if offset_offset > bytes.len() - 4 {
            return Err(Error::corrupt(format!(
                "codebook offset table at {offset_offset:#x} is past the end of the library"
            )));
        }

        let offsets: Vec<u32> = bytes[offset_offset..]
            .chunks_exact(4)
            .map(LittleEndian::read_u32)
            .collect();

        let mut data = bytes;
        data.truncate(offset_offset);
        Ok(Self { data, offsets })
    }

    /// Load a packed library from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        let library = Self::from_bytes(bytes)?;
        tracing::debug!("Loaded {} codebooks from {}", library.count(), path.display());
        Ok(library)
    }

    /// Number of addressable codebooks.
    #[must_use]
    pub fn count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Packed body of codebook `id`, if present.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&[u8]> {
        let id = id as usize;
        if id >= self.count() {
            return None;
        }
        let start = self.offsets[id] as usize;
        let end = self.offsets[id + 1] as usize;
        self.data.get(start..end)
    }

    /// Rebuild codebook `id` into standard Vorbis layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the id is not in this library
    /// and [`Error::CorruptHeader`] if the packed body is malformed.
    pub fn rebuild(&self, id: u32, out: &mut BitWriter) -> Result<()> {
        let body = self
            .get(id)
            .ok_or_else(|| Error::unsupported(format!("codebook id {id} not in library ({} codebooks)", self.count())))?;
        let mut reader = BitReader::new(body);
        rebuild_packed(&mut reader, body.len(), out)
    }
}

/// Expand one packed codebook to standard layout.
///
/// `size` is the packed byte length when known; `0` skips the length check
/// (codebooks stored inline in a setup packet).
pub fn rebuild_packed(input: &mut BitReader<'_>, size: usize, out: &mut BitWriter) -> Result<()> {
    let start = input.bits_read();

    let dimensions = input.read_bits(4)?;
    let entries = input.read_bits(14)?;
    out.write_bits(CODEBOOK_SYNC, 24);
    out.write_bits(dimensions, 16);
    out.write_bits(entries, 24);

    let ordered = input.read_bit()?;
    out.write_bit(ordered);
    if ordered {
        copy_ordered_lengths(input, out, entries)?;
    } else {
        let codeword_length_length = input.read_bits(3)?;
        let sparse = input.read_bit()?;
        if codeword_length_length == 0 || codeword_length_length > 5 {
            return Err(Error::corrupt(format!(
                "bad codeword length length {codeword_length_length}"
            )));
        }
        out.write_bit(sparse);

        for _ in 0..entries {
            let present = if sparse {
                let present = input.read_bit()?;
                out.write_bit(present);
                present
            } else {
                true
            };
            if present {
                let length = input.read_bits(codeword_length_length)?;
                out.write_bits(length, 5);
            }
        }
    }

    let lookup_type = input.read_bits(1)?;
    out.write_bits(lookup_type, 4);
    if lookup_type == 1 {
        copy_lookup_table(input, out, entries, dimensions)?;
    }

    let used = input.bits_read() - start;
    if size != 0 && used / 8 + 1 != size {
        return Err(Error::corrupt(format!(
            "packed codebook size mismatch: expected {size} bytes, used {}",
            used / 8 + 1
        )));
    }
    Ok(())
}

/// Copy one codebook that is already in standard layout.
pub fn copy_standard(input: &mut BitReader<'_>, out: &mut BitWriter) -> Result<()> {
    let sync = input.read_bits(24)?;
    if sync != CODEBOOK_SYNC {
        return Err(Error::corrupt(format!("bad codebook sync {sync:#08x}")));
    }
    let dimensions = input.read_bits(16)?;
    let entries = input.read_bits(24)?;
    out.write_bits(sync, 24);
    out.write_bits(dimensions, 16);
    out.write_bits(entries, 24);

    let ordered = input.read_bit()?;
    out.write_bit(ordered);
    if ordered {
        copy_ordered_lengths(input, out, entries)?;
    } else {
        let sparse = input.read_bit()?;
        out.write_bit(sparse);
        for _ in 0..entries {
            let present = if sparse {
                let present = input.read_bit()?;
                out.write_bit(present);
                present
            } else {
                true
            };
            if present {
                out.write_bits(input.read_bits(5)?, 5);
            }
        }
    }

    let lookup_type = input.read_bits(4)?;
    out.write_bits(lookup_type, 4);
    match lookup_type {
        0 => Ok(()),
        1 => copy_lookup_table(input, out, entries, dimensions),
        other => Err(Error::corrupt(format!("unexpected codebook lookup type {other}"))),
    }
}

fn copy_ordered_lengths(input: &mut BitReader<'_>, out: &mut BitWriter, entries: u32) -> Result<()> {
    out.write_bits(input.read_bits(5)?, 5);

    let mut current = 0u32;
    while current < entries {
        let width = ilog(entries - current);
        let number = input.read_bits(width)?;
        out.write_bits(number, width);
        current += number;
    }
    if current > entries {
        return Err(Error::corrupt("ordered codebook lengths overrun entry count"));
    }
    Ok(())
}

fn copy_lookup_table(
    input: &mut BitReader<'_>,
    out: &mut BitWriter,
    entries: u32,
    dimensions: u32,
) -> Result<()> {
    let min = input.read_bits(32)?;
    let max = input.read_bits(32)?;
    let value_length = input.read_bits(4)?;
    let sequence = input.read_bit()?;
    out.write_bits(min, 32);
    out.write_bits(max, 32);
    out.write_bits(value_length, 4);
    out.write_bit(sequence);

    for _ in 0..quantvals(entries, dimensions)? {
        out.write_bits(input.read_bits(value_length + 1)?, value_length + 1);
    }
    Ok(())
}

/// Number of quantized values of a type 1 lookup table: the largest `v`
/// with `v.pow(dimensions) <= entries`.
pub fn quantvals(entries: u32, dimensions: u32) -> Result<u32> {
    if dimensions == 0 {
        return Err(Error::corrupt("codebook with zero dimensions has a lookup table"));
    }
    let bits = ilog(entries);
    let mut vals = entries >> (bits.saturating_sub(1) * (dimensions - 1) / dimensions);

    loop {
        let mut acc: u64 = 1;
        let mut acc1: u64 = 1;
        for _ in 0..dimensions {
            acc = acc.saturating_mul(u64::from(vals));
            acc1 = acc1.saturating_mul(u64::from(vals) + 1);
        }
        if acc <= u64::from(entries) && acc1 > u64::from(entries) {
            return Ok(vals);
        }
        if acc > u64::from(entries) {
            vals -= 1;
        } else {
            vals += 1;
        }
    }
}

/// Codebook libraries available to the header parser, keyed by id.
///
/// Shared read-only between files in a batch.
#[derive(Debug, Clone, Default)]
pub struct CodebookRegistry {
    libraries: HashMap<CodebookLibraryId, CodebookLibrary>,
    force: Option<CodebookLibraryId>,
}

impl CodebookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_library(mut self, id: CodebookLibraryId, library: CodebookLibrary) -> Self {
        self.insert(id, library);
        self
    }

    pub fn insert(&mut self, id: CodebookLibraryId, library: CodebookLibrary) {
        self.libraries.insert(id, library);
    }

    #[must_use]
    pub fn get(&self, id: CodebookLibraryId) -> Option<&CodebookLibrary> {
        self.libraries.get(&id)
    }

    /// Only ever hand out `id`, whatever the header variant asks for.
    pub fn set_force(&mut self, id: Option<CodebookLibraryId>) {
        self.force = id;
    }

    #[must_use]
    pub fn force(&self) -> Option<CodebookLibraryId> {
        self.force
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Registered libraries among `preferred`, in order.
    #[must_use]
    pub fn candidates(&self, preferred: &[CodebookLibraryId]) -> Vec<(CodebookLibraryId, &CodebookLibrary)> {
        let order: Vec<CodebookLibraryId> = match self.force {
            Some(forced) => vec![forced],
            None => preferred.to_vec(),
        };
        order
            .into_iter()
            .filter_map(|id| self.libraries.get(&id).map(|lib| (id, lib)))
            .collect()
    }

    /// Load every library found under `dir` using its conventional file name.
    /// Missing files are skipped.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let paths: Vec<(CodebookLibraryId, PathBuf)> = CodebookLibraryId::ALL
            .iter()
            .map(|&id| (id, dir.join(id.default_file_name())))
            .collect();
        Self::load_paths(&paths)
    }

    /// Load libraries from explicit paths. Missing files are skipped.
    pub fn load_paths(paths: &[(CodebookLibraryId, PathBuf)]) -> Result<Self> {
        let mut registry = Self::new();
        for (id, path) in paths {
            match CodebookLibrary::open(path) {
                Ok(library) => registry.insert(*id, library),
                Err(Error::NotFound { .. }) => {
                    tracing::debug!("No {} codebooks at {}", id, path.display());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(registry)
    }
}
