//! RIFF/RIFX prologue and chunk table

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Serialize;
use std::io::{Read, Seek};

use crate::error::{Error, Result};
use crate::source::StreamSource;

const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const RIFX_MAGIC: &[u8; 4] = b"RIFX";
const WAVE_MAGIC: &[u8; 4] = b"WAVE";

/// Size of the `RIFF....WAVE` prologue.
pub const PROLOGUE_SIZE: u64 = 12;

/// Byte order of every multi-byte header field, picked by the RIFF magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    /// `RIFF`
    Little,
    /// `RIFX` (console builds)
    Big,
}

impl Endian {
    /// Read a `u16` at `offset` within `buf`.
    pub fn u16_at(self, buf: &[u8], offset: usize) -> Result<u16> {
        let bytes = field(buf, offset, 2)?;
        Ok(match self {
            Endian::Little => LittleEndian::read_u16(bytes),
            Endian::Big => BigEndian::read_u16(bytes),
        })
    }

    /// Read a `u32` at `offset` within `buf`.
    pub fn u32_at(self, buf: &[u8], offset: usize) -> Result<u32> {
        let bytes = field(buf, offset, 4)?;
        Ok(match self {
            Endian::Little => LittleEndian::read_u32(bytes),
            Endian::Big => BigEndian::read_u32(bytes),
        })
    }
}

fn field(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| {
            Error::corrupt(format!(
                "field at {offset:#x} runs past the end of a {:#x}-byte block",
                buf.len()
            ))
        })
}

/// One chunk of the RIFF body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub id: [u8; 4],
    /// Absolute offset of the chunk body (after the 8-byte chunk header).
    pub offset: u64,
    pub size: u32,
}

impl Chunk {
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.size)
    }

    #[must_use]
    pub fn id_str(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }
}

/// The prologue fields plus every chunk, in file order.
#[derive(Debug, Clone)]
pub struct ChunkTable {
    pub endian: Endian,
    pub chunks: Vec<Chunk>,
}

impl ChunkTable {
    /// Read the prologue and walk every chunk header.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedFormat`] if the container is not `RIFF`/`RIFX` + `WAVE`
    /// - [`Error::CorruptHeader`] if the RIFF size or any chunk overruns the container
    pub fn read<R: Read + Seek>(source: &mut StreamSource<R>) -> Result<Self> {
        if source.len() < PROLOGUE_SIZE {
            return Err(Error::unsupported(format!(
                "{} bytes is too short for a RIFF header",
                source.len()
            )));
        }

        let prologue = source.read(0, PROLOGUE_SIZE as u32)?;
        let endian = match &prologue[0..4] {
            m if m == RIFF_MAGIC => Endian::Little,
            m if m == RIFX_MAGIC => Endian::Big,
            other => {
                return Err(Error::unsupported(format!("unknown signature {other:02x?}")));
            }
        };
        if &prologue[8..12] != WAVE_MAGIC {
            return Err(Error::unsupported("RIFF form type is not WAVE"));
        }

        let riff_size = endian.u32_at(&prologue, 4)?;
        let riff_end = 8 + u64::from(riff_size);
        if riff_end > source.len() {
            return Err(Error::corrupt(format!(
                "RIFF size {riff_end:#x} exceeds container size {:#x}",
                source.len()
            )));
        }

        let mut chunks = Vec::new();
        let mut offset = PROLOGUE_SIZE;
        while offset < riff_end {
            if offset + 8 > riff_end {
                return Err(Error::corrupt(format!("chunk header at {offset:#x} is truncated")));
            }
            let header = source.read(offset, 8)?;
            let mut id = [0u8; 4];
            id.copy_from_slice(&header[0..4]);
            let size = endian.u32_at(&header, 4)?;

            let chunk = Chunk {
                id,
                offset: offset + 8,
                size,
            };
            if chunk.end() > riff_end {
                return Err(Error::corrupt(format!(
                    "'{}' chunk at {:#x} ends past the RIFF body",
                    chunk.id_str(),
                    offset
                )));
            }

            tracing::trace!("Chunk '{}' at {:#x} ({} bytes)", chunk.id_str(), chunk.offset, size);
            chunks.push(chunk);
            offset = chunk.end();
        }

        Ok(Self {
            endian,
            chunks,
        })
    }

    /// First chunk with the given id.
    #[must_use]
    pub fn find(&self, id: &[u8; 4]) -> Option<Chunk> {
        self.chunks.iter().find(|c| &c.id == id).copied()
    }
}
