//! Audio packet iteration
//!
//! Modified Wwise packets drop the leading packet-type bit and the
//! previous/next window flags that standard Vorbis puts after the mode
//! number. Restoring them needs the mode block flags from the setup packet
//! and a peek at the following packet's mode.

use std::io::{Read, Seek};

use serde::Serialize;

use crate::bits::{BitReader, BitWriter};
use crate::codec::state::DecodeState;
use crate::error::{Error, Result};
use crate::wwise::header::{PacketLayout, RawPacket};
use crate::wwise::riff::Chunk;

/// One audio packet, in standard Vorbis form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioPacket {
    /// Absolute offset of the packet header.
    pub offset: u64,
    /// Granule position stored by 6/8-byte packet headers.
    pub granule: Option<u32>,
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Payload size as stored in the container.
    pub stored_size: u32,
}

impl<R: Read + Seek> DecodeState<'_, R> {
    fn layout(&self) -> PacketLayout {
        let data_end = self.header.data_region_offset + self.header.data_region_length;
        PacketLayout {
            endian: self.header.endian,
            packet_header: self.header.packet_header,
            data: Chunk {
                id: *b"data",
                offset: self.header.data_chunk_offset,
                size: (data_end - self.header.data_chunk_offset) as u32,
            },
        }
    }

    fn data_end(&self) -> u64 {
        self.header.data_region_offset + self.header.data_region_length
    }

    /// Read the packet at the cursor and advance past it.
    ///
    /// Returns `Ok(None)` once the cursor reaches the end of the data region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] if a packet overruns the data region
    /// or names a mode the setup packet does not define.
    pub fn next_packet(&mut self) -> Result<Option<AudioPacket>> {
        let offset = self.source.cursor();
        if offset >= self.data_end() {
            return Ok(None);
        }

        let raw = self.layout().read_packet(self.source, offset)?;
        let stored_size = raw.data.len() as u32;
        let data = if self.header.modified_packets {
            self.restore_modified(&raw)?
        } else {
            raw.data
        };

        self.source.set_cursor(raw.next);
        self.packets_read += 1;
        tracing::trace!("Packet {} at {:#x}: {} bytes", self.packets_read, offset, stored_size);

        Ok(Some(AudioPacket {
            offset,
            granule: raw.frame_granule,
            data,
            stored_size,
        }))
    }

    fn restore_modified(&mut self, raw: &RawPacket) -> Result<Vec<u8>> {
        if raw.data.is_empty() {
            return Ok(Vec::new());
        }

        let mode_bits = self.header.mode_bits();
        let mut input = BitReader::new(&raw.data[..1]);
        let mode = input.read_bits(mode_bits)?;
        let remainder = input.read_bits(8 - mode_bits)?;
        let blockflag = self.mode_blockflag(mode)?;

        let mut out = BitWriter::new();
        out.write_bits(0, 1); // audio packet
        out.write_bits(mode, mode_bits);
        if blockflag {
            let next_blockflag = self.peek_blockflag(raw.next)?;
            out.write_bit(self.prev_blockflag);
            out.write_bit(next_blockflag);
        }
        out.write_bits(remainder, 8 - mode_bits);
        out.write_bytes(&raw.data[1..]);

        self.prev_blockflag = blockflag;
        Ok(out.into_bytes())
    }

    fn mode_blockflag(&self, mode: u32) -> Result<bool> {
        self.header
            .mode_blockflags
            .get(mode as usize)
            .copied()
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "packet mode {mode} not defined ({} modes)",
                    self.header.mode_blockflags.len()
                ))
            })
    }

    /// Block flag of the packet at `offset`, or short when there is none.
    fn peek_blockflag(&mut self, offset: u64) -> Result<bool> {
        let header_len = self.header.packet_header.size();
        if offset + header_len > self.data_end() {
            return Ok(false);
        }
        let header = self.source.read(offset, header_len as u32)?;
        let frame = self.header.packet_header.parse(&header, self.header.endian)?;
        if frame.size == 0 || offset + header_len + 1 > self.data_end() {
            return Ok(false);
        }

        let first = self.source.read(offset + header_len, 1)?;
        let mode = BitReader::new(&first).read_bits(self.header.mode_bits())?;
        self.mode_blockflag(mode)
    }
}
