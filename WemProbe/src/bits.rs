//! LSB-first bit packing, in Vorbis packet order
//!
//! Wwise stores setup packets and audio packets with the same bit order as
//! standard Vorbis: bits are consumed from the least significant end of each
//! byte, and multi-bit values are assembled least significant bit first.

use crate::error::{Error, Result};

/// Reads bit fields out of a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Total bits consumed so far.
    #[must_use]
    pub fn bits_read(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Read `count` bits (at most 32).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] when the field runs past the end of
    /// the buffer.
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        debug_assert!(count <= 32);
        if count as usize > self.bits_remaining() {
            return Err(Error::corrupt(format!(
                "bitstream ended: wanted {count} bits at bit {} of {}",
                self.pos,
                self.data.len() * 8
            )));
        }

        let mut value = 0u32;
        for i in 0..count {
            let byte = self.data[self.pos / 8];
            let bit = (byte >> (self.pos % 8)) & 1;
            value |= u32::from(bit) << i;
            self.pos += 1;
        }
        Ok(value)
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }
}

/// Accumulates bit fields into a byte buffer.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    pos: usize,
}

impl BitWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value` (at most 32).
    pub fn write_bits(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32);
        for i in 0..count {
            if self.pos % 8 == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> i) & 1) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= bit << (self.pos % 8);
            }
            self.pos += 1;
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u32::from(bit), 1);
    }

    /// Append whole bytes, eight bits each.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_bits(u32::from(b), 8);
        }
    }

    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.pos
    }

    /// Finish the buffer; the last byte is zero padded.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Number of bits needed to represent `v` (`ilog` in Vorbis I).
#[must_use]
pub fn ilog(v: u32) -> u32 {
    32 - v.leading_zeros()
}
