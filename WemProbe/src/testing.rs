//! Synthetic WEM containers and a stand-in Vorbis backend for unit tests

use std::io::{Read, Seek};

use crate::codebook::{CodebookLibraryId, fixtures};
use crate::codec::{CodecSetup, VorbisBackend};
use crate::error::{Error, Result};
use crate::source::StreamSource;
use crate::wwise::setup::fixtures::stripped_setup;
use crate::wwise::{ParseOptions, WwiseHeader, parse_with};

/// Parse a builder container with the fixture codebook library.
pub(crate) fn parse_fixture<R: Read + Seek>(source: &mut StreamSource<R>) -> WwiseHeader {
    let registry = fixtures::registry(CodebookLibraryId::Standard);
    parse_with(source, &registry, &ParseOptions::default()).unwrap()
}

/// Reads channels and sample rate straight out of the identification packet.
#[derive(Debug, Clone, Default)]
pub(crate) struct StaticBackend {
    pub(crate) sample_rate: Option<u32>,
    pub(crate) reject: bool,
}

#[derive(Debug)]
pub(crate) struct StaticSetup {
    channels: u8,
    sample_rate: u32,
    blocksizes: (u8, u8),
}

impl CodecSetup for StaticSetup {
    fn channels(&self) -> u8 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn blocksizes(&self) -> (u8, u8) {
        self.blocksizes
    }
}

impl VorbisBackend for StaticBackend {
    fn name(&self) -> &'static str {
        "static"
    }

    fn setup(&self, identification: &[u8], _setup: &[u8]) -> Result<Box<dyn CodecSetup>> {
        if self.reject || identification.len() < 30 {
            return Err(Error::CodecSetupFailed("rejected".to_string()));
        }
        let rate = u32::from_le_bytes([identification[12], identification[13], identification[14], identification[15]]);
        Ok(Box::new(StaticSetup {
            channels: identification[11],
            sample_rate: self.sample_rate.unwrap_or(rate),
            blocksizes: (identification[28] & 0x0F, identification[28] >> 4),
        }))
    }
}

/// Builds a Wwise Vorbis container, by default with the vorb block
/// embedded in a 0x42-byte `fmt `.
#[derive(Debug, Clone)]
pub(crate) struct WemBuilder {
    big_endian: bool,
    codec: u16,
    channels: u16,
    sample_rate: u32,
    avg_bytes_per_sec: u32,
    samples: u32,
    mod_signal: u32,
    blocksizes: (u8, u8),
    loop_points: Option<(u32, u32)>,
    first_audio_offset: Option<u32>,
    /// Size of a separate `vorb` chunk (0x2A, 0x32 or 0x34).
    vorb_chunk: Option<u32>,
    setup_granule: u32,
    setup: Vec<u8>,
    packets: Vec<Vec<u8>>,
}

impl WemBuilder {
    /// One second of mono 44.1 kHz audio with three small audio packets.
    pub(crate) fn mono_second() -> Self {
        Self {
            big_endian: false,
            codec: 0xFFFF,
            channels: 1,
            sample_rate: 44100,
            avg_bytes_per_sec: 8000,
            samples: 44100,
            mod_signal: 0x4A,
            blocksizes: (8, 11),
            loop_points: None,
            first_audio_offset: None,
            vorb_chunk: None,
            setup_granule: 0,
            setup: stripped_setup(),
            packets: vec![vec![0x00, 0x11, 0x22], vec![0x00, 0x33], vec![0x00, 0x44, 0x55, 0x66]],
        }
    }

    pub(crate) fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub(crate) fn with_codec(mut self, codec: u16) -> Self {
        self.codec = codec;
        self
    }

    pub(crate) fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub(crate) fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub(crate) fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub(crate) fn with_mod_signal(mut self, mod_signal: u32) -> Self {
        self.mod_signal = mod_signal;
        self
    }

    pub(crate) fn with_blocksizes(mut self, short: u8, long: u8) -> Self {
        self.blocksizes = (short, long);
        self
    }

    /// Raw `smpl` loop points (end inclusive, 0 meaning end of stream).
    pub(crate) fn with_loop(mut self, start: u32, end: u32) -> Self {
        self.loop_points = Some((start, end));
        self
    }

    pub(crate) fn with_first_audio_offset(mut self, offset: u32) -> Self {
        self.first_audio_offset = Some(offset);
        self
    }

    pub(crate) fn with_packets(mut self, packets: Vec<Vec<u8>>) -> Self {
        self.packets = packets;
        self
    }

    /// Move the vorb block out of `fmt ` into its own chunk of `size` bytes.
    pub(crate) fn with_vorb_chunk(mut self, size: u32) -> Self {
        self.vorb_chunk = Some(size);
        self
    }

    /// Granule written into the setup packet header (6-byte headers only).
    pub(crate) fn with_setup_granule(mut self, granule: u32) -> Self {
        self.setup_granule = granule;
        self
    }

    /// Replace the stripped setup payload.
    pub(crate) fn with_setup(mut self, setup: Vec<u8>) -> Self {
        self.setup = setup;
        self
    }

    /// Standard-layout chunks (0x32/0x34) frame packets with `u16` size + `u32` granule.
    fn granule_headers(&self) -> bool {
        matches!(self.vorb_chunk, Some(0x32 | 0x34))
    }

    fn packet(&self, out: &mut Vec<u8>, payload: &[u8], granule: u32) {
        out.extend_from_slice(&self.u16(payload.len() as u16));
        if self.granule_headers() {
            out.extend_from_slice(&self.u32(granule));
        }
        out.extend_from_slice(payload);
    }

    fn vorb(&self, setup_packet_len: u32) -> Vec<u8> {
        let size = self.vorb_chunk.unwrap_or(0x2A) as usize;
        let (setup_at, uid_at, blocksizes_at) = if self.granule_headers() {
            (0x18, 0x2C, 0x30)
        } else {
            (0x10, 0x24, 0x28)
        };

        let mut vorb = vec![0u8; size];
        let mut put = |at: usize, bytes: &[u8]| vorb[at..at + bytes.len()].copy_from_slice(bytes);
        put(0x00, &self.u32(self.samples));
        if !self.granule_headers() {
            put(0x04, &self.u32(self.mod_signal));
        }
        put(setup_at, &self.u32(0));
        put(setup_at + 4, &self.u32(self.first_audio_offset.unwrap_or(setup_packet_len)));
        put(uid_at, &self.u32(0xDEAD_BEEF));
        put(blocksizes_at, &[self.blocksizes.0, self.blocksizes.1]);
        vorb
    }

    fn u16(&self, v: u16) -> [u8; 2] {
        if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() }
    }

    fn u32(&self, v: u32) -> [u8; 4] {
        if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() }
    }

    fn chunk(&self, out: &mut Vec<u8>, id: &[u8; 4], body: &[u8]) {
        out.extend_from_slice(id);
        out.extend_from_slice(&self.u32(body.len() as u32));
        out.extend_from_slice(body);
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let header_len = if self.granule_headers() { 6 } else { 2 };
        let setup_packet_len = header_len + self.setup.len() as u32;
        let vorb = self.vorb(setup_packet_len);

        let mut fmt = Vec::with_capacity(0x42);
        fmt.extend_from_slice(&self.u16(self.codec));
        fmt.extend_from_slice(&self.u16(self.channels));
        fmt.extend_from_slice(&self.u32(self.sample_rate));
        fmt.extend_from_slice(&self.u32(self.avg_bytes_per_sec));
        fmt.extend_from_slice(&self.u16(0)); // block align
        fmt.extend_from_slice(&self.u16(0)); // bits per sample
        let extra_len = if self.vorb_chunk.is_some() { 6 } else { 0x30 };
        fmt.extend_from_slice(&self.u16(extra_len));
        fmt.extend_from_slice(&self.u16(0));
        fmt.extend_from_slice(&self.u32(4)); // channel mask
        if self.vorb_chunk.is_none() {
            fmt.extend_from_slice(&vorb);
            assert_eq!(fmt.len(), 0x42);
        }

        let mut data = Vec::new();
        self.packet(&mut data, &self.setup, self.setup_granule);
        for (i, packet) in self.packets.iter().enumerate() {
            self.packet(&mut data, packet, 1024 * (i as u32 + 1));
        }

        let mut body = Vec::new();
        self.chunk(&mut body, b"fmt ", &fmt);
        if self.vorb_chunk.is_some() {
            self.chunk(&mut body, b"vorb", &vorb);
        }
        if let Some((start, end)) = self.loop_points {
            let mut smpl = vec![0u8; 0x3C];
            smpl[0x1C..0x20].copy_from_slice(&self.u32(1));
            smpl[0x2C..0x30].copy_from_slice(&self.u32(start));
            smpl[0x30..0x34].copy_from_slice(&self.u32(end));
            self.chunk(&mut body, b"smpl", &smpl);
        }
        self.chunk(&mut body, b"data", &data);

        let mut out = if self.big_endian { b"RIFX".to_vec() } else { b"RIFF".to_vec() };
        out.extend_from_slice(&self.u32(body.len() as u32 + 4));
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(&body);
        out
    }
}
