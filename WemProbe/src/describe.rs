//! Stream description
//!
//! Builds the human-readable summary printed by `wemprobe describe`: a
//! fixed sequence of `key: value` lines, bounded to a byte budget.

use std::fmt::Write as _;
use std::io::{Read, Seek};

use serde::Serialize;

use crate::codec::DecodeState;
use crate::wwise::{LoopInfo, WwiseHeader};

/// Default byte budget for rendered descriptions.
pub const DEFAULT_MAX_LENGTH: usize = 256;

const CODEC_NAME: &str = "Custom Vorbis";
const LAYOUT_NAME: &str = "flat";
const METADATA_SOURCE: &str = "Audiokinetic Wwise RIFF header";

/// Derived stream metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Description {
    pub codec_name: String,
    pub sample_rate: u32,
    pub channels: u8,
    pub total_samples: u64,
    pub duration_seconds: f64,
    pub loop_info: Option<LoopInfo>,
    pub layout: String,
    pub metadata_source: String,
    pub bitrate_kbps: u64,
    pub stream_name: Option<String>,
    pub variant: String,
    /// Byte bound applied by [`render`].
    pub max_length: usize,
}

/// Describe the stream behind a decode state. Does not touch the cursor.
#[must_use]
pub fn describe<R: Read + Seek>(state: &DecodeState<'_, R>, max_length: usize) -> Description {
    describe_header(state.header(), max_length)
}

/// Describe a parsed header directly.
#[must_use]
pub fn describe_header(header: &WwiseHeader, max_length: usize) -> Description {
    let rate = header.sample_rate;
    Description {
        codec_name: CODEC_NAME.to_string(),
        sample_rate: rate,
        channels: header.channel_count,
        total_samples: header.total_samples,
        duration_seconds: seconds(header.total_samples, rate),
        loop_info: header.loop_info,
        layout: LAYOUT_NAME.to_string(),
        metadata_source: METADATA_SOURCE.to_string(),
        bitrate_kbps: average_bitrate(header.container_length, rate, header.total_samples) / 1000,
        stream_name: (!header.stream_name.is_empty()).then(|| header.stream_name.clone()),
        variant: header.variant.name().to_string(),
        max_length,
    }
}

/// Average bitrate over the whole container, in bits per second.
#[must_use]
pub fn average_bitrate(container_length: u64, sample_rate: u32, total_samples: u64) -> u64 {
    if total_samples == 0 {
        return 0;
    }
    let bits = u128::from(container_length) * 8 * u128::from(sample_rate);
    u64::try_from(bits / u128::from(total_samples)).unwrap_or(u64::MAX)
}

fn seconds(samples: u64, rate: u32) -> f64 {
    if rate == 0 {
        return 0.0;
    }
    samples as f64 / f64::from(rate)
}

/// Render a description, truncated to `max_length` bytes.
#[must_use]
pub fn render(description: &Description) -> String {
    let d = description;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "sample rate: {} Hz", d.sample_rate);
    let _ = writeln!(out, "channels: {}", d.channels);
    if let Some(l) = d.loop_info {
        let _ = writeln!(
            out,
            "loop start: {} samples ({:.2} seconds)",
            l.start,
            seconds(l.start, d.sample_rate)
        );
        let _ = writeln!(
            out,
            "loop end: {} samples ({:.2} seconds)",
            l.end,
            seconds(l.end, d.sample_rate)
        );
    }
    let _ = writeln!(
        out,
        "stream total samples: {} ({:.2} seconds)",
        d.total_samples, d.duration_seconds
    );
    let _ = writeln!(out, "encoding: {}", d.codec_name);
    let _ = writeln!(out, "layout: {}", d.layout);
    let _ = writeln!(out, "metadata from: {}", d.metadata_source);
    let _ = writeln!(out, "bitrate: {} kbps", d.bitrate_kbps);
    if let Some(name) = &d.stream_name {
        let _ = writeln!(out, "stream name: {name}");
    }

    let len = truncate_utf8(&out, d.max_length).len();
    out.truncate(len);
    out
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
#[must_use]
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
