//! Audio packet listing

use std::path::Path;

use crate::codec::init;
use crate::source::StreamSource;
use crate::wwise::{ParseOptions, parse_with};

use super::CodebookArgs;

/// Walk the audio packets of a WEM file, printing one line per packet
pub fn execute(path: &Path, limit: Option<usize>, codebooks: &CodebookArgs) -> anyhow::Result<()> {
    let registry = codebooks.load_registry()?;
    let mut source = StreamSource::open(path)?;
    let header = parse_with(&mut source, &registry, &ParseOptions::default())?;
    let mut state = init(&mut source, header)?;

    println!("{:>6}  {:>10}  {:>6}  {:>6}  {:>10}  mode byte", "#", "offset", "stored", "vorbis", "granule");
    let mut stored_total = 0u64;
    let mut shown = 0usize;
    while let Some(packet) = state.next_packet()? {
        stored_total += u64::from(packet.stored_size);
        if limit.is_some_and(|n| shown >= n) {
            continue;
        }
        let granule = packet.granule.map_or_else(|| "-".to_string(), |g| g.to_string());
        let first = packet.data.first().map_or_else(|| "--".to_string(), |b| format!("{b:08b}"));
        println!(
            "{:>6}  {:#10x}  {:>6}  {:>6}  {:>10}  {first}",
            state.packets_read(),
            packet.offset,
            packet.stored_size,
            packet.data.len(),
            granule
        );
        shown += 1;
    }

    println!(
        "\n{} packets, {} payload bytes, {} samples",
        state.packets_read(),
        stored_total,
        state.header().total_samples
    );
    Ok(())
}
