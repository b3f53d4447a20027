//! WEM header inspection

use std::path::Path;

use crate::codec::init;
use crate::source::StreamSource;
use crate::wwise::{ParseOptions, parse_with};

use super::CodebookArgs;

/// Parse a WEM file and display its Wwise header
pub fn execute(path: &Path, codebooks: &CodebookArgs) -> anyhow::Result<()> {
    let registry = codebooks.load_registry()?;
    let mut source = StreamSource::open(path)?;
    let header = parse_with(&mut source, &registry, &ParseOptions::default())?;

    println!("WEM File: {}", path.display());
    println!("---------------------------------");
    println!("Byte order:       {:?}", header.endian);
    println!("Header variant:   {}", header.variant.name());
    println!("Packet header:    {} bytes", header.packet_header.size());
    println!("Modified packets: {}", header.modified_packets);
    println!("Setup:            {}", header.setup_kind.name());
    if let Some(library) = header.codebook_library {
        println!("Codebooks:        {library}");
    }
    println!("Channels:         {}", header.channel_count);
    println!("Channel mask:     {:#x}", header.channel_layout);
    println!("Sample rate:      {} Hz", header.sample_rate);
    println!("Nominal bitrate:  {} bps", header.nominal_bitrate());
    println!("Total samples:    {}", header.total_samples);
    if let Some(l) = header.loop_info {
        println!("Loop:             {}..{}", l.start, l.end);
    }
    if let Some(uid) = header.uid {
        println!("UID:              {uid:#010x}");
    }
    println!("Blocksize 0:      2^{} = {}", header.blocksize_0, 1u32 << header.blocksize_0);
    println!("Blocksize 1:      2^{} = {}", header.blocksize_1, 1u32 << header.blocksize_1);
    println!("Modes:            {}", header.mode_blockflags.len());
    println!("Cue points:       {}", header.cue_count);
    println!("Setup packet:     {} bytes", header.setup_packet.len());
    println!("Data chunk:       {:#x} ({} bytes)", header.data_chunk_offset, header.data_chunk_size);
    println!("Audio packets:    {:#x} ({} bytes)", header.data_region_offset, header.data_region_length);

    match init(&mut source, header) {
        Ok(state) => {
            let codec = state.codec();
            let (b0, b1) = codec.blocksizes();
            println!(
                "\nVorbis setup accepted ({} ch, {} Hz, blocksizes 2^{b0}/2^{b1})",
                codec.channels(),
                codec.sample_rate()
            );
        }
        Err(e) => println!("\nVorbis setup rejected: {e}"),
    }

    source.close();
    Ok(())
}
