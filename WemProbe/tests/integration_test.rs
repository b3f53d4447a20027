use std::path::PathBuf;

use tempfile::tempdir;
use wemprobe::bits::BitWriter;
use wemprobe::prelude::*;

/// One packed codebook (1 dimension, 2 entries of 1 bit) plus the library offset table.
fn codebook_library() -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write_bits(1, 4); // dimensions
    w.write_bits(2, 14); // entries
    w.write_bit(false); // ordered
    w.write_bits(1, 3); // codeword length length
    w.write_bit(false); // sparse
    w.write_bits(0, 1);
    w.write_bits(0, 1);
    w.write_bits(0, 1); // lookup type
    let body = w.into_bytes();

    let mut bytes = body.clone();
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes
}

/// Wwise-stripped setup: codebook 0, one floor1, one residue, one mapping, one short mode.
fn stripped_setup() -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write_bits(0, 8);
    w.write_bits(0, 10);

    w.write_bits(0, 6);
    w.write_bits(1, 5);
    w.write_bits(0, 4);
    w.write_bits(0, 3);
    w.write_bits(0, 2);
    w.write_bits(0, 8);
    w.write_bits(1, 2);
    w.write_bits(4, 4);
    w.write_bits(5, 4);

    w.write_bits(0, 6);
    w.write_bits(0, 2);
    w.write_bits(0, 24);
    w.write_bits(0, 24);
    w.write_bits(0, 24);
    w.write_bits(0, 6);
    w.write_bits(0, 8);
    w.write_bits(0, 3);
    w.write_bits(0, 1);

    w.write_bits(0, 6);
    w.write_bits(0, 1);
    w.write_bits(0, 1);
    w.write_bits(0, 2);
    w.write_bits(0, 8);
    w.write_bits(0, 8);
    w.write_bits(0, 8);

    w.write_bits(0, 6);
    w.write_bits(0, 1);
    w.write_bits(0, 8);
    w.into_bytes()
}

/// Embedded-vorb (fmt size 0x42) mono 44.1 kHz container.
fn build_wem(samples: u32, loop_points: Option<(u32, u32)>) -> Vec<u8> {
    let setup = stripped_setup();
    let packets: [&[u8]; 2] = [&[0x00, 0x12], &[0x00, 0x34, 0x56]];

    let mut fmt = Vec::new();
    fmt.extend_from_slice(&0xFFFFu16.to_le_bytes());
    fmt.extend_from_slice(&1u16.to_le_bytes());
    fmt.extend_from_slice(&44100u32.to_le_bytes());
    fmt.extend_from_slice(&8000u32.to_le_bytes());
    fmt.extend_from_slice(&[0u8; 4]);
    fmt.extend_from_slice(&0x30u16.to_le_bytes());
    fmt.extend_from_slice(&[0u8; 2]);
    fmt.extend_from_slice(&4u32.to_le_bytes());
    fmt.extend_from_slice(&samples.to_le_bytes());
    fmt.extend_from_slice(&0x4Au32.to_le_bytes());
    fmt.extend_from_slice(&[0u8; 8]);
    fmt.extend_from_slice(&0u32.to_le_bytes());
    fmt.extend_from_slice(&(2 + setup.len() as u32).to_le_bytes());
    fmt.extend_from_slice(&[0u8; 12]);
    fmt.extend_from_slice(&0x1234_5678u32.to_le_bytes());
    fmt.extend_from_slice(&[8, 11]);
    assert_eq!(fmt.len(), 0x42);

    let mut data = Vec::new();
    data.extend_from_slice(&(setup.len() as u16).to_le_bytes());
    data.extend_from_slice(&setup);
    for packet in packets {
        data.extend_from_slice(&(packet.len() as u16).to_le_bytes());
        data.extend_from_slice(packet);
    }

    let mut chunks: Vec<(&[u8; 4], Vec<u8>)> = vec![(b"fmt ", fmt)];
    if let Some((start, end)) = loop_points {
        let mut smpl = vec![0u8; 0x3C];
        smpl[0x1C..0x20].copy_from_slice(&1u32.to_le_bytes());
        smpl[0x2C..0x30].copy_from_slice(&start.to_le_bytes());
        smpl[0x30..0x34].copy_from_slice(&end.to_le_bytes());
        chunks.push((b"smpl", smpl));
    }
    chunks.push((b"data", data));

    let mut body = Vec::new();
    for (id, chunk) in chunks {
        body.extend_from_slice(id);
        body.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        body.extend_from_slice(&chunk);
    }
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(&body);
    out
}

/// Mono 44.1 kHz container with a separate `vorb` chunk of `vorb_size` bytes.
fn build_vorb_chunk_wem(vorb_size: u32) -> Vec<u8> {
    let setup = stripped_setup();
    let packets: [&[u8]; 2] = [&[0x00, 0x12], &[0x00, 0x34, 0x56]];
    // 0x32/0x34 frame packets with a granule after the u16 size
    let granules = vorb_size != 0x2A;
    let header_len = if granules { 6 } else { 2 };

    let mut fmt = Vec::new();
    fmt.extend_from_slice(&0xFFFFu16.to_le_bytes());
    fmt.extend_from_slice(&1u16.to_le_bytes());
    fmt.extend_from_slice(&44100u32.to_le_bytes());
    fmt.extend_from_slice(&8000u32.to_le_bytes());
    fmt.extend_from_slice(&[0u8; 4]);
    fmt.extend_from_slice(&6u16.to_le_bytes());
    fmt.extend_from_slice(&[0u8; 2]);
    fmt.extend_from_slice(&4u32.to_le_bytes());

    let (setup_at, blocksizes_at) = if granules { (0x18, 0x30) } else { (0x10, 0x28) };
    let mut vorb = vec![0u8; vorb_size as usize];
    vorb[0x00..0x04].copy_from_slice(&44100u32.to_le_bytes());
    if !granules {
        vorb[0x04..0x08].copy_from_slice(&0x4Au32.to_le_bytes());
    }
    let first_audio = header_len + setup.len() as u32;
    vorb[setup_at + 4..setup_at + 8].copy_from_slice(&first_audio.to_le_bytes());
    vorb[blocksizes_at..blocksizes_at + 2].copy_from_slice(&[8, 11]);

    let mut data = Vec::new();
    for payload in std::iter::once(setup.as_slice()).chain(packets) {
        data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        if granules {
            data.extend_from_slice(&0u32.to_le_bytes());
        }
        data.extend_from_slice(payload);
    }

    let mut body = Vec::new();
    for (id, chunk) in [(b"fmt ", fmt), (b"vorb", vorb), (b"data", data)] {
        body.extend_from_slice(id);
        body.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        body.extend_from_slice(&chunk);
    }
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(&body);
    out
}

fn registry() -> CodebookRegistry {
    CodebookRegistry::new().with_library(
        CodebookLibraryId::Standard,
        CodebookLibrary::from_bytes(codebook_library()).unwrap(),
    )
}

#[test]
fn test_one_second_mono_with_lewton() {
    let mut source = StreamSource::from_bytes("mono.wem", build_wem(44100, None));
    let header = parse_with(&mut source, &registry(), &ParseOptions::default()).unwrap();
    let state = init(&mut source, header).unwrap();

    assert_eq!(state.codec().channels(), 1);
    assert_eq!(state.codec().sample_rate(), 44100);
    assert_eq!(state.codec().blocksizes(), (8, 11));

    let description = describe(&state, DEFAULT_MAX_LENGTH);
    assert_eq!(description.sample_rate, 44100);
    assert_eq!(description.channels, 1);
    assert_eq!(description.total_samples, 44100);
    assert_eq!(description.loop_info, None);
    assert!(render(&description).contains("stream total samples: 44100 (1.00 seconds)\n"));
}

#[test]
fn test_packets_after_lewton_setup() {
    let mut source = StreamSource::from_bytes("mono.wem", build_wem(44100, None));
    let header = parse_with(&mut source, &registry(), &ParseOptions::default()).unwrap();
    let mut state = init(&mut source, header).unwrap();

    let mut sizes = Vec::new();
    while let Some(packet) = state.next_packet().unwrap() {
        sizes.push(packet.data.len());
    }
    assert_eq!(sizes, vec![2, 3]);
}

#[test]
fn test_vorb_chunk_layouts_with_lewton() {
    for vorb_size in [0x2A, 0x32, 0x34] {
        let mut source = StreamSource::from_bytes("layout.wem", build_vorb_chunk_wem(vorb_size));
        let header = parse_with(&mut source, &registry(), &ParseOptions::default()).unwrap();
        let expected_header = if vorb_size == 0x2A { 2 } else { 6 };
        assert_eq!(header.packet_header.size(), expected_header);

        let mut state = init(&mut source, header).unwrap();
        assert_eq!(state.codec().blocksizes(), (8, 11));
        assert_eq!(state.next_packet().unwrap().unwrap().data, vec![0x00, 0x12]);

        let text = render(&describe(&state, DEFAULT_MAX_LENGTH));
        assert!(text.contains("stream total samples: 44100 (1.00 seconds)\n"));
    }
}

#[test]
fn test_description_is_deterministic() {
    let bytes = build_wem(22050, Some((441, 0)));
    let render_once = || {
        let mut source = StreamSource::from_bytes("det.wem", bytes.clone());
        let header = parse_with(&mut source, &registry(), &ParseOptions::default()).unwrap();
        let state = init(&mut source, header).unwrap();
        render(&describe(&state, DEFAULT_MAX_LENGTH))
    };
    let first = render_once();
    assert_eq!(first, render_once());
    assert!(first.contains("loop start: 441 samples (0.01 seconds)\n"));
    assert!(first.contains("loop end: 22050 samples (0.50 seconds)\n"));
}

#[test]
fn test_render_respects_every_bound() {
    let mut source = StreamSource::from_bytes("bounded.wem", build_wem(44100, Some((0, 99))));
    let header = parse_with(&mut source, &registry(), &ParseOptions::default()).unwrap();
    let state = init(&mut source, header).unwrap();

    let full = render(&describe(&state, usize::MAX));
    for max in 0..=full.len() + 8 {
        let rendered = render(&describe(&state, max));
        assert!(rendered.len() <= max);
        assert!(full.starts_with(&rendered));
    }
}

#[test]
fn test_second_init_is_invalid_state() {
    let mut source = StreamSource::from_bytes("twice.wem", build_wem(44100, None));
    let header = parse_with(&mut source, &registry(), &ParseOptions::default()).unwrap();
    {
        let mut state = init(&mut source, header.clone()).unwrap();
        while state.next_packet().unwrap().is_some() {}
    }

    let again = init(&mut source, header.clone());
    assert!(matches!(again, Err(Error::InvalidState(_))));

    source.rewind();
    assert!(init(&mut source, header).is_ok());
}

#[test]
fn test_unknown_signature_is_unsupported() {
    let mut bytes = build_wem(44100, None);
    bytes[0..4].copy_from_slice(b"OggS");
    let mut source = StreamSource::from_bytes("ogg.wem", bytes);
    let err = parse_with(&mut source, &registry(), &ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_reversed_loop_is_corrupt() {
    let mut source = StreamSource::from_bytes("loop.wem", build_wem(44100, Some((1000, 10))));
    let err = parse_with(&mut source, &registry(), &ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptHeader);
}

#[test]
fn test_out_of_range_read() {
    let mut source = StreamSource::from_bytes("short.wem", vec![0u8; 16]);
    assert!(matches!(source.read(8, 9), Err(Error::OutOfRange { .. })));
    assert_eq!(source.read(8, 8).unwrap().len(), 8);
}

#[test]
fn test_batch_from_disk() {
    let dir = tempdir().unwrap();
    let codebooks = dir.path().join("codebooks");
    std::fs::create_dir_all(&codebooks).unwrap();
    std::fs::write(
        codebooks.join(CodebookLibraryId::Standard.default_file_name()),
        codebook_library(),
    )
    .unwrap();
    std::fs::write(dir.path().join("a.wem"), build_wem(44100, None)).unwrap();
    std::fs::write(dir.path().join("b.wem"), b"RIFF\x04\x00\x00\x00WAVE").unwrap();

    let registry = CodebookRegistry::load_dir(&codebooks).unwrap();
    let files = find_wem_files(dir.path());
    assert_eq!(files, vec![dir.path().join("a.wem"), dir.path().join("b.wem")]);

    let batch = describe_files(&files, &registry, &ParseOptions::default(), 256, |_| {});
    assert_eq!(batch.success_count, 1);
    assert_eq!(batch.fail_count, 1);
    assert!(batch.results[0].outcome.is_ok());
    assert_eq!(
        batch.results[1].outcome.as_ref().unwrap_err().kind(),
        ErrorKind::CorruptHeader
    );

    let missing: PathBuf = dir.path().join("missing.wem");
    assert!(matches!(
        probe_file(&missing, &registry, &ParseOptions::default(), 256),
        Err(Error::NotFound { .. })
    ));
}
