//! Concrete end-to-end scenarios S1-S3 from the specification.

/// S1: compressing the empty input produces a valid gzip stream at least 18
/// bytes long (10-byte header + 0-byte deflate end-of-block + 8-byte
/// footer, give or take a byte for the empty block), with magic `1f 8b`,
/// method 8, and a footer reading crc32=0, isize=0. Decoding it back yields
/// the empty byte sequence.
#[test]
fn s1_empty_input_produces_a_well_formed_empty_member() {
    let compressed = zarc_gzip::compress(&[], 6).unwrap();

    assert!(compressed.len() >= 18, "too short to hold header+footer: {}", compressed.len());
    assert_eq!(&compressed[0..2], &[0x1f, 0x8b]);
    assert_eq!(compressed[2], 8);

    let footer = &compressed[compressed.len() - 8..];
    let crc = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let isize = u32::from_le_bytes([footer[4], footer[5], footer[6], footer[7]]);
    assert_eq!(crc, 0);
    assert_eq!(isize, 0);

    assert_eq!(zarc_gzip::decompress(&compressed).unwrap(), Vec::<u8>::new());
}

/// S2: 52 repeated 'A' bytes at level 6 compress to fewer bytes than the
/// input itself, round-trip exactly, and the *input's* CRC-32 matches the
/// well-known IEEE value for this exact byte sequence.
#[test]
fn s2_repeating_pattern_compresses_and_crc_matches_known_vector() {
    let data = b"A".repeat(52);

    let checksum = {
        let mut c = zarc_gzip::Crc32::new();
        c.update(&data);
        c.finalize()
    };
    assert_eq!(checksum, 0x1C6A_E876);

    let compressed = zarc_gzip::compress(&data, 6).unwrap();
    assert!(compressed.len() < data.len());
    assert_eq!(zarc_gzip::decompress(&compressed).unwrap(), data);
}

/// S3: mixed English text repeated ten times round-trips exactly at the
/// best compression level.
#[test]
fn s3_mixed_text_round_trips_at_level_nine() {
    let data = "The quick brown fox jumps over the lazy dog. ".repeat(10);
    let compressed = zarc_gzip::compress(data.as_bytes(), 9).unwrap();
    assert_eq!(zarc_gzip::decompress(&compressed).unwrap(), data.as_bytes());
}

/// Property 2: for arbitrary data, the decompressed CRC-32 and ISIZE the
/// reader reports match what an independent accumulator computes over the
/// original bytes.
#[test]
fn gzip_round_trip_reports_matching_crc_and_isize() {
    let data: Vec<u8> = (0..70_000u32).map(|i| (i % 251) as u8).collect();
    let compressed = zarc_gzip::compress(&data, 6).unwrap();

    let mut expected = zarc_gzip::Crc32::new();
    expected.update(&data);

    let decompressed = zarc_gzip::decompress(&compressed).unwrap();
    assert_eq!(decompressed, data);
    assert_eq!(decompressed.len() as u64 & 0xFFFF_FFFF, data.len() as u64 & 0xFFFF_FFFF);

    let mut actual = zarc_gzip::Crc32::new();
    actual.update(&decompressed);
    assert_eq!(actual.finalize(), expected.finalize());
}
