//! End-to-end scenarios from the specification's testable-properties list,
//! exercised against the crate's public API only (no internal access).

use std::io::Read;

fn inflate(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    flate2::read::DeflateDecoder::new(bytes)
        .read_to_end(&mut out)
        .expect("output is a conformant RFC 1951 stream");
    out
}

/// S3: mixed text, level 9, must round-trip exactly.
#[test]
fn mixed_text_round_trips_at_best_compression() {
    let data = "The quick brown fox jumps over the lazy dog. ".repeat(10);
    let compressed = zarc_deflate::compress(data.as_bytes(), 9).unwrap();
    assert_eq!(inflate(&compressed), data.as_bytes());
    // a text this repetitive should compress well below its own size
    assert!(compressed.len() < data.len());
}

/// Property 1: for every level 0, 1, 6, 9, the compressed stream decodes
/// back to the exact input, across a range of input shapes (empty, highly
/// repetitive, and effectively incompressible).
#[test]
fn deflate_round_trip_holds_across_levels_and_input_shapes() {
    let inputs: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"A".repeat(52),
        "the quick brown fox jumps over the lazy dog. ".repeat(37).into_bytes(),
        (0..3000u32).map(|i| (i * 2654435761) as u8).collect(),
    ];
    for level in [0u8, 1, 6, 9] {
        for input in &inputs {
            let compressed = zarc_deflate::compress(input, level).unwrap();
            assert_eq!(&inflate(&compressed), input, "level {level}, len {}", input.len());
        }
    }
}

/// The token stream the encoder would use for a given level replays back to
/// the original bytes; this is the property the lazy-matching heuristic
/// must never violate regardless of level.
#[test]
fn tokenize_replays_to_original_for_every_level() {
    let data = b"abcabcabcabcabcabcXYZXYZXYZ".to_vec();
    for level in 0u8..=9 {
        let tokens = zarc_deflate::tokenize(&data, level);
        let mut replayed = Vec::new();
        for tok in &tokens {
            match *tok {
                zarc_deflate::Token::Literal(b) => replayed.push(b),
                zarc_deflate::Token::Match { length, distance } => {
                    let start = replayed.len() - distance as usize;
                    for i in 0..length as usize {
                        replayed.push(replayed[start + i]);
                    }
                }
            }
        }
        assert_eq!(replayed, data, "level {level}");
    }
}
