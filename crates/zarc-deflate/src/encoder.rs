//! DEFLATE block encoder: turns a token stream into RFC 1951 bits.
//!
//! See spec §4.4. A whole input buffer is encoded as a single logical block
//! (stored, fixed, or dynamic), except that a stored block is capped at
//! 65535 bytes by the format and so is chunked into a back-to-back run of
//! stored blocks when chosen for larger inputs.

use crate::bitwriter::BitWriter;
use crate::huffman::{self, HuffmanCode};
use crate::tables::*;
use crate::token::Token;

const STORED_MAX_CHUNK: usize = 65535;

struct DynamicTables {
    litlen_lengths: Vec<u8>,
    dist_lengths: Vec<u8>,
    hlit: usize,
    hdist: usize,
    clen_lengths: Vec<u8>,
    hclen: usize,
    rle: Vec<(u16, u32, u32)>, // (symbol, extra bits value, extra bit count)
}

/// Compress `data` into a complete DEFLATE stream at the given level
/// (0 = no compression, 1 = fastest, 9 = best). Never fails: DEFLATE has no
/// pathological input that can't be represented, worst case falling back to
/// stored blocks.
pub fn compress(data: &[u8], level: u8) -> Vec<u8> {
    let mut bw = BitWriter::with_capacity(data.len() / 2 + 64);

    if data.is_empty() {
        write_fixed_block(&mut bw, &[]);
        return bw.finish();
    }

    if level == 0 {
        write_stored_blocks(&mut bw, data);
        return bw.finish();
    }

    let tokens = crate::lz77::find_matches(data, level);
    let (litlen_freq, dist_freq) = count_frequencies(&tokens);

    let dyn_tables = build_dynamic_tables(&litlen_freq, &dist_freq);
    let dynamic_bits = dynamic_block_bit_cost(&dyn_tables, &tokens);
    let fixed_bits = fixed_block_bit_cost(&tokens);
    let stored_bits = stored_block_bit_cost(data.len());

    if stored_bits <= dynamic_bits && stored_bits <= fixed_bits {
        write_stored_blocks(&mut bw, data);
    } else if fixed_bits <= dynamic_bits {
        write_fixed_block(&mut bw, &tokens);
    } else {
        write_dynamic_block(&mut bw, &tokens, &dyn_tables);
    }

    bw.finish()
}

fn count_frequencies(tokens: &[Token]) -> (Vec<u32>, Vec<u32>) {
    let mut litlen = vec![0u32; LITLEN_SYMBOLS];
    let mut dist = vec![0u32; DIST_SYMBOLS];
    litlen[END_OF_BLOCK as usize] = 1;

    for tok in tokens {
        match *tok {
            Token::Literal(b) => litlen[b as usize] += 1,
            Token::Match { length, distance } => {
                let lsym = LENGTH_CODE[length as usize - 3] as usize;
                litlen[lsym] += 1;
                dist[distance_code(distance) as usize] += 1;
            }
        }
    }

    (litlen, dist)
}

fn stored_block_bit_cost(len: usize) -> u64 {
    let chunks = len.div_ceil(STORED_MAX_CHUNK).max(1) as u64;
    len as u64 * 8 + chunks * 40 // 1+2+5 bits header rounds to 5 bytes/chunk, plus padding
}

fn fixed_block_bit_cost(tokens: &[Token]) -> u64 {
    let mut bits: u64 = 3; // block header
    for tok in tokens {
        bits += fixed_token_bits(tok);
    }
    bits += fixed_litlen_code_length(END_OF_BLOCK) as u64;
    bits
}

fn fixed_token_bits(tok: &Token) -> u64 {
    match *tok {
        Token::Literal(b) => fixed_litlen_code_length(b as u16) as u64,
        Token::Match { length, distance } => {
            let lsym = LENGTH_CODE[length as usize - 3];
            let lidx = lsym as usize - 257;
            let dcode = distance_code(distance) as usize;
            fixed_litlen_code_length(lsym) as u64
                + LENGTH_EXTRA_BITS[lidx] as u64
                + 5 // fixed distance codes are 5 bits
                + DIST_EXTRA_BITS[dcode] as u64
        }
    }
}

fn build_dynamic_tables(litlen_freq: &[u32], dist_freq: &[u32]) -> DynamicTables {
    let litlen_lengths = huffman::build_code_lengths(litlen_freq, 15);
    let dist_lengths = huffman::build_code_lengths(dist_freq, 15);

    let hlit = (0..litlen_lengths.len())
        .rev()
        .find(|&i| litlen_lengths[i] != 0)
        .map(|i| i + 1)
        .unwrap_or(257)
        .max(257);
    let hdist = (0..dist_lengths.len())
        .rev()
        .find(|&i| dist_lengths[i] != 0)
        .map(|i| i + 1)
        .unwrap_or(1)
        .max(1);

    let mut combined: Vec<u8> = Vec::with_capacity(hlit + hdist);
    combined.extend_from_slice(&litlen_lengths[..hlit]);
    combined.extend_from_slice(&dist_lengths[..hdist]);

    let rle = rle_code_lengths(&combined);

    let mut clen_freq = vec![0u32; CLEN_SYMBOLS];
    for &(sym, _, _) in &rle {
        clen_freq[sym as usize] += 1;
    }
    let clen_lengths = huffman::build_code_lengths(&clen_freq, 7);

    let hclen = CLEN_ORDER
        .iter()
        .enumerate()
        .rev()
        .find(|&(_, &sym)| clen_lengths[sym] != 0)
        .map(|(i, _)| i + 1)
        .unwrap_or(4)
        .max(4);

    DynamicTables {
        litlen_lengths,
        dist_lengths,
        hlit,
        hdist,
        clen_lengths,
        hclen,
        rle,
    }
}

/// Run-length encode a sequence of code lengths per RFC 1951 §3.2.7: runs of
/// identical nonzero lengths use symbol 16 (repeat previous, 3-6 times), runs
/// of zero use 17 (3-10 times) or 18 (11-138 times).
fn rle_code_lengths(lengths: &[u8]) -> Vec<(u16, u32, u32)> {
    let mut out = Vec::new();
    let n = lengths.len();
    let mut i = 0;

    while i < n {
        let cur = lengths[i];
        let mut run = 1;
        while i + run < n && lengths[i + run] == cur {
            run += 1;
        }

        if cur == 0 {
            let mut rem = run;
            while rem > 0 {
                if rem < 3 {
                    for _ in 0..rem {
                        out.push((0, 0, 0));
                    }
                    rem = 0;
                } else if rem <= 10 {
                    out.push((17, (rem - 3) as u32, 3));
                    rem = 0;
                } else {
                    let take = rem.min(138);
                    out.push((18, (take - 11) as u32, 7));
                    rem -= take;
                }
            }
        } else {
            out.push((cur as u16, 0, 0));
            let mut rem = run - 1;
            while rem > 0 {
                if rem < 3 {
                    for _ in 0..rem {
                        out.push((cur as u16, 0, 0));
                    }
                    rem = 0;
                } else {
                    let take = rem.min(6);
                    out.push((16, (take - 3) as u32, 2));
                    rem -= take;
                }
            }
        }

        i += run;
    }

    out
}

fn dynamic_block_bit_cost(t: &DynamicTables, tokens: &[Token]) -> u64 {
    let clen_codes = huffman::assign_canonical_codes(&t.clen_lengths, 7);
    let mut bits: u64 = 3 + 5 + 5 + 4 + (t.hclen as u64 * 3);
    for &(sym, _, extra_bits) in &t.rle {
        bits += clen_codes[sym as usize].length as u64 + extra_bits as u64;
    }

    for tok in tokens {
        bits += dynamic_token_bits(t, tok);
    }
    bits += t.litlen_lengths[END_OF_BLOCK as usize] as u64;
    bits
}

fn dynamic_token_bits(t: &DynamicTables, tok: &Token) -> u64 {
    match *tok {
        Token::Literal(b) => t.litlen_lengths[b as usize] as u64,
        Token::Match { length, distance } => {
            let lsym = LENGTH_CODE[length as usize - 3] as usize;
            let lidx = lsym - 257;
            let dcode = distance_code(distance) as usize;
            t.litlen_lengths[lsym] as u64
                + LENGTH_EXTRA_BITS[lidx] as u64
                + t.dist_lengths[dcode] as u64
                + DIST_EXTRA_BITS[dcode] as u64
        }
    }
}

fn write_stored_blocks(bw: &mut BitWriter, data: &[u8]) {
    let mut offset = 0;
    while offset < data.len() {
        let chunk_len = (data.len() - offset).min(STORED_MAX_CHUNK);
        let is_final = offset + chunk_len >= data.len();
        bw.write_bits(is_final as u32, 1);
        bw.write_bits(0, 2);
        bw.align_to_byte();
        bw.write_bits(chunk_len as u32, 16);
        bw.write_bits((!(chunk_len as u16)) as u32, 16);
        for &b in &data[offset..offset + chunk_len] {
            bw.write_bits(b as u32, 8);
        }
        offset += chunk_len;
    }
}

fn write_fixed_block(bw: &mut BitWriter, tokens: &[Token]) {
    bw.write_bits(1, 1);
    bw.write_bits(1, 2);

    for tok in tokens {
        write_fixed_token(bw, tok);
    }
    bw.write_code(HuffmanCode {
        bits: reverse(fixed_litlen_code(END_OF_BLOCK), fixed_litlen_code_length(END_OF_BLOCK)),
        length: fixed_litlen_code_length(END_OF_BLOCK),
    });
}

fn write_fixed_token(bw: &mut BitWriter, tok: &Token) {
    match *tok {
        Token::Literal(b) => {
            let len = fixed_litlen_code_length(b as u16);
            bw.write_code(HuffmanCode {
                bits: reverse(fixed_litlen_code(b as u16), len),
                length: len,
            });
        }
        Token::Match { length, distance } => {
            let lsym = LENGTH_CODE[length as usize - 3];
            let lidx = lsym as usize - 257;
            let len = fixed_litlen_code_length(lsym);
            bw.write_code(HuffmanCode {
                bits: reverse(fixed_litlen_code(lsym), len),
                length: len,
            });
            let extra = LENGTH_EXTRA_BITS[lidx];
            if extra > 0 {
                bw.write_bits((length - LENGTH_BASE[lidx]) as u32, extra as u32);
            }

            let dcode = distance_code(distance);
            bw.write_code(HuffmanCode {
                bits: reverse(dcode as u16, 5),
                length: 5,
            });
            let dextra = DIST_EXTRA_BITS[dcode as usize];
            if dextra > 0 {
                bw.write_bits((distance - DIST_BASE[dcode as usize]) as u32, dextra as u32);
            }
        }
    }
}

fn reverse(value: u16, n: u8) -> u16 {
    let mut v = value;
    let mut r = 0u16;
    for _ in 0..n {
        r = (r << 1) | (v & 1);
        v >>= 1;
    }
    r
}

fn write_dynamic_block(bw: &mut BitWriter, tokens: &[Token], t: &DynamicTables) {
    bw.write_bits(1, 1);
    bw.write_bits(2, 2);

    bw.write_bits((t.hlit - 257) as u32, 5);
    bw.write_bits((t.hdist - 1) as u32, 5);
    bw.write_bits((t.hclen - 4) as u32, 4);

    for i in 0..t.hclen {
        bw.write_bits(t.clen_lengths[CLEN_ORDER[i]] as u32, 3);
    }

    let clen_codes = huffman::assign_canonical_codes(&t.clen_lengths, 7);
    for &(sym, extra_val, extra_bits) in &t.rle {
        bw.write_code(clen_codes[sym as usize]);
        if extra_bits > 0 {
            bw.write_bits(extra_val, extra_bits);
        }
    }

    let litlen_codes = huffman::assign_canonical_codes(&t.litlen_lengths, 15);
    let dist_codes = huffman::assign_canonical_codes(&t.dist_lengths, 15);

    for tok in tokens {
        match *tok {
            Token::Literal(b) => bw.write_code(litlen_codes[b as usize]),
            Token::Match { length, distance } => {
                let lsym = LENGTH_CODE[length as usize - 3] as usize;
                let lidx = lsym - 257;
                bw.write_code(litlen_codes[lsym]);
                let extra = LENGTH_EXTRA_BITS[lidx];
                if extra > 0 {
                    bw.write_bits((length - LENGTH_BASE[lidx]) as u32, extra as u32);
                }

                let dcode = distance_code(distance) as usize;
                bw.write_code(dist_codes[dcode]);
                let dextra = DIST_EXTRA_BITS[dcode];
                if dextra > 0 {
                    bw.write_bits((distance - DIST_BASE[dcode]) as u32, dextra as u32);
                }
            }
        }
    }

    bw.write_code(litlen_codes[END_OF_BLOCK as usize]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inflate(bytes: &[u8]) -> Vec<u8> {
        use std::io::Read;
        let mut out = Vec::new();
        flate2::read::DeflateDecoder::new(bytes)
            .read_to_end(&mut out)
            .expect("valid deflate stream");
        out
    }

    #[test]
    fn empty_input_round_trips() {
        let compressed = compress(&[], 6);
        assert_eq!(inflate(&compressed), Vec::<u8>::new());
    }

    #[test]
    fn level_zero_round_trips() {
        let data = b"hello, world! hello, world!".to_vec();
        let compressed = compress(&data, 0);
        assert_eq!(inflate(&compressed), data);
    }

    #[test]
    fn all_levels_round_trip_repetitive_text() {
        let data = "the quick brown fox jumps over the lazy dog. "
            .repeat(200)
            .into_bytes();
        for level in 0..=9u8 {
            let compressed = compress(&data, level);
            assert_eq!(inflate(&compressed), data, "level {level}");
        }
    }

    #[test]
    fn large_incompressible_buffer_round_trips() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i * 2654435761) as u8).collect();
        for level in [1u8, 6, 9] {
            let compressed = compress(&data, level);
            assert_eq!(inflate(&compressed), data, "level {level}");
        }
    }

    #[test]
    fn stored_block_splits_past_65535_bytes() {
        let data = vec![7u8; 200_000];
        let compressed = compress(&data, 0);
        assert_eq!(inflate(&compressed), data);
    }
}
