// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{
    decode, decode_into, encode, encode_block, encode_pattern, max_encoded_len, EncodeState,
    Encoder, Error, Page,
};

/// Encode with a worst-case sized output buffer, so only the soft limit
/// (the input size) decides compressibility.
fn compress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut state = EncodeState::new();
    let mut dst = vec![0u8; max_encoded_len(data.len()).max(65)];
    let n = encode_block(&mut state, data, &mut dst, 0)?;
    dst.truncate(n);
    Ok(dst)
}

fn roundtrip(data: &[u8]) -> Result<(), String> {
    let page = Page::compress(&mut Encoder::new(), data)
        .map_err(|e| format!("compress error: {}", e))?;
    let decoded = page
        .decompress()
        .map_err(|e| format!("decode error: {}", e))?;
    if decoded != data {
        return Err(format!(
            "roundtrip mismatch: original len={}, decoded len={}",
            data.len(),
            decoded.len()
        ));
    }

    match compress(data) {
        Ok(encoded) => {
            if encoded.len() > data.len() {
                return Err(format!(
                    "encoded {} bytes into {} bytes",
                    data.len(),
                    encoded.len()
                ));
            }
            let decoded =
                decode(&encoded, data.len()).map_err(|e| format!("decode error: {}", e))?;
            if decoded != data {
                return Err(format!("fast roundtrip mismatch: len={}", data.len()));
            }
        }
        Err(Error::Incompressible) => {}
        Err(e) => return Err(format!("encode error: {}", e)),
    }
    Ok(())
}

fn lcg_bytes(seed: u64, n: usize) -> Vec<u8> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 32) as u8
        })
        .collect()
}

#[test]
fn test_small_copy() {
    for i in 0..32 {
        let mut s = b"aaaa".to_vec();
        s.extend(vec![b'b'; i]);
        s.extend(b"aaaabbbb");
        roundtrip(&s).unwrap();
    }
}

#[test]
fn test_small_rand() {
    let mut n = 1;
    while n <= 4096 {
        roundtrip(&lcg_bytes(n as u64, n)).unwrap();
        n += 23;
    }
}

#[test]
fn test_small_regular() {
    let mut n = 1;
    while n <= 4096 {
        let b: Vec<u8> = (0..n).map(|i| (i % 10) as u8 + b'a').collect();
        roundtrip(&b).unwrap();
        n += 23;
    }
}

#[test]
fn test_small_repeat() {
    let mut n = 1;
    while n <= 4096 {
        roundtrip(&vec![b'a'; n]).unwrap();
        n += 23;
    }
}

#[test]
fn test_boundary_sizes() {
    for n in [1, 2, 3, 4, 5, 8, 15, 16, 17, 18, 62, 63, 64, 65, 318, 319, 4095, 4096] {
        roundtrip(&vec![b'z'; n]).unwrap();
        roundtrip(&lcg_bytes(7, n)).unwrap();
        let text: Vec<u8> = b"page boundary ".iter().cycle().take(n).copied().collect();
        roundtrip(&text).unwrap();
    }
}

#[test]
fn test_literal_escape_thresholds() {
    // Unique bytes followed by a long run: the first tag carries exactly
    // `n` literals, straddling the literal field mask.
    for n in [61, 62, 63, 64, 65, 318, 319, 320] {
        let mut data = lcg_bytes(n as u64, n);
        data.extend(vec![0x5a; 2000]);
        let encoded = compress(&data).unwrap();
        assert_eq!(decode(&encoded, data.len()).unwrap(), data, "n={}", n);
    }
}

#[test]
fn test_repeat_escape_thresholds() {
    // One literal then a run whose repeat length straddles the repeat mask
    for run in [64, 65, 66, 67, 68, 69, 70, 322, 323, 324] {
        let data = vec![0x11u8; 1 + run];
        let encoded = compress(&data).unwrap();
        assert_eq!(decode(&encoded, data.len()).unwrap(), data, "run={}", run);
    }
}

#[test]
fn test_repeated_byte_page() {
    let data = vec![0x41u8; 4096];
    let encoded = compress(&data).unwrap();
    assert!(encoded.len() < 32, "got {} bytes", encoded.len());
    assert_eq!(decode(&encoded, 4096).unwrap(), data);
}

#[test]
fn test_random_page_incompressible() {
    let data = lcg_bytes(42, 4096);
    assert_eq!(encode(&data), Err(Error::Incompressible));

    let mut state = EncodeState::new();
    let mut dst = vec![0u8; 4096];
    assert_eq!(
        encode_block(&mut state, &data, &mut dst, 0),
        Err(Error::Incompressible)
    );
}

#[test]
fn test_pattern_page() {
    let data = vec![0u8; 4096];
    let encoded = encode_pattern(&data).unwrap();
    assert_eq!(encoded, vec![0u8; 8]);
    assert_eq!(decode(&encoded, 4096).unwrap(), data);

    let word = [0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04];
    let data = word.repeat(512);
    let encoded = encode_pattern(&data).unwrap();
    assert_eq!(encoded, word);
    assert_eq!(decode(&encoded, 4096).unwrap(), data);

    // Without the pattern short-circuit it is a normal block
    let encoded = encode(&data).unwrap();
    assert_ne!(encoded.len(), 8);
    assert_eq!(decode(&encoded, 4096).unwrap(), data);
}

#[test]
fn test_never_emits_pattern_length() {
    // Any normal block of exactly 8 bytes would decode as a pattern
    for n in 17..200 {
        for seed in 0..4u64 {
            let mut data = lcg_bytes(seed, 4);
            data.extend(vec![data[0]; n - 4]);
            if let Ok(encoded) = compress(&data) {
                assert_ne!(encoded.len(), 8, "n={}", n);
                assert_eq!(decode(&encoded, data.len()).unwrap(), data);
            }
        }
    }
}

#[test]
fn test_eight_byte_encoding_is_incompressible() {
    // Header, tag (offset 4, 4 literals, 16 repeat bytes) and "abcd" is
    // exactly 8 bytes, which a decoder would take for a pattern block.
    let data = b"abcd".repeat(5);
    let mut state = EncodeState::new();
    let mut dst = vec![0u8; max_encoded_len(data.len())];
    assert_eq!(
        encode_block(&mut state, &data, &mut dst, 0),
        Err(Error::Incompressible)
    );
    assert_eq!(&dst[..8], &[0x00, 0x04, 0xc0, 0x10, b'a', b'b', b'c', b'd']);
    assert_eq!(decode(&dst[..8], data.len()), Err(Error::Corrupt));

    let page = Page::compress(&mut Encoder::new(), &data).unwrap();
    assert!(!page.is_compressed());
    assert_eq!(page.decompress().unwrap(), data);

    // One byte shorter only shrinks the repeat field: still 8 bytes
    let data = b"abcd".repeat(5)[..19].to_vec();
    assert_eq!(encode(&data), Err(Error::Incompressible));
}

#[test]
fn test_short_sequential_page_incompressible() {
    // 256 distinct bytes hold no repeat at all
    let data: Vec<u8> = (0..=255u8).collect();
    assert_eq!(Encoder::new().encode(&data), Err(Error::Incompressible));
    roundtrip(&data).unwrap();
}

#[test]
fn test_encoder_reuse_is_deterministic() {
    let inputs = [
        b"abcdefgh".repeat(300),
        lcg_bytes(1, 4096),
        b"The quick brown fox jumps over the lazy dog. ".repeat(50),
    ];
    let mut encoder = Encoder::new();
    let mut reused = Vec::new();
    for input in &inputs {
        reused.push(encoder.encode(&input[..input.len().min(4096)]));
    }
    for (input, first) in inputs.iter().zip(&reused) {
        let again = encoder.encode(&input[..input.len().min(4096)]);
        assert_eq!(first, &again);
        assert_eq!(first, &Encoder::new().encode(&input[..input.len().min(4096)]));
    }
}

#[test]
fn test_soft_limit() {
    let data = b"0123456789abcdef".repeat(16);
    let full = encode(&data).unwrap();

    assert_eq!(Encoder::new().soft_limit(), 0);
    let mut encoder = Encoder::with_soft_limit(full.len());
    assert_eq!(encoder.soft_limit(), full.len());
    assert_eq!(encoder.encode(&data).unwrap(), full);

    let mut encoder = Encoder::with_soft_limit(full.len() - 1);
    assert_eq!(encoder.encode(&data), Err(Error::Incompressible));

    // Limits above the input size are clamped to it
    let mut encoder = Encoder::with_soft_limit(100_000);
    assert_eq!(encoder.encode(&data).unwrap(), full);
}

#[test]
fn test_output_below_worst_case() {
    // Compressible, but the buffer is smaller than the literal worst case
    let data = vec![b'q'; 1000];
    let mut state = EncodeState::new();
    let mut dst = vec![0u8; max_encoded_len(1000) - 1];
    assert_eq!(
        encode_block(&mut state, &data, &mut dst, 0),
        Err(Error::Incompressible)
    );
}

#[test]
fn test_corrupt_offset() {
    let data = b"abcdefghij".repeat(100);
    let mut encoded = compress(&data).unwrap();

    // First tag: literals "abcdefghij", then offset 10. Point it past the
    // start of the output.
    let utag = u32::from_le_bytes([encoded[1], encoded[2], encoded[3], 0]);
    assert_eq!(utag & 0xfff, 10);
    let bad = (utag & !0xfff) | 0x800;
    encoded[1..4].copy_from_slice(&bad.to_le_bytes()[..3]);
    assert_eq!(decode(&encoded, data.len()), Err(Error::Corrupt));
}

#[test]
fn test_truncated_escape() {
    // Long run: the repeat length is carried by escape bytes at the end
    let data = vec![b'r'; 2000];
    let encoded = compress(&data).unwrap();
    for cut in 5..encoded.len() {
        if cut == 8 {
            continue;
        }
        assert!(
            decode(&encoded[..cut], data.len()).is_err(),
            "cut={} decoded",
            cut
        );
    }
    assert_eq!(
        decode(&encoded[..encoded.len() - 1], data.len()),
        Err(Error::ReadError)
    );
}

#[test]
fn test_decode_garbage_never_panics() {
    for seed in 0..200u64 {
        let len = 5 + (seed as usize * 37) % 300;
        let garbage = lcg_bytes(seed, len);
        let mut dst = vec![0u8; 4096];
        let _ = decode_into(&garbage, &mut dst);
        let _ = decode(&garbage, 100);
    }
}

#[test]
fn test_decode_into_exact_buffer() {
    let data = b"exact output buffers need the byte-wise paths ".repeat(40);
    let data = &data[..1500];
    let encoded = compress(data).unwrap();
    let mut dst = vec![0u8; data.len()];
    assert_eq!(decode_into(&encoded, &mut dst).unwrap(), data.len());
    assert_eq!(&dst[..], data);

    let mut short = vec![0u8; data.len() - 1];
    assert_eq!(decode_into(&encoded, &mut short), Err(Error::Corrupt));
}

#[test]
fn test_encode_noise_then_repeats() {
    let mut data = lcg_bytes(99, 2048);
    let copy = data[..2048].to_vec();
    data.extend_from_slice(&copy);
    let encoded = compress(&data).unwrap();
    assert!(encoded.len() < 2200, "got {} bytes", encoded.len());
    assert_eq!(decode(&encoded, data.len()).unwrap(), data);
}

#[test]
fn test_version() {
    assert_eq!(crate::version(), "2022.03.20");
}
