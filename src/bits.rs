// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::constants::BYTE_MAX;

/// All-ones mask of `log2` bits
#[inline]
pub const fn mask(log2: u32) -> usize {
    (1 << log2) - 1
}

#[inline]
pub const fn round_up_to_log2(u: usize, log2: u32) -> usize {
    (u + mask(log2)) & !mask(log2)
}

/// Upper bound on the number of escape bytes needed to carry `u`.
#[inline]
pub const fn size_bytes_count(u: usize) -> usize {
    ((u + BYTE_MAX) >> 8) + 1
}

/// Exact number of escape bytes written for `u`: one per 255 plus the terminator.
#[inline]
pub const fn escape_len(u: usize) -> usize {
    u / BYTE_MAX + 1
}

/// Load a u32 from the slice at the given offset
#[inline]
pub fn read4(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Load a u64 from the slice at the given offset
#[inline]
pub fn read8(data: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(word)
}

#[inline]
pub fn equal4(data: &[u8], a: usize, b: usize) -> bool {
    read4(data, a) == read4(data, b)
}

/// Hash of the low 5 bytes of `u`, `bits` wide
#[inline]
pub fn hash5(u: u64, bits: u32) -> usize {
    const PRIME_5_BYTES: u64 = 889523592379;
    ((u << 24).wrapping_mul(PRIME_5_BYTES) >> (64 - bits)) as usize
}
