// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::constants::*;
use crate::copy::{copy_literals, copy_repeat};
use crate::error::{Error, Result};
use crate::tag::{read_escape, read_tag, TagLayout};

/// Decode returns the decompressed form of `src`.
///
/// `capacity` is the size of the original block, which the format does not
/// record; the caller tracks it. The result is at most 4096 bytes long.
pub fn decode(src: &[u8], capacity: usize) -> Result<Vec<u8>> {
    let mut dst = vec![0u8; capacity.min(BLOCK_SIZE)];
    let n = decode_into(src, &mut dst)?;
    dst.truncate(n);
    Ok(dst)
}

/// Decode into a pre-allocated destination buffer.
/// Returns the number of bytes written to dst.
///
/// Only the first 4096 bytes of `dst` are used. Bytes of `dst` past the
/// returned length may have been overwritten.
pub fn decode_into(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    if dst.is_empty() {
        return Err(Error::InvalidInput("empty output buffer".into()));
    }
    if src.len() <= HEADER_BYTES + TAG_BYTES {
        return Err(Error::InvalidInput(format!(
            "compressed block of {} bytes is too small",
            src.len()
        )));
    }

    let out_len = dst.len().min(BLOCK_SIZE);
    let dst = &mut dst[..out_len];

    let result = if src.len() == PATTERN_BYTES {
        decode_pattern(src, dst)
    } else {
        decode_block(src, dst, TagLayout::BLOCK_4KB)
    };
    if let Err(ref e) = result {
        tracing::debug!(src_len = src.len(), cap = out_len, error = %e, "lz4kd decode failed");
    }
    result
}

/// Tile the 8-byte pattern over all of `dst`.
fn decode_pattern(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    if dst.len() % PATTERN_BYTES != 0 {
        return Err(Error::Corrupt);
    }
    for word in dst.chunks_exact_mut(PATTERN_BYTES) {
        word.copy_from_slice(&src[..PATTERN_BYTES]);
    }
    Ok(dst.len())
}

/// Core decoding loop. `src` still starts with the header byte.
fn decode_block(src: &[u8], dst: &mut [u8], layout: TagLayout) -> Result<usize> {
    let in_end = src.len();
    let mut s = HEADER_BYTES; // source index
    let mut d = 0; // destination index

    while s + TAG_BYTES <= in_end {
        let tag = layout.unpack(read_tag(src, s));
        s += TAG_BYTES;

        let mut nr_bytes = tag.nr;
        if nr_bytes == layout.nr_mask() {
            s = read_escape(src, s, &mut nr_bytes)?;
        }
        if !copy_literals(src, s, dst, d, nr_bytes) {
            return Err(Error::Corrupt);
        }
        s += nr_bytes;
        d += nr_bytes;

        let mut r_bytes = tag.r + REPEAT_MIN;
        if tag.r == layout.r_mask() {
            s = read_escape(src, s, &mut r_bytes)?;
        }

        if tag.offset == 0 {
            return end_of_block(nr_bytes, r_bytes, s, in_end, d);
        }
        if tag.offset > d {
            // Reference before the start of the block
            return Err(Error::Corrupt);
        }
        if !copy_repeat(dst, d, tag.offset, r_bytes) {
            return Err(Error::Corrupt);
        }
        d += r_bytes;
    }

    if s == in_end {
        Ok(d)
    } else {
        Err(Error::Corrupt)
    }
}

/// Validate the final literal-only tag: it must carry literals, no repeat
/// bytes, and be the last thing in the block.
fn end_of_block(nr_bytes: usize, r_bytes: usize, s: usize, in_end: usize, d: usize) -> Result<usize> {
    if nr_bytes == 0 || r_bytes != REPEAT_MIN || s != in_end {
        return Err(Error::Corrupt);
    }
    Ok(d)
}
