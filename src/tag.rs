// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Tag layout and escape bytes
//!
//! Compressed data format ({} means 0 or more occurrences, [] optional):
//!
//! ```text
//! <24 bit tag: nr | r | offset>{<nr escape byte>}[<nr literal bytes>]{<r escape byte>}
//! ```
//!
//! Escape sequences are terminated by a byte != 255. Offset 0 marks the
//! final literal run of a block.

use crate::bits::{escape_len, mask, read4};
use crate::constants::*;
use crate::error::{Error, Result};

/// Bit widths of the three tag fields for one block size class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLayout {
    pub off_log2: u32,
    pub nr_log2: u32,
}

impl TagLayout {
    /// Layout used for 4KB blocks: 12 bit offset, 6 bit repeat, 6 bit literal count
    pub const BLOCK_4KB: TagLayout = TagLayout {
        off_log2: BLOCK_SIZE_LOG2,
        nr_log2: NR_4KB_LOG2,
    };

    #[inline]
    pub const fn r_log2(&self) -> u32 {
        TAG_BITS - (self.off_log2 + self.nr_log2)
    }

    #[inline]
    pub const fn nr_mask(&self) -> usize {
        mask(self.nr_log2)
    }

    #[inline]
    pub const fn r_mask(&self) -> usize {
        mask(self.r_log2())
    }

    #[inline]
    pub const fn off_mask(&self) -> usize {
        mask(self.off_log2)
    }

    /// Pack raw field values. Values must already fit their fields.
    #[inline]
    pub fn pack(&self, offset: usize, nr: usize, r: usize) -> u32 {
        debug_assert!(offset <= self.off_mask());
        debug_assert!(nr <= self.nr_mask());
        debug_assert!(r <= self.r_mask());
        ((nr << (self.off_log2 + self.r_log2())) | (r << self.off_log2) | offset) as u32
    }

    #[inline]
    pub fn unpack(&self, utag: u32) -> Tag {
        let utag = utag as usize;
        Tag {
            offset: utag & self.off_mask(),
            nr: utag >> (self.off_log2 + self.r_log2()),
            r: (utag >> self.off_log2) & self.r_mask(),
        }
    }
}

/// Raw tag fields as stored, before escape expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Back-reference distance, 0 for end of block
    pub offset: usize,
    /// Literal count field
    pub nr: usize,
    /// Repeat length field minus REPEAT_MIN
    pub r: usize,
}

/// Read the tag at `at` with one 4-byte load starting a byte earlier.
/// `at` must be at least 1; the header byte guarantees that for block data.
#[inline]
pub fn read_tag(src: &[u8], at: usize) -> u32 {
    read4(src, at - 1) >> 8
}

/// Write the low 3 bytes of `utag` little-endian.
#[inline]
pub fn write_tag(dst: &mut [u8], utag: u32) -> usize {
    dst[..TAG_BYTES].copy_from_slice(&utag.to_le_bytes()[..TAG_BYTES]);
    TAG_BYTES
}

/// Split a length into its field value and the remainder carried by escape
/// bytes, if any.
#[inline]
pub fn split_field(value: usize, field_mask: usize) -> (usize, Option<usize>) {
    if value < field_mask {
        (value, None)
    } else {
        (field_mask, Some(value - field_mask))
    }
}

/// Bytes needed to store a field value including its escape bytes
#[inline]
pub fn escaped_len(rest: Option<usize>) -> usize {
    rest.map_or(0, escape_len)
}

/// Emit escape bytes for `u` and return the number of bytes written
pub fn write_escape(dst: &mut [u8], mut u: usize) -> usize {
    let mut i = 0;
    while u >= BYTE_MAX {
        dst[i] = BYTE_MAX as u8;
        u -= BYTE_MAX;
        i += 1;
    }
    dst[i] = u as u8;
    i + 1
}

/// Add the escape sequence starting at `at` to `total`.
/// Returns the position after the terminating byte.
pub fn read_escape(src: &[u8], mut at: usize, total: &mut usize) -> Result<usize> {
    loop {
        let u = *src.get(at).ok_or(Error::ReadError)? as usize;
        *total += u;
        at += 1;
        if u != BYTE_MAX {
            return Ok(at);
        }
    }
}
