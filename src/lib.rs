// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! # LZ4KD Page Compression
//!
//! This library implements LZ4KD, an LZ77-style codec for single blocks of
//! at most 4096 bytes, such as zram or swap pages.
//!
//! LZ4KD provides:
//! - Single pass, allocation-free encoding with caller-owned scratch state
//! - Bounds-checked decoding that rejects corrupt blocks
//! - An 8-byte pattern form for pages made of one repeated word
//! - No framing: the caller keeps the original page size
//!
//! ## Block Format Example
//!
//! ```rust
//! use lz4kd::{decode, encode};
//!
//! let page = b"Hello, World! Hello, World! Hello, World! Hello, World!".repeat(40);
//! let compressed = encode(&page).expect("page should compress");
//! let decompressed = decode(&compressed, page.len()).expect("decompression failed");
//! assert_eq!(page, decompressed);
//! ```
//!
//! Blocks that do not shrink come back as [`Error::Incompressible`]; store
//! those as they are, or let [`Page`] do it:
//!
//! ```rust
//! use lz4kd::{Encoder, Page};
//!
//! let mut encoder = Encoder::new();
//! let page = Page::compress(&mut encoder, &[0u8; 4096]).unwrap();
//! assert_eq!(page.stored_len(), 8);
//! assert_eq!(page.decompress().unwrap(), vec![0u8; 4096]);
//! ```

mod bits;
mod constants;
mod copy;
mod decode;
mod encode;
mod error;
mod page;
mod tag;

#[cfg(feature = "concurrent")]
mod concurrent;

pub use constants::{BLOCK_SIZE, PATTERN_BYTES};
pub use decode::{decode, decode_into};
pub use encode::{
    encode, encode_block, encode_pattern, encoded_bytes_max, max_encoded_len,
    scratch_buffer_min_bytes, EncodeState, Encoder,
};
pub use error::{Error, Result};
pub use page::Page;

#[cfg(feature = "concurrent")]
pub use concurrent::{compress_pages, decompress_pages};

/// Version of the block format this crate reads and writes
pub fn version() -> &'static str {
    constants::VERSION
}

#[cfg(test)]
mod tests;
