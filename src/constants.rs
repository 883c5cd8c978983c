// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// log2 of the largest block the codec accepts (4KB)
pub const BLOCK_SIZE_LOG2: u32 = 12;

/// Largest block size, one memory page
pub const BLOCK_SIZE: usize = 1 << BLOCK_SIZE_LOG2;

/// Width of the literal count field in a 4KB block tag
pub const NR_4KB_LOG2: u32 = 6;

/// Shortest back-reference the format can express
pub const REPEAT_MIN: usize = 4;

/// Packed tag size
pub const TAG_BYTES: usize = 3;
pub const TAG_BITS: u32 = (TAG_BYTES * 8) as u32;

/// Escape bytes equal to this value continue the sequence
pub const BYTE_MAX: usize = 255;

/// Header byte written before the tag stream of a normal block
pub const HEADER: u8 = 0;
pub const HEADER_BYTES: usize = 1;

/// Compressed size that marks a tiled 8-byte pattern block
pub const PATTERN_BYTES: usize = 8;

/// Hash table slots (log2) of the encoder state
pub const HASH_LOG2: u32 = 12;
pub const HASH_SIZE: usize = 1 << HASH_LOG2;

/// Initial probe step (log2); the step grows by one every failed probe pair
pub const STEP_LOG2: u32 = 5;

/// Output buffers must exceed max(GAIN_BYTES_MAX, io_min >> GAIN_BYTES_LOG2)
pub const GAIN_BYTES_LOG2: u32 = 6;
pub const GAIN_BYTES_MAX: usize = 1 << GAIN_BYTES_LOG2;

/// Literal batch copy width, also the encoder's end-of-input margin
pub const NR_COPY_LOG2: u32 = 4;
pub const NR_COPY_MIN: usize = 1 << NR_COPY_LOG2;

/// Back-reference batch copy width
pub const R_COPY_MIN: usize = 16;

/// Output slack the batched back-reference copies may write past their end
pub const R_COPY_SAFE_2X: usize = (R_COPY_MIN << 1) - 1;

/// Format version string
pub const VERSION: &str = "2022.03.20";
