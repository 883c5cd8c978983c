// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bits::{equal4, hash5, read8, round_up_to_log2, size_bytes_count};
use crate::constants::*;
use crate::error::{Error, Result};
use crate::tag::{escaped_len, split_field, write_escape, write_tag, TagLayout};

/// Scratch state of one encode call: the match finder's hash table.
///
/// Each slot holds the last input position whose 5-byte window hashed to it.
/// The table is cleared at the start of every encode, so nothing carries
/// over from one block to the next.
#[derive(Clone)]
pub struct EncodeState {
    table: [u16; HASH_SIZE],
}

impl EncodeState {
    /// Create an empty table
    pub fn new() -> Self {
        EncodeState {
            table: [0; HASH_SIZE],
        }
    }

    fn reset(&mut self) {
        self.table.fill(0);
    }

    /// Store `pos` in the slot for `h` and return the position it replaces.
    #[inline]
    fn swap(&mut self, h: usize, pos: usize) -> usize {
        let prev = self.table[h] as usize;
        self.table[h] = pos as u16;
        prev
    }

    #[inline]
    fn insert(&mut self, h: usize, pos: usize) {
        self.table[h] = pos as u16;
    }
}

impl Default for EncodeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of scratch bytes an encode call needs
pub const fn scratch_buffer_min_bytes() -> usize {
    1 << (HASH_LOG2 + 1)
}

/// Encoder for LZ4KD compression
///
/// Owns the scratch state, so one encoder handles one block at a time.
/// Use one encoder per thread to compress in parallel.
pub struct Encoder {
    state: Box<EncodeState>,
    soft_limit: usize,
}

impl Encoder {
    /// Create a new encoder with no soft limit
    pub fn new() -> Self {
        Encoder {
            state: Box::default(),
            soft_limit: 0,
        }
    }

    /// Create an encoder that gives up once the output provably exceeds
    /// `soft_limit` bytes. 0 disables the limit.
    pub fn with_soft_limit(soft_limit: usize) -> Self {
        Encoder {
            state: Box::default(),
            soft_limit,
        }
    }

    /// The configured soft limit, 0 when disabled
    pub fn soft_limit(&self) -> usize {
        self.soft_limit
    }

    /// Encode `src` into `dst` and return the compressed size.
    pub fn encode_into(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        encode_block(&mut self.state, src, dst, self.soft_limit)
    }

    /// Like `encode_into`, but a block made of one repeated 8-byte word is
    /// stored as that word alone.
    pub fn encode_pattern_into(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        check_args(src, dst)?;
        if let Some(pattern) = tiled_pattern(src) {
            if dst.len() >= PATTERN_BYTES {
                dst[..PATTERN_BYTES].copy_from_slice(pattern);
                return Ok(PATTERN_BYTES);
            }
        }
        self.encode_into(src, dst)
    }

    /// Encode `src` into a newly allocated buffer.
    pub fn encode(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; encode_buffer_len(src.len())];
        let n = self.encode_into(src, &mut dst)?;
        dst.truncate(n);
        Ok(dst)
    }

    /// Pattern-aware variant of `encode`.
    pub fn encode_pattern(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; encode_buffer_len(src.len())];
        let n = self.encode_pattern_into(src, &mut dst)?;
        dst.truncate(n);
        Ok(dst)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode returns the compressed form of the block `src`.
///
/// Returns `Error::Incompressible` when the block does not fit in
/// `src.len()` bytes; callers then keep the block as is.
pub fn encode(src: &[u8]) -> Result<Vec<u8>> {
    Encoder::new().encode(src)
}

/// Like `encode`, storing blocks of one repeated 8-byte word in pattern form.
pub fn encode_pattern(src: &[u8]) -> Result<Vec<u8>> {
    Encoder::new().encode_pattern(src)
}

/// Output buffer size used by the allocating helpers: the literal worst
/// case, and always above the minimum-gain threshold.
fn encode_buffer_len(src_len: usize) -> usize {
    max_encoded_len(src_len).max(GAIN_BYTES_MAX + 1)
}

/// Maximum encoded size of a block of `src_len` bytes stored as literals.
pub fn max_encoded_len(src_len: usize) -> usize {
    let nr_mask = TagLayout::BLOCK_4KB.nr_mask();
    let n = HEADER_BYTES + TAG_BYTES + round_up_to_log2(src_len, NR_COPY_LOG2);
    if src_len < nr_mask {
        n
    } else {
        n + size_bytes_count(src_len - nr_mask)
    }
}

/// Maximum encoded size of a block carrying `nr_max` literal bytes and
/// `r_max` bytes of back-references.
pub fn encoded_bytes_max(nr_max: usize, r_max: usize) -> usize {
    let layout = TagLayout::BLOCK_4KB;
    let mut n = max_encoded_len(nr_max);
    if r_max >= layout.r_mask() {
        let r_max = r_max - layout.r_mask();
        // worst case: one tag for each REPEAT_MIN bytes
        n += size_bytes_count(r_max).max(r_max - r_max / REPEAT_MIN);
    }
    n
}

fn check_args(src: &[u8], dst: &[u8]) -> Result<()> {
    if src.is_empty() {
        return Err(Error::InvalidInput("empty input".into()));
    }
    if src.len() > BLOCK_SIZE {
        return Err(Error::InvalidInput(format!(
            "block of {} bytes exceeds {}",
            src.len(),
            BLOCK_SIZE
        )));
    }
    let io_min = src.len().min(dst.len());
    let gain_max = GAIN_BYTES_MAX.max(io_min >> GAIN_BYTES_LOG2);
    if dst.len() <= gain_max {
        return Err(Error::InvalidInput(format!(
            "output buffer of {} bytes, need more than {}",
            dst.len(),
            gain_max
        )));
    }
    Ok(())
}

/// Returns the repeated word if `src` is more than one copy of a single
/// 8-byte word.
fn tiled_pattern(src: &[u8]) -> Option<&[u8]> {
    if src.len() <= PATTERN_BYTES || src.len() % PATTERN_BYTES != 0 {
        return None;
    }
    let pattern = &src[..PATTERN_BYTES];
    src.chunks_exact(PATTERN_BYTES)
        .all(|word| word == pattern)
        .then_some(pattern)
}

/// Encode one block with caller-supplied scratch state.
///
/// `soft_limit` caps the compressed size; 0 or anything above
/// `min(src.len(), dst.len())` means that minimum. The returned size never
/// exceeds the effective limit.
pub fn encode_block(
    state: &mut EncodeState,
    src: &[u8],
    dst: &mut [u8],
    soft_limit: usize,
) -> Result<usize> {
    check_args(src, dst)?;

    let io_min = src.len().min(dst.len());
    let limit = if soft_limit == 0 || soft_limit > io_min {
        io_min
    } else {
        soft_limit
    };

    state.reset();
    dst[0] = HEADER;
    if max_encoded_len(src.len()) > dst.len() {
        tracing::trace!(len = src.len(), cap = dst.len(), "output below literal worst case");
        return Err(Error::Incompressible);
    }

    let n = encode_fast(state, src, &mut dst[..limit])?;
    if n == PATTERN_BYTES {
        // Would decode as a pattern block
        return Err(Error::Incompressible);
    }
    Ok(n)
}

/// Greedy single-pass encoder. `dst` is bounded by the soft limit and
/// already holds the header byte.
fn encode_fast(state: &mut EncodeState, src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let layout = TagLayout::BLOCK_4KB;
    let mut d = HEADER_BYTES;

    if src.len() <= NR_COPY_MIN {
        return Ok(d + emit_tail(&mut dst[d..], layout, src)?);
    }

    let in_end_safe = src.len() - NR_COPY_MIN;
    let mut nr0 = 0;
    let mut r = 1;

    loop {
        let mut step = 1 << STEP_LOG2;

        let q = loop {
            let q = state.swap(hash(src, r), r);
            if equal4(src, q, r) {
                break q;
            }
            r += 1;
            let q = state.swap(hash(src, r), r);
            if equal4(src, q, r) {
                break q;
            }
            step += 1;
            r += step >> STEP_LOG2;
            if r > in_end_safe {
                return Ok(d + emit_tail(&mut dst[d..], layout, &src[nr0..])?);
            }
        };

        let offset = r - q;
        let r_end = repeat_end(src, q, r, in_end_safe);
        d += emit_sequence(&mut dst[d..], layout, offset, &src[nr0..r], r_end - r)?;

        r = r_end;
        if r > in_end_safe {
            if r == src.len() {
                return Ok(d);
            }
            return Ok(d + emit_tail(&mut dst[d..], layout, &src[r..])?);
        }
        state.insert(hash(src, r - 1), r - 1);
        nr0 = r;
    }
}

#[inline]
fn hash(src: &[u8], pos: usize) -> usize {
    hash5(read8(src, pos), HASH_LOG2)
}

/// Extend the match at `(q, r)` forward, past the REPEAT_MIN bytes already
/// known equal. Returns the end of the match in `src`.
fn repeat_end(src: &[u8], q: usize, r: usize, in_end_safe: usize) -> usize {
    let mut q = q + REPEAT_MIN;
    let mut r = r + REPEAT_MIN;
    loop {
        let x = read8(src, q) ^ read8(src, r);
        if x != 0 {
            return r + (x.trailing_zeros() >> 3) as usize;
        }
        q += 8;
        r += 8;
        if r > in_end_safe {
            break;
        }
    }
    while r < src.len() && src[q] == src[r] {
        q += 1;
        r += 1;
    }
    r
}

/// Emit the literals followed by a back-reference and return the number of
/// bytes written. Empty `literals` yields a repeat-only tag.
fn emit_sequence(
    dst: &mut [u8],
    layout: TagLayout,
    offset: usize,
    literals: &[u8],
    repeat: usize,
) -> Result<usize> {
    debug_assert!(offset > 0 && repeat >= REPEAT_MIN);
    let (nr, nr_rest) = split_field(literals.len(), layout.nr_mask());
    let (r, r_rest) = split_field(repeat - REPEAT_MIN, layout.r_mask());

    let need = TAG_BYTES + escaped_len(nr_rest) + literals.len() + escaped_len(r_rest);
    if need > dst.len() {
        return Err(Error::Incompressible);
    }

    let mut i = write_tag(dst, layout.pack(offset, nr, r));
    if let Some(rest) = nr_rest {
        i += write_escape(&mut dst[i..], rest);
    }
    dst[i..i + literals.len()].copy_from_slice(literals);
    i += literals.len();
    if let Some(rest) = r_rest {
        i += write_escape(&mut dst[i..], rest);
    }
    Ok(i)
}

/// Emit the final literal run of a block under an end-of-block tag.
fn emit_tail(dst: &mut [u8], layout: TagLayout, literals: &[u8]) -> Result<usize> {
    let (nr, nr_rest) = split_field(literals.len(), layout.nr_mask());

    let bound = TAG_BYTES + literals.len() + nr_rest.map_or(0, size_bytes_count);
    if bound > dst.len() {
        return Err(Error::Incompressible);
    }

    let mut i = write_tag(dst, layout.pack(0, nr, 0));
    if let Some(rest) = nr_rest {
        i += write_escape(&mut dst[i..], rest);
    }
    dst[i..i + literals.len()].copy_from_slice(literals);
    Ok(i + literals.len())
}
