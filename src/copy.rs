// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Bounds-checked copy routines used by the decoder.
//!
//! The batched paths copy whole 16 byte chunks and may write past the end of
//! the run they expand, so they are only taken when the destination has
//! enough slack after it. Every chunk copy goes through `copy_within`, which
//! has memmove semantics; chunk sources are always bytes that are already
//! final, so the repeating pattern of an overlapping back-reference comes out
//! right.

use crate::constants::*;

/// Copy `total` literal bytes from `src[at..]` to `dst[out_at..]`.
/// Returns false when either side would overrun.
pub fn copy_literals(src: &[u8], at: usize, dst: &mut [u8], out_at: usize, total: usize) -> bool {
    let (in_end, out_end) = (src.len(), dst.len());
    let in_copy_end = at + total;
    let out_copy_end = out_at + total;

    if total <= NR_COPY_MIN {
        if at + NR_COPY_MIN <= in_end && out_at + NR_COPY_MIN <= out_end {
            dst[out_at..out_at + NR_COPY_MIN].copy_from_slice(&src[at..at + NR_COPY_MIN]);
            return true;
        }
    } else if in_copy_end + NR_COPY_MIN <= in_end && out_copy_end + NR_COPY_MIN <= out_end {
        let (mut d, mut s) = (out_at, at);
        while d < out_copy_end {
            dst[d..d + NR_COPY_MIN].copy_from_slice(&src[s..s + NR_COPY_MIN]);
            d += NR_COPY_MIN;
            s += NR_COPY_MIN;
        }
        return true;
    }

    if in_copy_end <= in_end && out_copy_end <= out_end {
        dst[out_at..out_copy_end].copy_from_slice(&src[at..in_copy_end]);
        true
    } else {
        false
    }
}

/// Expand a back-reference of `total` bytes at `out_at`, reading from
/// `offset` bytes earlier. The caller guarantees `1 <= offset <= out_at`.
/// Returns false when the run does not fit in `dst`.
pub fn copy_repeat(dst: &mut [u8], out_at: usize, offset: usize, total: usize) -> bool {
    debug_assert!(offset > 0 && offset <= out_at);
    let from = out_at - offset;
    let copy_end = out_at + total;
    let has_slack = copy_end + R_COPY_SAFE_2X <= dst.len();

    if offset >= R_COPY_MIN && has_slack {
        copy_2x_while_lt(dst, out_at, from, copy_end);
    } else if offset >= R_COPY_MIN >> 1 && has_slack {
        // The first chunk yields `offset` good bytes, after that the
        // distance to the source is 2*offset >= R_COPY_MIN.
        dst.copy_within(from..from + R_COPY_MIN, out_at);
        let (mut d, mut s) = (out_at + offset, from);
        while d < copy_end {
            dst.copy_within(s..s + R_COPY_MIN, d);
            d += R_COPY_MIN;
            s += R_COPY_MIN;
        }
    } else if offset > 1 && has_slack {
        copy_overlap(dst, out_at, from, offset, copy_end);
    } else {
        if copy_end > dst.len() {
            return false;
        }
        if offset == 1 {
            let byte = dst[from];
            dst[out_at..copy_end].fill(byte);
        } else {
            for i in out_at..copy_end {
                dst[i] = dst[i - offset];
            }
        }
    }
    true
}

/// Copy pairs of R_COPY_MIN chunks while the destination is below `end`.
#[inline]
fn copy_2x_while_lt(dst: &mut [u8], mut at: usize, mut from: usize, end: usize) {
    while at < end {
        dst.copy_within(from..from + R_COPY_MIN, at);
        dst.copy_within(from + R_COPY_MIN..from + 2 * R_COPY_MIN, at + R_COPY_MIN);
        at += 2 * R_COPY_MIN;
        from += 2 * R_COPY_MIN;
    }
}

/// Back-reference with 1 < offset < R_COPY_MIN/2: replicate the period with
/// 8 byte copies at a stride that doubles while it is small, until the
/// replicated span is a full chunk wide.
fn copy_overlap(dst: &mut [u8], mut at: usize, from: usize, mut offset: usize, end: usize) {
    const COPY_MIN: usize = R_COPY_MIN >> 1;
    const OFFSET_LIMIT: usize = COPY_MIN >> 1;

    dst.copy_within(from..from + COPY_MIN, at);
    at += offset;
    if offset <= OFFSET_LIMIT {
        offset <<= 1;
    }
    loop {
        dst.copy_within(from..from + COPY_MIN, at);
        at += offset;
        if offset <= OFFSET_LIMIT {
            offset <<= 1;
        }
        if at - from >= R_COPY_MIN {
            break;
        }
    }
    copy_2x_while_lt(dst, at, from, end);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_repeat(prefix: &[u8], offset: usize, total: usize) -> Vec<u8> {
        let mut want = prefix.to_vec();
        for _ in 0..total {
            want.push(want[want.len() - offset]);
        }
        want
    }

    #[test]
    fn test_copy_repeat_all_small_offsets() {
        let prefix: Vec<u8> = (0..40u8).map(|i| i.wrapping_mul(37) ^ 0x5a).collect();

        for offset in 1..=40 {
            for total in 4..=100 {
                for slack in [0, 7, 31, 64] {
                    let mut dst = vec![0xeeu8; prefix.len() + total + slack];
                    dst[..prefix.len()].copy_from_slice(&prefix);
                    assert!(copy_repeat(&mut dst, prefix.len(), offset, total));

                    let want = naive_repeat(&prefix, offset, total);
                    assert_eq!(
                        &dst[..want.len()],
                        &want[..],
                        "offset={}, total={}, slack={}",
                        offset,
                        total,
                        slack
                    );
                }
            }
        }
    }

    #[test]
    fn test_copy_repeat_overrun() {
        let mut dst = vec![7u8; 20];
        assert!(!copy_repeat(&mut dst, 10, 3, 11));
        assert!(copy_repeat(&mut dst, 10, 3, 10));
        assert!(!copy_repeat(&mut dst, 10, 1, 11));
    }

    #[test]
    fn test_copy_literals_paths() {
        let src: Vec<u8> = (0..100u8).collect();

        // Batched short copy
        let mut dst = vec![0u8; 64];
        assert!(copy_literals(&src, 3, &mut dst, 5, 7));
        assert_eq!(&dst[5..12], &src[3..10]);

        // Batched long copy
        let mut dst = vec![0u8; 64];
        assert!(copy_literals(&src, 0, &mut dst, 0, 40));
        assert_eq!(&dst[..40], &src[..40]);

        // Exact copy at the very end of both buffers
        let mut dst = vec![0u8; 30];
        assert!(copy_literals(&src, 80, &mut dst, 10, 20));
        assert_eq!(&dst[10..30], &src[80..100]);

        // Overruns
        let mut dst = vec![0u8; 30];
        assert!(!copy_literals(&src, 90, &mut dst, 0, 11));
        assert!(!copy_literals(&src, 0, &mut dst, 20, 11));
    }
}
