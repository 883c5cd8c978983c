// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Parallel page compression using Rayon

use rayon::prelude::*;

use crate::encode::Encoder;
use crate::error::Result;
use crate::page::Page;

/// Compress independent pages in parallel.
///
/// Every Rayon worker owns one `Encoder`, so no scratch state is shared.
/// Pages come back in input order; incompressible ones are stored raw.
///
/// # Example
///
/// ```ignore
/// use lz4kd::{compress_pages, decompress_pages};
///
/// let pages = vec![vec![0u8; 4096], b"hello".repeat(800)];
/// let stored = compress_pages(&pages).unwrap();
/// assert_eq!(decompress_pages(&stored).unwrap(), pages);
/// ```
pub fn compress_pages<P>(pages: &[P]) -> Result<Vec<Page>>
where
    P: AsRef<[u8]> + Sync,
{
    let stored: Vec<Page> = pages
        .par_iter()
        .map_init(Encoder::new, |encoder, page| {
            Page::compress(encoder, page.as_ref())
        })
        .collect::<Result<_>>()?;

    tracing::debug!(
        pages = stored.len(),
        compressed = stored.iter().filter(|p| p.is_compressed()).count(),
        stored_bytes = stored.iter().map(Page::stored_len).sum::<usize>(),
        "compressed page batch"
    );
    Ok(stored)
}

/// Decompress pages in parallel, in order.
pub fn decompress_pages(pages: &[Page]) -> Result<Vec<Vec<u8>>> {
    pages.par_iter().map(Page::decompress).collect()
}
