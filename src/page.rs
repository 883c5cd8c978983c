// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Stored form of one page: compressed when that saves space, raw otherwise.

use crate::constants::BLOCK_SIZE;
use crate::decode::decode_into;
use crate::encode::Encoder;
use crate::error::{Error, Result};

/// A page as a swap or zram backend would keep it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// Compressed block and the size of the page it came from
    Compressed { data: Vec<u8>, len: usize },
    /// The page itself, kept because it did not compress
    Raw(Vec<u8>),
}

impl Page {
    /// Compress `src`, falling back to a raw copy when it is incompressible.
    /// Uniform pages are kept in pattern form.
    pub fn compress(encoder: &mut Encoder, src: &[u8]) -> Result<Page> {
        match encoder.encode_pattern(src) {
            Ok(data) => Ok(Page::Compressed {
                data,
                len: src.len(),
            }),
            Err(Error::Incompressible) => Ok(Page::Raw(src.to_vec())),
            Err(e) => Err(e),
        }
    }

    /// Size of the original page
    pub fn len(&self) -> usize {
        match self {
            Page::Compressed { len, .. } => *len,
            Page::Raw(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes this page occupies in storage
    pub fn stored_len(&self) -> usize {
        match self {
            Page::Compressed { data, .. } => data.len(),
            Page::Raw(data) => data.len(),
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Page::Compressed { .. })
    }

    /// Restore the original page contents.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        match self {
            Page::Raw(data) => Ok(data.clone()),
            Page::Compressed { data, len } => {
                if *len > BLOCK_SIZE {
                    return Err(Error::Corrupt);
                }
                let mut out = vec![0u8; *len];
                let n = decode_into(data, &mut out)?;
                if n != *len {
                    return Err(Error::Corrupt);
                }
                Ok(out)
            }
        }
    }
}
