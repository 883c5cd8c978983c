// Copyright 2024 Karpeles Lab Inc.
// Based on the LZ4KD page compression format
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt;

/// Result type for LZ4KD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for LZ4KD compression/decompression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The block does not compress into the available space.
    ///
    /// This is a normal outcome: the caller stores the block uncompressed.
    Incompressible,

    /// Invalid arguments (empty or oversized buffers)
    InvalidInput(String),

    /// The input data is corrupt
    Corrupt,

    /// An escape sequence ran past the end of the input
    ReadError,
}

impl Error {
    /// Status code as returned across a C boundary: 0 for incompressible,
    /// -1 for general failure, -2 for a read past the input end.
    pub fn status(&self) -> i32 {
        match self {
            Error::Incompressible => 0,
            Error::InvalidInput(_) | Error::Corrupt => -1,
            Error::ReadError => -2,
        }
    }

    /// Returns true for the "store uncompressed" outcome
    pub fn is_incompressible(&self) -> bool {
        matches!(self, Error::Incompressible)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Incompressible => write!(f, "lz4kd: incompressible input"),
            Error::InvalidInput(msg) => write!(f, "lz4kd: invalid input: {}", msg),
            Error::Corrupt => write!(f, "lz4kd: corrupt input"),
            Error::ReadError => write!(f, "lz4kd: corrupt input, truncated escape sequence"),
        }
    }
}

impl std::error::Error for Error {}
