// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Integer codecs for factor sub-streams.
//!
//! Every codec encodes an array of `u32` values into a [`BitWriter`] and decodes exactly
//! the same number of values back from a [`BitReader`]. The caller always knows how many
//! values to decode, so no codec stores a count. Codecs are chosen at runtime through
//! [`CoderKind`]:
//!
//! | kind | layout |
//! |------|--------|
//! | [`FixedWidth`](CoderKind::FixedWidth) | 6 bit width, then every value in that many bits |
//! | [`AlignedU32`](CoderKind::AlignedU32) | byte aligned little-endian 32 bit words |
//! | [`VByte`](CoderKind::VByte) | 7 bits per byte plus a continuation bit |
//! | [`EliasGamma`](CoderKind::EliasGamma) / [`EliasDelta`](CoderKind::EliasDelta) | universal codes of `value + 1` |
//! | [`Deflate`](CoderKind::Deflate), [`Lzma`](CoderKind::Lzma), [`Lz4`](CoderKind::Lz4), [`Bzip2`](CoderKind::Bzip2) | byte aligned 32 bit length prefix, then the compressed payload |
//!
//! The general-purpose compressors see values as little-endian 32 bit words and byte
//! arrays as they are. Each call produces an independent, length-prefixed payload so a
//! block can be decoded without touching its neighbours.

mod bit;
mod general;

pub use self::bit::AlignedU32Coder;
pub use self::bit::EliasDeltaCoder;
pub use self::bit::EliasGammaCoder;
pub use self::bit::FixedWidthCoder;
pub use self::bit::VByteCoder;
pub use self::general::Bzip2Coder;
pub use self::general::DeflateCoder;
pub use self::general::Lz4Coder;
pub use self::general::LzmaCoder;

use std::fmt;

use crate::bits::BitReader;
use crate::bits::BitWriter;
use crate::error::Error;

/// Encodes and decodes arrays of unsigned integers.
///
/// Codecs may keep internal state between calls; [`reset`](Self::reset) returns them to
/// their initial state. An instance must not be shared between threads that encode or
/// decode concurrently, each worker owns its own.
pub trait ByteCodec: Send {
    fn kind(&self) -> CoderKind;

    /// Appends the encoding of `values` to `out`.
    fn encode(&mut self, out: &mut BitWriter, values: &[u32]) -> Result<(), Error>;

    /// Decodes `values.len()` values from `input`.
    fn decode(&mut self, input: &mut BitReader<'_>, values: &mut [u32]) -> Result<(), Error>;

    /// Appends the encoding of a byte array.
    fn encode_bytes(&mut self, out: &mut BitWriter, bytes: &[u8]) -> Result<(), Error> {
        let values: Vec<u32> = bytes.iter().map(|&b| b as u32).collect();
        self.encode(out, &values)
    }

    /// Decodes `bytes.len()` bytes from `input`.
    fn decode_bytes(&mut self, input: &mut BitReader<'_>, bytes: &mut [u8]) -> Result<(), Error> {
        let mut values = vec![0u32; bytes.len()];
        self.decode(input, &mut values)?;
        for (b, v) in bytes.iter_mut().zip(values) {
            *b = u8::try_from(v)
                .map_err(|_| Error::codec(format!("decoded byte out of range: {v}")))?;
        }
        Ok(())
    }

    /// Drops any state carried over from previous calls.
    fn reset(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Identifies a [`ByteCodec`] and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoderKind {
    FixedWidth,
    AlignedU32,
    VByte,
    EliasGamma,
    EliasDelta,
    /// Raw deflate, level 0 to 9.
    Deflate { level: u8 },
    /// xz container around LZMA2, preset 0 to 9.
    Lzma { level: u8 },
    /// LZ4 block format.
    Lz4,
    /// bzip2, block size 1 to 9.
    Bzip2 { level: u8 },
}

impl CoderKind {
    pub(crate) fn id(self) -> u8 {
        match self {
            CoderKind::FixedWidth => 1,
            CoderKind::AlignedU32 => 2,
            CoderKind::VByte => 3,
            CoderKind::EliasGamma => 4,
            CoderKind::EliasDelta => 5,
            CoderKind::Deflate { .. } => 6,
            CoderKind::Lzma { .. } => 7,
            CoderKind::Lz4 => 8,
            CoderKind::Bzip2 { .. } => 9,
        }
    }

    pub(crate) fn level(self) -> u8 {
        match self {
            CoderKind::Deflate { level }
            | CoderKind::Lzma { level }
            | CoderKind::Bzip2 { level } => level,
            _ => 0,
        }
    }

    pub(crate) fn from_parts(id: u8, level: u8) -> Result<Self, Error> {
        let kind = match id {
            1 => CoderKind::FixedWidth,
            2 => CoderKind::AlignedU32,
            3 => CoderKind::VByte,
            4 => CoderKind::EliasGamma,
            5 => CoderKind::EliasDelta,
            6 => CoderKind::Deflate { level },
            7 => CoderKind::Lzma { level },
            8 => CoderKind::Lz4,
            9 => CoderKind::Bzip2 { level },
            _ => return Err(Error::deserial(format!("unknown coder id: {id}"))),
        };
        kind.validate()?;
        Ok(kind)
    }

    /// Returns true for the general-purpose compressors.
    pub fn is_general_purpose(self) -> bool {
        matches!(
            self,
            CoderKind::Deflate { .. } | CoderKind::Lzma { .. } | CoderKind::Lz4 | CoderKind::Bzip2 { .. }
        )
    }

    /// Checks the compression level.
    pub fn validate(self) -> Result<(), Error> {
        let (valid, level) = match self {
            CoderKind::Deflate { level } | CoderKind::Lzma { level } => (level <= 9, level),
            CoderKind::Bzip2 { level } => ((1..=9).contains(&level), level),
            _ => (true, 0),
        };
        if valid {
            Ok(())
        } else {
            Err(Error::config(format!("invalid level for {self}: {level}")))
        }
    }

    /// Creates a codec instance. `preset` primes codecs that support a preset dictionary
    /// (deflate) and is ignored by the others.
    pub fn build(self, preset: Option<&[u8]>) -> Result<Box<dyn ByteCodec>, Error> {
        self.validate()?;
        Ok(match self {
            CoderKind::FixedWidth => Box::new(FixedWidthCoder),
            CoderKind::AlignedU32 => Box::new(AlignedU32Coder),
            CoderKind::VByte => Box::new(VByteCoder),
            CoderKind::EliasGamma => Box::new(EliasGammaCoder),
            CoderKind::EliasDelta => Box::new(EliasDeltaCoder),
            CoderKind::Deflate { level } => Box::new(DeflateCoder::new(level, preset)?),
            CoderKind::Lzma { level } => Box::new(LzmaCoder::new(level)),
            CoderKind::Lz4 => Box::new(Lz4Coder),
            CoderKind::Bzip2 { level } => Box::new(Bzip2Coder::new(level)),
        })
    }
}

impl fmt::Display for CoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoderKind::FixedWidth => write!(f, "fixed"),
            CoderKind::AlignedU32 => write!(f, "u32"),
            CoderKind::VByte => write!(f, "vbyte"),
            CoderKind::EliasGamma => write!(f, "gamma"),
            CoderKind::EliasDelta => write!(f, "delta"),
            CoderKind::Deflate { level } => write!(f, "deflate-{level}"),
            CoderKind::Lzma { level } => write!(f, "lzma-{level}"),
            CoderKind::Lz4 => write!(f, "lz4"),
            CoderKind::Bzip2 { level } => write!(f, "bzip2-{level}"),
        }
    }
}
