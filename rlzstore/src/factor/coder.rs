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

use crate::bits::BitReader;
use crate::bits::BitWriter;
use crate::coder::ByteCodec;
use crate::coder::CoderKind;
use crate::error::Error;
use crate::factor::BlockFactors;
use crate::factor::DEFAULT_LITERAL_THRESHOLD;

/// How offsets and literal bytes are laid out in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamLayout {
    /// Lengths, literal bytes and offsets in three sub-streams, each with its own codec.
    #[default]
    ThreeStream,
    /// Lengths, then offsets and literal bytes merged in factor order and written with
    /// the offset codec.
    TwoStream,
}

impl StreamLayout {
    pub(crate) fn id(self) -> u8 {
        match self {
            StreamLayout::ThreeStream => 1,
            StreamLayout::TwoStream => 2,
        }
    }

    pub(crate) fn from_id(id: u8) -> Result<Self, Error> {
        match id {
            1 => Ok(StreamLayout::ThreeStream),
            2 => Ok(StreamLayout::TwoStream),
            _ => Err(Error::deserial(format!("unknown stream layout: {id}"))),
        }
    }
}

/// Codec configuration of a factor stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoderConfig {
    /// Codec for `length - 1` of every factor.
    pub lengths: CoderKind,
    /// Codec for dictionary offsets, and for literal bytes in the two-stream layout.
    pub offsets: CoderKind,
    /// Codec for literal bytes in the three-stream layout.
    pub literals: CoderKind,
    pub layout: StreamLayout,
    /// Factors of at most this many bytes are stored as literals.
    pub literal_threshold: u32,
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            lengths: CoderKind::VByte,
            offsets: CoderKind::FixedWidth,
            literals: CoderKind::FixedWidth,
            layout: StreamLayout::ThreeStream,
            literal_threshold: DEFAULT_LITERAL_THRESHOLD,
        }
    }
}

impl CoderConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.literal_threshold == 0 {
            return Err(Error::config(
                "literal threshold must be at least 1 to represent unmatched bytes",
            ));
        }
        self.lengths.validate()?;
        self.offsets.validate()?;
        self.literals.validate()
    }

    /// Creates the codecs. `preset` primes codecs supporting a preset dictionary.
    pub fn build(&self, preset: Option<&[u8]>) -> Result<FactorCoder, Error> {
        self.validate()?;
        Ok(FactorCoder {
            config: *self,
            lengths: self.lengths.build(preset)?,
            offsets: self.offsets.build(preset)?,
            literals: self.literals.build(preset)?,
            scratch: Vec::new(),
        })
    }
}

/// Encodes and decodes the factors of one block.
///
/// Owns one codec instance per sub-stream; all of them are reset after every block, so
/// a block's encoding does not depend on the blocks before it.
pub struct FactorCoder {
    config: CoderConfig,
    lengths: Box<dyn ByteCodec>,
    offsets: Box<dyn ByteCodec>,
    literals: Box<dyn ByteCodec>,
    scratch: Vec<u32>,
}

impl FactorCoder {
    pub fn config(&self) -> &CoderConfig {
        &self.config
    }

    pub(crate) fn encode_block(
        &mut self,
        out: &mut BitWriter,
        factors: &BlockFactors,
    ) -> Result<(), Error> {
        let result = self.encode_streams(out, factors);
        self.reset()?;
        result
    }

    /// Decodes `num_factors` factors covering exactly `block_len` bytes.
    pub(crate) fn decode_block(
        &mut self,
        input: &mut BitReader<'_>,
        num_factors: usize,
        block_len: usize,
        factors: &mut BlockFactors,
    ) -> Result<(), Error> {
        let result = self.decode_streams(input, num_factors, block_len, factors);
        self.reset()?;
        result
    }

    fn encode_streams(&mut self, out: &mut BitWriter, factors: &BlockFactors) -> Result<(), Error> {
        self.scratch.clear();
        self.scratch.extend(factors.lengths.iter().map(|&len| len - 1));
        self.lengths.encode(out, &self.scratch)?;

        match self.config.layout {
            StreamLayout::ThreeStream => {
                self.literals.encode_bytes(out, &factors.literals)?;
                self.offsets.encode(out, &factors.offsets)
            }
            StreamLayout::TwoStream => {
                self.scratch.clear();
                let mut literals = factors.literals.iter();
                let mut offsets = factors.offsets.iter();
                for &len in &factors.lengths {
                    if len <= self.config.literal_threshold {
                        self.scratch
                            .extend(literals.by_ref().take(len as usize).map(|&b| b as u32));
                    } else if let Some(&offset) = offsets.next() {
                        self.scratch.push(offset);
                    }
                }
                self.offsets.encode(out, &self.scratch)
            }
        }
    }

    fn decode_streams(
        &mut self,
        input: &mut BitReader<'_>,
        num_factors: usize,
        block_len: usize,
        factors: &mut BlockFactors,
    ) -> Result<(), Error> {
        factors.clear();
        // every factor covers at least one byte
        if num_factors > block_len || (num_factors == 0 && block_len > 0) {
            return Err(Error::deserial("factor count does not fit the block size")
                .with_context("factors", num_factors)
                .with_context("block_len", block_len));
        }
        factors.lengths.resize(num_factors, 0);
        self.lengths.decode(input, &mut factors.lengths)?;

        let threshold = self.config.literal_threshold;
        let mut total = 0usize;
        let mut literal_bytes = 0usize;
        let mut num_offsets = 0usize;
        for len in factors.lengths.iter_mut() {
            *len = len
                .checked_add(1)
                .ok_or_else(|| Error::codec("factor length overflows u32"))?;
            total = total.saturating_add(*len as usize);
            if *len <= threshold {
                literal_bytes += *len as usize;
            } else {
                num_offsets += 1;
            }
        }
        if total != block_len {
            return Err(Error::inconsistent("factor lengths do not add up to the block size")
                .with_context("expected", block_len)
                .with_context("actual", total));
        }

        match self.config.layout {
            StreamLayout::ThreeStream => {
                factors.literals.resize(literal_bytes, 0);
                self.literals.decode_bytes(input, &mut factors.literals)?;
                factors.offsets.resize(num_offsets, 0);
                self.offsets.decode(input, &mut factors.offsets)
            }
            StreamLayout::TwoStream => {
                self.scratch.clear();
                self.scratch.resize(literal_bytes + num_offsets, 0);
                self.offsets.decode(input, &mut self.scratch)?;
                let mut merged = self.scratch.iter();
                for &len in &factors.lengths {
                    if len <= threshold {
                        for &v in merged.by_ref().take(len as usize) {
                            let b = u8::try_from(v).map_err(|_| {
                                Error::codec(format!("literal byte out of range: {v}"))
                            })?;
                            factors.literals.push(b);
                        }
                    } else if let Some(&offset) = merged.next() {
                        factors.offsets.push(offset);
                    }
                }
                Ok(())
            }
        }
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.lengths.reset()?;
        self.offsets.reset()?;
        self.literals.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlockFactors {
        let mut factors = BlockFactors::default();
        factors.add_factor(3, b"ab", 0);
        factors.add_factor(3, b"hello world", 17);
        factors.add_factor(3, b"\xff", 0);
        factors.add_factor(3, b"0123", 900_000);
        factors
    }

    #[test]
    fn test_layouts_roundtrip() {
        let factors = sample();
        let block_len = 2 + 11 + 1 + 4;
        for layout in [StreamLayout::ThreeStream, StreamLayout::TwoStream] {
            for kind in [CoderKind::VByte, CoderKind::Deflate { level: 1 }, CoderKind::EliasDelta] {
                let config = CoderConfig {
                    lengths: kind,
                    offsets: kind,
                    literals: kind,
                    layout,
                    literal_threshold: 3,
                };
                let mut coder = config.build(None).unwrap();
                let mut out = BitWriter::new();
                coder.encode_block(&mut out, &factors).unwrap();
                coder.encode_block(&mut out, &factors).unwrap();
                let bytes = out.into_bytes();

                let mut input = BitReader::new(&bytes);
                for _ in 0..2 {
                    let mut decoded = BlockFactors::default();
                    coder
                        .decode_block(&mut input, 4, block_len, &mut decoded)
                        .unwrap();
                    assert_eq!(decoded.lengths, factors.lengths);
                    assert_eq!(decoded.offsets, factors.offsets);
                    assert_eq!(decoded.literals, factors.literals);
                }
            }
        }
    }

    #[test]
    fn test_length_mismatch_is_inconsistent() {
        let mut coder = CoderConfig::default().build(None).unwrap();
        let mut out = BitWriter::new();
        coder.encode_block(&mut out, &sample()).unwrap();
        let bytes = out.into_bytes();
        let mut decoded = BlockFactors::default();
        let err = coder
            .decode_block(&mut BitReader::new(&bytes), 4, 17, &mut decoded)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Inconsistent);
    }

    #[test]
    fn test_factor_count_must_fit_block() {
        let mut coder = CoderConfig::default().build(None).unwrap();
        let mut out = BitWriter::new();
        coder.encode_block(&mut out, &sample()).unwrap();
        let bytes = out.into_bytes();
        let mut decoded = BlockFactors::default();
        for (num_factors, block_len) in [(usize::MAX, 18), (19, 18), (0, 18)] {
            let err = coder
                .decode_block(&mut BitReader::new(&bytes), num_factors, block_len, &mut decoded)
                .unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::MalformedData);
            assert!(err.message().contains("factor count"));
        }
        coder
            .decode_block(&mut BitReader::new(&bytes), 4, 18, &mut decoded)
            .unwrap();
        assert_eq!(decoded.lengths, sample().lengths);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = CoderConfig {
            literal_threshold: 0,
            ..CoderConfig::default()
        };
        assert!(config.build(None).is_err());
    }
}
