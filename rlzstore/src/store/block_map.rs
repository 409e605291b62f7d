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
use crate::codec::ArtifactBytes;
use crate::codec::ArtifactSlice;
use crate::codec::Family;
use crate::codec::assert::ensure_fully_consumed;
use crate::codec::assert::ensure_preamble;
use crate::common::bit_width;
use crate::error::Error;

/// Where each block starts in the factor stream and how many factors it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMap {
    offsets: Vec<u64>,
    counts: Vec<u32>,
}

impl BlockMap {
    pub(crate) fn with_capacity(num_blocks: usize) -> Self {
        Self {
            offsets: Vec::with_capacity(num_blocks),
            counts: Vec::with_capacity(num_blocks),
        }
    }

    /// Appends a block starting at bit `offset` of the factor stream.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is smaller than the previous block's offset.
    pub(crate) fn push(&mut self, offset: u64, num_factors: u32) {
        assert!(
            self.offsets.last().is_none_or(|&last| last <= offset),
            "block offsets must not decrease"
        );
        self.offsets.push(offset);
        self.counts.push(num_factors);
    }

    /// Appends all blocks of `other`, shifting their offsets by `bit_offset`.
    pub(crate) fn append_shifted(&mut self, other: &BlockMap, bit_offset: u64) {
        for (&offset, &count) in other.offsets.iter().zip(&other.counts) {
            self.push(offset + bit_offset, count);
        }
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Bit offset of block `i` in the factor stream.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn block_offset(&self, i: usize) -> u64 {
        self.offsets[i]
    }

    /// Number of factors in block `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn block_factors(&self, i: usize) -> u32 {
        self.counts[i]
    }

    /// Total number of factors over all blocks.
    pub fn num_factors(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Serializes both arrays bit-compacted to the width of their largest value.
    pub fn serialize(&self) -> Vec<u8> {
        let mut packed = BitWriter::new();
        pack(&mut packed, self.offsets.iter().copied());
        pack(&mut packed, self.counts.iter().map(|&c| c as u64));

        let family = Family::BLOCK_MAP;
        let mut bytes = ArtifactBytes::with_capacity(18 + packed.as_bytes().len());
        bytes.write_u8(family.id);
        bytes.write_u8(family.serial_version);
        bytes.write_u64_le(self.len() as u64);
        bytes.write_blob(packed.as_bytes());
        bytes.into_bytes()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::insufficient_data(tag)
        }

        let family = Family::BLOCK_MAP;
        let mut cursor = ArtifactSlice::new(bytes);
        ensure_preamble(&mut cursor, &family)?;
        let num_blocks = cursor.read_u64_le().map_err(make_error("num_blocks"))?;
        let packed = cursor.read_blob().map_err(make_error("packed"))?;
        ensure_fully_consumed(&cursor, &family)?;

        // non-empty blocks hold at least one factor, so counts take a bit each
        let num_blocks = usize::try_from(num_blocks)
            .ok()
            .filter(|&n| n <= packed.len().saturating_mul(8))
            .ok_or_else(|| Error::deserial(format!("invalid block count: {num_blocks}")))?;

        let mut reader = BitReader::new(&packed);
        let offsets = unpack(&mut reader, num_blocks)?;
        let counts = unpack(&mut reader, num_blocks)?
            .into_iter()
            .map(|c| {
                u32::try_from(c)
                    .map_err(|_| Error::deserial(format!("factor count out of range: {c}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::deserial("block offsets are not monotonic"));
        }
        Ok(Self { offsets, counts })
    }
}

fn pack(out: &mut BitWriter, values: impl Iterator<Item = u64> + Clone) {
    let width = bit_width(values.clone().max().unwrap_or(0));
    out.put_int(width as u64, 7);
    for v in values {
        out.put_int(v, width);
    }
}

fn unpack(input: &mut BitReader<'_>, n: usize) -> Result<Vec<u64>, Error> {
    let width = input.get_int(7)? as u32;
    if width > 64 {
        return Err(Error::deserial(format!("invalid bit width: {width}")));
    }
    (0..n).map(|_| input.get_int(width)).collect()
}
