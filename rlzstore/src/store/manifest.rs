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

use crate::codec::ArtifactBytes;
use crate::codec::ArtifactSlice;
use crate::codec::Family;
use crate::codec::assert::ensure_fully_consumed;
use crate::codec::assert::ensure_preamble;
use crate::coder::CoderKind;
use crate::error::Error;
use crate::factor::CoderConfig;
use crate::factor::SelectorKind;
use crate::factor::StreamLayout;
use crate::index::IndexKind;

const FLAGS_LOCAL_SEARCH: u8 = 1 << 0;
const FLAGS_HAS_PRESET: u8 = 1 << 1;

/// Effective configuration and shape of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Manifest {
    pub block_size: usize,
    pub text_size: u64,
    pub num_factors: u64,
    pub dictionary_hash: u64,
    pub coders: CoderConfig,
    pub selector: SelectorKind,
    pub index: IndexKind,
    pub local_search: bool,
    pub has_preset: bool,
}

impl Manifest {
    pub fn num_blocks(&self) -> usize {
        self.text_size.div_ceil(self.block_size as u64) as usize
    }

    /// Length of block `i`; only the last block may be shorter than the block size.
    pub fn block_len(&self, i: usize) -> usize {
        let start = i as u64 * self.block_size as u64;
        (self.text_size - start).min(self.block_size as u64) as usize
    }

    pub fn serialize(&self) -> Vec<u8> {
        let family = Family::MANIFEST;
        let mut bytes = ArtifactBytes::with_capacity(48);
        bytes.write_u8(family.id);
        bytes.write_u8(family.serial_version);
        let mut flags = 0;
        if self.local_search {
            flags |= FLAGS_LOCAL_SEARCH;
        }
        if self.has_preset {
            flags |= FLAGS_HAS_PRESET;
        }
        bytes.write_u8(flags);
        bytes.write_u64_le(self.block_size as u64);
        bytes.write_u64_le(self.text_size);
        bytes.write_u64_le(self.num_factors);
        bytes.write_u64_le(self.dictionary_hash);
        for kind in [self.coders.lengths, self.coders.offsets, self.coders.literals] {
            bytes.write_u8(kind.id());
            bytes.write_u8(kind.level());
        }
        bytes.write_u8(self.coders.layout.id());
        bytes.write_u32_le(self.coders.literal_threshold);
        bytes.write_u8(self.selector.id());
        bytes.write_u8(self.index.id());
        bytes.into_bytes()
    }

    /// Reads a manifest and validates the configuration it carries.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::insufficient_data(tag)
        }

        let family = Family::MANIFEST;
        let mut cursor = ArtifactSlice::new(bytes);
        ensure_preamble(&mut cursor, &family)?;
        let flags = cursor.read_u8().map_err(make_error("flags"))?;
        let block_size = cursor.read_u64_le().map_err(make_error("block_size"))?;
        let text_size = cursor.read_u64_le().map_err(make_error("text_size"))?;
        let num_factors = cursor.read_u64_le().map_err(make_error("num_factors"))?;
        let dictionary_hash = cursor.read_u64_le().map_err(make_error("dictionary_hash"))?;
        let mut kinds = [CoderKind::VByte; 3];
        for kind in kinds.iter_mut() {
            let id = cursor.read_u8().map_err(make_error("coder_id"))?;
            let level = cursor.read_u8().map_err(make_error("coder_level"))?;
            *kind = CoderKind::from_parts(id, level)?;
        }
        let layout = StreamLayout::from_id(cursor.read_u8().map_err(make_error("layout"))?)?;
        let literal_threshold = cursor.read_u32_le().map_err(make_error("literal_threshold"))?;
        let selector = SelectorKind::from_id(cursor.read_u8().map_err(make_error("selector"))?)?;
        let index = IndexKind::from_id(cursor.read_u8().map_err(make_error("index"))?)?;
        ensure_fully_consumed(&cursor, &family)?;

        let block_size = usize::try_from(block_size)
            .ok()
            .filter(|&bs| bs > 0 && bs <= u32::MAX as usize)
            .ok_or_else(|| Error::config(format!("invalid block size: {block_size}")))?;
        let coders = CoderConfig {
            lengths: kinds[0],
            offsets: kinds[1],
            literals: kinds[2],
            layout,
            literal_threshold,
        };
        coders.validate()?;
        if num_factors > text_size {
            return Err(Error::deserial(format!(
                "{num_factors} factors cannot cover {text_size} bytes"
            )));
        }

        Ok(Self {
            block_size,
            text_size,
            num_factors,
            dictionary_hash,
            coders,
            selector,
            index,
            local_search: flags & FLAGS_LOCAL_SEARCH != 0,
            has_preset: flags & FLAGS_HAS_PRESET != 0,
        })
    }
}
