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

//! Block-encoded RLZ store.
//!
//! The text is cut into blocks of a fixed size, every block is factorized against the
//! dictionary on its own and its factors are appended to one bit stream. The
//! [`BlockMap`] records where each block starts and how many factors it holds, so any
//! block decodes in time proportional to its size.
//!
//! # Usage
//!
//! ```
//! use rlzstore::dict::Dictionary;
//! use rlzstore::store::RlzStore;
//!
//! let text = b"abcabcabcabc";
//! let dict = Dictionary::from_content(b"abc".to_vec()).unwrap();
//! let store = RlzStore::builder().block_size(4).build(text, dict).unwrap();
//!
//! assert_eq!(store.size(), 12);
//! assert_eq!(store.block(1).unwrap(), b"bcab");
//! let bytes: Vec<u8> = store.bytes().unwrap().map(|b| b.unwrap()).collect();
//! assert_eq!(bytes, text);
//! ```
//!
//! A store directory holds these files:
//!
//! | file | contents |
//! |------|----------|
//! | `dict.bin` | dictionary bytes and the 0 sentinel |
//! | `index-<kind>-<hash>.bin` | dictionary index, keyed by the dictionary hash |
//! | `factors.bin` | encoded factor stream |
//! | `blockmap.bin` | block offsets and factor counts |
//! | `manifest.bin` | sizes and the codec configuration |
//! | `coder-preset.bin` | deflate preset dictionary, if configured |

mod block_map;
mod builder;
mod decoder;
mod manifest;
mod stats;

pub use self::block_map::BlockMap;
pub use self::builder::DEFAULT_BLOCK_SIZE;
pub use self::builder::RlzStoreBuilder;
pub use self::decoder::BlockDecoder;
pub use self::decoder::Bytes;
pub use self::decoder::Factors;
pub use self::stats::StoreStats;

use std::fs;
use std::path::Path;

use crate::bits::BitWriter;
use crate::dict::Dictionary;
use crate::error::Error;
use crate::factor::BlockFactors;
use crate::factor::CoderConfig;
use crate::factor::SelectorKind;
use crate::index::IndexKind;
use crate::store::manifest::Manifest;

const DICTIONARY_FILE: &str = "dict.bin";
const FACTORS_FILE: &str = "factors.bin";
const BLOCK_MAP_FILE: &str = "blockmap.bin";
const MANIFEST_FILE: &str = "manifest.bin";
const PRESET_FILE: &str = "coder-preset.bin";

/// A text compressed against a dictionary, decodable block by block.
///
/// The store is immutable and `Sync`; concurrent readers each use their own
/// [`BlockDecoder`].
#[derive(Debug, Clone)]
pub struct RlzStore {
    manifest: Manifest,
    dictionary: Dictionary,
    block_map: BlockMap,
    factors: Vec<u8>,
    preset: Option<Vec<u8>>,
}

impl RlzStore {
    /// Returns a builder with the default configuration.
    pub fn builder() -> RlzStoreBuilder {
        RlzStoreBuilder::default()
    }

    /// Assembles a store and checks that its parts agree with each other.
    pub(crate) fn from_parts(
        manifest: Manifest,
        dictionary: Dictionary,
        block_map: BlockMap,
        factors: Vec<u8>,
        preset: Option<Vec<u8>>,
    ) -> Result<Self, Error> {
        if dictionary.hash() != manifest.dictionary_hash {
            return Err(Error::config("dictionary does not belong to this store")
                .with_context("expected", format!("{:016x}", manifest.dictionary_hash))
                .with_context("actual", format!("{:016x}", dictionary.hash())));
        }
        if dictionary.len() as u64 + manifest.block_size as u64 > u32::MAX as u64 {
            return Err(Error::config("dictionary and block size exceed 32 bit offsets")
                .with_context("dictionary_len", dictionary.len())
                .with_context("block_size", manifest.block_size));
        }
        if manifest.has_preset != preset.is_some() {
            return Err(Error::config("coder preset dictionary missing or unexpected"));
        }
        if block_map.len() != manifest.num_blocks() {
            return Err(Error::deserial("block map does not match the text size")
                .with_context("expected", manifest.num_blocks())
                .with_context("actual", block_map.len()));
        }
        if block_map.num_factors() != manifest.num_factors {
            return Err(Error::deserial("block map does not match the factor count")
                .with_context("expected", manifest.num_factors)
                .with_context("actual", block_map.num_factors()));
        }
        let stream_bits = factors.len() as u64 * 8;
        if !block_map.is_empty() && block_map.block_offset(block_map.len() - 1) > stream_bits {
            return Err(Error::deserial("block map points past the end of the factor stream"));
        }
        // fails early on unusable codec settings
        manifest.coders.build(preset.as_deref())?;

        Ok(Self {
            manifest,
            dictionary,
            block_map,
            factors,
            preset,
        })
    }

    /// Length of the text in bytes.
    pub fn size(&self) -> u64 {
        self.manifest.text_size
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn num_blocks(&self) -> usize {
        self.block_map.len()
    }

    pub fn block_size(&self) -> usize {
        self.manifest.block_size
    }

    pub fn num_factors(&self) -> u64 {
        self.manifest.num_factors
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn block_map(&self) -> &BlockMap {
        &self.block_map
    }

    pub fn coder_config(&self) -> &CoderConfig {
        &self.manifest.coders
    }

    pub fn selector(&self) -> SelectorKind {
        self.manifest.selector
    }

    pub fn index_kind(&self) -> IndexKind {
        self.manifest.index
    }

    pub fn local_search(&self) -> bool {
        self.manifest.local_search
    }

    /// Encoded factor stream.
    pub fn encoded(&self) -> &[u8] {
        &self.factors
    }

    /// Returns a decoder owning its own codec instances and scratch buffers.
    pub fn decoder(&self) -> Result<BlockDecoder<'_>, Error> {
        BlockDecoder::new(self)
    }

    /// Decodes block `i`.
    ///
    /// Use a [`BlockDecoder`] to decode many blocks without re-creating codecs.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not smaller than [`num_blocks`](Self::num_blocks).
    pub fn block(&self, i: usize) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.block_size());
        self.decoder()?.decode_block(i, &mut out)?;
        Ok(out)
    }

    /// Forward iterator over the text bytes.
    pub fn bytes(&self) -> Result<Bytes<'_>, Error> {
        Bytes::new(self)
    }

    /// Forward iterator over all factors in text order.
    pub fn factors(&self) -> Result<Factors<'_>, Error> {
        Factors::new(self)
    }

    /// Decodes every block and compares it with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Inconsistent`](crate::error::ErrorKind::Inconsistent) naming
    /// the first block that differs.
    pub fn verify(&self, text: &[u8]) -> Result<(), Error> {
        if text.len() as u64 != self.size() {
            return Err(Error::inconsistent("text size differs from the store")
                .with_context("expected", self.size())
                .with_context("actual", text.len()));
        }
        let mut decoder = self.decoder()?;
        let mut block = Vec::with_capacity(self.block_size());
        for (i, expected) in text.chunks(self.block_size()).enumerate() {
            decoder.decode_block(i, &mut block)?;
            if block != expected {
                let position = block
                    .iter()
                    .zip(expected)
                    .position(|(a, b)| a != b)
                    .unwrap_or(block.len().min(expected.len()));
                return Err(Error::inconsistent("decoded text differs from the source")
                    .with_context("block", i)
                    .with_context("offset", i * self.block_size() + position));
            }
        }
        Ok(())
    }

    /// Number of dictionary factors covering each dictionary byte.
    pub fn dictionary_usage(&self) -> Result<Vec<u64>, Error> {
        let n = self.dictionary.len();
        let threshold = self.manifest.coders.literal_threshold;
        let mut starts = vec![0u64; n + 1];
        let mut ends = vec![0u64; n + 1];
        let mut decoder = self.decoder()?;
        for i in 0..self.num_blocks() {
            let factors = decoder.decode_factors(i)?;
            let mut offsets = factors.offsets.iter();
            for &len in factors.lengths.iter().filter(|&&len| len > threshold) {
                let Some(&offset) = offsets.next() else {
                    break;
                };
                let offset = offset as usize;
                if offset < n {
                    starts[offset] += 1;
                    ends[(offset + len as usize).min(n)] += 1;
                }
            }
        }

        let mut usage = Vec::with_capacity(n);
        let mut active = 0u64;
        for i in 0..n {
            active = active + starts[i] - ends[i];
            usage.push(active);
        }
        Ok(usage)
    }

    /// Collects factor and size statistics by decoding all blocks.
    pub fn stats(&self) -> Result<StoreStats, Error> {
        let threshold = self.manifest.coders.literal_threshold;
        let dictionary_len = self.dictionary.len();
        let mut stats = StoreStats {
            text_size: self.size(),
            num_blocks: self.num_blocks(),
            num_factors: self.num_factors(),
            dictionary_len,
            encoded_bytes: self.factors.len(),
            block_map_bytes: self.block_map.serialize().len(),
            ..StoreStats::default()
        };

        let mut decoder = self.decoder()?;
        for i in 0..self.num_blocks() {
            let factors = decoder.decode_factors(i)?;
            stats.dictionary_factors += factors
                .offsets
                .iter()
                .filter(|&&offset| (offset as usize) < dictionary_len)
                .count() as u64;
            stats.local_factors += factors
                .offsets
                .iter()
                .filter(|&&offset| (offset as usize) >= dictionary_len)
                .count() as u64;
            for &len in factors.lengths.iter().filter(|&&len| len <= threshold) {
                stats.literal_factors += 1;
                stats.literal_bytes += len as u64;
            }
        }
        Ok(stats)
    }

    /// Encodes the factors of this store with a different codec configuration, without
    /// parsing the text again.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if
    /// `coders` lowers the literal threshold: factors that are literal now have no
    /// dictionary offset to fall back on.
    pub fn reencode(&self, coders: CoderConfig) -> Result<RlzStore, Error> {
        coders.validate()?;
        let old_threshold = self.manifest.coders.literal_threshold;
        let new_threshold = coders.literal_threshold;
        if new_threshold < old_threshold {
            return Err(Error::config("cannot lower the literal threshold when re-encoding")
                .with_context("current", old_threshold)
                .with_context("requested", new_threshold));
        }

        let mut decoder = self.decoder()?;
        let mut coder = coders.build(self.preset.as_deref())?;
        let mut text = Vec::with_capacity(self.block_size());
        let mut reparsed = BlockFactors::default();
        let mut out = BitWriter::new();
        let mut block_map = BlockMap::with_capacity(self.num_blocks());
        for i in 0..self.num_blocks() {
            decoder.decode_block(i, &mut text)?;
            let factors = decoder.factors();
            reparsed.clear();
            let mut offsets = factors.offsets.iter();
            let mut pos = 0;
            for &len in &factors.lengths {
                let offset = if len > old_threshold {
                    offsets.next().copied().unwrap_or_default()
                } else {
                    0
                };
                let end = pos + len as usize;
                reparsed.add_factor(new_threshold, &text[pos..end], offset);
                pos = end;
            }
            let offset = out.len_bits();
            coder.encode_block(&mut out, &reparsed)?;
            block_map.push(offset, reparsed.num_factors() as u32);
        }
        out.align8();

        let manifest = Manifest {
            coders,
            ..self.manifest.clone()
        };
        tracing::info!(
            from = self.factors.len(),
            to = out.as_bytes().len(),
            "re-encoded factor stream"
        );
        Self::from_parts(
            manifest,
            self.dictionary.clone(),
            block_map,
            out.into_bytes(),
            self.preset.clone(),
        )
    }

    /// Writes the store into `dir`, creating it if needed. The dictionary index is
    /// written when the store is built, see [`RlzStoreBuilder::build_in`].
    pub fn store(&self, dir: &Path) -> Result<(), Error> {
        fs::create_dir_all(dir).map_err(|e| {
            Error::io("failed to create store directory", e).with_context("path", dir.display())
        })?;
        self.dictionary.store(&dir.join(DICTIONARY_FILE))?;
        write_file(&dir.join(FACTORS_FILE), &self.factors)?;
        write_file(&dir.join(BLOCK_MAP_FILE), &self.block_map.serialize())?;
        if let Some(preset) = &self.preset {
            write_file(&dir.join(PRESET_FILE), preset)?;
        }
        // written last, a directory without a manifest is not a store
        write_file(&dir.join(MANIFEST_FILE), &self.manifest.serialize())
    }

    /// Loads a store written by [`store`](Self::store).
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let manifest = Manifest::deserialize(&read_file(&dir.join(MANIFEST_FILE))?)?;
        let dictionary = Dictionary::load(&dir.join(DICTIONARY_FILE))?;
        let block_map = BlockMap::deserialize(&read_file(&dir.join(BLOCK_MAP_FILE))?)?;
        let factors = read_file(&dir.join(FACTORS_FILE))?;
        let preset = if manifest.has_preset {
            Some(read_file(&dir.join(PRESET_FILE))?)
        } else {
            None
        };
        let store = Self::from_parts(manifest, dictionary, block_map, factors, preset)?;
        tracing::debug!(
            size = store.size(),
            blocks = store.num_blocks(),
            factors = store.num_factors(),
            "loaded store"
        );
        Ok(store)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path)
        .map_err(|e| Error::io("failed to read store file", e).with_context("path", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    fs::write(path, bytes).map_err(|e| {
        Error::io("failed to write store file", e).with_context("path", path.display())
    })
}
