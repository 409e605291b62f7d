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

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use rayon::prelude::*;

use crate::bits::BitWriter;
use crate::coder::CoderKind;
use crate::common::thread_pool;
use crate::dict::Dictionary;
use crate::dict::DictionaryPolicy;
use crate::error::Error;
use crate::factor::BlockFactors;
use crate::factor::CoderConfig;
use crate::factor::FactorSelector;
use crate::factor::Factorizer;
use crate::factor::SelectorKind;
use crate::factor::StreamLayout;
use crate::index::DictionaryIndex;
use crate::index::IndexKind;
use crate::index::load_or_build;
use crate::store::BlockMap;
use crate::store::DICTIONARY_FILE;
use crate::store::RlzStore;
use crate::store::manifest::Manifest;

/// Default number of text bytes per block.
pub const DEFAULT_BLOCK_SIZE: usize = 2048;

// Blocks per unit of parallel work. Fixed so the output does not depend on the number
// of threads.
const SHARD_BLOCKS: usize = 256;

/// Builder for [`RlzStore`].
///
/// # Examples
///
/// ```
/// use rlzstore::coder::CoderKind;
/// use rlzstore::dict::UniformSampleBudget;
/// use rlzstore::factor::SelectorKind;
/// use rlzstore::store::RlzStore;
///
/// let text = b"the quick brown fox jumps over the lazy dog. ".repeat(100);
/// let store = RlzStore::builder()
///     .block_size(256)
///     .selector(SelectorKind::Minimal)
///     .offsets(CoderKind::Deflate { level: 6 })
///     .build_with_policy(&text, &UniformSampleBudget::new(512, 64))
///     .unwrap();
///
/// store.verify(&text).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RlzStoreBuilder {
    block_size: usize,
    index: IndexKind,
    selector: SelectorKind,
    coders: CoderConfig,
    local_search: bool,
    threads: usize,
    rebuild: bool,
    preset: Option<Vec<u8>>,
}

impl Default for RlzStoreBuilder {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            index: IndexKind::default(),
            selector: SelectorKind::default(),
            coders: CoderConfig::default(),
            local_search: false,
            threads: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            rebuild: false,
            preset: None,
        }
    }
}

impl RlzStoreBuilder {
    /// Sets the number of text bytes per block.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is 0 or does not fit 32 bits.
    pub fn block_size(mut self, block_size: usize) -> Self {
        assert!(block_size > 0, "block_size must be at least 1");
        assert!(
            block_size <= u32::MAX as usize,
            "block_size must fit 32 bits, got {block_size}"
        );
        self.block_size = block_size;
        self
    }

    /// Sets the dictionary index implementation.
    pub fn index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }

    /// Sets how one offset is chosen among all dictionary occurrences of a factor.
    pub fn selector(mut self, selector: SelectorKind) -> Self {
        self.selector = selector;
        self
    }

    /// Replaces the whole codec configuration.
    pub fn coders(mut self, coders: CoderConfig) -> Self {
        self.coders = coders;
        self
    }

    /// Sets the codec of the factor lengths.
    pub fn lengths(mut self, kind: CoderKind) -> Self {
        self.coders.lengths = kind;
        self
    }

    /// Sets the codec of the factor offsets.
    pub fn offsets(mut self, kind: CoderKind) -> Self {
        self.coders.offsets = kind;
        self
    }

    /// Sets the codec of the literal bytes.
    pub fn literals(mut self, kind: CoderKind) -> Self {
        self.coders.literals = kind;
        self
    }

    pub fn layout(mut self, layout: StreamLayout) -> Self {
        self.coders.layout = layout;
        self
    }

    /// Sets the length up to which factors are stored as literal bytes.
    ///
    /// # Panics
    ///
    /// Panics if `literal_threshold` is 0.
    pub fn literal_threshold(mut self, literal_threshold: u32) -> Self {
        assert!(literal_threshold > 0, "literal_threshold must be at least 1");
        self.coders.literal_threshold = literal_threshold;
        self
    }

    /// Enables matching against earlier bytes of the same block.
    pub fn local_search(mut self, local_search: bool) -> Self {
        self.local_search = local_search;
        self
    }

    /// Sets the number of worker threads used for factorization.
    ///
    /// # Panics
    ///
    /// Panics if `threads` is 0.
    pub fn threads(mut self, threads: usize) -> Self {
        assert!(threads > 0, "threads must be at least 1");
        self.threads = threads;
        self
    }

    /// Ignores dictionaries and indexes found in the store directory.
    pub fn rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }

    /// Sets the preset dictionary of deflate codecs.
    pub fn preset_dictionary(mut self, preset: impl Into<Vec<u8>>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    /// Compresses `text` against `dictionary` in memory.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) for an
    /// invalid codec configuration or a dictionary too large for the block size.
    pub fn build(self, text: &[u8], dictionary: Dictionary) -> Result<RlzStore, Error> {
        self.validate(&dictionary)?;
        let index = self.index.build(&dictionary)?;
        self.encode(text, dictionary, index.as_ref())
    }

    /// Builds the dictionary with `policy`, then compresses `text` in memory.
    pub fn build_with_policy(
        self,
        text: &[u8],
        policy: &dyn DictionaryPolicy,
    ) -> Result<RlzStore, Error> {
        let dictionary = policy.build(text)?;
        self.build(text, dictionary)
    }

    /// Builds a store in `dir` and writes all its files.
    ///
    /// A dictionary and index already present in `dir` are reused unless
    /// [`rebuild`](Self::rebuild) is set; an index built for a different dictionary is
    /// replaced.
    pub fn build_in(
        self,
        dir: &Path,
        text: &[u8],
        policy: &dyn DictionaryPolicy,
    ) -> Result<RlzStore, Error> {
        fs::create_dir_all(dir).map_err(|e| {
            Error::io("failed to create store directory", e).with_context("path", dir.display())
        })?;

        let dict_path = dir.join(DICTIONARY_FILE);
        let dictionary = if !self.rebuild && dict_path.exists() {
            tracing::info!(path = %dict_path.display(), "reusing dictionary");
            Dictionary::load(&dict_path)?
        } else {
            let dictionary = policy.build(text)?;
            dictionary.store(&dict_path)?;
            dictionary
        };
        self.validate(&dictionary)?;

        let index = load_or_build(dir, &dictionary, self.index, self.rebuild)?;
        let store = self.encode(text, dictionary, index.as_ref())?;
        store.store(dir)?;
        Ok(store)
    }

    fn validate(&self, dictionary: &Dictionary) -> Result<(), Error> {
        self.coders.validate()?;
        // local factors address dictionary_len + position_in_block
        if dictionary.len() as u64 + self.block_size as u64 > u32::MAX as u64 {
            return Err(Error::config("dictionary and block size exceed 32 bit offsets")
                .with_context("dictionary_len", dictionary.len())
                .with_context("block_size", self.block_size));
        }
        Ok(())
    }

    fn encode(
        &self,
        text: &[u8],
        dictionary: Dictionary,
        index: &dyn DictionaryIndex,
    ) -> Result<RlzStore, Error> {
        let selector = self.selector.selector();
        let shards: Vec<&[u8]> = text.chunks(self.block_size * SHARD_BLOCKS).collect();
        let pool = thread_pool(self.threads)?;
        let encoded: Vec<(Vec<u8>, BlockMap)> = pool.install(|| {
            shards
                .par_iter()
                .map(|shard| self.encode_shard(shard, index, selector))
                .collect::<Result<_, _>>()
        })?;

        let mut factors = Vec::new();
        let mut block_map = BlockMap::with_capacity(text.len().div_ceil(self.block_size));
        for (bytes, shard_map) in &encoded {
            block_map.append_shifted(shard_map, factors.len() as u64 * 8);
            factors.extend_from_slice(bytes);
        }

        let manifest = Manifest {
            block_size: self.block_size,
            text_size: text.len() as u64,
            num_factors: block_map.num_factors(),
            dictionary_hash: dictionary.hash(),
            coders: self.coders,
            selector: self.selector,
            index: self.index,
            local_search: self.local_search,
            has_preset: self.preset.is_some(),
        };
        tracing::info!(
            text_bytes = text.len(),
            blocks = block_map.len(),
            factors = manifest.num_factors,
            encoded_bytes = factors.len(),
            shards = shards.len(),
            threads = self.threads,
            "factorized text"
        );
        RlzStore::from_parts(manifest, dictionary, block_map, factors, self.preset.clone())
    }

    // Factorizes and encodes one shard into a byte aligned stream.
    fn encode_shard(
        &self,
        shard: &[u8],
        index: &dyn DictionaryIndex,
        selector: &dyn FactorSelector,
    ) -> Result<(Vec<u8>, BlockMap), Error> {
        let threshold = self.coders.literal_threshold;
        let mut factorizer =
            Factorizer::new(index, selector, threshold, self.local_search, self.block_size);
        let mut coder = self.coders.build(self.preset.as_deref())?;
        let mut factors = BlockFactors::default();
        let mut out = BitWriter::new();
        let mut block_map = BlockMap::with_capacity(shard.len().div_ceil(self.block_size));
        for block in shard.chunks(self.block_size) {
            factorizer.factorize_into(block, &mut factors);
            let offset = out.len_bits();
            coder.encode_block(&mut out, &factors)?;
            block_map.push(offset, factors.num_factors() as u32);
        }
        out.align8();
        Ok((out.into_bytes(), block_map))
    }
}
