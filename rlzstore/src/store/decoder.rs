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
use crate::error::Error;
use crate::factor::BlockFactors;
use crate::factor::Factor;
use crate::factor::FactorCoder;
use crate::store::RlzStore;

/// Decodes blocks of a store.
///
/// Owns scratch buffers and its own codec instances, so one decoder per thread can read
/// a shared store concurrently.
pub struct BlockDecoder<'a> {
    store: &'a RlzStore,
    coder: FactorCoder,
    factors: BlockFactors,
}

impl<'a> BlockDecoder<'a> {
    pub(crate) fn new(store: &'a RlzStore) -> Result<Self, Error> {
        let coder = store.manifest.coders.build(store.preset.as_deref())?;
        Ok(Self {
            store,
            coder,
            factors: BlockFactors::default(),
        })
    }

    /// Decodes block `i` into `out`, which is cleared first.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not smaller than the number of blocks.
    pub fn decode_block(&mut self, i: usize, out: &mut Vec<u8>) -> Result<(), Error> {
        self.decode_factors(i)?;
        let manifest = &self.store.manifest;
        self.factors
            .reconstruct(
                manifest.coders.literal_threshold,
                self.store.dictionary.content(),
                out,
            )
            .map_err(|e| e.with_context("block", i))?;
        if out.len() != manifest.block_len(i) {
            return Err(Error::inconsistent("decoded block has the wrong size")
                .with_context("block", i)
                .with_context("expected", manifest.block_len(i))
                .with_context("actual", out.len()));
        }
        tracing::trace!(block = i, factors = self.factors.num_factors(), "decoded block");
        Ok(())
    }

    /// Decodes the factors of block `i` into `out`, which is cleared first.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not smaller than the number of blocks.
    pub fn block_factors(&mut self, i: usize, out: &mut Vec<Factor>) -> Result<(), Error> {
        self.decode_factors(i)?;
        self.factors.to_factors(
            self.store.manifest.coders.literal_threshold,
            self.store.dictionary.len(),
            out,
        );
        Ok(())
    }

    /// Decodes the stream form of block `i` without reconstructing its text.
    pub(crate) fn decode_factors(&mut self, i: usize) -> Result<&BlockFactors, Error> {
        let store = self.store;
        assert!(
            i < store.num_blocks(),
            "block index out of range: {i} >= {}",
            store.num_blocks()
        );
        let mut reader = BitReader::new(&store.factors);
        reader.seek(store.block_map.block_offset(i))?;
        self.coder
            .decode_block(
                &mut reader,
                store.block_map.block_factors(i) as usize,
                store.manifest.block_len(i),
                &mut self.factors,
            )
            .map_err(|e| e.with_context("block", i))?;
        Ok(&self.factors)
    }

    /// Factors of the block decoded last.
    pub(crate) fn factors(&self) -> &BlockFactors {
        &self.factors
    }
}

/// Forward iterator over the bytes of a store, see [`RlzStore::bytes`].
///
/// Decodes one block at a time. After an error the iterator is exhausted.
pub struct Bytes<'a> {
    decoder: BlockDecoder<'a>,
    block: Vec<u8>,
    loaded: Option<usize>,
    pos: u64,
}

impl<'a> Bytes<'a> {
    pub(crate) fn new(store: &'a RlzStore) -> Result<Self, Error> {
        Ok(Self {
            decoder: BlockDecoder::new(store)?,
            block: Vec::with_capacity(store.block_size()),
            loaded: None,
            pos: 0,
        })
    }

    /// Position of the next byte returned.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Moves to byte `pos`; seeking to the end of the text is allowed.
    pub fn seek(&mut self, pos: u64) -> Result<(), Error> {
        let size = self.decoder.store.size();
        if pos > size {
            return Err(Error::config("cannot seek past the end of the text")
                .with_context("position", pos)
                .with_context("size", size));
        }
        self.pos = pos;
        Ok(())
    }
}

impl Iterator for Bytes<'_> {
    type Item = Result<u8, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let size = self.decoder.store.size();
        if self.pos >= size {
            return None;
        }
        let block_size = self.decoder.store.block_size() as u64;
        let i = (self.pos / block_size) as usize;
        if self.loaded != Some(i) {
            if let Err(err) = self.decoder.decode_block(i, &mut self.block) {
                self.loaded = None;
                self.pos = size;
                return Some(Err(err));
            }
            self.loaded = Some(i);
        }
        let b = self.block[(self.pos % block_size) as usize];
        self.pos += 1;
        Some(Ok(b))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.decoder.store.size() - self.pos;
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// Forward iterator over the factors of a store, block by block, see
/// [`RlzStore::factors`].
pub struct Factors<'a> {
    decoder: BlockDecoder<'a>,
    next_block: usize,
    pending: std::vec::IntoIter<Factor>,
    failed: bool,
}

impl<'a> Factors<'a> {
    pub(crate) fn new(store: &'a RlzStore) -> Result<Self, Error> {
        Ok(Self {
            decoder: BlockDecoder::new(store)?,
            next_block: 0,
            pending: Vec::new().into_iter(),
            failed: false,
        })
    }
}

impl Iterator for Factors<'_> {
    type Item = Result<Factor, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(factor) = self.pending.next() {
                return Some(Ok(factor));
            }
            if self.failed || self.next_block >= self.decoder.store.num_blocks() {
                return None;
            }
            let i = self.next_block;
            self.next_block += 1;
            let mut factors = Vec::new();
            if let Err(err) = self.decoder.block_factors(i, &mut factors) {
                self.failed = true;
                return Some(Err(err));
            }
            self.pending = factors.into_iter();
        }
    }
}
