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

/// Bytes hashed to find local match candidates.
const Q: usize = 4;
const HASH_BITS: u32 = 14;
const MAX_CHAIN: usize = 16;
const NONE: u32 = u32::MAX;

/// Dictionary factors shorter than this are checked against earlier text in the block.
pub(crate) const LOCAL_SEARCH_MAX_LEN: usize = 20;

/// Hash chains over the q-grams of the block parsed so far.
///
/// `head` maps a q-gram hash to the most recent position inserted with it and `prev`
/// links each position to the previous one with the same hash. Both are allocated once
/// per worker; only `head` is cleared between blocks since stale `prev` entries are
/// unreachable.
#[derive(Debug, Clone)]
pub(crate) struct LocalSearch {
    head: Vec<u32>,
    prev: Vec<u32>,
}

impl LocalSearch {
    pub fn new(block_size: usize) -> Self {
        Self {
            head: vec![NONE; 1 << HASH_BITS],
            prev: vec![NONE; block_size],
        }
    }

    /// Empties the table for a new block of `block_len` bytes.
    pub fn clear(&mut self, block_len: usize) {
        self.head.fill(NONE);
        if self.prev.len() < block_len {
            self.prev.resize(block_len, NONE);
        }
    }

    /// Registers the q-gram starting at `pos`.
    pub fn insert(&mut self, block: &[u8], pos: usize) {
        if pos + Q > block.len() {
            return;
        }
        let h = hash(&block[pos..pos + Q]);
        self.prev[pos] = self.head[h];
        self.head[h] = pos as u32;
    }

    /// Longest match for the text at `start` among earlier positions of the block.
    /// Returns the match position and length; ties go to the earliest position.
    pub fn find(&self, block: &[u8], start: usize) -> Option<(usize, usize)> {
        if start + Q > block.len() {
            return None;
        }
        let mut best: Option<(usize, usize)> = None;
        let mut candidate = self.head[hash(&block[start..start + Q])];
        let mut steps = 0;
        while candidate != NONE && steps < MAX_CHAIN {
            let pos = candidate as usize;
            let len = block[start..]
                .iter()
                .enumerate()
                .take_while(|&(k, &b)| block[pos + k] == b)
                .count();
            if len >= Q && best.is_none_or(|(_, best_len)| len >= best_len) {
                best = Some((pos, len));
            }
            candidate = self.prev[pos];
            steps += 1;
        }
        best
    }
}

fn hash(qgram: &[u8]) -> usize {
    let v = u32::from_le_bytes([qgram[0], qgram[1], qgram[2], qgram[3]]);
    (v.wrapping_mul(2654435761) >> (32 - HASH_BITS)) as usize
}
