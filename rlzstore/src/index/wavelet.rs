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

const WORDS_PER_BLOCK: usize = 8;
const BITS_PER_BLOCK: usize = 64 * WORDS_PER_BLOCK;

/// Bit vector with constant-time rank support.
#[derive(Debug, Clone)]
pub(crate) struct RankBitVector {
    words: Vec<u64>,
    // ones before each 512 bit block
    block_ranks: Vec<u64>,
    len: usize,
}

impl RankBitVector {
    pub fn from_bits(bits: impl ExactSizeIterator<Item = bool>) -> Self {
        let len = bits.len();
        let mut words = vec![0u64; len.div_ceil(64)];
        for (i, bit) in bits.enumerate() {
            if bit {
                words[i / 64] |= 1 << (i % 64);
            }
        }
        let mut block_ranks = Vec::with_capacity(len / BITS_PER_BLOCK + 1);
        let mut ones = 0u64;
        for block in 0..=len / BITS_PER_BLOCK {
            block_ranks.push(ones);
            let end = ((block + 1) * WORDS_PER_BLOCK).min(words.len());
            let start = (block * WORDS_PER_BLOCK).min(end);
            ones += words[start..end]
                .iter()
                .map(|w| w.count_ones() as u64)
                .sum::<u64>();
        }
        Self {
            words,
            block_ranks,
            len,
        }
    }

    /// Number of set bits in `[0, i)`.
    pub fn rank1(&self, i: usize) -> usize {
        debug_assert!(i <= self.len);
        let block = i / BITS_PER_BLOCK;
        let mut rank = self.block_ranks[block] as usize;
        for w in block * WORDS_PER_BLOCK..i / 64 {
            rank += self.words[w].count_ones() as usize;
        }
        let rem = i % 64;
        if rem > 0 {
            rank += (self.words[i / 64] & ((1u64 << rem) - 1)).count_ones() as usize;
        }
        rank
    }

    /// Number of unset bits in `[0, i)`.
    pub fn rank0(&self, i: usize) -> usize {
        i - self.rank1(i)
    }
}

/// Wavelet matrix over bytes: `rank(c, i)` in eight bit vector rank queries.
#[derive(Debug, Clone)]
pub(crate) struct WaveletMatrix {
    levels: Vec<RankBitVector>,
    zeros: Vec<usize>,
}

impl WaveletMatrix {
    pub fn new(symbols: &[u8]) -> Self {
        let mut levels = Vec::with_capacity(8);
        let mut zeros = Vec::with_capacity(8);
        let mut cur = symbols.to_vec();
        let mut next = Vec::with_capacity(cur.len());
        for level in 0..8 {
            let shift = 7 - level;
            let bv = RankBitVector::from_bits(cur.iter().map(|&s| (s >> shift) & 1 == 1));
            zeros.push(bv.rank0(cur.len()));
            levels.push(bv);

            // stable partition: symbols with a 0 bit first
            next.clear();
            next.extend(cur.iter().filter(|&&s| (s >> shift) & 1 == 0));
            next.extend(cur.iter().filter(|&&s| (s >> shift) & 1 == 1));
            std::mem::swap(&mut cur, &mut next);
        }
        Self { levels, zeros }
    }

    /// Occurrences of `sym` in `[0, i)`.
    pub fn rank(&self, sym: u8, i: usize) -> usize {
        let mut lo = 0;
        let mut hi = i;
        for (level, bv) in self.levels.iter().enumerate() {
            if (sym >> (7 - level)) & 1 == 0 {
                lo = bv.rank0(lo);
                hi = bv.rank0(hi);
            } else {
                lo = self.zeros[level] + bv.rank1(lo);
                hi = self.zeros[level] + bv.rank1(hi);
            }
        }
        hi - lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::random::XorShift64;

    #[test]
    fn test_rank_matches_count() {
        let mut rng = XorShift64::seeded(11);
        let symbols: Vec<u8> = (0..3000).map(|_| (rng.next_u64() % 7) as u8 * 37).collect();
        let wm = WaveletMatrix::new(&symbols);
        for i in (0..=symbols.len()).step_by(97) {
            for sym in [0u8, 37, 74, 222, 1] {
                let expected = symbols[..i].iter().filter(|&&s| s == sym).count();
                assert_eq!(wm.rank(sym, i), expected, "sym {sym} at {i}");
            }
        }
    }

    #[test]
    fn test_bit_vector_rank() {
        let bv = RankBitVector::from_bits((0..1500).map(|i| i % 3 == 0));
        assert_eq!(bv.rank1(0), 0);
        assert_eq!(bv.rank1(1), 1);
        assert_eq!(bv.rank1(1500), 500);
        assert_eq!(bv.rank0(1024), 1024 - 342);
    }
}
