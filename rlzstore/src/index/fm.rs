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

use crate::dict::Dictionary;
use crate::index::DictionaryIndex;
use crate::index::IndexKind;
use crate::index::SaRange;
use crate::index::rmq::RangeMinimum;
use crate::index::suffix_array::suffix_array;
use crate::index::wavelet::WaveletMatrix;

/// FM-index over the byte-reversed dictionary.
///
/// Backward search over the reversed content prepends symbols to a reversed pattern,
/// which is the same as appending them to the forward pattern. A factorizer reading the
/// text left to right therefore narrows its range with one rank query per level of the
/// wavelet matrix for each byte.
///
/// Row 0 of the suffix array is the empty suffix; its BWT symbol is stored as 0 and
/// excluded from rank counts through `primary`.
#[derive(Debug, Clone)]
pub struct FmIndex {
    dictionary_hash: u64,
    n: usize,
    // suffix array of the reversed content, n + 1 rows
    sa: Vec<u32>,
    bwt: WaveletMatrix,
    primary: usize,
    // counts[c]: number of rows whose suffix starts with a symbol smaller than c
    counts: Vec<usize>,
    rmq: RangeMinimum,
}

impl FmIndex {
    pub fn build(dict: &Dictionary) -> Self {
        let reversed: Vec<u8> = dict.content().iter().rev().copied().collect();
        let mut sa = Vec::with_capacity(reversed.len() + 1);
        sa.push(reversed.len() as u32);
        sa.extend(suffix_array(&reversed));
        Self::from_suffix_array(dict, sa)
    }

    /// Rebuilds the rank structures from a previously computed suffix array.
    pub(crate) fn from_suffix_array(dict: &Dictionary, sa: Vec<u32>) -> Self {
        let content = dict.content();
        let n = content.len();
        debug_assert_eq!(sa.len(), n + 1);

        // reversed[j] == content[n - 1 - j]
        let mut primary = 0;
        let bwt: Vec<u8> = sa
            .iter()
            .enumerate()
            .map(|(row, &s)| match s as usize {
                0 => {
                    primary = row;
                    0
                }
                s => content[n - s],
            })
            .collect();

        let mut counts = vec![0usize; 257];
        for &b in content {
            counts[b as usize + 1] += 1;
        }
        // the empty suffix precedes every symbol
        counts[0] = 1;
        for c in 1..257 {
            counts[c] += counts[c - 1];
        }

        // a smaller dictionary offset is a larger reversed suffix start
        let keys = sa.iter().map(|&s| (n - s as usize) as u32).collect();
        Self {
            dictionary_hash: dict.hash(),
            n,
            bwt: WaveletMatrix::new(&bwt),
            sa,
            primary,
            counts,
            rmq: RangeMinimum::new(keys),
        }
    }

    fn occ(&self, sym: u8, i: usize) -> usize {
        let rank = self.bwt.rank(sym, i);
        if sym == 0 && self.primary < i {
            rank - 1
        } else {
            rank
        }
    }
}

impl DictionaryIndex for FmIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Fm
    }

    fn dictionary_hash(&self) -> u64 {
        self.dictionary_hash
    }

    fn dictionary_len(&self) -> usize {
        self.n
    }

    fn full_range(&self) -> SaRange {
        SaRange { sp: 0, ep: self.n }
    }

    fn extend(&self, range: SaRange, _depth: usize, sym: u8) -> Option<SaRange> {
        let c = sym as usize;
        let base = self.counts[c];
        if self.counts[c + 1] == base {
            return None;
        }
        let sp = base + self.occ(sym, range.sp);
        let end = base + self.occ(sym, range.ep + 1);
        (sp < end).then(|| SaRange { sp, ep: end - 1 })
    }

    fn offset_at(&self, rank: usize, len: usize) -> u32 {
        (self.n - self.sa[rank] as usize - len) as u32
    }

    fn find_minimum(&self, range: SaRange) -> usize {
        self.rmq.argmin(range.sp, range.ep)
    }

    fn serialize(&self) -> Vec<u8> {
        super::serialize_index(self.kind(), self.dictionary_hash, self.n, &self.sa)
    }
}
