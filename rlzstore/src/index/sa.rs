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

/// Plain suffix array over the dictionary, narrowed by binary search.
///
/// All suffixes in a range share the first `depth` bytes, so extending by one symbol is
/// two binary searches on the byte at `depth`. Suffixes too short to have that byte sort
/// before every symbol.
#[derive(Debug, Clone)]
pub struct SaIndex {
    dictionary_hash: u64,
    text: Vec<u8>,
    sa: Vec<u32>,
    rmq: RangeMinimum,
}

impl SaIndex {
    pub fn build(dict: &Dictionary) -> Self {
        let sa = suffix_array(dict.content());
        Self::from_suffix_array(dict, sa)
    }

    pub(crate) fn from_suffix_array(dict: &Dictionary, sa: Vec<u32>) -> Self {
        debug_assert_eq!(sa.len(), dict.len());
        Self {
            dictionary_hash: dict.hash(),
            text: dict.content().to_vec(),
            rmq: RangeMinimum::new(sa.clone()),
            sa,
        }
    }

    fn symbol_at(&self, suffix: u32, depth: usize) -> Option<u8> {
        self.text.get(suffix as usize + depth).copied()
    }
}

impl DictionaryIndex for SaIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::SuffixArray
    }

    fn dictionary_hash(&self) -> u64 {
        self.dictionary_hash
    }

    fn dictionary_len(&self) -> usize {
        self.text.len()
    }

    fn full_range(&self) -> SaRange {
        SaRange {
            sp: 0,
            ep: self.text.len() - 1,
        }
    }

    fn extend(&self, range: SaRange, depth: usize, sym: u8) -> Option<SaRange> {
        let rows = &self.sa[range.sp..=range.ep];
        let lo = rows.partition_point(|&s| self.symbol_at(s, depth).is_none_or(|c| c < sym));
        let hi = rows.partition_point(|&s| self.symbol_at(s, depth).is_none_or(|c| c <= sym));
        (lo < hi).then(|| SaRange {
            sp: range.sp + lo,
            ep: range.sp + hi - 1,
        })
    }

    fn offset_at(&self, rank: usize, _len: usize) -> u32 {
        self.sa[rank]
    }

    fn find_minimum(&self, range: SaRange) -> usize {
        self.rmq.argmin(range.sp, range.ep)
    }

    fn serialize(&self) -> Vec<u8> {
        super::serialize_index(self.kind(), self.dictionary_hash, self.text.len(), &self.sa)
    }
}
