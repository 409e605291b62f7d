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

use crate::factor::BlockFactors;
use crate::factor::Factor;
use crate::factor::FactorSelector;
use crate::factor::local::LOCAL_SEARCH_MAX_LEN;
use crate::factor::local::LocalSearch;
use crate::index::DictionaryIndex;

/// Greedy longest-match parser of text blocks.
///
/// A factorizer owns its local search table, so each worker thread uses its own.
pub struct Factorizer<'a> {
    index: &'a dyn DictionaryIndex,
    selector: &'a dyn FactorSelector,
    literal_threshold: u32,
    local: Option<LocalSearch>,
}

impl<'a> Factorizer<'a> {
    /// Creates a factorizer sized for blocks of `block_size` bytes; longer blocks grow the
    /// local search table. With `local_search`
    /// set, short dictionary factors are replaced by longer matches earlier in the block.
    ///
    /// # Panics
    ///
    /// Panics if `literal_threshold` is 0.
    pub fn new(
        index: &'a dyn DictionaryIndex,
        selector: &'a dyn FactorSelector,
        literal_threshold: u32,
        local_search: bool,
        block_size: usize,
    ) -> Self {
        assert!(literal_threshold > 0, "literal threshold must be at least 1");
        Self {
            index,
            selector,
            literal_threshold,
            local: local_search.then(|| LocalSearch::new(block_size)),
        }
    }

    /// Factorizes `block` and returns its factors.
    pub fn factorize(&mut self, block: &[u8]) -> Vec<Factor> {
        let mut data = BlockFactors::default();
        self.factorize_into(block, &mut data);
        let mut factors = Vec::with_capacity(data.num_factors());
        data.to_factors(
            self.literal_threshold,
            self.index.dictionary_len(),
            &mut factors,
        );
        factors
    }

    /// Factorizes `block` into stream form. `out` is cleared first.
    pub(crate) fn factorize_into(&mut self, block: &[u8], out: &mut BlockFactors) {
        out.clear();
        if let Some(local) = &mut self.local {
            local.clear(block.len());
        }

        let dictionary_len = self.index.dictionary_len();
        let mut pos = 0;
        while pos < block.len() {
            let start = pos;
            let mut range = self.index.full_range();
            while pos < block.len() {
                match self.index.extend(range, pos - start, block[pos]) {
                    Some(next) => {
                        range = next;
                        pos += 1;
                    }
                    None => break,
                }
            }

            let mut len = pos - start;
            let mut offset = 0;
            if len == 0 {
                // unmatched symbol
                len = 1;
            } else {
                offset = self.selector.select(self.index, range, len);
            }

            if let Some(local) = &self.local {
                if len < LOCAL_SEARCH_MAX_LEN {
                    if let Some((position, local_len)) = local.find(block, start) {
                        if local_len > len {
                            len = local_len;
                            offset = (dictionary_len + position) as u32;
                        }
                    }
                }
            }

            pos = start + len;
            out.add_factor(self.literal_threshold, &block[start..pos], offset);
            if let Some(local) = &mut self.local {
                for p in start..pos {
                    local.insert(block, p);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Dictionary;
    use crate::factor::SelectorKind;
    use crate::index::IndexKind;

    #[test]
    fn test_block_scenario() {
        let dict = Dictionary::from_content(b"abc".to_vec()).unwrap();
        let index = IndexKind::Fm.build(&dict).unwrap();
        let mut factorizer =
            Factorizer::new(index.as_ref(), SelectorKind::First.selector(), 2, false, 4);
        assert_eq!(
            factorizer.factorize(b"abca"),
            vec![
                Factor::Dictionary { offset: 0, len: 3 },
                Factor::Literal(b"a".to_vec()),
            ]
        );
        assert_eq!(
            factorizer.factorize(b"bcab"),
            vec![
                Factor::Literal(b"bc".to_vec()),
                Factor::Literal(b"ab".to_vec()),
            ]
        );
    }

    #[test]
    fn test_unmatched_symbols_become_literals() {
        let dict = Dictionary::from_content(b"hello".to_vec()).unwrap();
        let index = IndexKind::SuffixArray.build(&dict).unwrap();
        let mut factorizer =
            Factorizer::new(index.as_ref(), SelectorKind::Minimal.selector(), 1, false, 16);
        let factors = factorizer.factorize(b"xhellx");
        assert_eq!(
            factors,
            vec![
                Factor::Literal(b"x".to_vec()),
                Factor::Dictionary { offset: 0, len: 4 },
                Factor::Literal(b"x".to_vec()),
            ]
        );
    }

    #[test]
    fn test_block_longer_than_configured_size() {
        let dict = Dictionary::from_content(b"qrs".to_vec()).unwrap();
        let index = IndexKind::Fm.build(&dict).unwrap();
        let block = b"0123456789#0123456789#0123456789";
        let mut local = Factorizer::new(index.as_ref(), SelectorKind::First.selector(), 3, true, 8);
        let factors = local.factorize(block);
        assert_eq!(factors.iter().map(Factor::len).sum::<usize>(), block.len());
        assert_eq!(factors[11], Factor::Local { position: 0, len: 21 });
        // the table stays usable for shorter blocks
        assert_eq!(local.factorize(b"qrsqrs").len(), 2);
    }

    #[test]
    fn test_local_search_prefers_longer_block_match() {
        let dict = Dictionary::from_content(b"qrs".to_vec()).unwrap();
        let index = IndexKind::Fm.build(&dict).unwrap();
        let block = b"0123456789#0123456789";
        let mut plain = Factorizer::new(index.as_ref(), SelectorKind::First.selector(), 3, false, 32);
        assert_eq!(plain.factorize(block).len(), block.len());

        let mut local = Factorizer::new(index.as_ref(), SelectorKind::First.selector(), 3, true, 32);
        let factors = local.factorize(block);
        assert_eq!(factors.len(), 12);
        assert_eq!(factors[11], Factor::Local { position: 0, len: 10 });
    }
}
