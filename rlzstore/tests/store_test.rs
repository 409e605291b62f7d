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

mod common;

use common::random_text;
use common::word_text;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use rlzstore::coder::CoderKind;
use rlzstore::dict::Dictionary;
use rlzstore::error::ErrorKind;
use rlzstore::factor::CoderConfig;
use rlzstore::factor::Factor;
use rlzstore::factor::SelectorKind;
use rlzstore::factor::StreamLayout;
use rlzstore::index::IndexKind;
use rlzstore::store::RlzStore;
use rlzstore::store::RlzStoreBuilder;

fn dictionary() -> Dictionary {
    Dictionary::from_content(word_text(8192, 1)).unwrap()
}

// Word text with a sprinkle of arbitrary bytes that the dictionary may not contain.
fn mixed_text(len: usize, seed: u64) -> Vec<u8> {
    let mut text = word_text(len, seed);
    let noise = random_text(len / 97 + 1, 255, seed ^ 0x5eed);
    for (i, &b) in noise.iter().enumerate() {
        if let Some(slot) = text.get_mut(i * 97) {
            *slot = b;
        }
    }
    text
}

fn assert_blocks_decode_in_isolation(store: &RlzStore, text: &[u8], step: usize) {
    let block_size = store.block_size();
    assert_eq!(store.num_blocks(), text.len().div_ceil(block_size));
    for i in (0..store.num_blocks()).step_by(step).chain(store.num_blocks().checked_sub(1)) {
        let start = i * block_size;
        let end = (start + block_size).min(text.len());
        assert_eq!(store.block(i).unwrap(), &text[start..end], "block {i}");
    }
}

fn check_roundtrip(block_size: usize, len: usize) {
    let text = mixed_text(len, len as u64 + 7);
    let store = RlzStore::builder()
        .block_size(block_size)
        .build(&text, dictionary())
        .unwrap();
    assert_eq!(store.size(), len as u64);
    store.verify(&text).unwrap();
    let step = (store.num_blocks() / 200).max(1);
    assert_blocks_decode_in_isolation(&store, &text, step);
}

#[test]
fn test_roundtrip_block_boundaries() {
    for block_size in [1, 37, 1024, 65536] {
        for len in [0, 1, block_size - 1, block_size, block_size + 1, 3 * block_size + 5] {
            check_roundtrip(block_size, len);
        }
    }
}

#[test]
fn test_roundtrip_large_text() {
    for block_size in [1024, 65536] {
        check_roundtrip(block_size, 10_000_000);
    }
}

#[test]
#[ignore] // ten million blocks; run with: cargo test --release -- --ignored
fn test_roundtrip_large_text_small_blocks() {
    for block_size in [1, 37] {
        check_roundtrip(block_size, 10_000_000);
    }
}

#[test]
fn test_abc_scenario() {
    let text = b"abcabcabcabc";
    let dict = Dictionary::from_content(b"abc".to_vec()).unwrap();
    let store = RlzStore::builder()
        .block_size(4)
        .literal_threshold(2)
        .build(text, dict.clone())
        .unwrap();
    assert_eq!(store.num_blocks(), 3);

    let mut decoder = store.decoder().unwrap();
    let mut factors = Vec::new();
    decoder.block_factors(0, &mut factors).unwrap();
    assert_eq!(
        factors,
        vec![
            Factor::Dictionary { offset: 0, len: 3 },
            Factor::Literal(b"a".to_vec()),
        ]
    );
    decoder.block_factors(2, &mut factors).unwrap();
    assert_eq!(
        factors,
        vec![
            Factor::Literal(b"c".to_vec()),
            Factor::Dictionary { offset: 0, len: 3 },
        ]
    );

    let bytes: Vec<u8> = store.bytes().unwrap().map(Result::unwrap).collect();
    assert_eq!(bytes, text);

    // with the default threshold every factor is short enough to be literal
    let store = RlzStore::builder().block_size(4).build(text, dict).unwrap();
    store.verify(text).unwrap();
    assert!(store.factors().unwrap().all(|f| f.unwrap().is_literal()));
}

#[test]
fn test_factor_lengths_cover_blocks() {
    let text = mixed_text(50_000, 5);
    for local_search in [false, true] {
        let store = RlzStore::builder()
            .block_size(1000)
            .local_search(local_search)
            .build(&text, dictionary())
            .unwrap();

        let mut decoder = store.decoder().unwrap();
        let mut factors = Vec::new();
        for (i, block) in text.chunks(1000).enumerate() {
            decoder.block_factors(i, &mut factors).unwrap();
            assert!(factors.iter().all(|f| !f.is_empty()));
            assert_eq!(factors.iter().map(Factor::len).sum::<usize>(), block.len());
        }

        let all: Vec<Factor> = store.factors().unwrap().map(Result::unwrap).collect();
        assert_eq!(all.len() as u64, store.num_factors());
        assert_eq!(all.iter().map(Factor::len).sum::<usize>(), text.len());
        for factor in &all {
            match *factor {
                Factor::Dictionary { offset, len } => {
                    assert!(offset as usize + len as usize <= store.dictionary().len());
                }
                Factor::Local { .. } => assert!(local_search),
                Factor::Literal(ref bytes) => assert!(bytes.len() <= 3),
            }
        }
    }
}

#[test]
fn test_configurations_roundtrip() {
    let text = mixed_text(120_000, 9);
    let coders = [
        (CoderKind::VByte, CoderKind::FixedWidth, CoderKind::FixedWidth),
        (CoderKind::EliasGamma, CoderKind::EliasDelta, CoderKind::AlignedU32),
        (CoderKind::Deflate { level: 6 }, CoderKind::Lzma { level: 1 }, CoderKind::Lz4),
        (CoderKind::Bzip2 { level: 1 }, CoderKind::Lz4, CoderKind::Deflate { level: 1 }),
    ];
    for (lengths, offsets, literals) in coders {
        for layout in [StreamLayout::ThreeStream, StreamLayout::TwoStream] {
            for selector in [SelectorKind::First, SelectorKind::Last, SelectorKind::Minimal] {
                for index in [IndexKind::Fm, IndexKind::SuffixArray] {
                    let store = RlzStore::builder()
                        .block_size(4096)
                        .lengths(lengths)
                        .offsets(offsets)
                        .literals(literals)
                        .layout(layout)
                        .selector(selector)
                        .index(index)
                        .local_search(selector == SelectorKind::Minimal)
                        .literal_threshold(4)
                        .threads(2)
                        .build(&text, dictionary())
                        .unwrap();
                    store.verify(&text).unwrap();
                    assert_eq!(store.coder_config().layout, layout);
                    assert_eq!(store.selector(), selector);
                    assert_eq!(store.index_kind(), index);
                }
            }
        }
    }
}

#[test]
fn test_indexes_and_minimal_selector_agree() {
    let text = mixed_text(30_000, 21);
    let build = |index: IndexKind| {
        RlzStore::builder()
            .block_size(512)
            .selector(SelectorKind::Minimal)
            .index(index)
            .build(&text, dictionary())
            .unwrap()
    };
    let fm = build(IndexKind::Fm);
    let sa = build(IndexKind::SuffixArray);
    assert_eq!(fm.encoded(), sa.encoded());
    assert_eq!(fm.block_map(), sa.block_map());
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[test]
fn test_text_bytes_below_dictionary_alphabet() {
    // dictionary of letters from 'd' up; the text also holds spaces, 'a' to 'c' and noise
    let content: Vec<u8> = word_text(3000, 3)
        .into_iter()
        .filter(|b| b.is_ascii_lowercase() && *b >= b'd')
        .collect();
    let dict = Dictionary::from_content(content.clone()).unwrap();
    let text = mixed_text(20_000, 17);
    let block_size = 256;

    for index in [IndexKind::Fm, IndexKind::SuffixArray] {
        for selector in [SelectorKind::First, SelectorKind::Last, SelectorKind::Minimal] {
            let store = RlzStore::builder()
                .block_size(block_size)
                .index(index)
                .selector(selector)
                .literal_threshold(1)
                .build(&text, dict.clone())
                .unwrap();
            store.verify(&text).unwrap();

            let mut decoder = store.decoder().unwrap();
            let mut factors = Vec::new();
            for (i, block) in text.chunks(block_size).enumerate() {
                decoder.block_factors(i, &mut factors).unwrap();
                let mut pos = 0;
                for factor in &factors {
                    let len = factor.len();
                    let matched = &block[pos..pos + len];
                    if let Factor::Dictionary { offset, .. } = *factor {
                        let offset = offset as usize;
                        assert_eq!(&content[offset..offset + len], matched);
                        if selector == SelectorKind::Minimal {
                            assert_eq!(find(&content, matched), Some(offset), "{index}");
                        }
                    }
                    // greedy: one more byte of the block is never in the dictionary
                    if pos + len < block.len() {
                        let longer = &block[pos..pos + len + 1];
                        assert_eq!(find(&content, longer), None, "{index} {selector:?}");
                    }
                    pos += len;
                }
                assert_eq!(pos, block.len());
            }
        }
    }

    let build = |index: IndexKind| {
        RlzStore::builder()
            .block_size(block_size)
            .index(index)
            .selector(SelectorKind::Minimal)
            .build(&text, dict.clone())
            .unwrap()
    };
    assert_eq!(build(IndexKind::Fm).encoded(), build(IndexKind::SuffixArray).encoded());
}

#[test]
fn test_deterministic_across_thread_counts() {
    let text = mixed_text(400_000, 13);
    let build = |threads: usize| {
        RlzStore::builder()
            .block_size(64)
            .local_search(true)
            .threads(threads)
            .build(&text, dictionary())
            .unwrap()
    };
    let reference = build(1);
    for threads in [2, 3, 8] {
        let store = build(threads);
        assert_eq!(store.encoded(), reference.encoded(), "threads = {threads}");
        assert_eq!(store.block_map(), reference.block_map());
    }
    reference.verify(&text).unwrap();
}

#[test]
fn test_byte_iterator_seek() {
    let text = mixed_text(10_000, 3);
    let store = RlzStore::builder()
        .block_size(100)
        .build(&text, dictionary())
        .unwrap();

    let mut bytes = store.bytes().unwrap();
    assert_eq!(bytes.size_hint(), (10_000, Some(10_000)));
    bytes.seek(4321).unwrap();
    assert_eq!(bytes.position(), 4321);
    let rest: Vec<u8> = bytes.by_ref().take(1000).map(Result::unwrap).collect();
    assert_eq!(rest, &text[4321..5321]);

    bytes.seek(17).unwrap();
    assert_eq!(bytes.next().unwrap().unwrap(), text[17]);

    bytes.seek(10_000).unwrap();
    assert!(bytes.next().is_none());
    let err = bytes.seek(10_001).unwrap_err();
    assert_that!(err.message(), contains_substring("past the end"));
}

#[test]
#[should_panic(expected = "block index out of range")]
fn test_block_out_of_range_panics() {
    let store = RlzStore::builder()
        .block_size(8)
        .build(b"0123456789", dictionary())
        .unwrap();
    let _ = store.block(2);
}

#[test]
fn test_verify_detects_mismatch() {
    let text = mixed_text(5_000, 8);
    let store = RlzStore::builder()
        .block_size(256)
        .build(&text, dictionary())
        .unwrap();

    let mut other = text.clone();
    other[3000] ^= 0xff;
    let err = store.verify(&other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inconsistent);
    assert_that!(err.to_string(), contains_substring("block: 11"));

    let err = store.verify(&text[1..]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inconsistent);
}

#[test]
fn test_reencode() {
    let text = mixed_text(80_000, 4);
    let store = RlzStore::builder()
        .block_size(2048)
        .local_search(true)
        .build(&text, dictionary())
        .unwrap();

    let config = CoderConfig {
        lengths: CoderKind::Deflate { level: 9 },
        offsets: CoderKind::Bzip2 { level: 9 },
        literals: CoderKind::Lz4,
        layout: StreamLayout::TwoStream,
        literal_threshold: 6,
    };
    let reencoded = store.reencode(config).unwrap();
    reencoded.verify(&text).unwrap();
    assert_eq!(reencoded.coder_config(), &config);
    assert_eq!(reencoded.num_factors(), store.num_factors());
    let literal_bytes = |s: &RlzStore| s.stats().unwrap().literal_bytes;
    assert!(literal_bytes(&reencoded) >= literal_bytes(&store));

    let lowered = CoderConfig {
        literal_threshold: 2,
        ..CoderConfig::default()
    };
    let err = store.reencode(lowered).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_that!(err.message(), contains_substring("cannot lower the literal threshold"));
}

#[test]
fn test_stats_and_dictionary_usage() {
    let text = mixed_text(60_000, 6);
    let store = RlzStore::builder()
        .block_size(1024)
        .local_search(true)
        .build(&text, dictionary())
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.text_size, 60_000);
    assert_eq!(stats.num_blocks, 59);
    assert_eq!(
        stats.literal_factors + stats.dictionary_factors + stats.local_factors,
        stats.num_factors
    );
    assert!(stats.dictionary_factors > 0);
    assert!(stats.compression_ratio() > 0.0);
    assert!(stats.mean_factor_len() >= 1.0);
    assert_that!(stats.to_string(), contains_substring("dictionary factors"));

    let usage = store.dictionary_usage().unwrap();
    assert_eq!(usage.len(), store.dictionary().len());
    let copied: u64 = store
        .factors()
        .unwrap()
        .map(Result::unwrap)
        .filter_map(|f| match f {
            Factor::Dictionary { len, .. } => Some(len as u64),
            _ => None,
        })
        .sum();
    assert_eq!(usage.iter().sum::<u64>(), copied);
}

#[test]
fn test_preset_dictionary() {
    let text = mixed_text(40_000, 15);
    let preset = word_text(2048, 77);
    let deflate = CoderKind::Deflate { level: 9 };
    let store = RlzStore::builder()
        .block_size(512)
        .lengths(deflate)
        .offsets(deflate)
        .literals(deflate)
        .preset_dictionary(preset)
        .build(&text, dictionary())
        .unwrap();
    store.verify(&text).unwrap();
}

#[test]
fn test_empty_text() {
    let store = RlzStore::builder().build(b"", dictionary()).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.num_blocks(), 0);
    assert!(store.bytes().unwrap().next().is_none());
    assert!(store.factors().unwrap().next().is_none());
    store.verify(b"").unwrap();
    assert_eq!(store.stats().unwrap().num_factors, 0);
}

#[test]
#[should_panic(expected = "literal_threshold must be at least 1")]
fn test_zero_literal_threshold_panics() {
    let _ = RlzStoreBuilder::default().literal_threshold(0);
}

#[test]
fn test_invalid_coder_level() {
    let err = RlzStore::builder()
        .offsets(CoderKind::Bzip2 { level: 0 })
        .build(b"text", dictionary())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}
