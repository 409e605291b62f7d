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

use std::collections::HashMap;

use common::random_text;
use common::word_text;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use rlzstore::countmin::ChunkFrequencyEstimator;
use rlzstore::countmin::ChunkTopKEstimator;
use rlzstore::countmin::CountMinSketch;
use rlzstore::countmin::CountMinTopK;
use rlzstore::countmin::TopKRow;
use rlzstore::countmin::parallel_sketch;

#[test]
fn test_estimates_never_undercount() {
    let mut sketch = CountMinSketch::with_accuracy(0.01, 0.01);
    let mut truth: HashMap<u64, u64> = HashMap::new();
    let items = random_text(50_000, 200, 17);
    for (i, &item) in items.iter().enumerate() {
        let item = item as u64 * 7919;
        let count = (i % 3 + 1) as u64;
        let estimate = sketch.update(item, count);
        let exact = truth.entry(item).or_default();
        *exact += count;
        assert!(estimate >= *exact);
    }
    for (&item, &exact) in &truth {
        assert!(sketch.estimate(item) >= exact);
    }
    assert_eq!(sketch.total_count(), truth.values().sum::<u64>());
    assert!(sketch.noise_estimate() <= sketch.total_count());
}

#[test]
fn test_merge_equals_combined_updates() {
    let left = random_text(10_000, 255, 3);
    let right = random_text(10_000, 255, 4);

    let mut a = CountMinSketch::with_accuracy(0.001, 0.05);
    let mut b = CountMinSketch::with_accuracy(0.001, 0.05);
    let mut combined = CountMinSketch::with_accuracy(0.001, 0.05);
    for &item in &left {
        a.update(item as u64, 1);
        combined.update(item as u64, 1);
    }
    for &item in &right {
        b.update(item as u64, 2);
        combined.update(item as u64, 2);
    }

    let mut merged = a.clone();
    merged.merge(&b);
    let mut merged_other_way = b.clone();
    merged_other_way.merge(&a);
    for item in 0..256u64 {
        assert_eq!(merged.estimate(item), combined.estimate(item));
        assert_eq!(merged_other_way.estimate(item), combined.estimate(item));
    }
    assert_eq!(merged.total_count(), combined.total_count());
    assert_eq!(merged.serialize(), combined.serialize());
}

#[test]
#[should_panic(expected = "incompatible sketches")]
fn test_merge_incompatible_panics() {
    let mut a = CountMinSketch::with_accuracy(0.1, 0.1);
    let b = CountMinSketch::with_accuracy(0.01, 0.1);
    a.merge(&b);
}

#[test]
fn test_serialize_roundtrip() {
    let mut sketch = CountMinSketch::with_accuracy(0.01, 0.001);
    for item in 0..1000u64 {
        sketch.update(item % 97, item);
    }
    sketch.update_item("a string item");
    let bytes = sketch.serialize();
    let restored = CountMinSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored.serialize(), bytes);
    assert_eq!(restored.total_count(), sketch.total_count());
    assert_eq!(restored.estimate(5), sketch.estimate(5));
    assert_eq!(restored.estimate_item("a string item"), sketch.estimate_item("a string item"));
    assert!(restored.is_compatible(&sketch));

    let empty = CountMinSketch::default();
    let restored = CountMinSketch::deserialize(&empty.serialize()).unwrap();
    assert!(restored.is_empty());
}

#[test]
fn test_deserialize_errors() {
    let bytes = CountMinSketch::with_accuracy(0.1, 0.1).serialize();

    let err = CountMinSketch::deserialize(&bytes[..bytes.len() - 3]).unwrap_err();
    assert_that!(err.message(), contains_substring("insufficient data"));

    let mut wrong_family = bytes.clone();
    wrong_family[0] = 99;
    let err = CountMinSketch::deserialize(&wrong_family).unwrap_err();
    assert_that!(err.message(), contains_substring("invalid family"));

    let mut wrong_version = bytes.clone();
    wrong_version[1] = 42;
    let err = CountMinSketch::deserialize(&wrong_version).unwrap_err();
    assert_that!(err.message(), contains_substring("unsupported serial version"));

    let mut trailing = bytes;
    trailing.push(0);
    let err = CountMinSketch::deserialize(&trailing).unwrap_err();
    assert_that!(err.message(), contains_substring("trailing bytes"));
}

#[test]
fn test_parallel_sketch_matches_sequential() {
    let text = word_text(200_000, 11);
    let width = 8;
    let mut estimator = ChunkFrequencyEstimator::new(width, CountMinSketch::with_accuracy(0.001, 0.01));
    estimator.process(&text);
    let sequential = estimator.into_sketch();
    assert_eq!(sequential.total_count(), (text.len() - width + 1) as u64);

    for threads in [1, 2, 3, 8] {
        let parallel = parallel_sketch(&text, width, 0.001, 0.01, threads).unwrap();
        assert_eq!(parallel.serialize(), sequential.serialize(), "threads = {threads}");
    }
}

#[test]
fn test_parallel_sketch_short_text() {
    let sketch = parallel_sketch(b"abc", 8, 0.01, 0.01, 4).unwrap();
    assert!(sketch.is_empty());
}

// Items 1 to 5 arrive with weights 10 down to 6 per round, between rounds of light items.
fn skewed_updates(rounds: usize, seed: u64) -> Vec<(u64, u64)> {
    let light = random_text(rounds * 200, 250, seed);
    let mut updates = Vec::new();
    for round in light.chunks(200) {
        for heavy in 1..=5u64 {
            updates.push((heavy, 11 - heavy));
        }
        updates.extend(round.iter().map(|&b| (1000 + b as u64, 1)));
    }
    updates
}

#[test]
fn test_topk_tracks_heavy_hitters() {
    let mut topk = CountMinTopK::with_accuracy(5, 0.001, 0.01);
    let mut truth: HashMap<u64, u64> = HashMap::new();
    for (item, count) in skewed_updates(100, 5) {
        topk.update(item, count);
        *truth.entry(item).or_default() += count;
    }

    let rows = topk.topk();
    let items: Vec<u64> = rows.iter().map(TopKRow::item).collect();
    assert_eq!(items, vec![1, 2, 3, 4, 5]);
    for row in &rows {
        assert!(row.estimate() >= truth[&row.item()]);
        assert!(row.estimate() <= topk.estimate(row.item()));
    }
    assert!(topk.topk_threshold() >= 600);
    assert_eq!(topk.topk_threshold(), rows[4].estimate());
}

#[test]
fn test_topk_threshold_before_full() {
    let mut topk = CountMinTopK::with_accuracy(3, 0.01, 0.01);
    assert!(topk.topk().is_empty());
    assert_eq!(topk.topk_threshold(), 0);
    topk.update(9, 4);
    topk.update(8, 2);
    assert_eq!(topk.topk_threshold(), 0);
    assert_eq!(topk.topk().len(), 2);
}

#[test]
fn test_topk_merge_matches_combined() {
    let updates = skewed_updates(100, 6);
    let (left, right) = updates.split_at(updates.len() / 2);

    let mut a = CountMinTopK::with_accuracy(5, 0.001, 0.01);
    let mut b = CountMinTopK::with_accuracy(5, 0.001, 0.01);
    let mut combined = CountMinTopK::with_accuracy(5, 0.001, 0.01);
    for &(item, count) in left {
        a.update(item, count);
        combined.update(item, count);
    }
    for &(item, count) in right {
        b.update(item, count);
        combined.update(item, count);
    }

    a.merge(&b);
    assert_eq!(a.sketch(), combined.sketch());
    let merged: Vec<u64> = a.topk().iter().map(TopKRow::item).collect();
    let expected: Vec<u64> = combined.topk().iter().map(TopKRow::item).collect();
    assert_eq!(merged, expected);
    for row in a.topk() {
        assert_eq!(row.estimate(), a.estimate(row.item()));
    }
}

#[test]
#[should_panic(expected = "k must be at least 1")]
fn test_topk_zero_k() {
    CountMinTopK::with_accuracy(0, 0.01, 0.01);
}

#[test]
fn test_chunk_topk_estimator_finds_repeated_window() {
    let mut text = random_text(30_000, 200, 9);
    for i in (0..text.len()).step_by(100) {
        text[i..i + 6].copy_from_slice(b"needle");
    }

    let mut estimator = ChunkTopKEstimator::new(6, CountMinTopK::with_accuracy(4, 0.001, 0.01));
    estimator.process(&text);
    let best = estimator.topk();
    assert_eq!(best.len(), 4);
    assert_eq!(best[0].item(), estimator.hasher().compute_hash(b"needle"));
    assert!(best[0].estimate() >= 300);
    assert!(best[1].estimate() < best[0].estimate());

    // the wrapped sketch saw the same windows as a plain estimator
    let mut plain = ChunkFrequencyEstimator::new(6, CountMinSketch::with_accuracy(0.001, 0.01));
    plain.process(&text);
    assert_eq!(estimator.into_counter().into_sketch(), plain.into_sketch());
}
