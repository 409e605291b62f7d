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

use std::collections::BTreeSet;
use std::collections::HashMap;

use crate::countmin::CountMinSketch;

/// An item tracked by [`CountMinTopK`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopKRow {
    item: u64,
    estimate: u64,
}

impl TopKRow {
    pub fn item(&self) -> u64 {
        self.item
    }

    /// Estimate of the item when it was last updated.
    pub fn estimate(&self) -> u64 {
        self.estimate
    }
}

/// Count-Min sketch that also remembers the `k` items with the largest estimates.
///
/// Every update refreshes the estimate of the updated item. An untracked item replaces
/// the weakest tracked one once its estimate is strictly larger, so the tracked set only
/// changes on updates and ties keep the incumbent.
#[derive(Debug, Clone)]
pub struct CountMinTopK {
    sketch: CountMinSketch,
    k: usize,
    estimates: HashMap<u64, u64>,
    // (estimate, item); the first entry is the next to be evicted
    ranked: BTreeSet<(u64, u64)>,
}

impl CountMinTopK {
    /// # Panics
    ///
    /// Panics if `k` is 0.
    pub fn new(k: usize, sketch: CountMinSketch) -> Self {
        assert!(k > 0, "k must be at least 1");
        Self {
            sketch,
            k,
            estimates: HashMap::with_capacity(k + 1),
            ranked: BTreeSet::new(),
        }
    }

    pub fn with_accuracy(k: usize, epsilon: f64, delta: f64) -> Self {
        Self::new(k, CountMinSketch::with_accuracy(epsilon, delta))
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn sketch(&self) -> &CountMinSketch {
        &self.sketch
    }

    pub fn into_sketch(self) -> CountMinSketch {
        self.sketch
    }

    /// Adds `count` occurrences of `item` and returns its updated estimate.
    pub fn update(&mut self, item: u64, count: u64) -> u64 {
        let estimate = self.sketch.update(item, count);
        if let Some(old) = self.estimates.get_mut(&item) {
            self.ranked.remove(&(*old, item));
            *old = estimate;
            self.ranked.insert((estimate, item));
        } else if self.estimates.len() < self.k {
            self.track(item, estimate);
        } else if let Some(&(weakest, weakest_item)) = self.ranked.first() {
            if estimate > weakest {
                self.ranked.pop_first();
                self.estimates.remove(&weakest_item);
                self.track(item, estimate);
            }
        }
        estimate
    }

    pub fn estimate(&self, item: u64) -> u64 {
        self.sketch.estimate(item)
    }

    /// Tracked items, largest estimate first; equal estimates are ordered by item.
    pub fn topk(&self) -> Vec<TopKRow> {
        let mut rows: Vec<TopKRow> = self
            .ranked
            .iter()
            .map(|&(estimate, item)| TopKRow { item, estimate })
            .collect();
        rows.sort_by(|a, b| b.estimate.cmp(&a.estimate).then(a.item.cmp(&b.item)));
        rows
    }

    /// Estimate an untracked item must exceed to enter the top `k`; 0 until `k` items
    /// are tracked.
    pub fn topk_threshold(&self) -> u64 {
        if self.estimates.len() < self.k {
            return 0;
        }
        self.ranked.first().map_or(0, |&(estimate, _)| estimate)
    }

    /// Merges the sketches and keeps the `k` best items of both candidate sets, ranked by
    /// their estimates in the merged sketch.
    ///
    /// # Panics
    ///
    /// Panics if the sketches are not [compatible](CountMinSketch::is_compatible).
    pub fn merge(&mut self, other: &Self) {
        self.sketch.merge(&other.sketch);
        let mut candidates: Vec<u64> = self
            .estimates
            .keys()
            .chain(other.estimates.keys())
            .copied()
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut rows: Vec<(u64, u64)> = candidates
            .into_iter()
            .map(|item| (self.sketch.estimate(item), item))
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        rows.truncate(self.k);

        self.estimates.clear();
        self.ranked.clear();
        for (estimate, item) in rows {
            self.track(item, estimate);
        }
    }

    fn track(&mut self, item: u64, estimate: u64) {
        self.estimates.insert(item, estimate);
        self.ranked.insert((estimate, item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_needs_strictly_larger_estimate() {
        let mut topk = CountMinTopK::with_accuracy(2, 0.001, 0.01);
        topk.update(1, 5);
        topk.update(2, 3);
        assert_eq!(topk.topk_threshold(), 3);

        topk.update(3, 3);
        let items: Vec<u64> = topk.topk().iter().map(TopKRow::item).collect();
        assert_eq!(items, vec![1, 2]);

        topk.update(3, 1);
        let items: Vec<u64> = topk.topk().iter().map(TopKRow::item).collect();
        assert_eq!(items, vec![1, 3]);
        assert_eq!(topk.topk_threshold(), 4);
    }
}
