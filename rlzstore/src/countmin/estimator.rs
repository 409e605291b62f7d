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

use rayon::prelude::*;

use crate::common::thread_pool;
use crate::countmin::CountMinSketch;
use crate::countmin::CountMinTopK;
use crate::countmin::TopKRow;
use crate::error::Error;
use crate::hash::RollingHasher;

/// A frequency counter that window hashes can be fed into.
pub trait WindowCounter {
    /// Counts one occurrence of the window with hash `hash` and returns its estimate.
    fn count_window(&mut self, hash: u64) -> u64;
}

impl WindowCounter for CountMinSketch {
    fn count_window(&mut self, hash: u64) -> u64 {
        self.update(hash, 1)
    }
}

impl WindowCounter for CountMinTopK {
    fn count_window(&mut self, hash: u64) -> u64 {
        self.update(hash, 1)
    }
}

/// Counts every fixed-width window of a byte stream.
///
/// Windows are identified by their [`RollingHasher`] hash. The first `width - 1` bytes
/// only prime the hasher; from then on every byte completes a window which is added to
/// the counter, a plain [`CountMinSketch`] by default or a [`CountMinTopK`] to also
/// collect the most frequent windows.
#[derive(Debug, Clone)]
pub struct ChunkFrequencyEstimator<C = CountMinSketch> {
    hasher: RollingHasher,
    counter: C,
}

/// Window estimator that keeps the `k` most frequent window hashes.
pub type ChunkTopKEstimator = ChunkFrequencyEstimator<CountMinTopK>;

impl<C: WindowCounter> ChunkFrequencyEstimator<C> {
    /// # Panics
    ///
    /// Panics if `width` is 0.
    pub fn new(width: usize, counter: C) -> Self {
        Self {
            hasher: RollingHasher::new(width),
            counter,
        }
    }

    /// Feeds one byte. Returns the updated estimate of the window ending at this byte, or
    /// `None` while fewer than `width` bytes have been seen.
    pub fn update(&mut self, sym: u8) -> Option<u64> {
        let hash = self.hasher.update(sym);
        self.hasher
            .is_full()
            .then(|| self.counter.count_window(hash))
    }

    /// Feeds every byte of `text`.
    pub fn process(&mut self, text: &[u8]) {
        for &sym in text {
            self.update(sym);
        }
    }

    pub fn hasher(&self) -> &RollingHasher {
        &self.hasher
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub fn into_counter(self) -> C {
        self.counter
    }
}

impl ChunkFrequencyEstimator<CountMinSketch> {
    pub fn sketch(&self) -> &CountMinSketch {
        &self.counter
    }

    pub fn into_sketch(self) -> CountMinSketch {
        self.counter
    }
}

impl ChunkFrequencyEstimator<CountMinTopK> {
    /// The most frequent windows seen so far, by hash.
    pub fn topk(&self) -> Vec<TopKRow> {
        self.counter.topk()
    }
}

/// Sketches all `width` byte windows of `text` on `threads` workers.
///
/// Each worker counts the windows starting inside its own shard of the text and the
/// per-shard sketches are merged. Merging is a plain sum, so the result is identical to a
/// sequential [`ChunkFrequencyEstimator::process`] over the whole text.
///
/// # Panics
///
/// Panics if `width` or `threads` is 0, or if the accuracy is out of range.
pub fn parallel_sketch(
    text: &[u8],
    width: usize,
    epsilon: f64,
    delta: f64,
    threads: usize,
) -> Result<CountMinSketch, Error> {
    assert!(width > 0, "window width must be at least 1");
    assert!(threads > 0, "threads must be at least 1");
    let num_windows = (text.len() + 1).saturating_sub(width);
    let shard_len = num_windows.div_ceil(threads).max(1);
    let shards: Vec<(usize, usize)> = (0..num_windows)
        .step_by(shard_len)
        .map(|start| (start, (start + shard_len).min(num_windows)))
        .collect();

    let pool = thread_pool(threads)?;
    let sketches: Vec<CountMinSketch> = pool.install(|| {
        shards
            .par_iter()
            .map(|&(first, last)| {
                // windows starting in [first, last) end before last + width - 1
                let mut estimator =
                    ChunkFrequencyEstimator::new(width, CountMinSketch::with_accuracy(epsilon, delta));
                estimator.process(&text[first..last + width - 1]);
                estimator.into_sketch()
            })
            .collect()
    });

    let mut merged = CountMinSketch::with_accuracy(epsilon, delta);
    for sketch in &sketches {
        merged.merge(sketch);
    }
    tracing::debug!(
        windows = num_windows,
        shards = sketches.len(),
        total = merged.total_count(),
        "sketched text windows"
    );
    Ok(merged)
}
