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

use std::hash::Hash;
use std::hash::Hasher;

use crate::codec::ArtifactBytes;
use crate::codec::ArtifactSlice;
use crate::codec::Family;
use crate::codec::assert::ensure_fully_consumed;
use crate::codec::assert::ensure_preamble;
use crate::common::random::XorShift64;
use crate::countmin::serialization::FLAGS_IS_EMPTY;
use crate::countmin::serialization::HASH_PARAM_SEED;
use crate::error::Error;
use crate::hash::MurmurHash3X64128;

/// Largest prime below 2^31; also the modulus mask of the row hash.
const PRIME: u64 = 2147483647;

const DEFAULT_EPSILON: f64 = 1.0 / 20000.0;
const DEFAULT_DELTA: f64 = 1.0 / 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HashParams {
    a: u64,
    b: u64,
}

/// Count-Min sketch with 64 bit counters.
///
/// See the [countmin module level documentation](crate::countmin) for more.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMinSketch {
    epsilon: f64,
    delta: f64,
    // num_buckets - 1, used as a bit mask
    mask: u64,
    hash_params: Vec<HashParams>,
    table: Vec<u64>,
    total_count: u64,
}

impl Default for CountMinSketch {
    fn default() -> Self {
        Self::with_accuracy(DEFAULT_EPSILON, DEFAULT_DELTA)
    }
}

impl CountMinSketch {
    /// Creates a sketch whose overestimate stays within `epsilon * total_count` with
    /// probability `1 - delta`.
    ///
    /// # Panics
    ///
    /// Panics if `epsilon` or `delta` is not in `(0, 1)`.
    pub fn with_accuracy(epsilon: f64, delta: f64) -> Self {
        assert!(
            epsilon > 0.0 && epsilon < 1.0,
            "epsilon must be in (0, 1), got {epsilon}"
        );
        assert!(
            delta > 0.0 && delta < 1.0,
            "delta must be in (0, 1), got {delta}"
        );
        let num_buckets = Self::suggest_num_buckets(epsilon);
        let num_hashes = Self::suggest_num_hashes(delta) as usize;

        let mut rng = XorShift64::seeded(HASH_PARAM_SEED);
        let hash_params = (0..num_hashes)
            .map(|_| {
                let a = rng.next_in(1, PRIME);
                let b = rng.next_in(1, PRIME);
                HashParams { a, b }
            })
            .collect();

        Self {
            epsilon,
            delta,
            mask: num_buckets - 1,
            hash_params,
            table: vec![0; num_buckets as usize * num_hashes],
            total_count: 0,
        }
    }

    /// Number of counters per row for a target relative error: the smallest power of two
    /// not below `ceil(2 / epsilon)`.
    pub fn suggest_num_buckets(epsilon: f64) -> u64 {
        let w = (2.0 / epsilon).ceil() as u64;
        w.max(1).next_power_of_two()
    }

    /// Number of rows for a target failure probability: `ceil(log2(1 / delta))`.
    pub fn suggest_num_hashes(delta: f64) -> u8 {
        let d = (1.0 / delta).log2().ceil();
        d.clamp(1.0, u8::MAX as f64) as u8
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn num_hashes(&self) -> usize {
        self.hash_params.len()
    }

    pub fn num_buckets(&self) -> u64 {
        self.mask + 1
    }

    /// Sum of all counts added to the sketch.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Adds `count` occurrences of `item` and returns the updated estimate of `item`.
    pub fn update(&mut self, item: u64, count: u64) -> u64 {
        self.total_count = self.total_count.saturating_add(count);
        let mut estimate = u64::MAX;
        for row in 0..self.num_hashes() {
            let slot = self.slot(item, row);
            let counter = &mut self.table[slot];
            *counter = counter.saturating_add(count);
            estimate = estimate.min(*counter);
        }
        estimate
    }

    /// Returns an estimate of the count of `item`, never less than its true count.
    pub fn estimate(&self, item: u64) -> u64 {
        (0..self.num_hashes())
            .map(|row| self.table[self.slot(item, row)])
            .min()
            .unwrap_or(0)
    }

    /// Hashes `item` and adds one occurrence of it.
    pub fn update_item<T: Hash + ?Sized>(&mut self, item: &T) -> u64 {
        self.update(hash_item(item), 1)
    }

    /// Estimate for an item added with [`update_item`](Self::update_item).
    pub fn estimate_item<T: Hash + ?Sized>(&self, item: &T) -> u64 {
        self.estimate(hash_item(item))
    }

    /// The highest per-row minimum counter.
    ///
    /// Every estimate includes at least the smallest counter of each of its rows, so this
    /// is a floor below which estimates are indistinguishable from collision noise.
    pub fn noise_estimate(&self) -> u64 {
        let width = self.num_buckets() as usize;
        self.table
            .chunks(width)
            .map(|row| row.iter().copied().min().unwrap_or(0))
            .max()
            .unwrap_or(0)
    }

    /// Expected absolute error bound of an estimate.
    pub fn estimation_error(&self) -> f64 {
        self.epsilon * self.total_count as f64
    }

    /// Probability that an estimate stays within [`estimation_error`](Self::estimation_error).
    pub fn estimation_probability(&self) -> f64 {
        1.0 - self.delta
    }

    /// Returns true if `other` has the same shape and hash parameters.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.mask == other.mask && self.hash_params == other.hash_params
    }

    /// Adds all counters of `other` into this sketch.
    ///
    /// # Panics
    ///
    /// Panics if the sketches are not [compatible](Self::is_compatible).
    pub fn merge(&mut self, other: &Self) {
        assert!(
            self.is_compatible(other),
            "incompatible sketches: {}x{} vs {}x{}",
            self.num_hashes(),
            self.num_buckets(),
            other.num_hashes(),
            other.num_buckets()
        );
        for (counter, value) in self.table.iter_mut().zip(other.table.iter()) {
            *counter = counter.saturating_add(*value);
        }
        self.total_count = self.total_count.saturating_add(other.total_count);
    }

    /// Serializes the sketch: parameters, hash parameters, total count and counters.
    pub fn serialize(&self) -> Vec<u8> {
        let family = Family::COUNTMIN;
        let capacity = 2 + 2 + 4 + 8 * 3 + self.hash_params.len() * 16 + self.table.len() * 8;
        let mut bytes = ArtifactBytes::with_capacity(capacity);
        bytes.write_u8(family.id);
        bytes.write_u8(family.serial_version);
        bytes.write_u8(if self.is_empty() { FLAGS_IS_EMPTY } else { 0 });
        bytes.write_u8(self.num_hashes() as u8);
        bytes.write_u32_le(self.num_buckets() as u32);
        bytes.write_u64_le(self.epsilon.to_bits());
        bytes.write_u64_le(self.delta.to_bits());
        bytes.write_u64_le(self.total_count);
        for params in &self.hash_params {
            bytes.write_u64_le(params.a);
            bytes.write_u64_le(params.b);
        }
        for counter in &self.table {
            bytes.write_u64_le(*counter);
        }
        bytes.into_bytes()
    }

    /// Deserializes a sketch written by [`serialize`](Self::serialize).
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::insufficient_data(tag)
        }

        let family = Family::COUNTMIN;
        let mut cursor = ArtifactSlice::new(bytes);
        ensure_preamble(&mut cursor, &family)?;
        let flags = cursor.read_u8().map_err(make_error("flags"))?;
        let num_hashes = cursor.read_u8().map_err(make_error("num_hashes"))? as usize;
        let num_buckets = cursor.read_u32_le().map_err(make_error("num_buckets"))? as u64;
        let epsilon = f64::from_bits(cursor.read_u64_le().map_err(make_error("epsilon"))?);
        let delta = f64::from_bits(cursor.read_u64_le().map_err(make_error("delta"))?);
        let total_count = cursor.read_u64_le().map_err(make_error("total_count"))?;

        if num_hashes == 0 {
            return Err(Error::deserial("num_hashes must be at least 1"));
        }
        if !num_buckets.is_power_of_two() {
            return Err(Error::deserial(format!(
                "num_buckets must be a power of two, got {num_buckets}"
            )));
        }
        if !(epsilon > 0.0 && epsilon < 1.0 && delta > 0.0 && delta < 1.0) {
            return Err(Error::deserial(format!(
                "accuracy out of range: epsilon {epsilon}, delta {delta}"
            )));
        }
        let is_empty = (flags & FLAGS_IS_EMPTY) != 0;
        if is_empty != (total_count == 0) {
            return Err(Error::deserial(format!(
                "empty flag disagrees with total count {total_count}"
            )));
        }

        let mut hash_params = Vec::with_capacity(num_hashes);
        for _ in 0..num_hashes {
            let a = cursor.read_u64_le().map_err(make_error("hash_params"))?;
            let b = cursor.read_u64_le().map_err(make_error("hash_params"))?;
            hash_params.push(HashParams { a, b });
        }

        let num_counters = num_hashes * num_buckets as usize;
        if cursor.remaining() / 8 < num_counters {
            return Err(Error::insufficient_data("table"));
        }
        let mut table = Vec::with_capacity(num_counters);
        for _ in 0..num_counters {
            table.push(cursor.read_u64_le().map_err(make_error("table"))?);
        }
        ensure_fully_consumed(&cursor, &family)?;

        Ok(Self {
            epsilon,
            delta,
            mask: num_buckets - 1,
            hash_params,
            table,
            total_count,
        })
    }

    fn slot(&self, item: u64, row: usize) -> usize {
        let params = self.hash_params[row];
        let mut hash = params.a.wrapping_mul(item);
        hash = ((hash >> 31).wrapping_add(hash)) & PRIME;
        let column = hash & self.mask;
        row * self.num_buckets() as usize + column as usize
    }
}

fn hash_item<T: Hash + ?Sized>(item: &T) -> u64 {
    let mut hasher = MurmurHash3X64128::with_seed(0);
    item.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let sketch = CountMinSketch::with_accuracy(1.0 / 20000.0, 1.0 / 1000.0);
        assert_eq!(sketch.num_buckets(), 65536);
        assert_eq!(sketch.num_hashes(), 10);
        assert_eq!(CountMinSketch::suggest_num_buckets(0.5), 4);
        assert_eq!(CountMinSketch::suggest_num_hashes(0.5), 1);
    }

    #[test]
    fn test_noise_estimate_tracks_row_floor() {
        let mut sketch = CountMinSketch::with_accuracy(0.5, 0.5);
        assert_eq!(sketch.noise_estimate(), 0);
        // four buckets, one row: touching every bucket lifts the floor
        for item in 0..10_000u64 {
            sketch.update(item, 1);
        }
        assert!(sketch.noise_estimate() > 0);
        assert!(sketch.noise_estimate() <= sketch.estimate(0));
    }
}
