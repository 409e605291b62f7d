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

//! Count-Min sketch for approximate frequency counting.
//!
//! The sketch keeps `d` rows of `w` counters. Every update increments one counter per
//! row and an estimate is the minimum over the item's counters, so estimates never fall
//! below the true count. With `w = 2/epsilon` (rounded up to a power of two) and
//! `d = log2(1/delta)` the overestimate exceeds `epsilon * total_count` with probability
//! at most `delta`.
//!
//! Hash parameters are drawn from a fixed seed, so two sketches created with the same
//! accuracy are always compatible and can be [merged](CountMinSketch::merge).
//!
//! # Usage
//!
//! ```rust
//! use rlzstore::countmin::CountMinSketch;
//!
//! let mut sketch = CountMinSketch::with_accuracy(0.001, 0.01);
//!
//! sketch.update(42, 1);
//! sketch.update(7, 3);
//!
//! assert!(sketch.estimate(7) >= 3);
//! assert!(sketch.estimate(42) >= 1);
//! ```
//!
//! # Window frequencies
//!
//! [`ChunkFrequencyEstimator`] feeds the hash of every fixed-width window of a text into
//! a sketch; dictionary policies use it to rank candidate content.
//!
//! ```rust
//! use rlzstore::countmin::ChunkFrequencyEstimator;
//! use rlzstore::countmin::CountMinSketch;
//!
//! let mut estimator = ChunkFrequencyEstimator::new(4, CountMinSketch::with_accuracy(0.01, 0.01));
//! estimator.process(b"abcdabcdabcd");
//! let hash = estimator.hasher().compute_hash(b"abcd");
//! assert!(estimator.sketch().estimate(hash) >= 3);
//! ```
//!
//! # Heavy hitters
//!
//! [`CountMinTopK`] wraps a sketch and keeps the `k` items with the largest estimates.
//! [`ChunkTopKEstimator`] uses it to collect the most frequent windows of a text.
//!
//! ```rust
//! use rlzstore::countmin::ChunkTopKEstimator;
//! use rlzstore::countmin::CountMinTopK;
//!
//! let mut estimator = ChunkTopKEstimator::new(3, CountMinTopK::with_accuracy(2, 0.01, 0.01));
//! estimator.process(b"xyzxyzxyzxyz-ab");
//! let best = estimator.topk();
//! assert_eq!(best.len(), 2);
//! assert!(best[0].estimate() >= 4);
//! ```

mod estimator;
mod serialization;
mod sketch;
mod topk;

pub use self::estimator::ChunkFrequencyEstimator;
pub use self::estimator::ChunkTopKEstimator;
pub use self::estimator::WindowCounter;
pub use self::estimator::parallel_sketch;
pub use self::sketch::CountMinSketch;
pub use self::topk::CountMinTopK;
pub use self::topk::TopKRow;
