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

use std::collections::VecDeque;

const PRIME: u64 = 2147483647;
const NUM_CHARS: u64 = 256;

/// Rabin-Karp hash over a sliding window of `width` bytes.
///
/// The hash of a window `s[0..w)` is `sum(s[i] * 256^(w-1-i)) mod (2^31 - 1)`. Each
/// [`update`](Self::update) shifts one byte in and, once the window is full, removes the
/// contribution of the byte that falls out.
///
/// # Examples
///
/// ```
/// use rlzstore::hash::RollingHasher;
///
/// let text = b"mississippi";
/// let mut hasher = RollingHasher::new(4);
/// let mut last = 0;
/// for &b in &text[..8] {
///     last = hasher.update(b);
/// }
/// assert_eq!(last, hasher.compute_hash(&text[4..8]));
/// ```
#[derive(Debug, Clone)]
pub struct RollingHasher {
    width: usize,
    // 256^width mod PRIME
    nk: u64,
    hash: u64,
    window: VecDeque<u8>,
}

impl RollingHasher {
    /// Creates a hasher over windows of `width` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0.
    pub fn new(width: usize) -> Self {
        assert!(width > 0, "window width must be at least 1");
        let mut nk = 1;
        for _ in 0..width {
            nk = (nk * NUM_CHARS) % PRIME;
        }
        Self {
            width,
            nk,
            hash: 0,
            window: VecDeque::with_capacity(width),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns true once `width` bytes have been seen, i.e. the hash covers a full window.
    pub fn is_full(&self) -> bool {
        self.window.len() == self.width
    }

    /// Shifts `sym` into the window and returns the hash of the last `width` bytes, or of
    /// all bytes seen so far while fewer than `width` have been seen.
    pub fn update(&mut self, sym: u8) -> u64 {
        self.hash = (self.hash * NUM_CHARS + sym as u64) % PRIME;
        if self.window.len() == self.width {
            if let Some(tail) = self.window.pop_front() {
                let drop = (self.nk * tail as u64) % PRIME;
                self.hash = (self.hash + PRIME - drop) % PRIME;
            }
        }
        self.window.push_back(sym);
        self.hash
    }

    /// Hashes `window` from scratch.
    pub fn compute_hash(&self, window: &[u8]) -> u64 {
        window
            .iter()
            .fold(0, |hash, &sym| (hash * NUM_CHARS + sym as u64) % PRIME)
    }

    /// Forgets all bytes seen so far.
    pub fn reset(&mut self) {
        self.hash = 0;
        self.window.clear();
    }
}
