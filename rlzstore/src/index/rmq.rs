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

const BLOCK: usize = 64;

/// Range-minimum queries over a fixed array of keys.
///
/// Keys are grouped into blocks of 64; a sparse table over the block minima answers the
/// whole-block part of a query and the partial blocks at both ends are scanned.
#[derive(Debug, Clone)]
pub(crate) struct RangeMinimum {
    keys: Vec<u32>,
    // sparse[j][b]: position of the minimum of blocks b..b + 2^j
    sparse: Vec<Vec<u32>>,
}

impl RangeMinimum {
    pub fn new(keys: Vec<u32>) -> Self {
        let num_blocks = keys.len().div_ceil(BLOCK);
        let level0: Vec<u32> = (0..num_blocks)
            .map(|b| scan(&keys, b * BLOCK, ((b + 1) * BLOCK).min(keys.len()) - 1) as u32)
            .collect();

        let mut sparse = vec![level0];
        let mut span = 1;
        while span * 2 <= num_blocks {
            let prev = &sparse[sparse.len() - 1];
            let level: Vec<u32> = (0..=num_blocks - span * 2)
                .map(|b| better(&keys, prev[b] as usize, prev[b + span] as usize) as u32)
                .collect();
            sparse.push(level);
            span *= 2;
        }
        Self { keys, sparse }
    }

    /// Position of the smallest key in the inclusive range `[l, r]`; the leftmost one on
    /// ties.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty or out of bounds.
    pub fn argmin(&self, l: usize, r: usize) -> usize {
        assert!(l <= r && r < self.keys.len(), "invalid range [{l}, {r}]");
        let (bl, br) = (l / BLOCK, r / BLOCK);
        if bl == br {
            return scan(&self.keys, l, r);
        }
        let mut best = scan(&self.keys, l, (bl + 1) * BLOCK - 1);
        if bl + 1 < br {
            let (first, last) = (bl + 1, br - 1);
            let j = (usize::BITS - 1 - (last - first + 1).leading_zeros()) as usize;
            let left = self.sparse[j][first] as usize;
            let right = self.sparse[j][last + 1 - (1 << j)] as usize;
            best = better(&self.keys, best, better(&self.keys, left, right));
        }
        better(&self.keys, best, scan(&self.keys, br * BLOCK, r))
    }
}

fn scan(keys: &[u32], l: usize, r: usize) -> usize {
    let mut best = l;
    for i in l + 1..=r {
        if keys[i] < keys[best] {
            best = i;
        }
    }
    best
}

fn better(keys: &[u32], a: usize, b: usize) -> usize {
    match keys[a].cmp(&keys[b]) {
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Equal => a.min(b),
    }
}
