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

/// Builds the suffix array of `text` by prefix doubling.
///
/// A suffix that is a proper prefix of another sorts first, as if the text were followed
/// by a terminator smaller than every byte.
pub(crate) fn suffix_array(text: &[u8]) -> Vec<u32> {
    let n = text.len();
    let mut sa: Vec<u32> = (0..n as u32).collect();
    if n <= 1 {
        return sa;
    }

    // rank 0 is reserved for positions past the end
    let mut rank: Vec<u32> = text.iter().map(|&b| b as u32 + 1).collect();
    let mut next = vec![0u32; n];
    let mut k = 1;
    loop {
        sa.par_sort_unstable_by_key(|&i| sort_key(&rank, i as usize, k));
        next[sa[0] as usize] = 1;
        for j in 1..n {
            let prev = sort_key(&rank, sa[j - 1] as usize, k);
            let cur = sort_key(&rank, sa[j] as usize, k);
            next[sa[j] as usize] = next[sa[j - 1] as usize] + (prev != cur) as u32;
        }
        std::mem::swap(&mut rank, &mut next);
        if rank[sa[n - 1] as usize] as usize == n || k >= n {
            break;
        }
        k *= 2;
    }
    sa
}

fn sort_key(rank: &[u32], i: usize, k: usize) -> u64 {
    let hi = rank[i] as u64;
    let lo = rank.get(i + k).copied().unwrap_or(0) as u64;
    (hi << 32) | lo
}
