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

use std::fmt;

/// Factor and size statistics of a store, see [`RlzStore::stats`](super::RlzStore::stats).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub text_size: u64,
    pub num_blocks: usize,
    pub num_factors: u64,
    /// Factors stored as literal bytes.
    pub literal_factors: u64,
    /// Bytes covered by literal factors.
    pub literal_bytes: u64,
    /// Factors copied from the dictionary.
    pub dictionary_factors: u64,
    /// Factors copied from earlier in their own block.
    pub local_factors: u64,
    pub dictionary_len: usize,
    /// Size of the encoded factor stream.
    pub encoded_bytes: usize,
    /// Size of the serialized block map.
    pub block_map_bytes: usize,
}

impl StoreStats {
    /// Average number of text bytes per factor; 0 for an empty store.
    pub fn mean_factor_len(&self) -> f64 {
        if self.num_factors == 0 {
            0.0
        } else {
            self.text_size as f64 / self.num_factors as f64
        }
    }

    /// Encoded size, block map included, relative to the text size. The dictionary is
    /// not counted.
    pub fn compression_ratio(&self) -> f64 {
        if self.text_size == 0 {
            0.0
        } else {
            (self.encoded_bytes + self.block_map_bytes) as f64 / self.text_size as f64
        }
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### RLZ store summary:")?;
        writeln!(f, "   text bytes          : {}", self.text_size)?;
        writeln!(f, "   blocks              : {}", self.num_blocks)?;
        writeln!(f, "   factors             : {}", self.num_factors)?;
        writeln!(
            f,
            "   literal factors     : {} ({} bytes)",
            self.literal_factors, self.literal_bytes
        )?;
        writeln!(f, "   dictionary factors  : {}", self.dictionary_factors)?;
        writeln!(f, "   local factors       : {}", self.local_factors)?;
        writeln!(f, "   mean factor length  : {:.2}", self.mean_factor_len())?;
        writeln!(f, "   dictionary bytes    : {}", self.dictionary_len)?;
        writeln!(f, "   encoded bytes       : {}", self.encoded_bytes)?;
        writeln!(f, "   block map bytes     : {}", self.block_map_bytes)?;
        writeln!(f, "   compression ratio   : {:.4}", self.compression_ratio())?;
        writeln!(f, "### End RLZ store summary")
    }
}
