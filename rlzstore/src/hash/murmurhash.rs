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

use std::hash::Hasher;

/// Seed used for dictionary content hashes.
const CONTENT_HASH_SEED: u32 = 4711;

/// A [`Hasher`] producing the 128 bit x64 variant of MurmurHash3.
///
/// Bytes are buffered until [`finish128`](Self::finish128) is called, so hashing a value
/// through several `write` calls gives the same result as hashing its concatenation.
#[derive(Debug, Default, Clone)]
pub struct MurmurHash3X64128 {
    seed: u32,
    buf: Vec<u8>,
}

impl MurmurHash3X64128 {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            buf: Vec::new(),
        }
    }

    /// Returns both 64 bit halves of the hash.
    pub fn finish128(&self) -> (u64, u64) {
        mur3::murmurhash3_x64_128(&self.buf, self.seed)
    }
}

impl Hasher for MurmurHash3X64128 {
    fn finish(&self) -> u64 {
        self.finish128().0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// Hash identifying a dictionary's content.
///
/// Persisted indexes record the hash of the dictionary they were built from; a mismatch
/// on load means the index is stale.
pub fn content_hash(bytes: &[u8]) -> u64 {
    let (h1, h2) = mur3::murmurhash3_x64_128(bytes, CONTENT_HASH_SEED);
    h1 ^ h2.rotate_left(32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remainder() {
        // remainder > 8
        let key = "The quick brown fox jumps over the lazy dog";
        let mut hasher = MurmurHash3X64128::with_seed(0);
        hasher.write(key.as_bytes());
        assert_eq!(hasher.finish128(), (0xe34bbc7bbc071b6c, 0x7a433ca9c49a9347));

        // test a remainder < 8, fed in pieces
        let mut hasher = MurmurHash3X64128::with_seed(0);
        hasher.write(b"The quick brown fox jumps over ");
        hasher.write(b"the lazy dogdogdog");
        assert_eq!(hasher.finish128(), (0x9c8205300e612fc4, 0xcbc0af6136aa3df9));

        // test a remainder = 0
        let mut hasher = MurmurHash3X64128::with_seed(0);
        hasher.write(b"The quick brown fox jumps over t");
        assert_eq!(hasher.finish(), 0xdf6af91bb29bdacf);
    }

    #[test]
    fn test_content_hash_distinguishes_content() {
        assert_eq!(content_hash(b"abc\0"), content_hash(b"abc\0"));
        assert_ne!(content_hash(b"abc\0"), content_hash(b"abd\0"));
        assert_ne!(content_hash(b""), content_hash(b"\0"));
    }
}
