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

#![allow(dead_code)]

/// Deterministic pseudo random bytes drawn from the first `alphabet` byte values.
pub fn random_text(len: usize, alphabet: u8, seed: u64) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % alphabet.max(1) as u64) as u8
        })
        .collect()
}

/// Text made of words from a small vocabulary, so that a dictionary sampled from it
/// matches long stretches.
pub fn word_text(len: usize, seed: u64) -> Vec<u8> {
    const WORDS: &[&[u8]] = &[
        b"lorem ", b"ipsum ", b"dolor ", b"sit ", b"amet, ", b"consectetur ",
        b"adipiscing ", b"elit. ", b"sed ", b"do ", b"eiusmod ", b"tempor\n",
    ];
    let picks = random_text(len, WORDS.len() as u8, seed);
    let mut text = Vec::with_capacity(len + 16);
    for pick in picks {
        if text.len() >= len {
            break;
        }
        text.extend_from_slice(WORDS[pick as usize]);
    }
    text.truncate(len);
    text
}
