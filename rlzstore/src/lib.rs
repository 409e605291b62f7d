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

//! Relative Lempel-Ziv compression of large texts against a fixed dictionary.
//!
//! A bounded dictionary is chosen from the text, indexed for substring search, and the
//! text is greedily parsed block by block into factors: literal bytes or copies of
//! dictionary substrings. The encoded factors of every block are independent, so a
//! single block decodes without touching the rest of the store.
//!
//! The main entry points are [`RlzStore`](store::RlzStore) and its
//! [`builder`](store::RlzStore::builder). Lower layers are public for reuse:
//!
//! - [`countmin`]: count-min sketch and sharded window frequency estimation
//! - [`hash`]: rolling window hash and content hashing
//! - [`index`]: dictionary indexes supporting backward search
//! - [`factor`]: the greedy factorizer and the per-block factor coder
//! - [`coder`]: integer and general-purpose codecs for factor sub-streams
//!
//! # Examples
//!
//! ```
//! use rlzstore::dict::Dictionary;
//! use rlzstore::store::RlzStore;
//!
//! let text = b"to be or not to be, that is the question".repeat(50);
//! let dict = Dictionary::from_content(b"to be or not to be, that is the question".to_vec())
//!     .unwrap();
//! let store = RlzStore::builder().block_size(64).build(&text, dict).unwrap();
//!
//! assert_eq!(store.size(), text.len() as u64);
//! assert_eq!(store.block(3).unwrap(), &text[192..256]);
//! ```

pub mod bits;
pub mod coder;
pub mod countmin;
pub mod dict;
pub mod error;
pub mod factor;
pub mod hash;
pub mod index;
pub mod store;

mod codec;
mod common;

pub use self::codec::Family;
