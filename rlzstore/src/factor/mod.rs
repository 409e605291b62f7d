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

//! Greedy factorization of text blocks against a dictionary index.
//!
//! A block is parsed left to right. At each position the longest prefix of the remaining
//! block that occurs in the dictionary becomes one factor; a byte that does not occur at
//! all becomes a one byte literal. Factors never extend past the end of their block, so
//! every block decodes on its own.
//!
//! Factors of at most `literal_threshold` bytes are stored as literal bytes, longer ones
//! as a dictionary offset. Whether a factor is literal is always derived from its length,
//! never stored.

mod coder;
mod data;
mod factorizer;
mod local;
mod selector;

pub use self::coder::CoderConfig;
pub use self::coder::FactorCoder;
pub use self::coder::StreamLayout;
pub(crate) use self::data::BlockFactors;
pub use self::factorizer::Factorizer;
pub use self::selector::FactorSelector;
pub use self::selector::SelectFirst;
pub use self::selector::SelectLast;
pub use self::selector::SelectMinimal;
pub use self::selector::SelectorKind;

/// Default upper bound on the length of a literal factor.
pub const DEFAULT_LITERAL_THRESHOLD: u32 = 3;

/// One unit of the compressed representation of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Factor {
    /// Bytes stored verbatim.
    Literal(Vec<u8>),
    /// `len` bytes copied from the dictionary starting at `offset`.
    Dictionary { offset: u32, len: u32 },
    /// `len` bytes copied from earlier in the same block, starting `position` bytes into
    /// the block. The copy may overlap its own output.
    Local { position: u32, len: u32 },
}

impl Factor {
    /// Number of text bytes this factor stands for; always at least 1.
    pub fn len(&self) -> usize {
        match self {
            Factor::Literal(bytes) => bytes.len(),
            Factor::Dictionary { len, .. } | Factor::Local { len, .. } => *len as usize,
        }
    }

    /// Always false for factors produced by a factorizer or decoder.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Factor::Literal(_))
    }
}
