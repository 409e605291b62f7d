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

use crate::error::Error;
use crate::factor::Factor;

/// Scratch buffers holding the factors of one block in stream form.
///
/// `lengths` has one entry per factor. Factors with a length of at most the literal
/// threshold contribute their bytes to `literals`, all others one entry to `offsets`.
/// An offset at or past the dictionary length addresses the current block instead:
/// `offset - dictionary_len` is the position the copy starts at.
#[derive(Debug, Default, Clone)]
pub(crate) struct BlockFactors {
    pub lengths: Vec<u32>,
    pub offsets: Vec<u32>,
    pub literals: Vec<u8>,
}

impl BlockFactors {
    pub fn clear(&mut self) {
        self.lengths.clear();
        self.offsets.clear();
        self.literals.clear();
    }

    pub fn num_factors(&self) -> usize {
        self.lengths.len()
    }

    /// Appends a factor covering `text`. `offset` is only used for factors longer than
    /// `literal_threshold`.
    pub fn add_factor(&mut self, literal_threshold: u32, text: &[u8], offset: u32) {
        let len = text.len() as u32;
        debug_assert!(len > 0);
        self.lengths.push(len);
        if len <= literal_threshold {
            self.literals.extend_from_slice(text);
        } else {
            self.offsets.push(offset);
        }
    }

    /// Rebuilds the block text into `out`, which is cleared first.
    pub fn reconstruct(
        &self,
        literal_threshold: u32,
        dictionary: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        out.clear();
        let mut literals = self.literals.as_slice();
        let mut offsets = self.offsets.iter();
        for &len in &self.lengths {
            let len = len as usize;
            if len <= literal_threshold as usize {
                let (head, tail) = literals
                    .split_at_checked(len)
                    .ok_or_else(|| Error::codec("literal stream exhausted"))?;
                out.extend_from_slice(head);
                literals = tail;
                continue;
            }

            let offset = *offsets
                .next()
                .ok_or_else(|| Error::codec("offset stream exhausted"))? as usize;
            if offset < dictionary.len() {
                let src = dictionary
                    .get(offset..offset + len)
                    .ok_or_else(|| copy_out_of_range(offset, len, dictionary.len()))?;
                out.extend_from_slice(src);
            } else {
                let position = offset - dictionary.len();
                if position >= out.len() {
                    return Err(copy_out_of_range(position, len, out.len()));
                }
                // may overlap the bytes being written
                for i in position..position + len {
                    let b = out[i];
                    out.push(b);
                }
            }
        }
        Ok(())
    }

    /// Converts the stream form into [`Factor`]s.
    pub fn to_factors(&self, literal_threshold: u32, dictionary_len: usize, out: &mut Vec<Factor>) {
        out.clear();
        let mut literals = self.literals.as_slice();
        let mut offsets = self.offsets.iter();
        for &len in &self.lengths {
            if len <= literal_threshold {
                let (head, tail) = literals.split_at(len as usize);
                out.push(Factor::Literal(head.to_vec()));
                literals = tail;
            } else {
                let offset = offsets.next().copied().unwrap_or_default();
                out.push(match offset.checked_sub(dictionary_len as u32) {
                    Some(position) => Factor::Local { position, len },
                    None => Factor::Dictionary { offset, len },
                });
            }
        }
    }
}

fn copy_out_of_range(start: usize, len: usize, available: usize) -> Error {
    Error::codec("copy factor out of range")
        .with_context("start", start)
        .with_context("len", len)
        .with_context("available", available)
}
