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

//! Bit-addressable streams.
//!
//! Bits are packed least significant first: bit `i` of the stream is bit `i % 8` of
//! byte `i / 8`. An integer written with [`BitWriter::put_int`] occupies `width`
//! consecutive bits, least significant bit first.

use crate::error::Error;

/// Append-only bit stream.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    len_bits: u64,
}

impl BitWriter {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far.
    pub fn len_bits(&self) -> u64 {
        self.len_bits
    }

    /// Returns true if the stream position is on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.len_bits % 8 == 0
    }

    /// Writes the low `width` bits of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is greater than 64.
    pub fn put_int(&mut self, mut value: u64, mut width: u32) {
        assert!(width <= 64, "width must be at most 64, got {width}");
        if width < 64 {
            value &= (1u64 << width) - 1;
        }
        while width > 0 {
            let offset = (self.len_bits % 8) as u32;
            if offset == 0 {
                self.bytes.push(0);
            }
            let take = (8 - offset).min(width);
            let chunk = (value & ((1u64 << take) - 1)) as u8;
            let last = self.bytes.len() - 1;
            self.bytes[last] |= chunk << offset;
            value >>= take;
            width -= take;
            self.len_bits += take as u64;
        }
    }

    /// Writes `zeros` zero bits followed by a single one bit.
    pub fn put_unary(&mut self, mut zeros: u64) {
        while zeros > 0 {
            let chunk = zeros.min(64) as u32;
            self.put_int(0, chunk);
            zeros -= chunk as u64;
        }
        self.put_int(1, 1);
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn align8(&mut self) {
        self.len_bits = self.bytes.len() as u64 * 8;
    }

    /// Writes raw bytes starting at the next byte boundary.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.align8();
        self.bytes.extend_from_slice(bytes);
        self.len_bits = self.bytes.len() as u64 * 8;
    }

    /// Bytes written so far. A trailing partial byte is zero padded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the stream and returns its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Read cursor over a bit stream written by [`BitWriter`].
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current bit position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Moves the cursor to an absolute bit position.
    pub fn seek(&mut self, pos: u64) -> Result<(), Error> {
        if pos > self.len_bits() {
            return Err(Error::codec(format!(
                "seek to bit {pos} past the end of a {} bit stream",
                self.len_bits()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn len_bits(&self) -> u64 {
        self.bytes.len() as u64 * 8
    }

    /// Reads an integer of `width` bits.
    pub fn get_int(&mut self, width: u32) -> Result<u64, Error> {
        assert!(width <= 64, "width must be at most 64, got {width}");
        if self.pos + width as u64 > self.len_bits() {
            return Err(exhausted(self.pos, width as u64));
        }
        let mut value = 0u64;
        let mut done = 0u32;
        while done < width {
            let byte = self.bytes[(self.pos / 8) as usize];
            let offset = (self.pos % 8) as u32;
            let take = (8 - offset).min(width - done);
            let chunk = ((byte >> offset) as u64) & ((1u64 << take) - 1);
            value |= chunk << done;
            done += take;
            self.pos += take as u64;
        }
        Ok(value)
    }

    /// Reads a run of zero bits terminated by a one bit and returns the number of zeros.
    pub fn get_unary(&mut self) -> Result<u64, Error> {
        let start = self.pos;
        loop {
            if self.get_int(1)? == 1 {
                return Ok(self.pos - start - 1);
            }
        }
    }

    /// Skips to the next byte boundary.
    pub fn align8(&mut self) {
        self.pos = self.pos.div_ceil(8) * 8;
    }

    /// Reads `len` raw bytes starting at the next byte boundary.
    pub fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.align8();
        let start = (self.pos / 8) as usize;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| exhausted(self.pos, len as u64 * 8))?;
        self.pos = end as u64 * 8;
        Ok(&self.bytes[start..end])
    }
}

fn exhausted(pos: u64, wanted: u64) -> Error {
    Error::codec("bit stream exhausted")
        .with_context("position", pos)
        .with_context("wanted_bits", wanted)
}
