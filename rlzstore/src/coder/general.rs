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

use std::io::Read;
use std::io::Write;

use byteorder::ByteOrder;
use byteorder::LittleEndian;
use flate2::Compress;
use flate2::Compression;
use flate2::Decompress;
use flate2::FlushCompress;
use flate2::FlushDecompress;
use flate2::Status;

use crate::bits::BitReader;
use crate::bits::BitWriter;
use crate::coder::ByteCodec;
use crate::coder::CoderKind;
use crate::error::Error;

/// Byte-oriented compressor wrapped into a [`ByteCodec`].
///
/// Values are compressed as little-endian 32 bit words. The payload is written at a
/// byte boundary after a 32 bit byte length, so a decoder can skip or bound it without
/// understanding the format.
trait Compressor: Send {
    fn kind(&self) -> CoderKind;

    fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>, Error>;

    fn decompress(&mut self, payload: &[u8], expected_len: usize) -> Result<Vec<u8>, Error>;

    fn reset(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

fn put_frame(out: &mut BitWriter, payload: &[u8]) -> Result<(), Error> {
    let len = u32::try_from(payload.len())
        .map_err(|_| Error::codec("compressed payload exceeds 4 GiB"))?;
    out.align8();
    out.put_int(len as u64, 32);
    out.put_bytes(payload);
    Ok(())
}

fn get_frame<'a>(input: &mut BitReader<'a>) -> Result<&'a [u8], Error> {
    input.align8();
    let len = input.get_int(32)? as usize;
    input.get_bytes(len)
}

fn check_len(kind: CoderKind, decoded: &[u8], expected_len: usize) -> Result<(), Error> {
    if decoded.len() == expected_len {
        Ok(())
    } else {
        Err(Error::codec(format!(
            "{kind} payload decoded to {} bytes, expected {expected_len}",
            decoded.len()
        )))
    }
}

fn encode_words<C: Compressor>(coder: &mut C, out: &mut BitWriter, values: &[u32]) -> Result<(), Error> {
    let mut buf = vec![0u8; values.len() * 4];
    LittleEndian::write_u32_into(values, &mut buf);
    encode_payload(coder, out, &buf)
}

fn decode_words<C: Compressor>(
    coder: &mut C,
    input: &mut BitReader<'_>,
    values: &mut [u32],
) -> Result<(), Error> {
    let mut buf = vec![0u8; values.len() * 4];
    decode_payload(coder, input, &mut buf)?;
    LittleEndian::read_u32_into(&buf, values);
    Ok(())
}

fn encode_payload<C: Compressor>(coder: &mut C, out: &mut BitWriter, bytes: &[u8]) -> Result<(), Error> {
    if bytes.is_empty() {
        return Ok(());
    }
    let payload = coder.compress(bytes)?;
    put_frame(out, &payload)
}

fn decode_payload<C: Compressor>(
    coder: &mut C,
    input: &mut BitReader<'_>,
    bytes: &mut [u8],
) -> Result<(), Error> {
    if bytes.is_empty() {
        return Ok(());
    }
    let payload = get_frame(input)?;
    let decoded = coder.decompress(payload, bytes.len())?;
    check_len(Compressor::kind(coder), &decoded, bytes.len())?;
    bytes.copy_from_slice(&decoded);
    Ok(())
}

macro_rules! framed_codec {
    ($($coder:ty),*) => {$(
        impl ByteCodec for $coder {
            fn kind(&self) -> CoderKind {
                Compressor::kind(self)
            }

            fn encode(&mut self, out: &mut BitWriter, values: &[u32]) -> Result<(), Error> {
                encode_words(self, out, values)
            }

            fn decode(&mut self, input: &mut BitReader<'_>, values: &mut [u32]) -> Result<(), Error> {
                decode_words(self, input, values)
            }

            fn encode_bytes(&mut self, out: &mut BitWriter, bytes: &[u8]) -> Result<(), Error> {
                encode_payload(self, out, bytes)
            }

            fn decode_bytes(&mut self, input: &mut BitReader<'_>, bytes: &mut [u8]) -> Result<(), Error> {
                decode_payload(self, input, bytes)
            }

            fn reset(&mut self) -> Result<(), Error> {
                Compressor::reset(self)
            }
        }
    )*};
}

framed_codec!(DeflateCoder, LzmaCoder, Lz4Coder, Bzip2Coder);

/// Raw deflate with an optional preset dictionary.
///
/// The compressor and decompressor streams are owned by the coder and reused. A stream
/// that has produced a payload is reset before the next one, and the preset dictionary
/// is installed again after every reset.
pub struct DeflateCoder {
    level: u8,
    preset: Option<Vec<u8>>,
    compress: Compress,
    decompress: Decompress,
    compress_dirty: bool,
    decompress_dirty: bool,
}

impl DeflateCoder {
    pub fn new(level: u8, preset: Option<&[u8]>) -> Result<Self, Error> {
        let mut coder = Self {
            level,
            preset: preset.filter(|p| !p.is_empty()).map(|p| p.to_vec()),
            compress: Compress::new(Compression::new(level as u32), false),
            decompress: Decompress::new(false),
            compress_dirty: false,
            decompress_dirty: false,
        };
        coder.prime_compress()?;
        coder.prime_decompress()?;
        Ok(coder)
    }

    fn prime_compress(&mut self) -> Result<(), Error> {
        if let Some(preset) = &self.preset {
            self.compress
                .set_dictionary(preset)
                .map_err(|e| Error::codec("failed to install deflate preset").set_source(e))?;
        }
        Ok(())
    }

    fn prime_decompress(&mut self) -> Result<(), Error> {
        if let Some(preset) = &self.preset {
            self.decompress
                .set_dictionary(preset)
                .map_err(|e| Error::codec("failed to install inflate preset").set_source(e))?;
        }
        Ok(())
    }

    fn reset_compress(&mut self) -> Result<(), Error> {
        self.compress.reset();
        self.compress_dirty = false;
        self.prime_compress()
    }

    fn reset_decompress(&mut self) -> Result<(), Error> {
        self.decompress.reset(false);
        self.decompress_dirty = false;
        self.prime_decompress()
    }
}

impl Compressor for DeflateCoder {
    fn kind(&self) -> CoderKind {
        CoderKind::Deflate { level: self.level }
    }

    fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>, Error> {
        if self.compress_dirty {
            self.reset_compress()?;
        }
        self.compress_dirty = true;

        let mut out = Vec::with_capacity(input.len() / 2 + 64);
        let start = self.compress.total_in();
        loop {
            let consumed = (self.compress.total_in() - start) as usize;
            let status = self
                .compress
                .compress_vec(&input[consumed..], &mut out, FlushCompress::Finish)
                .map_err(|e| Error::codec("deflate failed").set_source(e))?;
            match status {
                Status::StreamEnd => return Ok(out),
                Status::Ok | Status::BufError => out.reserve(out.capacity().max(64)),
            }
        }
    }

    fn decompress(&mut self, payload: &[u8], expected_len: usize) -> Result<Vec<u8>, Error> {
        if self.decompress_dirty {
            self.reset_decompress()?;
        }
        self.decompress_dirty = true;

        let mut out = Vec::with_capacity(expected_len + 1);
        let start = self.decompress.total_in();
        loop {
            let consumed = (self.decompress.total_in() - start) as usize;
            let produced = out.len();
            let status = self
                .decompress
                .decompress_vec(&payload[consumed..], &mut out, FlushDecompress::Finish)
                .map_err(|e| Error::codec("corrupt deflate stream").set_source(e))?;
            match status {
                Status::StreamEnd => return Ok(out),
                Status::Ok | Status::BufError => {
                    let progressed = out.len() > produced
                        || (self.decompress.total_in() - start) as usize > consumed;
                    if out.len() == out.capacity() {
                        out.reserve(64);
                    } else if !progressed {
                        return Err(Error::codec("truncated deflate stream"));
                    }
                }
            }
        }
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.reset_compress()?;
        self.reset_decompress()
    }
}

/// xz container around LZMA2. Every payload is a complete, independent xz stream.
#[derive(Debug, Clone, Copy)]
pub struct LzmaCoder {
    level: u8,
}

impl LzmaCoder {
    pub fn new(level: u8) -> Self {
        Self { level }
    }
}

impl Compressor for LzmaCoder {
    fn kind(&self) -> CoderKind {
        CoderKind::Lzma { level: self.level }
    }

    fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>, Error> {
        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), self.level as u32);
        encoder
            .write_all(input)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::codec("lzma compression failed").set_source(e))
    }

    fn decompress(&mut self, payload: &[u8], expected_len: usize) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(expected_len);
        xz2::read::XzDecoder::new(payload)
            .read_to_end(&mut out)
            .map_err(|e| Error::codec("corrupt lzma stream").set_source(e))?;
        Ok(out)
    }
}

/// LZ4 block format.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4Coder;

impl Compressor for Lz4Coder {
    fn kind(&self) -> CoderKind {
        CoderKind::Lz4
    }

    fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(lz4_flex::block::compress(input))
    }

    fn decompress(&mut self, payload: &[u8], expected_len: usize) -> Result<Vec<u8>, Error> {
        lz4_flex::block::decompress(payload, expected_len)
            .map_err(|e| Error::codec("corrupt lz4 block").set_source(e))
    }
}

/// bzip2 with the given block size level.
#[derive(Debug, Clone, Copy)]
pub struct Bzip2Coder {
    level: u8,
}

impl Bzip2Coder {
    pub fn new(level: u8) -> Self {
        Self { level }
    }
}

impl Compressor for Bzip2Coder {
    fn kind(&self) -> CoderKind {
        CoderKind::Bzip2 { level: self.level }
    }

    fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>, Error> {
        let mut encoder =
            bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::new(self.level as u32));
        encoder
            .write_all(input)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::codec("bzip2 compression failed").set_source(e))
    }

    fn decompress(&mut self, payload: &[u8], expected_len: usize) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(expected_len);
        bzip2::read::BzDecoder::new(payload)
            .read_to_end(&mut out)
            .map_err(|e| Error::codec("corrupt bzip2 stream").set_source(e))?;
        Ok(out)
    }
}
