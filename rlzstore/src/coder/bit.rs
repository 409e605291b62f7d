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

use byteorder::ByteOrder;
use byteorder::LittleEndian;

use crate::bits::BitReader;
use crate::bits::BitWriter;
use crate::coder::ByteCodec;
use crate::coder::CoderKind;
use crate::common::bit_width;
use crate::error::Error;

const WIDTH_BITS: u32 = 6;

/// Every value in the bit width of the largest one.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedWidthCoder;

impl ByteCodec for FixedWidthCoder {
    fn kind(&self) -> CoderKind {
        CoderKind::FixedWidth
    }

    fn encode(&mut self, out: &mut BitWriter, values: &[u32]) -> Result<(), Error> {
        if values.is_empty() {
            return Ok(());
        }
        let max = values.iter().copied().max().unwrap_or(0);
        let width = bit_width(max as u64);
        out.put_int(width as u64, WIDTH_BITS);
        for &v in values {
            out.put_int(v as u64, width);
        }
        Ok(())
    }

    fn decode(&mut self, input: &mut BitReader<'_>, values: &mut [u32]) -> Result<(), Error> {
        if values.is_empty() {
            return Ok(());
        }
        let width = input.get_int(WIDTH_BITS)? as u32;
        if width > 32 {
            return Err(Error::codec(format!("fixed width out of range: {width}")));
        }
        for v in values.iter_mut() {
            *v = input.get_int(width)? as u32;
        }
        Ok(())
    }
}

/// Byte aligned little-endian 32 bit words.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlignedU32Coder;

impl ByteCodec for AlignedU32Coder {
    fn kind(&self) -> CoderKind {
        CoderKind::AlignedU32
    }

    fn encode(&mut self, out: &mut BitWriter, values: &[u32]) -> Result<(), Error> {
        let mut buf = vec![0u8; values.len() * 4];
        LittleEndian::write_u32_into(values, &mut buf);
        out.put_bytes(&buf);
        Ok(())
    }

    fn decode(&mut self, input: &mut BitReader<'_>, values: &mut [u32]) -> Result<(), Error> {
        let buf = input.get_bytes(values.len() * 4)?;
        LittleEndian::read_u32_into(buf, values);
        Ok(())
    }
}

/// Seven value bits per byte, least significant group first; the high bit marks that
/// more bytes follow.
#[derive(Debug, Default, Clone, Copy)]
pub struct VByteCoder;

impl ByteCodec for VByteCoder {
    fn kind(&self) -> CoderKind {
        CoderKind::VByte
    }

    fn encode(&mut self, out: &mut BitWriter, values: &[u32]) -> Result<(), Error> {
        for &v in values {
            let mut v = v;
            while v >= 0x80 {
                out.put_int(((v & 0x7f) | 0x80) as u64, 8);
                v >>= 7;
            }
            out.put_int(v as u64, 8);
        }
        Ok(())
    }

    fn decode(&mut self, input: &mut BitReader<'_>, values: &mut [u32]) -> Result<(), Error> {
        for v in values.iter_mut() {
            let mut value = 0u64;
            let mut shift = 0;
            loop {
                let byte = input.get_int(8)?;
                value |= (byte & 0x7f) << shift;
                if byte & 0x80 == 0 {
                    break;
                }
                shift += 7;
                if shift > 28 {
                    return Err(Error::codec("vbyte value longer than 5 bytes"));
                }
            }
            *v = u32::try_from(value)
                .map_err(|_| Error::codec(format!("vbyte value overflows u32: {value}")))?;
        }
        Ok(())
    }
}

/// Elias gamma code of `value + 1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EliasGammaCoder;

impl ByteCodec for EliasGammaCoder {
    fn kind(&self) -> CoderKind {
        CoderKind::EliasGamma
    }

    fn encode(&mut self, out: &mut BitWriter, values: &[u32]) -> Result<(), Error> {
        for &v in values {
            put_gamma(out, v as u64 + 1);
        }
        Ok(())
    }

    fn decode(&mut self, input: &mut BitReader<'_>, values: &mut [u32]) -> Result<(), Error> {
        for v in values.iter_mut() {
            *v = shifted_value(get_gamma(input)?)?;
        }
        Ok(())
    }
}

/// Elias delta code of `value + 1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EliasDeltaCoder;

impl ByteCodec for EliasDeltaCoder {
    fn kind(&self) -> CoderKind {
        CoderKind::EliasDelta
    }

    fn encode(&mut self, out: &mut BitWriter, values: &[u32]) -> Result<(), Error> {
        for &v in values {
            let x = v as u64 + 1;
            let width = bit_width(x);
            put_gamma(out, width as u64);
            out.put_int(x, width - 1);
        }
        Ok(())
    }

    fn decode(&mut self, input: &mut BitReader<'_>, values: &mut [u32]) -> Result<(), Error> {
        for v in values.iter_mut() {
            let width = get_gamma(input)?;
            if width > 33 {
                return Err(Error::codec(format!("elias delta width out of range: {width}")));
            }
            let width = width as u32;
            let x = (1u64 << (width - 1)) | input.get_int(width - 1)?;
            *v = shifted_value(x)?;
        }
        Ok(())
    }
}

// x >= 1: unary length, then the bits below the leading one
fn put_gamma(out: &mut BitWriter, x: u64) {
    let width = bit_width(x);
    out.put_unary(width as u64 - 1);
    out.put_int(x, width - 1);
}

fn get_gamma(input: &mut BitReader<'_>) -> Result<u64, Error> {
    let zeros = input.get_unary()?;
    if zeros > 63 {
        return Err(Error::codec(format!("elias gamma prefix too long: {zeros}")));
    }
    Ok((1u64 << zeros) | input.get_int(zeros as u32)?)
}

fn shifted_value(x: u64) -> Result<u32, Error> {
    u32::try_from(x - 1).map_err(|_| Error::codec(format!("decoded value overflows u32: {}", x - 1)))
}
