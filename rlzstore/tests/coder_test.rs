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

use googletest::assert_that;
use googletest::prelude::contains_substring;
use proptest::prelude::*;
use rlzstore::bits::BitReader;
use rlzstore::bits::BitWriter;
use rlzstore::coder::CoderKind;

fn values() -> impl Strategy<Value = Vec<u32>> {
    prop_oneof![
        prop::collection::vec(any::<u32>(), 0..512),
        prop::collection::vec(0u32..256, 0..2048),
        prop::collection::vec(prop_oneof![Just(0u32), Just(u32::MAX)], 0..64),
    ]
}

// Encodes `values` twice behind a misaligned prefix and decodes both copies.
fn check_roundtrip(kind: CoderKind, values: &[u32]) -> Result<(), TestCaseError> {
    let mut coder = kind.build(None).unwrap();
    let mut out = BitWriter::new();
    out.put_int(0b101, 3);
    coder.encode(&mut out, values).unwrap();
    coder.encode(&mut out, values).unwrap();
    out.put_int(0b11, 2);
    let bytes = out.into_bytes();

    let mut decoder = kind.build(None).unwrap();
    let mut input = BitReader::new(&bytes);
    prop_assert_eq!(input.get_int(3).unwrap(), 0b101);
    for _ in 0..2 {
        let mut decoded = vec![0; values.len()];
        decoder.decode(&mut input, &mut decoded).unwrap();
        prop_assert_eq!(&decoded, values);
    }
    prop_assert_eq!(input.get_int(2).unwrap(), 0b11);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn test_fixed_width_roundtrip(values in values()) {
        check_roundtrip(CoderKind::FixedWidth, &values)?;
    }

    #[test]
    fn test_aligned_u32_roundtrip(values in values()) {
        check_roundtrip(CoderKind::AlignedU32, &values)?;
    }

    #[test]
    fn test_vbyte_roundtrip(values in values()) {
        check_roundtrip(CoderKind::VByte, &values)?;
    }

    #[test]
    fn test_elias_gamma_roundtrip(values in values()) {
        check_roundtrip(CoderKind::EliasGamma, &values)?;
    }

    #[test]
    fn test_elias_delta_roundtrip(values in values()) {
        check_roundtrip(CoderKind::EliasDelta, &values)?;
    }

    #[test]
    fn test_deflate_roundtrip(values in values()) {
        check_roundtrip(CoderKind::Deflate { level: 6 }, &values)?;
    }

    #[test]
    fn test_lzma_roundtrip(values in values()) {
        check_roundtrip(CoderKind::Lzma { level: 1 }, &values)?;
    }

    #[test]
    fn test_lz4_roundtrip(values in values()) {
        check_roundtrip(CoderKind::Lz4, &values)?;
    }

    #[test]
    fn test_bzip2_roundtrip(values in values()) {
        check_roundtrip(CoderKind::Bzip2 { level: 1 }, &values)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_byte_arrays_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
        for kind in [
            CoderKind::FixedWidth,
            CoderKind::AlignedU32,
            CoderKind::VByte,
            CoderKind::EliasGamma,
            CoderKind::EliasDelta,
            CoderKind::Deflate { level: 1 },
            CoderKind::Lzma { level: 0 },
            CoderKind::Lz4,
            CoderKind::Bzip2 { level: 1 },
        ] {
            let mut coder = kind.build(None).unwrap();
            let mut out = BitWriter::new();
            coder.encode_bytes(&mut out, &bytes).unwrap();
            let encoded = out.into_bytes();
            let mut decoded = vec![0; bytes.len()];
            coder
                .decode_bytes(&mut BitReader::new(&encoded), &mut decoded)
                .unwrap();
            prop_assert_eq!(&decoded, &bytes, "{}", kind);
        }
    }
}

#[test]
fn test_deflate_preset_dictionary_roundtrip() {
    let preset = b"alpha beta gamma delta epsilon".repeat(4);
    let values: Vec<u32> = b"gamma delta alpha beta".iter().map(|&b| b as u32).collect();
    let kind = CoderKind::Deflate { level: 9 };

    let mut coder = kind.build(Some(&preset)).unwrap();
    let mut out = BitWriter::new();
    coder.encode(&mut out, &values).unwrap();
    coder.reset().unwrap();
    coder.encode(&mut out, &values).unwrap();
    let bytes = out.into_bytes();

    let mut decoder = kind.build(Some(&preset)).unwrap();
    let mut input = BitReader::new(&bytes);
    for _ in 0..2 {
        let mut decoded = vec![0; values.len()];
        decoder.decode(&mut input, &mut decoded).unwrap();
        decoder.reset().unwrap();
        assert_eq!(decoded, values);
    }
}

#[test]
fn test_invalid_levels() {
    for kind in [
        CoderKind::Deflate { level: 10 },
        CoderKind::Lzma { level: 12 },
        CoderKind::Bzip2 { level: 0 },
    ] {
        let err = kind.build(None).err().unwrap();
        assert_that!(err.message(), contains_substring("invalid level"));
    }
}

#[test]
fn test_truncated_stream() {
    let values: Vec<u32> = (0..100).collect();
    for kind in [
        CoderKind::FixedWidth,
        CoderKind::VByte,
        CoderKind::EliasDelta,
        CoderKind::Deflate { level: 6 },
        CoderKind::Lz4,
    ] {
        let mut coder = kind.build(None).unwrap();
        let mut out = BitWriter::new();
        coder.encode(&mut out, &values).unwrap();
        let bytes = out.into_bytes();
        let mut decoded = vec![0; values.len()];
        let truncated = &bytes[..bytes.len() / 2];
        assert!(
            coder
                .decode(&mut BitReader::new(truncated), &mut decoded)
                .is_err(),
            "{kind}"
        );
    }
}
