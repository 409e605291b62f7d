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

//! Substring search over a dictionary.
//!
//! A [`DictionaryIndex`] narrows a range of suffix array rows one symbol at a time: the
//! rows in a range are exactly the dictionary positions where the pattern read so far
//! occurs. Two implementations are provided:
//!
//! * [`FmIndex`] runs backward search over the reversed dictionary using rank queries on
//!   its Burrows-Wheeler transform.
//! * [`SaIndex`] binary searches a forward suffix array at the current match depth.
//!
//! Both resolve a range to a dictionary offset either by rank (first or last row) or by
//! a range-minimum query that yields the smallest offset.
//!
//! # Usage
//!
//! ```rust
//! use rlzstore::dict::Dictionary;
//! use rlzstore::index::IndexKind;
//!
//! let dict = Dictionary::from_content(b"abracadabra".to_vec()).unwrap();
//! let index = IndexKind::Fm.build(&dict).unwrap();
//!
//! let mut range = index.full_range();
//! for (depth, &sym) in b"abra".iter().enumerate() {
//!     range = index.extend(range, depth, sym).unwrap();
//! }
//! assert_eq!(range.len(), 2);
//! assert_eq!(index.offset_at(index.find_minimum(range), 4), 0);
//! ```

mod fm;
mod rmq;
mod sa;
mod suffix_array;
mod wavelet;

pub use self::fm::FmIndex;
pub use self::sa::SaIndex;

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use crate::codec::ArtifactBytes;
use crate::codec::ArtifactSlice;
use crate::codec::Family;
use crate::codec::assert::ensure_fully_consumed;
use crate::codec::assert::ensure_preamble;
use crate::dict::Dictionary;
use crate::error::Error;

/// Inclusive range `[sp, ep]` of suffix array rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaRange {
    pub sp: usize,
    pub ep: usize,
}

impl SaRange {
    /// Number of rows in the range.
    pub fn len(&self) -> usize {
        self.ep + 1 - self.sp
    }

    /// Ranges produced by an index are never empty; an empty continuation is reported
    /// as `None` instead.
    pub fn is_empty(&self) -> bool {
        self.sp > self.ep
    }
}

/// Read-only substring index over a dictionary.
pub trait DictionaryIndex: Send + Sync {
    fn kind(&self) -> IndexKind;

    /// Content hash of the dictionary this index was built from.
    fn dictionary_hash(&self) -> u64;

    /// Content length of the dictionary, excluding the sentinel.
    fn dictionary_len(&self) -> usize;

    /// The range matching the empty pattern.
    fn full_range(&self) -> SaRange;

    /// Narrows `range`, whose rows all match a pattern of length `depth`, to the rows
    /// matching that pattern followed by `sym`. Returns `None` if no row does.
    fn extend(&self, range: SaRange, depth: usize, sym: u8) -> Option<SaRange>;

    /// Dictionary offset of the match of length `len` at row `rank`.
    fn offset_at(&self, rank: usize, len: usize) -> u32;

    /// Row of `range` whose match starts at the smallest dictionary offset.
    fn find_minimum(&self, range: SaRange) -> usize;

    /// Serialized form, loadable with [`deserialize_index`].
    fn serialize(&self) -> Vec<u8>;
}

/// Selects a [`DictionaryIndex`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexKind {
    /// Backward search over the reversed dictionary.
    #[default]
    Fm,
    /// Binary search over a forward suffix array.
    SuffixArray,
}

impl IndexKind {
    pub(crate) fn id(self) -> u8 {
        match self {
            IndexKind::Fm => 1,
            IndexKind::SuffixArray => 2,
        }
    }

    pub(crate) fn from_id(id: u8) -> Result<Self, Error> {
        match id {
            1 => Ok(IndexKind::Fm),
            2 => Ok(IndexKind::SuffixArray),
            _ => Err(Error::deserial(format!("unknown index kind: {id}"))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IndexKind::Fm => "fm",
            IndexKind::SuffixArray => "sa",
        }
    }

    /// Builds an index of this kind over `dict`.
    pub fn build(self, dict: &Dictionary) -> Result<Box<dyn DictionaryIndex>, Error> {
        let index: Box<dyn DictionaryIndex> = match self {
            IndexKind::Fm => Box::new(FmIndex::build(dict)),
            IndexKind::SuffixArray => Box::new(SaIndex::build(dict)),
        };
        tracing::info!(
            kind = self.name(),
            dictionary_len = dict.len(),
            "built dictionary index"
        );
        Ok(index)
    }

    /// File name of the persisted index for a dictionary hash.
    pub fn file_name(self, dictionary_hash: u64) -> String {
        format!("index-{}-{dictionary_hash:016x}.bin", self.name())
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fm" => Ok(IndexKind::Fm),
            "sa" => Ok(IndexKind::SuffixArray),
            _ => Err(Error::config(format!("unknown index kind: {s}"))),
        }
    }
}

fn serialize_index(kind: IndexKind, dictionary_hash: u64, n: usize, sa: &[u32]) -> Vec<u8> {
    let family = Family::DICTIONARY_INDEX;
    let mut bytes = ArtifactBytes::with_capacity(2 + 1 + 8 + 8 + sa.len() * 4);
    bytes.write_u8(family.id);
    bytes.write_u8(family.serial_version);
    bytes.write_u8(kind.id());
    bytes.write_u64_le(dictionary_hash);
    bytes.write_u64_le(n as u64);
    for &s in sa {
        bytes.write_u32_le(s);
    }
    bytes.into_bytes()
}

/// Loads an index written by [`DictionaryIndex::serialize`] for `dict`.
///
/// # Errors
///
/// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if the
/// index was built from a different dictionary, and
/// [`ErrorKind::MalformedData`](crate::error::ErrorKind::MalformedData) if the bytes are not
/// a valid index.
pub fn deserialize_index(bytes: &[u8], dict: &Dictionary) -> Result<Box<dyn DictionaryIndex>, Error> {
    fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
        move |_| Error::insufficient_data(tag)
    }

    let family = Family::DICTIONARY_INDEX;
    let mut cursor = ArtifactSlice::new(bytes);
    ensure_preamble(&mut cursor, &family)?;
    let kind = IndexKind::from_id(cursor.read_u8().map_err(make_error("kind"))?)?;
    let dictionary_hash = cursor.read_u64_le().map_err(make_error("dictionary_hash"))?;
    let n = cursor.read_u64_le().map_err(make_error("dictionary_len"))?;

    if dictionary_hash != dict.hash() {
        return Err(Error::config("index was built for a different dictionary")
            .with_context("index_hash", format!("{dictionary_hash:016x}"))
            .with_context("dictionary_hash", format!("{:016x}", dict.hash())));
    }
    if n != dict.len() as u64 {
        return Err(Error::deserial(format!(
            "index covers {n} bytes but the dictionary has {}",
            dict.len()
        )));
    }

    let rows = match kind {
        IndexKind::Fm => dict.len() + 1,
        IndexKind::SuffixArray => dict.len(),
    };
    if cursor.remaining() / 4 < rows {
        return Err(Error::insufficient_data("suffix_array"));
    }
    let mut seen = vec![false; rows];
    let mut sa = Vec::with_capacity(rows);
    for _ in 0..rows {
        let s = cursor.read_u32_le().map_err(make_error("suffix_array"))?;
        match seen.get_mut(s as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(Error::deserial(format!("invalid suffix array entry: {s}"))),
        }
        sa.push(s);
    }
    ensure_fully_consumed(&cursor, &family)?;

    Ok(match kind {
        IndexKind::Fm => Box::new(FmIndex::from_suffix_array(dict, sa)),
        IndexKind::SuffixArray => Box::new(SaIndex::from_suffix_array(dict, sa)),
    })
}

/// Loads the index of `kind` for `dict` from `dir`, or builds and stores it.
///
/// The file name carries the dictionary hash and the stored hash is checked again on
/// load, so an index left over from a different dictionary is never used. Unreadable or
/// stale files are rebuilt, as is everything when `rebuild` is set.
pub fn load_or_build(
    dir: &Path,
    dict: &Dictionary,
    kind: IndexKind,
    rebuild: bool,
) -> Result<Box<dyn DictionaryIndex>, Error> {
    let path: PathBuf = dir.join(kind.file_name(dict.hash()));
    if !rebuild && path.exists() {
        let loaded = fs::read(&path)
            .map_err(|e| Error::io("failed to read index", e))
            .and_then(|bytes| deserialize_index(&bytes, dict));
        match loaded {
            Ok(index) if index.kind() == kind => {
                tracing::debug!(path = %path.display(), "loaded dictionary index");
                return Ok(index);
            }
            Ok(index) => {
                tracing::warn!(
                    path = %path.display(),
                    found = index.kind().name(),
                    "index kind mismatch, rebuilding"
                );
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "discarding index");
            }
        }
    }

    let index = kind.build(dict)?;
    fs::write(&path, index.serialize()).map_err(|e| {
        Error::io("failed to write index", e).with_context("path", path.display())
    })?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occurrences(text: &[u8], pattern: &[u8]) -> Vec<u32> {
        (0..=text.len().saturating_sub(pattern.len()))
            .filter(|&i| text[i..].starts_with(pattern))
            .map(|i| i as u32)
            .collect()
    }

    fn search(index: &dyn DictionaryIndex, pattern: &[u8]) -> Option<SaRange> {
        let mut range = index.full_range();
        for (depth, &sym) in pattern.iter().enumerate() {
            range = index.extend(range, depth, sym)?;
        }
        Some(range)
    }

    #[test]
    fn test_exact_membership() {
        let content = b"abracadabra\0cab\xffabra";
        let dict = Dictionary::from_content(content.to_vec()).unwrap();
        for kind in [IndexKind::Fm, IndexKind::SuffixArray] {
            let index = kind.build(&dict).unwrap();
            for pattern in [
                &b"a"[..],
                b"abra",
                b"cab",
                b"\0",
                b"a\0c",
                b"\xffab",
                b"abracadabra",
                b"zz",
                b"abrab",
                b"raa",
            ] {
                let expected = occurrences(content, pattern);
                match search(index.as_ref(), pattern) {
                    None => assert!(expected.is_empty(), "{kind}: missed {pattern:?}"),
                    Some(range) => {
                        let mut offsets: Vec<u32> = (range.sp..=range.ep)
                            .map(|rank| index.offset_at(rank, pattern.len()))
                            .collect();
                        offsets.sort_unstable();
                        assert_eq!(offsets, expected, "{kind}: pattern {pattern:?}");
                        let min = index.offset_at(index.find_minimum(range), pattern.len());
                        assert_eq!(min, expected[0], "{kind}: minimum of {pattern:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_symbol_below_dictionary_alphabet() {
        let dict = Dictionary::from_content(b"bcdbcd".to_vec()).unwrap();
        for kind in [IndexKind::Fm, IndexKind::SuffixArray] {
            let index = kind.build(&dict).unwrap();
            for pattern in [&b"a"[..], b"ba", b"\0", b"b\0", b"e", b"de"] {
                assert_eq!(search(index.as_ref(), pattern), None, "{kind}: {pattern:?}");
            }
            let range = search(index.as_ref(), b"bc").unwrap();
            assert_eq!(range.len(), 2, "{kind}");
        }
    }

    #[test]
    fn test_serialize_roundtrip_and_staleness() {
        let dict = Dictionary::from_content(b"mississippi".to_vec()).unwrap();
        let other = Dictionary::from_content(b"mississippI".to_vec()).unwrap();
        for kind in [IndexKind::Fm, IndexKind::SuffixArray] {
            let index = kind.build(&dict).unwrap();
            let bytes = index.serialize();
            let loaded = deserialize_index(&bytes, &dict).unwrap();
            assert_eq!(loaded.kind(), kind);
            assert_eq!(loaded.serialize(), bytes);

            let err = deserialize_index(&bytes, &other).err().unwrap();
            assert_eq!(err.kind(), crate::error::ErrorKind::ConfigInvalid);
            assert!(deserialize_index(&bytes[..bytes.len() - 1], &dict).is_err());
        }
    }
}
