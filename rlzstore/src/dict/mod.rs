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

//! The reference dictionary factors point into.
//!
//! A dictionary is an immutable byte buffer terminated by a single 0 sentinel. Its content
//! is chosen by a [`DictionaryPolicy`]; the store only relies on the buffer itself.

mod policy;

pub use self::policy::DictionaryPolicy;
pub use self::policy::UniformSampleBudget;

use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::hash::content_hash;

/// Largest supported content length. Factor offsets are 32 bit.
pub const MAX_DICTIONARY_LEN: usize = u32::MAX as usize - 1;

/// Immutable, sentinel-terminated dictionary bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    // content followed by the 0 sentinel
    bytes: Vec<u8>,
    hash: u64,
}

impl Dictionary {
    /// Creates a dictionary from its content. The sentinel is appended.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if the
    /// content is empty or longer than [`MAX_DICTIONARY_LEN`].
    pub fn from_content(content: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let mut bytes = content.into();
        bytes.push(0);
        Self::from_bytes(bytes)
    }

    /// Creates a dictionary from sentinel-terminated bytes, e.g. the contents of a
    /// dictionary file.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        match bytes.last() {
            None => return Err(Error::config("dictionary must not be empty")),
            Some(0) => {}
            Some(b) => {
                return Err(Error::config(format!(
                    "dictionary must end with a 0 sentinel, found {b:#04x}"
                )));
            }
        }
        let content_len = bytes.len() - 1;
        if content_len == 0 {
            return Err(Error::config("dictionary content must not be empty"));
        }
        if content_len > MAX_DICTIONARY_LEN {
            return Err(Error::config("dictionary too large for 32 bit offsets")
                .with_context("len", content_len));
        }
        let hash = content_hash(&bytes);
        Ok(Self { bytes, hash })
    }

    /// Reads a dictionary file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let bytes = fs::read(path).map_err(|e| {
            Error::io("failed to read dictionary", e).with_context("path", path.display())
        })?;
        Self::from_bytes(bytes)
    }

    /// Writes the dictionary bytes, sentinel included.
    pub fn store(&self, path: &Path) -> Result<(), Error> {
        fs::write(path, &self.bytes).map_err(|e| {
            Error::io("failed to write dictionary", e).with_context("path", path.display())
        })
    }

    /// Content length, excluding the sentinel.
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Always false: an empty dictionary cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dictionary content without the sentinel.
    pub fn content(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Dictionary bytes including the trailing sentinel.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content hash keying indexes built over this dictionary.
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_sentinel_handling() {
        let dict = Dictionary::from_content(b"abc".to_vec()).unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.content(), b"abc");
        assert_eq!(dict.as_bytes(), b"abc\0");
        assert_eq!(dict, Dictionary::from_bytes(b"abc\0".to_vec()).unwrap());
    }

    #[test]
    fn test_rejects_malformed() {
        let err = Dictionary::from_bytes(b"abc".to_vec()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(Dictionary::from_bytes(vec![0]).is_err());
        assert!(Dictionary::from_bytes(vec![]).is_err());
        assert!(Dictionary::from_content(Vec::new()).is_err());
    }
}
