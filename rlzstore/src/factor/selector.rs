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

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::index::DictionaryIndex;
use crate::index::SaRange;

/// Picks one dictionary offset out of a range of equally long matches.
///
/// Any row of the range is a correct choice; the policy only changes which offsets
/// end up in the encoded stream.
pub trait FactorSelector: Send + Sync {
    fn kind(&self) -> SelectorKind;

    /// Returns the dictionary offset of the chosen match of length `len`.
    fn select(&self, index: &dyn DictionaryIndex, range: SaRange, len: usize) -> u32;
}

/// The match at the first row of the range.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectFirst;

impl FactorSelector for SelectFirst {
    fn kind(&self) -> SelectorKind {
        SelectorKind::First
    }

    fn select(&self, index: &dyn DictionaryIndex, range: SaRange, len: usize) -> u32 {
        index.offset_at(range.sp, len)
    }
}

/// The match at the last row of the range.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectLast;

impl FactorSelector for SelectLast {
    fn kind(&self) -> SelectorKind {
        SelectorKind::Last
    }

    fn select(&self, index: &dyn DictionaryIndex, range: SaRange, len: usize) -> u32 {
        index.offset_at(range.ep, len)
    }
}

/// The match with the smallest dictionary offset.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectMinimal;

impl FactorSelector for SelectMinimal {
    fn kind(&self) -> SelectorKind {
        SelectorKind::Minimal
    }

    fn select(&self, index: &dyn DictionaryIndex, range: SaRange, len: usize) -> u32 {
        if range.sp == range.ep {
            return index.offset_at(range.sp, len);
        }
        index.offset_at(index.find_minimum(range), len)
    }
}

/// Identifies a [`FactorSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectorKind {
    #[default]
    First,
    Last,
    Minimal,
}

impl SelectorKind {
    pub(crate) fn id(self) -> u8 {
        match self {
            SelectorKind::First => 1,
            SelectorKind::Last => 2,
            SelectorKind::Minimal => 3,
        }
    }

    pub(crate) fn from_id(id: u8) -> Result<Self, Error> {
        match id {
            1 => Ok(SelectorKind::First),
            2 => Ok(SelectorKind::Last),
            3 => Ok(SelectorKind::Minimal),
            _ => Err(Error::deserial(format!("unknown selector id: {id}"))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SelectorKind::First => "first",
            SelectorKind::Last => "last",
            SelectorKind::Minimal => "minimal",
        }
    }

    /// The selector implementing this policy.
    pub fn selector(self) -> &'static dyn FactorSelector {
        match self {
            SelectorKind::First => &SelectFirst,
            SelectorKind::Last => &SelectLast,
            SelectorKind::Minimal => &SelectMinimal,
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelectorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(SelectorKind::First),
            "last" => Ok(SelectorKind::Last),
            "minimal" => Ok(SelectorKind::Minimal),
            _ => Err(Error::config(format!("unknown factor selector: {s}"))),
        }
    }
}
