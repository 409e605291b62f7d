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

/// Defines the families of persisted artifacts.
///
/// The family id is the first byte of every framed artifact, so a file handed to the
/// wrong loader is rejected before any of its payload is interpreted.
pub struct Family {
    /// The byte ID for this family.
    pub id: u8,
    /// The name for this family.
    pub name: &'static str,
    /// The serial version written by this build.
    pub serial_version: u8,
}

impl Family {
    /// Count-Min sketch.
    pub const COUNTMIN: Family = Family {
        id: 18,
        name: "COUNTMIN",
        serial_version: 1,
    };

    /// Suffix index over a dictionary.
    pub const DICTIONARY_INDEX: Family = Family {
        id: 32,
        name: "DICTIONARY_INDEX",
        serial_version: 1,
    };

    /// Per-block factor stream offsets and factor counts.
    pub const BLOCK_MAP: Family = Family {
        id: 33,
        name: "BLOCK_MAP",
        serial_version: 1,
    };

    /// Store manifest: block size, text size and codec configuration.
    pub const MANIFEST: Family = Family {
        id: 34,
        name: "MANIFEST",
        serial_version: 1,
    };
}

impl Family {
    pub fn validate_id(&self, family_id: u8) -> Result<(), Error> {
        if family_id != self.id {
            Err(Error::invalid_family(self.id, family_id, self.name))
        } else {
            Ok(())
        }
    }
}
