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

use crate::codec::ArtifactSlice;
use crate::codec::Family;
use crate::error::Error;

pub(crate) fn ensure_serial_version_is(family: &Family, actual: u8) -> Result<(), Error> {
    if family.serial_version == actual {
        Ok(())
    } else {
        Err(Error::unsupported_serial_version(family.serial_version, actual))
    }
}

/// Reads and checks the family id and serial version at the start of an artifact.
pub(crate) fn ensure_preamble(cursor: &mut ArtifactSlice<'_>, family: &Family) -> Result<(), Error> {
    let family_id = cursor
        .read_u8()
        .map_err(|_| Error::insufficient_data("family_id"))?;
    family.validate_id(family_id)?;
    let serial_version = cursor
        .read_u8()
        .map_err(|_| Error::insufficient_data("serial_version"))?;
    ensure_serial_version_is(family, serial_version)
}

pub(crate) fn ensure_fully_consumed(cursor: &ArtifactSlice<'_>, family: &Family) -> Result<(), Error> {
    match cursor.remaining() {
        0 => Ok(()),
        n => Err(Error::deserial(format!(
            "{} artifact has {n} trailing bytes",
            family.name
        ))),
    }
}
