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

//! Framing for persisted artifacts.
//!
//! Every artifact except the raw dictionary and factor stream starts with a
//! two byte preamble: the family id and the serial version of that family.

pub(crate) mod assert;
mod decode;
mod encode;
mod family;

pub(crate) use self::decode::ArtifactSlice;
pub(crate) use self::encode::ArtifactBytes;
pub use self::family::Family;
