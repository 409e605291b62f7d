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

//! Shared helpers.

pub(crate) mod random;

use crate::error::Error;

/// Builds a worker pool with exactly `threads` threads.
pub(crate) fn thread_pool(threads: usize) -> Result<rayon::ThreadPool, Error> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("rlzstore-worker-{i}"))
        .build()
        .map_err(|e| {
            Error::resource("failed to start worker threads")
                .with_context("threads", threads)
                .set_source(e)
        })
}

/// Number of bits needed to represent `value`; 0 for 0.
pub(crate) fn bit_width(value: u64) -> u32 {
    64 - value.leading_zeros()
}
