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

use crate::dict::Dictionary;
use crate::error::Error;

/// Chooses dictionary content from a text.
pub trait DictionaryPolicy: Send + Sync {
    /// Short identifier used in logs and file names.
    fn name(&self) -> String;

    /// Builds a dictionary for `text`.
    fn build(&self, text: &[u8]) -> Result<Dictionary, Error>;
}

/// Samples fixed-size pieces of the text at a uniform stride until a byte budget is
/// spent.
///
/// With a budget of `B` bytes and pieces of `k` bytes, `B / k` pieces are taken every
/// `len / (B / k)` bytes. A text no larger than the budget becomes the dictionary as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSampleBudget {
    budget_bytes: usize,
    sample_len: usize,
}

impl UniformSampleBudget {
    /// # Panics
    ///
    /// Panics if `sample_len` is 0 or larger than `budget_bytes`.
    pub fn new(budget_bytes: usize, sample_len: usize) -> Self {
        assert!(sample_len > 0, "sample_len must be at least 1");
        assert!(
            sample_len <= budget_bytes,
            "sample_len {sample_len} exceeds the budget of {budget_bytes} bytes"
        );
        Self {
            budget_bytes,
            sample_len,
        }
    }
}

impl DictionaryPolicy for UniformSampleBudget {
    fn name(&self) -> String {
        format!("uniform-{}-{}", self.sample_len, self.budget_bytes)
    }

    fn build(&self, text: &[u8]) -> Result<Dictionary, Error> {
        if text.is_empty() {
            return Err(Error::config("cannot sample a dictionary from an empty text"));
        }
        if text.len() <= self.budget_bytes {
            return Dictionary::from_content(text.to_vec());
        }

        let num_samples = self.budget_bytes / self.sample_len;
        let step = (text.len() / num_samples).max(1);
        let mut content = Vec::with_capacity(num_samples * self.sample_len);
        for start in (0..text.len()).step_by(step) {
            let end = (start + self.sample_len).min(text.len());
            content.extend_from_slice(&text[start..end]);
            if content.len() >= self.budget_bytes {
                break;
            }
        }
        content.truncate(self.budget_bytes);
        tracing::info!(
            policy = %self.name(),
            samples = num_samples,
            step,
            bytes = content.len(),
            "sampled dictionary"
        );
        Dictionary::from_content(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_is_whole_dictionary() {
        let policy = UniformSampleBudget::new(1024, 16);
        let dict = policy.build(b"hello world").unwrap();
        assert_eq!(dict.content(), b"hello world");
    }

    #[test]
    fn test_budget_respected() {
        let text: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let policy = UniformSampleBudget::new(4096, 64);
        let dict = policy.build(&text).unwrap();
        assert_eq!(dict.len(), 4096);
        assert_eq!(&dict.content()[..64], &text[..64]);
    }
}
