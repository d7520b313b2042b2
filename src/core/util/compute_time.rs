// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ops::Drop;
use std::time;

/// Logs, at debug level, how long a scope took to run.
/// Typical use:
/// let _t = ComputeTime::new("global_ordinals", field);
#[derive(Debug)]
pub struct ComputeTime {
    task: &'static str,
    subject: String,
    instant: time::Instant,
}

impl ComputeTime {
    pub fn new(task: &'static str, subject: impl Into<String>) -> Self {
        ComputeTime {
            task,
            subject: subject.into(),
            instant: time::Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = self.instant.elapsed();
        elapsed.as_secs() * 1000 + u64::from(elapsed.subsec_nanos()) / 1_000_000
    }
}

impl Drop for ComputeTime {
    fn drop(&mut self) {
        debug!("[{}:{}] {}ms", self.task, self.subject, self.elapsed_ms());
    }
}
