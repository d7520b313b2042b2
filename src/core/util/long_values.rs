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

use crate::error::{ErrorKind, Result};

/// Abstraction over an array of longs.
pub trait LongValues: Send + Sync {
    fn get64(&self, index: i64) -> Result<i64>;
}

/// Maps every index to itself.
pub struct IdentityLongValues;

impl LongValues for IdentityLongValues {
    fn get64(&self, index: i64) -> Result<i64> {
        Ok(index)
    }
}

/// `index + deltas[index]`, used to store a monotonic mapping compactly
/// when most deltas are small.
pub struct DeltaLongValues {
    deltas: Vec<i64>,
}

impl DeltaLongValues {
    pub fn new(deltas: Vec<i64>) -> Self {
        DeltaLongValues { deltas }
    }
}

impl LongValues for DeltaLongValues {
    fn get64(&self, index: i64) -> Result<i64> {
        match self.deltas.get(index as usize) {
            Some(delta) => Ok(index + *delta),
            None => bail!(ErrorKind::IllegalArgument(format!(
                "index {} out of bounds for {} values",
                index,
                self.deltas.len()
            ))),
        }
    }
}
