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

use smallvec::SmallVec;

/// Growable per-document buffer of longs, sorted on demand. The buffer is
/// reused across documents; a view from `values()` is valid until the
/// buffer is refilled.
#[derive(Debug, Default)]
pub struct SortingNumericDocValues {
    values: SmallVec<[i64; 4]>,
}

impl SortingNumericDocValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn push(&mut self, value: i64) {
        self.values.push(value);
    }

    pub fn sort(&mut self) {
        self.values.sort_unstable();
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn value_at(&self, index: usize) -> i64 {
        self.values[index]
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

/// Growable per-document buffer of doubles, sorted on demand.
#[derive(Debug, Default)]
pub struct SortingNumericDoubleValues {
    values: SmallVec<[f64; 4]>,
}

impl SortingNumericDoubleValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// NaN sorts after every other value, -0.0 before 0.0.
    pub fn sort(&mut self) {
        self.values.sort_unstable_by(|a, b| a.total_cmp(b));
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn value_at(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Growable per-document buffer of byte values, sorted on demand. The
/// slot allocations are kept between documents.
#[derive(Debug, Default)]
pub struct SortingBinaryDocValues {
    values: Vec<Vec<u8>>,
    count: usize,
}

impl SortingBinaryDocValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Returns an empty slot for the next value.
    pub fn next_slot(&mut self) -> &mut Vec<u8> {
        if self.count == self.values.len() {
            self.values.push(Vec::new());
        }
        let slot = &mut self.values[self.count];
        slot.clear();
        self.count += 1;
        slot
    }

    pub fn push(&mut self, value: &[u8]) {
        self.next_slot().extend_from_slice(value);
    }

    pub fn sort(&mut self) {
        self.values[..self.count].sort_unstable();
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn value_at(&self, index: usize) -> &[u8] {
        debug_assert!(index < self.count);
        &self.values[index]
    }

    pub fn values(&self) -> &[Vec<u8>] {
        &self.values[..self.count]
    }
}
