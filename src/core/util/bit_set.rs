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

use crate::core::util::Bits;
use crate::error::Result;

#[inline]
pub fn bits2words(num_bits: usize) -> usize {
    if num_bits == 0 {
        0
    } else {
        ((num_bits - 1) >> 6) + 1
    }
}

/// BitSet of fixed length (num_bits), backed by a `Vec<i64>`.
#[derive(Debug, Clone, Default)]
pub struct FixedBitSet {
    bits: Vec<i64>,
    num_bits: usize,
}

impl FixedBitSet {
    pub fn new(num_bits: usize) -> FixedBitSet {
        FixedBitSet {
            bits: vec![0; bits2words(num_bits)],
            num_bits,
        }
    }

    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.num_bits);
        let word = index >> 6;
        self.bits[word] |= 1i64 << (index & 0x3f);
    }

    #[inline]
    pub fn get_bit(&self, index: usize) -> bool {
        debug_assert!(index < self.num_bits);
        let word = index >> 6;
        (self.bits[word] & (1i64 << (index & 0x3f))) != 0
    }

    /// Return the number of bits that are set.
    pub fn cardinality(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl Bits for FixedBitSet {
    fn get(&self, index: usize) -> Result<bool> {
        Ok(self.get_bit(index))
    }

    fn len(&self) -> usize {
        self.num_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut bits = FixedBitSet::new(130);
        bits.set(0);
        bits.set(63);
        bits.set(64);
        bits.set(129);
        assert_eq!(bits.cardinality(), 4);
        assert_eq!(bits.len(), 130);
        assert!(bits.get(63).unwrap());
        assert!(bits.get(64).unwrap());
        assert!(!bits.get(62).unwrap());
        assert!(!bits.get(128).unwrap());
    }

    #[test]
    fn test_empty() {
        let bits = FixedBitSet::new(0);
        assert!(bits.is_empty());
        assert_eq!(bits.cardinality(), 0);
    }
}
