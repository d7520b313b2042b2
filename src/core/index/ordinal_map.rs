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

use crate::core::index::SortedSetDocValues;
use crate::core::util::{DeltaLongValues, IdentityLongValues, LongValues};
use crate::error::{ErrorKind, Result};

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// maps per-segment ordinals to/from global ordinal space
pub struct OrdinalMap {
    // globalOrd -> (globalOrd - segmentOrd) where segmentOrd is the the ordinal in
    // the first segment that contains this term
    global_ord_deltas: Vec<i64>,
    // globalOrd -> first segment container
    first_segments: Vec<i32>,
    // for every segment, segmentOrd -> globalOrd
    segment_to_global_ords: Vec<Arc<dyn LongValues>>,
    // the map from/to segment ids
    segment_map: SegmentMap,
}

impl OrdinalMap {
    /// Merges the dictionaries of `subs`, one per segment, into a single
    /// ordinal space sorted by value. Segments are weighted by their
    /// dictionary size so that the largest one is the most likely to map
    /// its ordinals with the identity function.
    pub fn build<T: SortedSetDocValues + ?Sized>(subs: &[Box<T>]) -> Result<Self> {
        let weights: Vec<usize> = subs.iter().map(|s| s.get_value_count()).collect();
        let segment_map = SegmentMap::new(&weights);
        Self::new(subs, segment_map)
    }

    fn new<T: SortedSetDocValues + ?Sized>(subs: &[Box<T>], segment_map: SegmentMap) -> Result<Self> {
        let num_subs = subs.len();
        let mut global_ord_deltas = Vec::new();
        let mut first_segments = Vec::new();
        let mut ord_deltas: Vec<Vec<i64>> = Vec::with_capacity(num_subs);
        let mut ord_delta_bits = vec![0i64; num_subs];
        let mut segment_ords = vec![0i64; num_subs];

        // min-heap over (term, segment index in weighted order)
        let mut queue: BinaryHeap<Reverse<(Vec<u8>, usize)>> = BinaryHeap::with_capacity(num_subs);
        for i in 0..num_subs {
            let sub = &subs[segment_map.new_to_old(i)];
            ord_deltas.push(Vec::with_capacity(sub.get_value_count()));
            if sub.get_value_count() > 0 {
                queue.push(Reverse((sub.lookup_ord(0)?, i)));
            }
        }

        let mut global_ord = 0i64;
        while let Some(Reverse((term, first))) = queue.pop() {
            let mut top = vec![first];
            while let Some(Reverse((next, _))) = queue.peek() {
                if *next != term {
                    break;
                }
                if let Some(Reverse((_, segment_index))) = queue.pop() {
                    top.push(segment_index);
                }
            }

            let mut first_segment_index = usize::max_value();
            let mut global_ord_delta = i64::max_value();
            for segment_index in top {
                let segment_ord = segment_ords[segment_index];
                let delta = global_ord - segment_ord;
                // We compute the least segment where the term occurs. In case the
                // first segment contains most (or better all) values, this will
                // help save significant memory
                if segment_index < first_segment_index {
                    first_segment_index = segment_index;
                    global_ord_delta = delta;
                }
                ord_delta_bits[segment_index] |= delta;
                ord_deltas[segment_index].push(delta);
                segment_ords[segment_index] += 1;

                let sub = &subs[segment_map.new_to_old(segment_index)];
                let next_ord = segment_ords[segment_index];
                if next_ord < sub.get_value_count() as i64 {
                    let next_term = sub.lookup_ord(next_ord)?;
                    if next_term <= term {
                        bail!(ErrorKind::StorageRead(format!(
                            "dictionary of segment {} is not sorted at ordinal {}",
                            segment_map.new_to_old(segment_index),
                            next_ord
                        )));
                    }
                    queue.push(Reverse((next_term, segment_index)));
                }
            }
            // for each unique term, just mark the first segment index/delta where it occurs
            debug_assert!(first_segment_index < num_subs);
            first_segments.push(first_segment_index as i32);
            global_ord_deltas.push(global_ord_delta);
            global_ord += 1;
        }

        let mut segment_to_global_ords: Vec<Arc<dyn LongValues>> = Vec::with_capacity(num_subs);
        for (i, deltas) in ord_deltas.into_iter().enumerate() {
            if ord_delta_bits[i] == 0 {
                // segment ords perfectly match global ordinals
                // likely in case of low cardinalities and large segments
                segment_to_global_ords.push(Arc::new(IdentityLongValues {}));
            } else {
                segment_to_global_ords.push(Arc::new(DeltaLongValues::new(deltas)));
            }
        }
        Ok(OrdinalMap {
            global_ord_deltas,
            first_segments,
            segment_to_global_ords,
            segment_map,
        })
    }

    /// Number of distinct values across all segments.
    pub fn value_count(&self) -> i64 {
        self.global_ord_deltas.len() as i64
    }

    /// Given a global ordinal, returns the index of the first segment that
    /// contains this term.
    pub fn first_segment_number(&self, global_ord: i64) -> usize {
        let new = self.first_segments[global_ord as usize] as usize;
        self.segment_map.new_to_old(new)
    }

    /// Given a global ordinal, returns the ordinal of the first segment which
    /// contains this ordinal (the corresponding to the segment return
    /// `first_segment_number`).
    pub fn first_segment_ord(&self, global_ord: i64) -> i64 {
        global_ord - self.global_ord_deltas[global_ord as usize]
    }

    /// Given a segment number, return a `LongValues` instance that maps
    /// segment ordinals to global ordinals.
    pub fn get_global_ords(&self, index: usize) -> Arc<dyn LongValues> {
        let i = self.segment_map.old_to_new(index);
        Arc::clone(&self.segment_to_global_ords[i])
    }

    pub fn num_segments(&self) -> usize {
        self.segment_to_global_ords.len()
    }
}

#[derive(Debug)]
struct SegmentMap {
    new_to_old: Vec<usize>,
    old_to_new: Vec<usize>,
}

impl SegmentMap {
    fn new(weights: &[usize]) -> Self {
        let new_to_old = Self::map(weights);
        let old_to_new = Self::inverse(&new_to_old);
        SegmentMap {
            new_to_old,
            old_to_new,
        }
    }

    fn new_to_old(&self, segment: usize) -> usize {
        self.new_to_old[segment]
    }

    fn old_to_new(&self, segment: usize) -> usize {
        self.old_to_new[segment]
    }

    fn map(weights: &[usize]) -> Vec<usize> {
        let mut new_to_old: Vec<usize> = (0..weights.len()).collect();
        // stable, so equally weighted segments keep their order
        new_to_old.sort_by(|i, j| weights[*j].cmp(&weights[*i]));
        new_to_old
    }

    // inverse the map
    fn inverse(map: &[usize]) -> Vec<usize> {
        let mut inverse = vec![0usize; map.len()];
        for (i, old) in map.iter().enumerate() {
            inverse[*old] = i;
        }
        inverse
    }
}
