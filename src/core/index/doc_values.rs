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

use crate::core::search::ScorerAware;
use crate::core::util::{Bits, BitsRef, DocId, FixedBitSet};
use crate::error::Result;

use std::cmp::Ordering;
use std::sync::Arc;

/// When returned by `next_ord()` it means there are no more ordinals for the document.
pub const NO_MORE_ORDS: i64 = -1;

/// A per-document numeric value.
pub trait NumericDocValues: Send + Sync {
    fn get(&self, doc_id: DocId) -> Result<i64>;
}

impl<T: NumericDocValues + ?Sized> NumericDocValues for Arc<T> {
    fn get(&self, doc_id: DocId) -> Result<i64> {
        (**self).get(doc_id)
    }
}

/// A per-document byte value.
pub trait BinaryDocValues: Send + Sync {
    fn get(&self, doc_id: DocId) -> Result<Vec<u8>>;
}

impl<T: BinaryDocValues + ?Sized> BinaryDocValues for Arc<T> {
    fn get(&self, doc_id: DocId) -> Result<Vec<u8>> {
        (**self).get(doc_id)
    }
}

/// A per-document ordinal into a sorted dictionary of byte values, at most
/// one per document.
pub trait SortedDocValues: Send + Sync {
    /// Returns the ordinal for `doc_id`, or -1 if the document has no value.
    fn get_ord(&self, doc_id: DocId) -> Result<i32>;

    fn lookup_ord(&self, ord: i32) -> Result<Vec<u8>>;

    fn value_count(&self) -> usize;

    /// if key exists, return its ordinal, else return
    /// - insertion_point - 1.
    fn lookup_term(&self, key: &[u8]) -> Result<i32> {
        let mut low = 0;
        let mut high = self.value_count() as i32 - 1;
        while low <= high {
            let mid = low + (high - low) / 2;
            let term = self.lookup_ord(mid)?;
            match term.as_slice().cmp(key) {
                Ordering::Less => {
                    low = mid + 1;
                }
                Ordering::Greater => {
                    high = mid - 1;
                }
                Ordering::Equal => {
                    return Ok(mid);
                }
            }
        }
        Ok(-(low + 1)) // key not found
    }
}

pub struct EmptySortedDocValues;

impl SortedDocValues for EmptySortedDocValues {
    fn get_ord(&self, _doc_id: DocId) -> Result<i32> {
        Ok(-1)
    }

    fn lookup_ord(&self, _ord: i32) -> Result<Vec<u8>> {
        Ok(Vec::with_capacity(0))
    }

    fn value_count(&self) -> usize {
        0
    }
}

/// Per-document ordinals into a sorted dictionary, any number per document.
///
/// Ordinals of a document are returned in increasing order, which is also
/// the order of their byte values.
pub trait SortedSetDocValues: Send + Sync {
    /// positions to the specified document
    fn set_document(&mut self, doc: DocId) -> Result<()>;

    /// Returns the next ordinal for the current document (previously
    /// set by `Self::set_document()`), or `NO_MORE_ORDS`.
    fn next_ord(&mut self) -> i64;

    /// Retrieves the value for the specified ordinal.
    fn lookup_ord(&self, ord: i64) -> Result<Vec<u8>>;

    /// Returns the number of unique values.
    fn get_value_count(&self) -> usize;

    /// if `key` exists, returns its ordinal, else return `-insertion_point - 1`
    fn lookup_term(&self, key: &[u8]) -> Result<i64> {
        let mut low = 0_i64;
        let mut high = self.get_value_count() as i64 - 1;
        while low <= high {
            let mid = low + (high - low) / 2;
            let term = self.lookup_ord(mid)?;
            match term.as_slice().cmp(key) {
                Ordering::Less => {
                    low = mid + 1;
                }
                Ordering::Greater => {
                    high = mid - 1;
                }
                Ordering::Equal => {
                    return Ok(mid);
                }
            }
        }
        Ok(-(low + 1)) // key not found
    }

    /// The single-valued view if these ordinals are known to hold at most
    /// one value per document.
    fn get_sorted_doc_values(&self) -> Option<Arc<dyn SortedDocValues>> {
        None
    }
}

/// Extension of `SortedSetDocValues` that supports random access to the
/// ordinals of the current document.
pub trait RandomAccessOrds: SortedSetDocValues {
    /// Retrieve the ordinal for the current document at `index`,
    /// from 0 to `cardinality() - 1`.
    fn ord_at(&self, index: usize) -> i64;

    /// Number of ordinals for the current document.
    fn cardinality(&self) -> usize;
}

pub struct EmptySortedSetDocValues;

impl SortedSetDocValues for EmptySortedSetDocValues {
    fn set_document(&mut self, _doc: DocId) -> Result<()> {
        Ok(())
    }

    fn next_ord(&mut self) -> i64 {
        NO_MORE_ORDS
    }

    fn lookup_ord(&self, _ord: i64) -> Result<Vec<u8>> {
        Ok(Vec::with_capacity(0))
    }

    fn get_value_count(&self) -> usize {
        0
    }

    fn lookup_term(&self, _key: &[u8]) -> Result<i64> {
        Ok(-1)
    }
}

impl RandomAccessOrds for EmptySortedSetDocValues {
    fn ord_at(&self, _index: usize) -> i64 {
        unreachable!()
    }

    fn cardinality(&self) -> usize {
        0
    }
}

/// Exposes single-valued `SortedDocValues` as multi-valued ordinals.
pub struct SingletonSortedSetDocValues {
    dv_in: Arc<dyn SortedDocValues>,
    current_ord: i64,
    ord: i64,
}

impl SingletonSortedSetDocValues {
    pub fn new(dv_in: Arc<dyn SortedDocValues>) -> Self {
        SingletonSortedSetDocValues {
            dv_in,
            current_ord: NO_MORE_ORDS,
            ord: NO_MORE_ORDS,
        }
    }

    pub fn sorted_doc_values(&self) -> &Arc<dyn SortedDocValues> {
        &self.dv_in
    }
}

impl SortedSetDocValues for SingletonSortedSetDocValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        let ord = i64::from(self.dv_in.get_ord(doc)?);
        self.current_ord = ord;
        self.ord = ord;
        Ok(())
    }

    fn next_ord(&mut self) -> i64 {
        let v = self.current_ord;
        self.current_ord = NO_MORE_ORDS;
        v
    }

    fn lookup_ord(&self, ord: i64) -> Result<Vec<u8>> {
        // cast is ok: single-valued cannot exceed i32::MAX
        self.dv_in.lookup_ord(ord as i32)
    }

    fn get_value_count(&self) -> usize {
        self.dv_in.value_count()
    }

    fn lookup_term(&self, key: &[u8]) -> Result<i64> {
        let val = self.dv_in.lookup_term(key)?;
        Ok(i64::from(val))
    }

    fn get_sorted_doc_values(&self) -> Option<Arc<dyn SortedDocValues>> {
        Some(Arc::clone(&self.dv_in))
    }
}

impl RandomAccessOrds for SingletonSortedSetDocValues {
    fn ord_at(&self, _index: usize) -> i64 {
        self.ord
    }

    fn cardinality(&self) -> usize {
        if self.ord >= 0 {
            1
        } else {
            0
        }
    }
}

/// Per-document integer values, sorted ascending within a document.
pub trait SortedNumericDocValues: Send {
    /// positions to the specified document
    fn set_document(&mut self, doc: DocId) -> Result<()>;

    /// Retrieve the value for the current document at the specified index.
    /// An index ranges from 0 to count() - 1.
    fn value_at(&self, index: usize) -> i64;

    /// value count for current doc
    fn count(&self) -> usize;

    /// The single-valued view, if the values are known to hold at most one
    /// value per document.
    fn get_numeric_doc_values(&self) -> Option<Arc<dyn NumericDocValues>> {
        None
    }

    /// The documents that have a value, if the values are single-valued.
    fn get_docs_with_field(&self) -> Option<BitsRef> {
        None
    }

    fn as_scorer_aware(&mut self) -> Option<&mut dyn ScorerAware> {
        None
    }
}

/// Exposes single-valued `NumericDocValues` as multi-valued.
pub struct SingletonSortedNumericDocValues {
    numeric_doc_values_in: Arc<dyn NumericDocValues>,
    docs_with_field: BitsRef,
    value: i64,
    count: usize,
}

impl SingletonSortedNumericDocValues {
    pub fn new(numeric_doc_values_in: Arc<dyn NumericDocValues>, docs_with_field: BitsRef) -> Self {
        SingletonSortedNumericDocValues {
            numeric_doc_values_in,
            docs_with_field,
            value: 0,
            count: 0,
        }
    }
}

impl SortedNumericDocValues for SingletonSortedNumericDocValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        let value = self.numeric_doc_values_in.get(doc)?;
        self.value = value;
        self.count = if value == 0 && !self.docs_with_field.get(doc as usize)? {
            0
        } else {
            1
        };
        Ok(())
    }

    fn value_at(&self, _index: usize) -> i64 {
        self.value
    }

    fn count(&self) -> usize {
        self.count
    }

    fn get_numeric_doc_values(&self) -> Option<Arc<dyn NumericDocValues>> {
        Some(Arc::clone(&self.numeric_doc_values_in))
    }

    fn get_docs_with_field(&self) -> Option<BitsRef> {
        Some(Arc::clone(&self.docs_with_field))
    }
}

/// provide utility methods for doc values
pub struct DocValues;

impl DocValues {
    pub fn singleton_sorted_doc_values(dv: Arc<dyn SortedDocValues>) -> SingletonSortedSetDocValues {
        SingletonSortedSetDocValues::new(dv)
    }

    pub fn singleton_sorted_numeric_doc_values(
        numeric_doc_values_in: Arc<dyn NumericDocValues>,
        docs_with_field: BitsRef,
    ) -> SingletonSortedNumericDocValues {
        SingletonSortedNumericDocValues::new(numeric_doc_values_in, docs_with_field)
    }

    /// Returns the single-valued view of `dv`, if it has one.
    pub fn unwrap_singleton(dv: &dyn SortedSetDocValues) -> Option<Arc<dyn SortedDocValues>> {
        dv.get_sorted_doc_values()
    }

    /// Returns the docs-with-field bits of single-valued numeric values.
    pub fn unwrap_singleton_bits(dv: &dyn SortedNumericDocValues) -> Option<BitsRef> {
        dv.get_docs_with_field()
    }

    /// Presence of single-valued ordinals: a document has a value when its
    /// ordinal is not -1, answered without materializing a bit set.
    pub fn docs_with_value_sorted(dv: Arc<dyn SortedDocValues>, max_doc: DocId) -> BitsRef {
        Arc::new(SortedDocValuesBits { dv, max_doc })
    }

    pub fn docs_with_value_sorted_set(
        dv: &mut dyn RandomAccessOrds,
        max_doc: DocId,
    ) -> Result<BitsRef> {
        let mut bits = FixedBitSet::new(max_doc as usize);
        for doc in 0..max_doc {
            dv.set_document(doc)?;
            if dv.cardinality() > 0 {
                bits.set(doc as usize);
            }
        }
        Ok(Arc::new(bits))
    }

    pub fn docs_with_value_sorted_numeric(
        dv: &mut dyn SortedNumericDocValues,
        max_doc: DocId,
    ) -> Result<BitsRef> {
        let mut bits = FixedBitSet::new(max_doc as usize);
        for doc in 0..max_doc {
            dv.set_document(doc)?;
            if dv.count() > 0 {
                bits.set(doc as usize);
            }
        }
        Ok(Arc::new(bits))
    }
}

struct SortedDocValuesBits {
    dv: Arc<dyn SortedDocValues>,
    max_doc: DocId,
}

impl Bits for SortedDocValuesBits {
    fn get(&self, index: usize) -> Result<bool> {
        let ord = self.dv.get_ord(index as DocId)?;
        Ok(ord >= 0)
    }

    fn len(&self) -> usize {
        self.max_doc as usize
    }
}
