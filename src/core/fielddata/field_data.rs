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

use crate::core::fielddata::{
    GeoPoint, GeoPointValues, MultiGeoPointValues, NumericDoubleValues, SortedBinaryDocValues,
    SortedNumericDoubleValues, SortingBinaryDocValues,
};
use crate::core::index::{
    BinaryDocValues, DocValues, RandomAccessOrds, SortedDocValues, SortedNumericDocValues,
};
use crate::core::util::{Bits, BitsRef, DocId, FixedBitSet};
use crate::error::Result;

use std::io::Write;
use std::sync::Arc;

/// Utility methods over field data accessors.
pub struct FieldData;

impl FieldData {
    /// Returns the docs-with-field bits of single-valued byte values.
    pub fn unwrap_singleton_bits(values: &dyn SortedBinaryDocValues) -> Option<BitsRef> {
        values.get_docs_with_field()
    }

    pub fn unwrap_singleton_double_bits(values: &dyn SortedNumericDoubleValues) -> Option<BitsRef> {
        values.get_docs_with_field()
    }

    pub fn unwrap_singleton_geo_bits(values: &dyn MultiGeoPointValues) -> Option<BitsRef> {
        values.get_docs_with_field()
    }

    pub fn docs_with_value_bytes(
        values: &mut dyn SortedBinaryDocValues,
        max_doc: DocId,
    ) -> Result<BitsRef> {
        let mut bits = FixedBitSet::new(max_doc as usize);
        for doc in 0..max_doc {
            values.set_document(doc)?;
            if values.count() > 0 {
                bits.set(doc as usize);
            }
        }
        Ok(Arc::new(bits))
    }

    pub fn docs_with_value_doubles(
        values: &mut dyn SortedNumericDoubleValues,
        max_doc: DocId,
    ) -> Result<BitsRef> {
        let mut bits = FixedBitSet::new(max_doc as usize);
        for doc in 0..max_doc {
            values.set_document(doc)?;
            if values.count() > 0 {
                bits.set(doc as usize);
            }
        }
        Ok(Arc::new(bits))
    }

    pub fn docs_with_value_geo_points(
        values: &mut dyn MultiGeoPointValues,
        max_doc: DocId,
    ) -> Result<BitsRef> {
        let mut bits = FixedBitSet::new(max_doc as usize);
        for doc in 0..max_doc {
            values.set_document(doc)?;
            if values.count() > 0 {
                bits.set(doc as usize);
            }
        }
        Ok(Arc::new(bits))
    }

    pub fn singleton_bytes(
        values: Arc<dyn BinaryDocValues>,
        docs_with_field: BitsRef,
    ) -> SingletonSortedBinaryDocValues {
        SingletonSortedBinaryDocValues::new(values, docs_with_field)
    }

    pub fn singleton_doubles(
        values: Arc<dyn NumericDoubleValues>,
        docs_with_field: BitsRef,
    ) -> SingletonSortedNumericDoubleValues {
        SingletonSortedNumericDoubleValues::new(values, docs_with_field)
    }

    pub fn singleton_geo_points(
        values: Arc<dyn GeoPointValues>,
        docs_with_field: BitsRef,
    ) -> SingletonMultiGeoPointValues {
        SingletonMultiGeoPointValues::new(values, docs_with_field)
    }

    /// Exposes ordinals as the byte values they stand for. Single-valued
    /// ordinals stay single-valued.
    pub fn to_string_ordinals(
        values: Box<dyn RandomAccessOrds>,
        max_doc: DocId,
    ) -> Box<dyn SortedBinaryDocValues> {
        match DocValues::unwrap_singleton(values.as_ref()) {
            Some(sorted) => {
                let docs_with_field = DocValues::docs_with_value_sorted(Arc::clone(&sorted), max_doc);
                Box::new(Self::singleton_bytes(
                    Arc::new(SortedAsBinaryDocValues { sorted }),
                    docs_with_field,
                ))
            }
            None => Box::new(OrdinalsBytesValues {
                ords: values,
                buffer: SortingBinaryDocValues::new(),
            }),
        }
    }

    /// Exposes longs as doubles.
    pub fn cast_long_to_double(
        values: Box<dyn SortedNumericDocValues>,
    ) -> Box<dyn SortedNumericDoubleValues> {
        Box::new(DoubleCastedValues { values })
    }

    /// Exposes doubles as longs, truncating towards zero. Truncation keeps
    /// the values of a document sorted.
    pub fn cast_double_to_long(
        values: Box<dyn SortedNumericDoubleValues>,
    ) -> Box<dyn SortedNumericDocValues> {
        Box::new(LongCastedValues { values })
    }

    /// Exposes longs as their decimal text, sorted as bytes.
    pub fn to_string_longs(values: Box<dyn SortedNumericDocValues>) -> Box<dyn SortedBinaryDocValues> {
        Box::new(ToStringValues {
            values: ToStringSource::Longs(values),
            buffer: SortingBinaryDocValues::new(),
        })
    }

    /// Exposes doubles as their decimal text, sorted as bytes.
    pub fn to_string_doubles(
        values: Box<dyn SortedNumericDoubleValues>,
    ) -> Box<dyn SortedBinaryDocValues> {
        Box::new(ToStringValues {
            values: ToStringSource::Doubles(values),
            buffer: SortingBinaryDocValues::new(),
        })
    }

    /// Exposes geo points as `"lat, lon"` text, sorted as bytes.
    pub fn to_string_geo_points(
        values: Box<dyn MultiGeoPointValues>,
    ) -> Box<dyn SortedBinaryDocValues> {
        Box::new(ToStringValues {
            values: ToStringSource::GeoPoints(values),
            buffer: SortingBinaryDocValues::new(),
        })
    }
}

/// Single-valued byte values exposed as multi-valued.
pub struct SingletonSortedBinaryDocValues {
    values: Arc<dyn BinaryDocValues>,
    docs_with_field: BitsRef,
    value: Vec<u8>,
    count: usize,
}

impl SingletonSortedBinaryDocValues {
    fn new(values: Arc<dyn BinaryDocValues>, docs_with_field: BitsRef) -> Self {
        SingletonSortedBinaryDocValues {
            values,
            docs_with_field,
            value: Vec::new(),
            count: 0,
        }
    }
}

impl SortedBinaryDocValues for SingletonSortedBinaryDocValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        if self.docs_with_field.get(doc as usize)? {
            self.value = self.values.get(doc)?;
            self.count = 1;
        } else {
            self.value.clear();
            self.count = 0;
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }

    fn value_at(&self, _index: usize) -> &[u8] {
        &self.value
    }

    fn get_docs_with_field(&self) -> Option<BitsRef> {
        Some(Arc::clone(&self.docs_with_field))
    }
}

/// Single-valued doubles exposed as multi-valued.
pub struct SingletonSortedNumericDoubleValues {
    values: Arc<dyn NumericDoubleValues>,
    docs_with_field: BitsRef,
    value: f64,
    count: usize,
}

impl SingletonSortedNumericDoubleValues {
    fn new(values: Arc<dyn NumericDoubleValues>, docs_with_field: BitsRef) -> Self {
        SingletonSortedNumericDoubleValues {
            values,
            docs_with_field,
            value: 0.0,
            count: 0,
        }
    }
}

impl SortedNumericDoubleValues for SingletonSortedNumericDoubleValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.value = self.values.get(doc)?;
        self.count = if self.docs_with_field.get(doc as usize)? {
            1
        } else {
            0
        };
        Ok(())
    }

    fn value_at(&self, _index: usize) -> f64 {
        self.value
    }

    fn count(&self) -> usize {
        self.count
    }

    fn get_docs_with_field(&self) -> Option<BitsRef> {
        Some(Arc::clone(&self.docs_with_field))
    }
}

/// Single-valued geo points exposed as multi-valued.
pub struct SingletonMultiGeoPointValues {
    values: Arc<dyn GeoPointValues>,
    docs_with_field: BitsRef,
    value: GeoPoint,
    count: usize,
}

impl SingletonMultiGeoPointValues {
    fn new(values: Arc<dyn GeoPointValues>, docs_with_field: BitsRef) -> Self {
        SingletonMultiGeoPointValues {
            values,
            docs_with_field,
            value: GeoPoint::default(),
            count: 0,
        }
    }
}

impl MultiGeoPointValues for SingletonMultiGeoPointValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.value = self.values.get(doc)?;
        self.count = if self.docs_with_field.get(doc as usize)? {
            1
        } else {
            0
        };
        Ok(())
    }

    fn value_at(&self, _index: usize) -> GeoPoint {
        self.value
    }

    fn count(&self) -> usize {
        self.count
    }

    fn get_docs_with_field(&self) -> Option<BitsRef> {
        Some(Arc::clone(&self.docs_with_field))
    }
}

struct SortedAsBinaryDocValues {
    sorted: Arc<dyn SortedDocValues>,
}

impl BinaryDocValues for SortedAsBinaryDocValues {
    fn get(&self, doc_id: DocId) -> Result<Vec<u8>> {
        let ord = self.sorted.get_ord(doc_id)?;
        if ord < 0 {
            Ok(Vec::with_capacity(0))
        } else {
            self.sorted.lookup_ord(ord)
        }
    }
}

// ordinals of a document are sorted, so are the terms they stand for
struct OrdinalsBytesValues {
    ords: Box<dyn RandomAccessOrds>,
    buffer: SortingBinaryDocValues,
}

impl SortedBinaryDocValues for OrdinalsBytesValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.ords.set_document(doc)?;
        self.buffer.clear();
        for i in 0..self.ords.cardinality() {
            let term = self.ords.lookup_ord(self.ords.ord_at(i))?;
            self.buffer.push(&term);
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.buffer.count()
    }

    fn value_at(&self, index: usize) -> &[u8] {
        self.buffer.value_at(index)
    }
}

struct DoubleCastedValues {
    values: Box<dyn SortedNumericDocValues>,
}

impl SortedNumericDoubleValues for DoubleCastedValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.values.set_document(doc)
    }

    fn value_at(&self, index: usize) -> f64 {
        self.values.value_at(index) as f64
    }

    fn count(&self) -> usize {
        self.values.count()
    }

    fn get_docs_with_field(&self) -> Option<BitsRef> {
        self.values.get_docs_with_field()
    }
}

struct LongCastedValues {
    values: Box<dyn SortedNumericDoubleValues>,
}

impl SortedNumericDocValues for LongCastedValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.values.set_document(doc)
    }

    fn value_at(&self, index: usize) -> i64 {
        self.values.value_at(index) as i64
    }

    fn count(&self) -> usize {
        self.values.count()
    }

    fn get_docs_with_field(&self) -> Option<BitsRef> {
        self.values.get_docs_with_field()
    }
}

enum ToStringSource {
    Longs(Box<dyn SortedNumericDocValues>),
    Doubles(Box<dyn SortedNumericDoubleValues>),
    GeoPoints(Box<dyn MultiGeoPointValues>),
}

struct ToStringValues {
    values: ToStringSource,
    buffer: SortingBinaryDocValues,
}

impl SortedBinaryDocValues for ToStringValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.buffer.clear();
        match self.values {
            ToStringSource::Longs(ref mut values) => {
                values.set_document(doc)?;
                for i in 0..values.count() {
                    write!(self.buffer.next_slot(), "{}", values.value_at(i))?;
                }
            }
            ToStringSource::Doubles(ref mut values) => {
                values.set_document(doc)?;
                for i in 0..values.count() {
                    write!(self.buffer.next_slot(), "{:?}", values.value_at(i))?;
                }
            }
            ToStringSource::GeoPoints(ref mut values) => {
                values.set_document(doc)?;
                for i in 0..values.count() {
                    write!(self.buffer.next_slot(), "{}", values.value_at(i))?;
                }
            }
        }
        self.buffer.sort();
        Ok(())
    }

    fn count(&self) -> usize {
        self.buffer.count()
    }

    fn value_at(&self, index: usize) -> &[u8] {
        self.buffer.value_at(index)
    }

    fn get_docs_with_field(&self) -> Option<BitsRef> {
        match self.values {
            ToStringSource::Longs(ref values) => values.get_docs_with_field(),
            ToStringSource::Doubles(ref values) => values.get_docs_with_field(),
            ToStringSource::GeoPoints(ref values) => values.get_docs_with_field(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fielddata::memory::{MemoryIndexReader, MemoryNumericFieldData};
    use crate::core::fielddata::{AtomicFieldData, AtomicNumericFieldData, IndexNumericFieldData};
    use crate::core::index::IndexReader;

    fn strings(values: &mut dyn SortedBinaryDocValues, doc: DocId) -> Vec<String> {
        values.set_document(doc).unwrap();
        (0..values.count())
            .map(|i| String::from_utf8(values.value_at(i).to_vec()).unwrap())
            .collect()
    }

    fn long_data(docs: Vec<Vec<i64>>) -> Arc<dyn AtomicNumericFieldData> {
        let reader = MemoryIndexReader::new(&[docs.len() as DocId]);
        let field = MemoryNumericFieldData::longs("n", &[docs]);
        let leaves = reader.leaves();
        field.load(&leaves[0]).unwrap()
    }

    #[test]
    fn test_longs_as_text_are_sorted_as_bytes() {
        let data = long_data(vec![vec![9, 10, -3]]);
        let mut bytes = FieldData::to_string_longs(data.long_values().unwrap());
        assert_eq!(strings(bytes.as_mut(), 0), vec!["-3", "10", "9"]);
    }

    #[test]
    fn test_doubles_as_text() {
        let data = long_data(vec![vec![2], vec![]]);
        let mut bytes = FieldData::to_string_doubles(data.double_values().unwrap());
        assert_eq!(strings(bytes.as_mut(), 0), vec!["2.0"]);
        assert!(strings(bytes.as_mut(), 1).is_empty());
        // single-valued input keeps its presence bits
        assert!(FieldData::unwrap_singleton_bits(bytes.as_ref()).is_some());
    }

    #[test]
    fn test_cast_double_to_long_truncates() {
        let data = long_data(vec![vec![1]]);
        let doubles = FieldData::cast_long_to_double(data.long_values().unwrap());
        let mut longs = FieldData::cast_double_to_long(doubles);
        longs.set_document(0).unwrap();
        assert_eq!(longs.value_at(0), 1);

        struct Halves;

        impl NumericDoubleValues for Halves {
            fn get(&self, doc_id: DocId) -> Result<f64> {
                Ok(f64::from(doc_id) - 0.5)
            }
        }

        let bits: BitsRef = Arc::new(FixedBitSet::new(2));
        let doubles = FieldData::singleton_doubles(Arc::new(Halves), bits);
        let mut longs = FieldData::cast_double_to_long(Box::new(doubles));
        longs.set_document(0).unwrap();
        assert_eq!(longs.count(), 0);
    }

    #[test]
    fn test_docs_with_value_scans() {
        let data = long_data(vec![vec![1, 2], vec![], vec![3]]);
        let mut doubles = data.double_values().unwrap();
        assert!(FieldData::unwrap_singleton_double_bits(doubles.as_ref()).is_none());
        let bits = FieldData::docs_with_value_doubles(doubles.as_mut(), 3).unwrap();
        assert!(bits.get(0).unwrap());
        assert!(!bits.get(1).unwrap());
        assert!(bits.get(2).unwrap());

        let mut bytes = data.bytes_values().unwrap();
        let bits = FieldData::docs_with_value_bytes(bytes.as_mut(), 3).unwrap();
        assert!(bits.get(0).unwrap());
        assert!(!bits.get(1).unwrap());
    }
}
