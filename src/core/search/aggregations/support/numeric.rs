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
    AtomicFieldData, IndexNumericFieldData, SortedBinaryDocValues, SortedNumericDoubleValues,
};
use crate::core::index::{LeafReaderContext, SortedNumericDocValues};
use crate::core::search::aggregations::support::{
    numeric_docs_with_value, NumericValuesSource, ScriptBytesValues, ScriptDoubleValues,
    ScriptLongValues, ValueType, ValuesSource,
};
use crate::core::search::SearchScript;
use crate::core::util::BitsRef;
use crate::error::Result;

use std::sync::Arc;

/// Numeric values of a field, in the representation the field stores.
pub struct NumericFieldData {
    field_data: Arc<dyn IndexNumericFieldData>,
}

impl NumericFieldData {
    pub fn new(field_data: Arc<dyn IndexNumericFieldData>) -> Self {
        NumericFieldData { field_data }
    }
}

impl ValuesSource for NumericFieldData {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        self.field_data.load(context)?.bytes_values()
    }

    fn docs_with_value(&self, context: &LeafReaderContext<'_>) -> Result<BitsRef> {
        numeric_docs_with_value(self, context)
    }
}

impl NumericValuesSource for NumericFieldData {
    fn is_floating_point(&self) -> bool {
        self.field_data.numeric_type().is_floating_point()
    }

    fn long_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedNumericDocValues>> {
        self.field_data.load(context)?.long_values()
    }

    fn double_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedNumericDoubleValues>> {
        self.field_data.load(context)?.double_values()
    }
}

/// Numeric values computed by a script for every document.
pub struct NumericScript {
    script: Arc<dyn SearchScript>,
    value_type: Option<ValueType>,
}

impl NumericScript {
    /// `value_type` is what the script is declared to return; without
    /// one the values are treated as floating point.
    pub fn new(script: Arc<dyn SearchScript>, value_type: Option<ValueType>) -> Self {
        NumericScript { script, value_type }
    }
}

impl ValuesSource for NumericScript {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        let script = self.script.get_leaf_search_script(context)?;
        Ok(Box::new(ScriptBytesValues::new(script)))
    }

    fn docs_with_value(&self, context: &LeafReaderContext<'_>) -> Result<BitsRef> {
        numeric_docs_with_value(self, context)
    }

    fn needs_scores(&self) -> bool {
        self.script.needs_scores()
    }
}

impl NumericValuesSource for NumericScript {
    fn is_floating_point(&self) -> bool {
        self.value_type
            .map(|t| t.is_floating_point())
            .unwrap_or(true)
    }

    fn long_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedNumericDocValues>> {
        let script = self.script.get_leaf_search_script(context)?;
        Ok(Box::new(ScriptLongValues::new(script)))
    }

    fn double_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedNumericDoubleValues>> {
        let script = self.script.get_leaf_search_script(context)?;
        Ok(Box::new(ScriptDoubleValues::new(script)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fielddata::memory::{MemoryIndexReader, MemoryNumericFieldData};
    use crate::core::index::{DocValues, IndexReader};
    use crate::core::search::tests::MockSearchScript;
    use crate::core::util::{Bits, VariantValue};

    fn assert_presence_matches_counts(source: &dyn NumericValuesSource, reader: &MemoryIndexReader) {
        for leaf in reader.leaves() {
            let bits = source.docs_with_value(&leaf).unwrap();
            let mut longs = source.long_values(&leaf).unwrap();
            let mut doubles = source.double_values(&leaf).unwrap();
            for doc in 0..leaf.max_doc() {
                longs.set_document(doc).unwrap();
                doubles.set_document(doc).unwrap();
                assert_eq!(bits.get(doc as usize).unwrap(), longs.count() > 0);
                assert_eq!(longs.count(), doubles.count());
            }
        }
    }

    #[test]
    fn test_long_field() {
        let reader = MemoryIndexReader::new(&[3, 2]);
        let field = MemoryNumericFieldData::longs(
            "n",
            &[vec![vec![3], vec![], vec![1]], vec![vec![2, 8], vec![]]],
        );
        let source = NumericFieldData::new(Arc::new(field));
        assert!(!source.is_floating_point());
        assert!(!source.needs_scores());

        let leaves = reader.leaves();
        let singleton = source.long_values(&leaves[0]).unwrap();
        assert!(DocValues::unwrap_singleton_bits(singleton.as_ref()).is_some());
        let multi = source.long_values(&leaves[1]).unwrap();
        assert!(DocValues::unwrap_singleton_bits(multi.as_ref()).is_none());

        assert_presence_matches_counts(&source, &reader);
    }

    #[test]
    fn test_double_field() {
        let reader = MemoryIndexReader::new(&[3, 2]);
        let field = MemoryNumericFieldData::doubles(
            "d",
            &[vec![vec![0.5], vec![1.5], vec![]], vec![vec![], vec![2.5, -1.0]]],
        );
        let source = NumericFieldData::new(Arc::new(field));
        assert!(source.is_floating_point());
        assert_presence_matches_counts(&source, &reader);

        let leaves = reader.leaves();
        let mut bytes = source.bytes_values(&leaves[1]).unwrap();
        bytes.set_document(1).unwrap();
        assert_eq!(bytes.count(), 2);
        assert_eq!(bytes.value_at(0), b"-1.0");
        assert_eq!(bytes.value_at(1), b"2.5");
    }

    #[test]
    fn test_numeric_script() {
        let reader = MemoryIndexReader::new(&[3]);
        let script = Arc::new(MockSearchScript::new(|doc, _, _| {
            Ok(match doc {
                0 => VariantValue::Vec(vec![
                    VariantValue::Long(5),
                    VariantValue::Long(1),
                    VariantValue::Long(3),
                ]),
                1 => VariantValue::Null,
                _ => VariantValue::Double(2.75),
            })
        }));
        let source = NumericScript::new(script.clone(), Some(ValueType::Long));
        assert!(!source.is_floating_point());
        assert!(source.needs_scores());

        let leaves = reader.leaves();
        let mut longs = source.long_values(&leaves[0]).unwrap();
        longs.set_document(0).unwrap();
        let values: Vec<i64> = (0..longs.count()).map(|i| longs.value_at(i)).collect();
        assert_eq!(values, vec![1, 3, 5]);
        longs.set_document(1).unwrap();
        assert_eq!(longs.count(), 0);
        longs.set_document(2).unwrap();
        assert_eq!(longs.value_at(0), 2);

        let bits = source.docs_with_value(&leaves[0]).unwrap();
        assert!(bits.get(0).unwrap());
        assert!(!bits.get(1).unwrap());
        assert!(bits.get(2).unwrap());

        assert!(NumericScript::new(script.clone(), None).is_floating_point());
        assert!(NumericScript::new(script, Some(ValueType::Double)).is_floating_point());
    }
}
