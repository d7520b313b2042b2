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
    SortedBinaryDocValues, SortedNumericDoubleValues, SortingBinaryDocValues,
    SortingNumericDocValues, SortingNumericDoubleValues,
};
use crate::core::index::SortedNumericDocValues;
use crate::core::search::{LeafSearchScript, ScorerAware, ScorerRef};
use crate::core::util::DocId;
use crate::error::Result;

/// The values a script returns for each document: a scalar is one value,
/// an array is many, null is none.
pub struct ScriptLongValues {
    script: Box<dyn LeafSearchScript>,
    buffer: SortingNumericDocValues,
}

impl ScriptLongValues {
    pub fn new(script: Box<dyn LeafSearchScript>) -> Self {
        ScriptLongValues {
            script,
            buffer: SortingNumericDocValues::new(),
        }
    }
}

impl SortedNumericDocValues for ScriptLongValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.script.set_document(doc);
        let value = self.script.run()?;
        let buffer = &mut self.buffer;
        buffer.clear();
        value.for_each_value(&mut |v| {
            buffer.push(v.to_long()?);
            Ok(())
        })?;
        buffer.sort();
        Ok(())
    }

    fn value_at(&self, index: usize) -> i64 {
        self.buffer.value_at(index)
    }

    fn count(&self) -> usize {
        self.buffer.count()
    }

    fn as_scorer_aware(&mut self) -> Option<&mut dyn ScorerAware> {
        Some(self)
    }
}

impl ScorerAware for ScriptLongValues {
    fn set_scorer(&mut self, scorer: ScorerRef) {
        self.script.set_scorer(scorer);
    }
}

pub struct ScriptDoubleValues {
    script: Box<dyn LeafSearchScript>,
    buffer: SortingNumericDoubleValues,
}

impl ScriptDoubleValues {
    pub fn new(script: Box<dyn LeafSearchScript>) -> Self {
        ScriptDoubleValues {
            script,
            buffer: SortingNumericDoubleValues::new(),
        }
    }
}

impl SortedNumericDoubleValues for ScriptDoubleValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.script.set_document(doc);
        let value = self.script.run()?;
        let buffer = &mut self.buffer;
        buffer.clear();
        value.for_each_value(&mut |v| {
            buffer.push(v.to_double()?);
            Ok(())
        })?;
        buffer.sort();
        Ok(())
    }

    fn value_at(&self, index: usize) -> f64 {
        self.buffer.value_at(index)
    }

    fn count(&self) -> usize {
        self.buffer.count()
    }

    fn as_scorer_aware(&mut self) -> Option<&mut dyn ScorerAware> {
        Some(self)
    }
}

impl ScorerAware for ScriptDoubleValues {
    fn set_scorer(&mut self, scorer: ScorerRef) {
        self.script.set_scorer(scorer);
    }
}

/// Script results rendered as text, or kept as is when binary.
pub struct ScriptBytesValues {
    script: Box<dyn LeafSearchScript>,
    buffer: SortingBinaryDocValues,
}

impl ScriptBytesValues {
    pub fn new(script: Box<dyn LeafSearchScript>) -> Self {
        ScriptBytesValues {
            script,
            buffer: SortingBinaryDocValues::new(),
        }
    }
}

impl SortedBinaryDocValues for ScriptBytesValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.script.set_document(doc);
        let value = self.script.run()?;
        let buffer = &mut self.buffer;
        buffer.clear();
        value.for_each_value(&mut |v| {
            buffer.push(&v.to_bytes());
            Ok(())
        })?;
        buffer.sort();
        Ok(())
    }

    fn count(&self) -> usize {
        self.buffer.count()
    }

    fn value_at(&self, index: usize) -> &[u8] {
        self.buffer.value_at(index)
    }

    fn as_scorer_aware(&mut self) -> Option<&mut dyn ScorerAware> {
        Some(self)
    }
}

impl ScorerAware for ScriptBytesValues {
    fn set_scorer(&mut self, scorer: ScorerRef) {
        self.script.set_scorer(scorer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fielddata::memory::MemoryIndexReader;
    use crate::core::index::IndexReader;
    use crate::core::search::tests::{MockScorer, MockSearchScript};
    use crate::core::search::SearchScript;
    use crate::core::util::VariantValue;

    #[test]
    fn test_double_values_from_score() {
        let reader = MemoryIndexReader::new(&[1]);
        let leaves = reader.leaves();
        let script = MockSearchScript::new(|_, _, score| {
            let score = f64::from(score);
            Ok(VariantValue::Vec(vec![
                VariantValue::Double(score),
                VariantValue::Double(-score),
                VariantValue::Null,
            ]))
        });
        let mut values = ScriptDoubleValues::new(script.get_leaf_search_script(&leaves[0]).unwrap());
        values.set_scorer(MockScorer::shared(0, 1.5));
        values.set_document(0).unwrap();
        assert_eq!(values.count(), 2);
        assert_eq!(values.value_at(0), -1.5);
        assert_eq!(values.value_at(1), 1.5);
    }

    #[test]
    fn test_long_values_reset_between_documents() {
        let reader = MemoryIndexReader::new(&[2]);
        let leaves = reader.leaves();
        let script = MockSearchScript::new(|doc, _, _| {
            Ok(if doc == 0 {
                VariantValue::Vec(vec![VariantValue::Long(9), VariantValue::Long(4)])
            } else {
                VariantValue::Null
            })
        });
        let mut values = ScriptLongValues::new(script.get_leaf_search_script(&leaves[0]).unwrap());
        values.set_document(0).unwrap();
        assert_eq!(values.count(), 2);
        assert_eq!(values.value_at(0), 4);
        values.set_document(1).unwrap();
        assert_eq!(values.count(), 0);
    }

    #[test]
    fn test_unconvertible_value_is_an_error() {
        let reader = MemoryIndexReader::new(&[1]);
        let leaves = reader.leaves();
        let script = MockSearchScript::new(|_, _, _| Ok(VariantValue::from("abc")));
        let mut values = ScriptLongValues::new(script.get_leaf_search_script(&leaves[0]).unwrap());
        assert!(values.set_document(0).is_err());
    }
}
