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
use crate::core::index::{LeafReaderContext, SortedNumericDocValues};
use crate::core::search::aggregations::support::{
    NumericValuesSource, ValuesSource, ValuesSourceKind,
};
use crate::core::search::{LeafSearchScript, ScorerAware, ScorerRef, SearchScript, VALUE_VAR};
use crate::core::util::{BitsRef, DocId, VariantValue};
use crate::error::Result;

use std::sync::Arc;

/// Numeric values of another source, each replaced by what a script
/// computes from it.
///
/// Always floating point: a script may turn an integer into a fraction.
pub struct NumericWithScript {
    source: Arc<dyn NumericValuesSource>,
    script: Arc<dyn SearchScript>,
}

impl NumericWithScript {
    pub fn new(source: Arc<dyn NumericValuesSource>, script: Arc<dyn SearchScript>) -> Self {
        NumericWithScript { source, script }
    }
}

impl ValuesSource for NumericWithScript {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        let values = self.source.bytes_values(context)?;
        let script = self.script.get_leaf_search_script(context)?;
        Ok(Box::new(WithScriptBytesValues::new(values, script)))
    }

    // the script maps values one to one, so presence is the source's
    fn docs_with_value(&self, context: &LeafReaderContext<'_>) -> Result<BitsRef> {
        self.source.docs_with_value(context)
    }

    fn needs_scores(&self) -> bool {
        self.script.needs_scores()
    }
}

impl NumericValuesSource for NumericWithScript {
    fn is_floating_point(&self) -> bool {
        true
    }

    fn long_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedNumericDocValues>> {
        let values = self.source.long_values(context)?;
        let script = self.script.get_leaf_search_script(context)?;
        Ok(Box::new(WithScriptLongValues::new(values, script)))
    }

    fn double_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedNumericDoubleValues>> {
        let values = self.source.double_values(context)?;
        let script = self.script.get_leaf_search_script(context)?;
        Ok(Box::new(WithScriptDoubleValues::new(values, script)))
    }
}

/// Byte values of any source, each replaced by the text a script computes
/// from it.
pub struct BytesWithScript {
    source: ValuesSourceKind,
    script: Arc<dyn SearchScript>,
}

impl BytesWithScript {
    pub fn new(source: ValuesSourceKind, script: Arc<dyn SearchScript>) -> Self {
        BytesWithScript { source, script }
    }
}

impl ValuesSource for BytesWithScript {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        let values = self.source.bytes_values(context)?;
        let script = self.script.get_leaf_search_script(context)?;
        Ok(Box::new(WithScriptBytesValues::new(values, script)))
    }

    fn docs_with_value(&self, context: &LeafReaderContext<'_>) -> Result<BitsRef> {
        self.source.docs_with_value(context)
    }

    fn needs_scores(&self) -> bool {
        self.script.needs_scores()
    }
}

/// Runs `script` once per value of the current document and buffers the
/// results, sorted.
pub struct WithScriptLongValues {
    values: Box<dyn SortedNumericDocValues>,
    script: Box<dyn LeafSearchScript>,
    buffer: SortingNumericDocValues,
}

impl WithScriptLongValues {
    pub fn new(values: Box<dyn SortedNumericDocValues>, script: Box<dyn LeafSearchScript>) -> Self {
        WithScriptLongValues {
            values,
            script,
            buffer: SortingNumericDocValues::new(),
        }
    }
}

impl SortedNumericDocValues for WithScriptLongValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.values.set_document(doc)?;
        self.buffer.clear();
        self.script.set_document(doc);
        for i in 0..self.values.count() {
            self.script
                .set_next_var(VALUE_VAR, VariantValue::Long(self.values.value_at(i)));
            self.buffer.push(self.script.run_as_long()?);
        }
        self.buffer.sort();
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

impl ScorerAware for WithScriptLongValues {
    fn set_scorer(&mut self, scorer: ScorerRef) {
        self.script.set_scorer(scorer);
    }
}

pub struct WithScriptDoubleValues {
    values: Box<dyn SortedNumericDoubleValues>,
    script: Box<dyn LeafSearchScript>,
    buffer: SortingNumericDoubleValues,
}

impl WithScriptDoubleValues {
    pub fn new(
        values: Box<dyn SortedNumericDoubleValues>,
        script: Box<dyn LeafSearchScript>,
    ) -> Self {
        WithScriptDoubleValues {
            values,
            script,
            buffer: SortingNumericDoubleValues::new(),
        }
    }
}

impl SortedNumericDoubleValues for WithScriptDoubleValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.values.set_document(doc)?;
        self.buffer.clear();
        self.script.set_document(doc);
        for i in 0..self.values.count() {
            self.script
                .set_next_var(VALUE_VAR, VariantValue::Double(self.values.value_at(i)));
            self.buffer.push(self.script.run_as_double()?);
        }
        self.buffer.sort();
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

impl ScorerAware for WithScriptDoubleValues {
    fn set_scorer(&mut self, scorer: ScorerRef) {
        self.script.set_scorer(scorer);
    }
}

/// The script reads each value as a string and its result is rendered as
/// text.
pub struct WithScriptBytesValues {
    values: Box<dyn SortedBinaryDocValues>,
    script: Box<dyn LeafSearchScript>,
    buffer: SortingBinaryDocValues,
}

impl WithScriptBytesValues {
    pub fn new(values: Box<dyn SortedBinaryDocValues>, script: Box<dyn LeafSearchScript>) -> Self {
        WithScriptBytesValues {
            values,
            script,
            buffer: SortingBinaryDocValues::new(),
        }
    }
}

impl SortedBinaryDocValues for WithScriptBytesValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.values.set_document(doc)?;
        self.buffer.clear();
        self.script.set_document(doc);
        for i in 0..self.values.count() {
            let value = String::from_utf8_lossy(self.values.value_at(i)).into_owned();
            self.script.set_next_var(VALUE_VAR, VariantValue::VString(value));
            let result = self.script.run_as_string()?;
            self.buffer.push(result.as_bytes());
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

    fn as_scorer_aware(&mut self) -> Option<&mut dyn ScorerAware> {
        Some(self)
    }
}

impl ScorerAware for WithScriptBytesValues {
    fn set_scorer(&mut self, scorer: ScorerRef) {
        self.script.set_scorer(scorer);
    }
}
