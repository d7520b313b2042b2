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

use crate::core::index::{
    OrdinalMap, RandomAccessOrds, SortedDocValues, SortedSetDocValues, NO_MORE_ORDS,
};
use crate::core::util::{ComputeTime, DocId, LongValues};
use crate::error::{ErrorKind, Result};

use smallvec::SmallVec;
use std::sync::Arc;

/// Ordinals of one field merged across every partition of an index.
///
/// Built once from the local dictionaries of all partitions, then shared
/// read-only by the per-partition views returned by
/// `global_ordinals_values` and `global_sorted_values`.
pub struct GlobalOrdinals {
    field: String,
    ordinal_map: OrdinalMap,
    // local dictionaries, used to resolve a global ordinal back to its term
    lookups: Vec<Box<dyn RandomAccessOrds>>,
}

impl GlobalOrdinals {
    /// `segments` must hold the local ordinals of every partition, in
    /// partition order.
    pub fn build(field: &str, segments: Vec<Box<dyn RandomAccessOrds>>) -> Result<Self> {
        let _t = ComputeTime::new("global_ordinals", field);
        let ordinal_map = OrdinalMap::build(&segments)?;
        debug!(
            "built global ordinals for field [{}]: {} segments, {} values",
            field,
            segments.len(),
            ordinal_map.value_count()
        );
        Ok(GlobalOrdinals {
            field: field.to_string(),
            ordinal_map,
            lookups: segments,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Number of partitions the dictionary was merged from.
    pub fn segment_count(&self) -> usize {
        self.lookups.len()
    }

    /// Cardinality of the merged dictionary.
    pub fn value_count(&self) -> usize {
        self.ordinal_map.value_count() as usize
    }

    pub fn ordinal_map(&self) -> &OrdinalMap {
        &self.ordinal_map
    }

    pub fn lookup_ord(&self, global_ord: i64) -> Result<Vec<u8>> {
        if global_ord < 0 || global_ord >= self.ordinal_map.value_count() {
            bail!(ErrorKind::IllegalArgument(format!(
                "global ordinal {} out of range for field [{}] with {} values",
                global_ord,
                self.field,
                self.value_count()
            )));
        }
        let segment = self.ordinal_map.first_segment_number(global_ord);
        let segment_ord = self.ordinal_map.first_segment_ord(global_ord);
        self.lookups[segment].lookup_ord(segment_ord)
    }

    fn segment_mapping(&self, segment: usize) -> Result<Arc<dyn LongValues>> {
        if segment >= self.ordinal_map.num_segments() {
            bail!(ErrorKind::IllegalState(format!(
                "global ordinals of field [{}] were built for {} segments, got segment {}",
                self.field,
                self.ordinal_map.num_segments(),
                segment
            )));
        }
        Ok(self.ordinal_map.get_global_ords(segment))
    }

    /// Maps the local ordinals of partition `segment` into the global space.
    pub fn global_ordinals_values(
        self: &Arc<Self>,
        segment: usize,
        local: Box<dyn RandomAccessOrds>,
    ) -> Result<Box<dyn RandomAccessOrds>> {
        let mapping = self.segment_mapping(segment)?;
        Ok(Box::new(GlobalOrdinalMapping {
            values: local,
            mapping,
            global: Arc::clone(self),
            ords: SmallVec::new(),
            next: 0,
        }))
    }

    /// Single-valued variant of `global_ordinals_values`.
    pub fn global_sorted_values(
        self: &Arc<Self>,
        segment: usize,
        local: Arc<dyn SortedDocValues>,
    ) -> Result<Arc<dyn SortedDocValues>> {
        let mapping = self.segment_mapping(segment)?;
        Ok(Arc::new(GlobalSortedDocValues {
            values: local,
            mapping,
            global: Arc::clone(self),
        }))
    }
}

/// Local ordinals of one partition, translated to global ordinals.
struct GlobalOrdinalMapping {
    values: Box<dyn RandomAccessOrds>,
    mapping: Arc<dyn LongValues>,
    global: Arc<GlobalOrdinals>,
    ords: SmallVec<[i64; 4]>,
    next: usize,
}

impl SortedSetDocValues for GlobalOrdinalMapping {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.values.set_document(doc)?;
        self.ords.clear();
        self.next = 0;
        for i in 0..self.values.cardinality() {
            // the mapping is monotonic, so global ords stay sorted
            let ord = self.mapping.get64(self.values.ord_at(i))?;
            self.ords.push(ord);
        }
        Ok(())
    }

    fn next_ord(&mut self) -> i64 {
        if self.next < self.ords.len() {
            let ord = self.ords[self.next];
            self.next += 1;
            ord
        } else {
            NO_MORE_ORDS
        }
    }

    fn lookup_ord(&self, ord: i64) -> Result<Vec<u8>> {
        self.global.lookup_ord(ord)
    }

    fn get_value_count(&self) -> usize {
        self.global.value_count()
    }

    fn get_sorted_doc_values(&self) -> Option<Arc<dyn SortedDocValues>> {
        self.values.get_sorted_doc_values().map(|local| {
            Arc::new(GlobalSortedDocValues {
                values: local,
                mapping: Arc::clone(&self.mapping),
                global: Arc::clone(&self.global),
            }) as Arc<dyn SortedDocValues>
        })
    }
}

impl RandomAccessOrds for GlobalOrdinalMapping {
    fn ord_at(&self, index: usize) -> i64 {
        self.ords[index]
    }

    fn cardinality(&self) -> usize {
        self.ords.len()
    }
}

struct GlobalSortedDocValues {
    values: Arc<dyn SortedDocValues>,
    mapping: Arc<dyn LongValues>,
    global: Arc<GlobalOrdinals>,
}

impl SortedDocValues for GlobalSortedDocValues {
    fn get_ord(&self, doc_id: DocId) -> Result<i32> {
        let ord = self.values.get_ord(doc_id)?;
        if ord < 0 {
            Ok(ord)
        } else {
            Ok(self.mapping.get64(i64::from(ord))? as i32)
        }
    }

    fn lookup_ord(&self, ord: i32) -> Result<Vec<u8>> {
        self.global.lookup_ord(i64::from(ord))
    }

    fn value_count(&self) -> usize {
        self.global.value_count()
    }
}
