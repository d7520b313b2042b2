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
    AtomicFieldData, GlobalOrdinals, IndexFieldData, IndexOrdinalsFieldData,
    SortedBinaryDocValues,
};
use crate::core::index::{IndexReader, LeafReaderContext, RandomAccessOrds};
use crate::core::search::aggregations::support::{
    check_segment_count, ordinals_docs_with_value, OrdinalsValuesSource, ScriptBytesValues,
    ValuesSource,
};
use crate::core::search::SearchScript;
use crate::core::util::BitsRef;
use crate::error::Result;

use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Byte values of a field, as the field data stores them.
pub struct BytesFieldData {
    field_data: Arc<dyn IndexFieldData>,
}

impl BytesFieldData {
    pub fn new(field_data: Arc<dyn IndexFieldData>) -> Self {
        BytesFieldData { field_data }
    }
}

impl ValuesSource for BytesFieldData {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        self.field_data.load(context)?.bytes_values()
    }
}

/// Byte values of a dictionary-coded field.
///
/// The global ordinals are merged on first use and kept for the life of
/// the source, so a source must not outlive the reader it was first
/// used with.
pub struct OrdinalsFieldData {
    field_data: Arc<dyn IndexOrdinalsFieldData>,
    global_ordinals: OnceCell<Arc<GlobalOrdinals>>,
}

impl OrdinalsFieldData {
    pub fn new(field_data: Arc<dyn IndexOrdinalsFieldData>) -> Self {
        OrdinalsFieldData {
            field_data,
            global_ordinals: OnceCell::new(),
        }
    }

    /// The merged dictionary of every partition of `reader`, built on the
    /// first call.
    pub fn global_ordinals(&self, reader: &dyn IndexReader) -> Result<&Arc<GlobalOrdinals>> {
        let global = self.global_ordinals.get_or_try_init(|| -> Result<Arc<GlobalOrdinals>> {
            let mut segments = Vec::new();
            for leaf in reader.leaves() {
                segments.push(self.field_data.load(&leaf)?.ordinals_values()?);
            }
            let global = GlobalOrdinals::build(self.field_data.field_name(), segments)?;
            Ok(Arc::new(global))
        })?;
        check_segment_count(global.field(), global.segment_count(), reader)?;
        Ok(global)
    }
}

impl ValuesSource for OrdinalsFieldData {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        self.field_data.load(context)?.bytes_values()
    }

    fn docs_with_value(&self, context: &LeafReaderContext<'_>) -> Result<BitsRef> {
        ordinals_docs_with_value(self.ordinals_values(context)?, context)
    }
}

impl OrdinalsValuesSource for OrdinalsFieldData {
    fn ordinals_values(&self, context: &LeafReaderContext<'_>) -> Result<Box<dyn RandomAccessOrds>> {
        self.field_data.load(context)?.ordinals_values()
    }

    fn global_ordinals_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn RandomAccessOrds>> {
        let global = self.global_ordinals(context.parent)?;
        let local = self.ordinals_values(context)?;
        global.global_ordinals_values(context.ord, local)
    }

    fn global_max_ord(&self, reader: &dyn IndexReader) -> Result<i64> {
        match reader.leaves().first() {
            Some(leaf) => Ok(self.global_ordinals_values(leaf)?.get_value_count() as i64),
            None => Ok(0),
        }
    }
}

/// Byte values computed by a script for every document.
pub struct BytesScript {
    script: Arc<dyn SearchScript>,
}

impl BytesScript {
    pub fn new(script: Arc<dyn SearchScript>) -> Self {
        BytesScript { script }
    }
}

impl ValuesSource for BytesScript {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        let script = self.script.get_leaf_search_script(context)?;
        Ok(Box::new(ScriptBytesValues::new(script)))
    }

    fn needs_scores(&self) -> bool {
        self.script.needs_scores()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fielddata::memory::{
        MemoryBinaryFieldData, MemoryIndexReader, MemoryOrdinalsFieldData,
    };
    use crate::core::fielddata::{AtomicOrdinalsFieldData, FieldData};
    use crate::core::index::DocValues;
    use crate::core::search::aggregations::support::{FieldDataRef, ValuesSourceConfig};
    use crate::core::search::tests::MockSearchScript;
    use crate::core::util::{Bits, VariantValue};
    use crate::error::ErrorKind;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    fn ordinals(segments: &[Vec<Vec<&str>>]) -> OrdinalsFieldData {
        OrdinalsFieldData::new(Arc::new(MemoryOrdinalsFieldData::new("tag", segments)))
    }

    fn global_ords(source: &OrdinalsFieldData, reader: &MemoryIndexReader) -> Vec<Vec<i64>> {
        let mut docs = Vec::new();
        for leaf in reader.leaves() {
            let mut ords = source.global_ordinals_values(&leaf).unwrap();
            for doc in 0..leaf.max_doc() {
                ords.set_document(doc).unwrap();
                docs.push((0..ords.cardinality()).map(|i| ords.ord_at(i)).collect());
            }
        }
        docs
    }

    #[test]
    fn test_overlapping_value_gets_one_global_ordinal() {
        // partition A: {x -> 0, y -> 1}, partition B: {y -> 0, z -> 1}
        let reader = MemoryIndexReader::new(&[2, 2]);
        let source = ordinals(&[
            vec![vec!["x"], vec!["y"]],
            vec![vec!["y"], vec!["z"]],
        ]);

        assert_eq!(source.global_max_ord(&reader).unwrap(), 3);
        assert_eq!(
            global_ords(&source, &reader),
            vec![vec![0], vec![1], vec![1], vec![2]]
        );

        let leaves = reader.leaves();
        let global = source.global_ordinals_values(&leaves[1]).unwrap();
        assert_eq!(global.lookup_ord(0).unwrap(), b"x".to_vec());
        assert_eq!(global.lookup_ord(1).unwrap(), b"y".to_vec());
        assert_eq!(global.lookup_ord(2).unwrap(), b"z".to_vec());
        assert_eq!(global.lookup_term(b"y").unwrap(), 1);
    }

    #[test]
    fn test_global_max_ord_is_partition_independent() {
        let reader = MemoryIndexReader::new(&[1, 2, 1]);
        let source = ordinals(&[
            vec![vec!["b"]],
            vec![vec!["a", "c"], vec!["d"]],
            vec![vec!["a"]],
        ]);
        let counts: Vec<usize> = reader
            .leaves()
            .iter()
            .map(|leaf| source.global_ordinals_values(leaf).unwrap().get_value_count())
            .collect();
        assert_eq!(counts, vec![4, 4, 4]);
        assert_eq!(source.global_max_ord(&reader).unwrap(), 4);
    }

    #[test]
    fn test_global_ordinals_are_built_once() {
        let reader = MemoryIndexReader::new(&[1, 1]);
        let source = ordinals(&[vec![vec!["a"]], vec![vec!["b"]]]);
        let first = Arc::clone(source.global_ordinals(&reader).unwrap());
        let leaves = reader.leaves();
        source.global_ordinals_values(&leaves[1]).unwrap();
        let second = source.global_ordinals(&reader).unwrap();
        assert!(Arc::ptr_eq(&first, second));
    }

    struct CountingLoads {
        inner: MemoryOrdinalsFieldData,
        loads: AtomicUsize,
    }

    impl IndexOrdinalsFieldData for CountingLoads {
        fn field_name(&self) -> &str {
            IndexOrdinalsFieldData::field_name(&self.inner)
        }

        fn load(
            &self,
            context: &LeafReaderContext<'_>,
        ) -> Result<Arc<dyn AtomicOrdinalsFieldData>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            IndexOrdinalsFieldData::load(&self.inner, context)
        }
    }

    #[test]
    fn test_concurrent_partitions_build_global_ordinals_once() {
        let reader = Arc::new(MemoryIndexReader::new(&[2, 2, 1]));
        let field = Arc::new(CountingLoads {
            inner: MemoryOrdinalsFieldData::new(
                "tag",
                &[
                    vec![vec!["c"], vec!["a"]],
                    vec![vec!["b"], vec!["c"]],
                    vec![vec!["d"]],
                ],
            ),
            loads: AtomicUsize::new(0),
        });
        let source = Arc::new(OrdinalsFieldData::new(
            Arc::clone(&field) as Arc<dyn IndexOrdinalsFieldData>
        ));

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let reader = Arc::clone(&reader);
                let source = Arc::clone(&source);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let leaves = reader.leaves();
                    let leaf = &leaves[i % leaves.len()];
                    barrier.wait();
                    let ords = source.global_ordinals_values(leaf).unwrap();
                    assert_eq!(ords.get_value_count(), 4);
                    Arc::clone(source.global_ordinals(reader.as_ref()).unwrap())
                })
            })
            .collect();
        let built: Vec<Arc<GlobalOrdinals>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(built.iter().all(|g| Arc::ptr_eq(g, &built[0])));
        // one load per partition for the single build, one per local lookup
        assert_eq!(field.loads.load(Ordering::SeqCst), 3 + threads);
    }

    #[test]
    fn test_global_ordinals_reject_a_reader_with_other_partitions() {
        let reader = MemoryIndexReader::new(&[1, 1]);
        let source = ordinals(&[vec![vec!["a"]], vec![vec!["b"]]]);
        assert_eq!(source.global_max_ord(&reader).unwrap(), 2);

        let other = MemoryIndexReader::new(&[1]);
        match source.global_max_ord(&other) {
            Err(e) => match *e.kind() {
                ErrorKind::IllegalState(_) => {}
                ref k => panic!("unexpected error {:?}", k),
            },
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_global_max_ord_of_empty_index() {
        let reader = MemoryIndexReader::new(&[]);
        let source = ordinals(&[]);
        assert_eq!(source.global_max_ord(&reader).unwrap(), 0);
    }

    #[test]
    fn test_single_valued_global_ordinals_keep_the_singleton_view() {
        let reader = MemoryIndexReader::new(&[2, 1]);
        let source = ordinals(&[vec![vec!["m"], vec![]], vec![vec!["a"]]]);
        let leaves = reader.leaves();
        let ords = source.global_ordinals_values(&leaves[0]).unwrap();
        let sorted = DocValues::unwrap_singleton(ords.as_ref()).unwrap();
        assert_eq!(sorted.get_ord(0).unwrap(), 1);
        assert_eq!(sorted.get_ord(1).unwrap(), -1);
        assert_eq!(sorted.value_count(), 2);
    }

    #[test]
    fn test_docs_with_value_fast_path_agrees_with_scan() {
        let reader = MemoryIndexReader::new(&[4]);
        let docs = vec![vec!["a"], vec![], vec!["b"], vec![]];
        let single = ordinals(&[docs.clone()]);
        let mut multi_docs = docs;
        multi_docs[2] = vec!["b", "c"];
        let multi = ordinals(&[multi_docs]);

        let leaves = reader.leaves();
        let leaf = &leaves[0];
        let single_ords = single.ordinals_values(leaf).unwrap();
        assert!(DocValues::unwrap_singleton(single_ords.as_ref()).is_some());
        let multi_ords = multi.ordinals_values(leaf).unwrap();
        assert!(DocValues::unwrap_singleton(multi_ords.as_ref()).is_none());

        let fast = single.docs_with_value(leaf).unwrap();
        let scanned = multi.docs_with_value(leaf).unwrap();
        let mut bytes = single.bytes_values(leaf).unwrap();
        for doc in 0..4 {
            bytes.set_document(doc).unwrap();
            let expected = bytes.count() > 0;
            assert_eq!(fast.get(doc as usize).unwrap(), expected);
            assert_eq!(scanned.get(doc as usize).unwrap(), expected);
        }
    }

    #[test]
    fn test_plain_bytes_presence_agrees_with_counts() {
        let reader = MemoryIndexReader::new(&[4, 3]);
        let field = MemoryBinaryFieldData::new(
            "raw",
            &[
                vec![vec!["k"], vec![], vec!["e"], vec![]],
                vec![vec!["y", "x"], vec![], vec!["x"]],
            ],
        );
        let source = ValuesSourceConfig::new()
            .field_data(FieldDataRef::Bytes(Arc::new(field)))
            .build()
            .unwrap();
        assert_eq!(source.name(), "bytes");

        for leaf in reader.leaves() {
            let mut values = source.bytes_values(&leaf).unwrap();
            // the first partition is single-valued, the second is not
            let singleton = FieldData::unwrap_singleton_bits(values.as_ref());
            assert_eq!(singleton.is_some(), leaf.ord == 0);
            let scanned = FieldData::docs_with_value_bytes(values.as_mut(), leaf.max_doc()).unwrap();
            let bits = source.docs_with_value(&leaf).unwrap();
            for doc in 0..leaf.max_doc() {
                values.set_document(doc).unwrap();
                let expected = values.count() > 0;
                assert_eq!(bits.get(doc as usize).unwrap(), expected);
                assert_eq!(scanned.get(doc as usize).unwrap(), expected);
                if let Some(ref singleton) = singleton {
                    assert_eq!(singleton.get(doc as usize).unwrap(), expected);
                }
            }
        }

        let leaves = reader.leaves();
        let mut values = source.bytes_values(&leaves[1]).unwrap();
        values.set_document(0).unwrap();
        assert_eq!(values.value_at(0), b"x");
        assert_eq!(values.value_at(1), b"y");
    }

    #[test]
    fn test_missing_partition_is_a_storage_error() {
        let reader = MemoryIndexReader::new(&[1, 1]);
        let source = ordinals(&[vec![vec!["a"]]]);
        let leaves = reader.leaves();
        match source.global_ordinals_values(&leaves[0]) {
            Err(e) => match *e.kind() {
                ErrorKind::StorageRead(_) => {}
                ref k => panic!("unexpected error {:?}", k),
            },
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_bytes_script() {
        let reader = MemoryIndexReader::new(&[3]);
        let script = Arc::new(MockSearchScript::new(|doc, _, _| {
            Ok(match doc {
                0 => VariantValue::Vec(vec!["b".into(), "a".into()]),
                1 => VariantValue::Null,
                _ => VariantValue::Long(42),
            })
        }));
        let source = BytesScript::new(script);
        assert!(source.needs_scores());

        let leaves = reader.leaves();
        let mut values = source.bytes_values(&leaves[0]).unwrap();
        values.set_document(0).unwrap();
        assert_eq!(values.count(), 2);
        assert_eq!(values.value_at(0), b"a");
        assert_eq!(values.value_at(1), b"b");
        values.set_document(1).unwrap();
        assert_eq!(values.count(), 0);
        values.set_document(2).unwrap();
        assert_eq!(values.value_at(0), b"42");

        let bits = source.docs_with_value(&leaves[0]).unwrap();
        assert!(bits.get(0).unwrap());
        assert!(!bits.get(1).unwrap());
        assert!(bits.get(2).unwrap());
    }
}
