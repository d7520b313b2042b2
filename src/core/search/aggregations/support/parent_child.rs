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
    AtomicFieldData, GlobalOrdinals, IndexParentChildFieldData, SortedBinaryDocValues,
};
use crate::core::index::{
    EmptySortedDocValues, IndexReader, LeafReaderContext, RandomAccessOrds,
    SingletonSortedSetDocValues, SortedDocValues,
};
use crate::core::search::aggregations::support::{check_segment_count, ValuesSource};
use crate::error::Result;

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Byte values of a join field, with one ordinal dictionary per relation
/// name.
///
/// Relations are never merged with each other: each gets its own global
/// ordinals, built together on first use.
pub struct ParentChild {
    field_data: Arc<dyn IndexParentChildFieldData>,
    global_ordinals: OnceCell<RelationOrdinals>,
}

struct RelationOrdinals {
    segment_count: usize,
    by_relation: HashMap<String, Arc<GlobalOrdinals>>,
}

impl ParentChild {
    pub fn new(field_data: Arc<dyn IndexParentChildFieldData>) -> Self {
        ParentChild {
            field_data,
            global_ordinals: OnceCell::new(),
        }
    }

    fn global_ordinals(
        &self,
        reader: &dyn IndexReader,
    ) -> Result<&HashMap<String, Arc<GlobalOrdinals>>> {
        let built = self.global_ordinals.get_or_try_init(|| -> Result<RelationOrdinals> {
            let leaves = reader.leaves();
            let mut atomics = Vec::with_capacity(leaves.len());
            for leaf in &leaves {
                atomics.push(self.field_data.load(leaf)?);
            }

            let mut global_ordinals = HashMap::new();
            for relation in self.field_data.parent_types() {
                let mut segments: Vec<Box<dyn RandomAccessOrds>> =
                    Vec::with_capacity(leaves.len());
                for atomic in &atomics {
                    let sorted = atomic.ordinals_values(&relation)?;
                    segments.push(Box::new(SingletonSortedSetDocValues::new(sorted)));
                }
                let name = format!("{}#{}", self.field_data.field_name(), relation);
                let global = GlobalOrdinals::build(&name, segments)?;
                global_ordinals.insert(relation, Arc::new(global));
            }
            Ok(RelationOrdinals {
                segment_count: leaves.len(),
                by_relation: global_ordinals,
            })
        })?;
        check_segment_count(self.field_data.field_name(), built.segment_count, reader)?;
        Ok(&built.by_relation)
    }

    /// Ordinals of `relation` in the partition, mapped into the dictionary
    /// of that relation merged across every partition of `context.parent`.
    pub fn global_ordinals_values(
        &self,
        relation: &str,
        context: &LeafReaderContext<'_>,
    ) -> Result<Arc<dyn SortedDocValues>> {
        match self.global_ordinals(context.parent)?.get(relation) {
            Some(global) => {
                let local = self.field_data.load(context)?.ordinals_values(relation)?;
                global.global_sorted_values(context.ord, local)
            }
            None => {
                debug!(
                    "field [{}] has no relation [{}]",
                    self.field_data.field_name(),
                    relation
                );
                Ok(Arc::new(EmptySortedDocValues))
            }
        }
    }

    /// Cardinality of the merged dictionary of `relation`.
    pub fn global_max_ord(&self, reader: &dyn IndexReader, relation: &str) -> Result<i64> {
        match reader.leaves().first() {
            Some(leaf) => Ok(self.global_ordinals_values(relation, leaf)?.value_count() as i64),
            None => Ok(0),
        }
    }
}

impl ValuesSource for ParentChild {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        self.field_data.load(context)?.bytes_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fielddata::memory::{MemoryIndexReader, MemoryParentChildFieldData};
    use crate::core::fielddata::AtomicParentChildFieldData;
    use crate::error::ErrorKind;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    fn join_data() -> MemoryParentChildFieldData {
        MemoryParentChildFieldData::new(
            "join",
            &[
                vec![vec![("question", "q1")], vec![("answer", "q1"), ("question", "q3")]],
                vec![vec![("question", "q2")], vec![("question", "q1")]],
            ],
        )
        .unwrap()
    }

    fn join_field() -> ParentChild {
        ParentChild::new(Arc::new(join_data()))
    }

    struct CountingLoads {
        inner: MemoryParentChildFieldData,
        loads: AtomicUsize,
    }

    impl IndexParentChildFieldData for CountingLoads {
        fn field_name(&self) -> &str {
            self.inner.field_name()
        }

        fn parent_types(&self) -> Vec<String> {
            self.inner.parent_types()
        }

        fn load(
            &self,
            context: &LeafReaderContext<'_>,
        ) -> Result<Arc<dyn AtomicParentChildFieldData>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(context)
        }
    }

    #[test]
    fn test_concurrent_partitions_build_relations_once() {
        let reader = Arc::new(MemoryIndexReader::new(&[2, 2]));
        let field = Arc::new(CountingLoads {
            inner: join_data(),
            loads: AtomicUsize::new(0),
        });
        let source = Arc::new(ParentChild::new(
            Arc::clone(&field) as Arc<dyn IndexParentChildFieldData>
        ));

        let threads = 6;
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
                    let values = source.global_ordinals_values("question", leaf).unwrap();
                    assert_eq!(values.value_count(), 3);
                    let relations = source.global_ordinals(reader.as_ref()).unwrap();
                    Arc::clone(&relations["question"])
                })
            })
            .collect();
        let built: Vec<Arc<GlobalOrdinals>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(built.iter().all(|g| Arc::ptr_eq(g, &built[0])));
        // one load per partition for the single build, one per local lookup
        assert_eq!(field.loads.load(Ordering::SeqCst), 2 + threads);
    }

    #[test]
    fn test_relations_reject_a_reader_with_other_partitions() {
        let reader = MemoryIndexReader::new(&[2, 2]);
        let source = join_field();
        assert_eq!(source.global_max_ord(&reader, "question").unwrap(), 3);

        let other = MemoryIndexReader::new(&[2]);
        match source.global_max_ord(&other, "question") {
            Err(e) => match *e.kind() {
                ErrorKind::IllegalState(_) => {}
                ref k => panic!("unexpected error {:?}", k),
            },
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_global_ordinals_per_relation() {
        let reader = MemoryIndexReader::new(&[2, 2]);
        let source = join_field();
        assert_eq!(source.global_max_ord(&reader, "question").unwrap(), 3);
        assert_eq!(source.global_max_ord(&reader, "answer").unwrap(), 1);

        let leaves = reader.leaves();
        let first = source.global_ordinals_values("question", &leaves[0]).unwrap();
        let second = source.global_ordinals_values("question", &leaves[1]).unwrap();
        assert_eq!(first.get_ord(0).unwrap(), 0);
        assert_eq!(first.get_ord(1).unwrap(), 2);
        assert_eq!(second.get_ord(0).unwrap(), 1);
        // q1 maps to the same global ordinal from both partitions
        assert_eq!(second.get_ord(1).unwrap(), 0);
        assert_eq!(second.lookup_ord(2).unwrap(), b"q3".to_vec());

        let answers = source.global_ordinals_values("answer", &leaves[1]).unwrap();
        assert_eq!(answers.get_ord(0).unwrap(), -1);
        assert_eq!(answers.value_count(), 1);
    }

    #[test]
    fn test_unknown_relation_is_empty() {
        let reader = MemoryIndexReader::new(&[2, 2]);
        let source = join_field();
        assert_eq!(source.global_max_ord(&reader, "comment").unwrap(), 0);
        let leaves = reader.leaves();
        let values = source.global_ordinals_values("comment", &leaves[0]).unwrap();
        assert_eq!(values.get_ord(0).unwrap(), -1);
    }

    #[test]
    fn test_bytes_values() {
        let reader = MemoryIndexReader::new(&[2, 2]);
        let source = join_field();
        let leaves = reader.leaves();
        let mut bytes = source.bytes_values(&leaves[0]).unwrap();
        bytes.set_document(1).unwrap();
        assert_eq!(bytes.count(), 2);
        assert_eq!(bytes.value_at(0), b"q1");
        assert_eq!(bytes.value_at(1), b"q3");
        assert!(!source.needs_scores());
    }
}
