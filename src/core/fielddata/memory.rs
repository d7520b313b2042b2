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

//! In-memory field data, built from plain per-document value lists.
//!
//! Every segment is given as one entry per document, each entry holding
//! the values of that document in any order. Values are sorted per
//! document on construction, and ordinal dictionaries are sorted and
//! deduplicated, so the accessors uphold the same invariants as on-disk
//! doc values. Fields whose documents all have at most one value are
//! exposed through the singleton wrappers.

use crate::core::fielddata::{
    AtomicFieldData, AtomicGeoPointFieldData, AtomicNumericFieldData, AtomicOrdinalsFieldData,
    AtomicParentChildFieldData, FieldData, GeoPoint, GeoPointValues, IndexFieldData,
    IndexGeoPointFieldData, IndexNumericFieldData, IndexOrdinalsFieldData,
    IndexParentChildFieldData, MultiGeoPointValues, NumericDoubleValues, NumericType,
    SortedBinaryDocValues, SortedNumericDoubleValues,
};
use crate::core::index::{
    BinaryDocValues, DocValues, EmptySortedDocValues, IndexReader, LeafReader, LeafReaderContext,
    NumericDocValues, RandomAccessOrds, SortedDocValues, SortedNumericDocValues,
    SortedSetDocValues, NO_MORE_ORDS,
};
use crate::core::util::{BitsRef, DocId, FixedBitSet, MatchAllBits};
use crate::error::{ErrorKind, Result};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub struct MemoryLeafReader {
    max_doc: DocId,
}

impl MemoryLeafReader {
    pub fn new(max_doc: DocId) -> Self {
        MemoryLeafReader { max_doc }
    }
}

impl LeafReader for MemoryLeafReader {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }
}

/// An index made of in-memory partitions of the given sizes.
pub struct MemoryIndexReader {
    leaves: Vec<MemoryLeafReader>,
}

impl MemoryIndexReader {
    pub fn new(max_docs: &[DocId]) -> Self {
        MemoryIndexReader {
            leaves: max_docs.iter().map(|m| MemoryLeafReader::new(*m)).collect(),
        }
    }
}

impl IndexReader for MemoryIndexReader {
    fn leaves(&self) -> Vec<LeafReaderContext<'_>> {
        let mut doc_base = 0;
        let mut leaves = Vec::with_capacity(self.leaves.len());
        for (ord, leaf) in self.leaves.iter().enumerate() {
            leaves.push(LeafReaderContext::new(self, leaf, ord, doc_base));
            doc_base += leaf.max_doc();
        }
        leaves
    }
}

/// Values of every document of a segment, laid out back to back.
struct DocTable<T> {
    offsets: Vec<usize>,
    values: Vec<T>,
}

impl<T> DocTable<T> {
    fn new(docs: Vec<Vec<T>>) -> Self {
        let mut offsets = Vec::with_capacity(docs.len() + 1);
        let mut values = Vec::new();
        offsets.push(0);
        for doc in docs {
            values.extend(doc);
            offsets.push(values.len());
        }
        DocTable { offsets, values }
    }

    fn max_doc(&self) -> DocId {
        (self.offsets.len() - 1) as DocId
    }

    fn range(&self, doc: DocId) -> Result<(usize, usize)> {
        if doc < 0 || doc >= self.max_doc() {
            bail!(ErrorKind::StorageRead(format!(
                "doc {} out of range for segment with {} docs",
                doc,
                self.max_doc()
            )));
        }
        let doc = doc as usize;
        Ok((self.offsets[doc], self.offsets[doc + 1]))
    }

    fn is_single_valued(&self) -> bool {
        self.offsets.windows(2).all(|w| w[1] - w[0] <= 1)
    }

    fn docs_with_field(&self) -> BitsRef {
        let max_doc = self.max_doc() as usize;
        if self.values.len() == max_doc && self.is_single_valued() {
            return Arc::new(MatchAllBits::new(max_doc));
        }
        let mut bits = FixedBitSet::new(max_doc);
        for doc in 0..max_doc {
            if self.offsets[doc + 1] > self.offsets[doc] {
                bits.set(doc);
            }
        }
        Arc::new(bits)
    }
}

/// Single-valued column, missing values hold `T::default()`.
struct DenseColumn<T> {
    values: Vec<T>,
}

impl<T: Copy + Default> DenseColumn<T> {
    fn from_table(table: &DocTable<T>) -> Self {
        let mut values = Vec::with_capacity(table.max_doc() as usize);
        for w in table.offsets.windows(2) {
            values.push(if w[1] > w[0] {
                table.values[w[0]]
            } else {
                T::default()
            });
        }
        DenseColumn { values }
    }

    fn value(&self, doc: DocId) -> Result<T> {
        match self.values.get(doc as usize) {
            Some(v) if doc >= 0 => Ok(*v),
            _ => bail!(ErrorKind::StorageRead(format!(
                "doc {} out of range for segment with {} docs",
                doc,
                self.values.len()
            ))),
        }
    }
}

impl NumericDocValues for DenseColumn<i64> {
    fn get(&self, doc_id: DocId) -> Result<i64> {
        self.value(doc_id)
    }
}

impl NumericDoubleValues for DenseColumn<f64> {
    fn get(&self, doc_id: DocId) -> Result<f64> {
        self.value(doc_id)
    }
}

impl GeoPointValues for DenseColumn<GeoPoint> {
    fn get(&self, doc_id: DocId) -> Result<GeoPoint> {
        self.value(doc_id)
    }
}

/// A column of values, with a single-valued view when every document has
/// at most one value.
struct Column<T> {
    table: Arc<DocTable<T>>,
    single: Option<(Arc<DenseColumn<T>>, BitsRef)>,
}

impl<T: Copy + Default> Column<T> {
    fn new(docs: Vec<Vec<T>>) -> Self {
        let table = DocTable::new(docs);
        let single = if table.is_single_valued() {
            Some((
                Arc::new(DenseColumn::from_table(&table)),
                table.docs_with_field(),
            ))
        } else {
            None
        };
        Column {
            table: Arc::new(table),
            single,
        }
    }

    fn cursor(&self) -> TableCursor<T> {
        TableCursor {
            table: Arc::clone(&self.table),
            start: 0,
            end: 0,
        }
    }
}

/// Positions on the values of one document of a `DocTable`.
struct TableCursor<T> {
    table: Arc<DocTable<T>>,
    start: usize,
    end: usize,
}

impl<T> TableCursor<T> {
    fn position(&mut self, doc: DocId) -> Result<()> {
        let (start, end) = self.table.range(doc)?;
        self.start = start;
        self.end = end;
        Ok(())
    }
}

impl SortedNumericDocValues for TableCursor<i64> {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.position(doc)
    }

    fn value_at(&self, index: usize) -> i64 {
        self.table.values[self.start + index]
    }

    fn count(&self) -> usize {
        self.end - self.start
    }
}

impl SortedNumericDoubleValues for TableCursor<f64> {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.position(doc)
    }

    fn value_at(&self, index: usize) -> f64 {
        self.table.values[self.start + index]
    }

    fn count(&self) -> usize {
        self.end - self.start
    }
}

impl MultiGeoPointValues for TableCursor<GeoPoint> {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.position(doc)
    }

    fn value_at(&self, index: usize) -> GeoPoint {
        self.table.values[self.start + index]
    }

    fn count(&self) -> usize {
        self.end - self.start
    }
}

impl SortedBinaryDocValues for TableCursor<Vec<u8>> {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.position(doc)
    }

    fn count(&self) -> usize {
        self.end - self.start
    }

    fn value_at(&self, index: usize) -> &[u8] {
        &self.table.values[self.start + index]
    }
}

trait Segment {
    fn max_doc(&self) -> DocId;
}

fn segment_for<'a, T: Segment>(
    field: &str,
    segments: &'a [Arc<T>],
    context: &LeafReaderContext<'_>,
) -> Result<&'a Arc<T>> {
    match segments.get(context.ord) {
        Some(segment) if segment.max_doc() == context.max_doc() => Ok(segment),
        Some(segment) => bail!(ErrorKind::StorageRead(format!(
            "field [{}] has {} docs in segment {}, reader has {}",
            field,
            segment.max_doc(),
            context.ord,
            context.max_doc()
        ))),
        None => bail!(ErrorKind::StorageRead(format!(
            "field [{}] has no data for segment {}",
            field, context.ord
        ))),
    }
}

fn sorted_terms<S: AsRef<[u8]>>(docs: &[Vec<S>]) -> Vec<Vec<u8>> {
    let terms: BTreeSet<&[u8]> = docs
        .iter()
        .flat_map(|d| d.iter().map(|v| v.as_ref()))
        .collect();
    terms.into_iter().map(|t| t.to_vec()).collect()
}

/// Single-valued ordinals over an in-memory dictionary.
struct MemorySortedDocValues {
    terms: Arc<Vec<Vec<u8>>>,
    ords: Vec<i32>,
}

impl SortedDocValues for MemorySortedDocValues {
    fn get_ord(&self, doc_id: DocId) -> Result<i32> {
        match self.ords.get(doc_id as usize) {
            Some(ord) if doc_id >= 0 => Ok(*ord),
            _ => bail!(ErrorKind::StorageRead(format!(
                "doc {} out of range for segment with {} docs",
                doc_id,
                self.ords.len()
            ))),
        }
    }

    fn lookup_ord(&self, ord: i32) -> Result<Vec<u8>> {
        match self.terms.get(ord as usize) {
            Some(term) if ord >= 0 => Ok(term.clone()),
            _ => bail!(ErrorKind::IllegalArgument(format!(
                "ordinal {} out of range for {} values",
                ord,
                self.terms.len()
            ))),
        }
    }

    fn value_count(&self) -> usize {
        self.terms.len()
    }
}

/// Multi-valued ordinals over an in-memory dictionary.
struct MemorySortedSetDocValues {
    terms: Arc<Vec<Vec<u8>>>,
    ords: TableCursor<i64>,
    next: usize,
}

impl SortedSetDocValues for MemorySortedSetDocValues {
    fn set_document(&mut self, doc: DocId) -> Result<()> {
        self.ords.position(doc)?;
        self.next = self.ords.start;
        Ok(())
    }

    fn next_ord(&mut self) -> i64 {
        if self.next < self.ords.end {
            let ord = self.ords.table.values[self.next];
            self.next += 1;
            ord
        } else {
            NO_MORE_ORDS
        }
    }

    fn lookup_ord(&self, ord: i64) -> Result<Vec<u8>> {
        match self.terms.get(ord as usize) {
            Some(term) if ord >= 0 => Ok(term.clone()),
            _ => bail!(ErrorKind::IllegalArgument(format!(
                "ordinal {} out of range for {} values",
                ord,
                self.terms.len()
            ))),
        }
    }

    fn get_value_count(&self) -> usize {
        self.terms.len()
    }
}

impl RandomAccessOrds for MemorySortedSetDocValues {
    fn ord_at(&self, index: usize) -> i64 {
        self.ords.table.values[self.ords.start + index]
    }

    fn cardinality(&self) -> usize {
        self.ords.end - self.ords.start
    }
}

struct OrdinalsSegment {
    max_doc: DocId,
    terms: Arc<Vec<Vec<u8>>>,
    ords: Column<i64>,
    single: Option<Arc<MemorySortedDocValues>>,
}

impl OrdinalsSegment {
    fn new<S: AsRef<[u8]>>(docs: &[Vec<S>]) -> Self {
        let terms = sorted_terms(docs);
        let per_doc: Vec<Vec<i64>> = docs
            .iter()
            .map(|d| {
                let ords: BTreeSet<i64> = d
                    .iter()
                    .filter_map(|v| terms.binary_search_by(|t| t.as_slice().cmp(v.as_ref())).ok())
                    .map(|ord| ord as i64)
                    .collect();
                ords.into_iter().collect()
            })
            .collect();
        let terms = Arc::new(terms);
        let ords = Column::new(per_doc);
        let single = ords.single.as_ref().map(|_| {
            let doc_ords = ords
                .table
                .offsets
                .windows(2)
                .map(|w| {
                    if w[1] > w[0] {
                        ords.table.values[w[0]] as i32
                    } else {
                        -1
                    }
                })
                .collect();
            Arc::new(MemorySortedDocValues {
                terms: Arc::clone(&terms),
                ords: doc_ords,
            })
        });
        OrdinalsSegment {
            max_doc: docs.len() as DocId,
            terms,
            ords,
            single,
        }
    }

    fn ords(&self) -> Box<dyn RandomAccessOrds> {
        match self.single {
            Some(ref single) => Box::new(DocValues::singleton_sorted_doc_values(
                Arc::clone(single) as Arc<dyn SortedDocValues>,
            )),
            None => Box::new(MemorySortedSetDocValues {
                terms: Arc::clone(&self.terms),
                ords: self.ords.cursor(),
                next: 0,
            }),
        }
    }
}

impl Segment for OrdinalsSegment {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }
}

impl AtomicFieldData for OrdinalsSegment {
    fn bytes_values(&self) -> Result<Box<dyn SortedBinaryDocValues>> {
        Ok(FieldData::to_string_ordinals(
            self.ords(),
            self.max_doc,
        ))
    }
}

impl AtomicOrdinalsFieldData for OrdinalsSegment {
    fn ordinals_values(&self) -> Result<Box<dyn RandomAccessOrds>> {
        Ok(self.ords())
    }
}

/// Dictionary-coded byte values.
pub struct MemoryOrdinalsFieldData {
    field: String,
    segments: Vec<Arc<OrdinalsSegment>>,
}

impl MemoryOrdinalsFieldData {
    pub fn new<S: AsRef<[u8]>>(field: &str, segments: &[Vec<Vec<S>>]) -> Self {
        MemoryOrdinalsFieldData {
            field: field.to_string(),
            segments: segments
                .iter()
                .map(|docs| Arc::new(OrdinalsSegment::new(docs)))
                .collect(),
        }
    }

    fn segment(&self, context: &LeafReaderContext<'_>) -> Result<Arc<OrdinalsSegment>> {
        segment_for(&self.field, &self.segments, context).map(Arc::clone)
    }
}

impl IndexOrdinalsFieldData for MemoryOrdinalsFieldData {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn load(&self, context: &LeafReaderContext<'_>) -> Result<Arc<dyn AtomicOrdinalsFieldData>> {
        Ok(self.segment(context)?)
    }
}

impl IndexFieldData for MemoryOrdinalsFieldData {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn load(&self, context: &LeafReaderContext<'_>) -> Result<Arc<dyn AtomicFieldData>> {
        Ok(self.segment(context)?)
    }
}

/// Single-valued byte values, missing values read as empty.
struct DenseBinary {
    table: Arc<DocTable<Vec<u8>>>,
}

impl BinaryDocValues for DenseBinary {
    fn get(&self, doc_id: DocId) -> Result<Vec<u8>> {
        let (start, end) = self.table.range(doc_id)?;
        Ok(if end > start {
            self.table.values[start].clone()
        } else {
            Vec::new()
        })
    }
}

struct BinarySegment {
    table: Arc<DocTable<Vec<u8>>>,
    docs_with_field: Option<BitsRef>,
}

impl BinarySegment {
    fn new<S: AsRef<[u8]>>(docs: &[Vec<S>]) -> Self {
        let per_doc = docs
            .iter()
            .map(|d| {
                let mut values: Vec<Vec<u8>> = d.iter().map(|v| v.as_ref().to_vec()).collect();
                values.sort();
                values
            })
            .collect();
        let table = DocTable::new(per_doc);
        let docs_with_field = if table.is_single_valued() {
            Some(table.docs_with_field())
        } else {
            None
        };
        BinarySegment {
            table: Arc::new(table),
            docs_with_field,
        }
    }
}

impl Segment for BinarySegment {
    fn max_doc(&self) -> DocId {
        self.table.max_doc()
    }
}

impl AtomicFieldData for BinarySegment {
    fn bytes_values(&self) -> Result<Box<dyn SortedBinaryDocValues>> {
        let values: Box<dyn SortedBinaryDocValues> = match self.docs_with_field {
            Some(ref bits) => Box::new(FieldData::singleton_bytes(
                Arc::new(DenseBinary {
                    table: Arc::clone(&self.table),
                }),
                Arc::clone(bits),
            )),
            None => Box::new(TableCursor {
                table: Arc::clone(&self.table),
                start: 0,
                end: 0,
            }),
        };
        Ok(values)
    }
}

/// Raw byte values, without an ordinal dictionary.
pub struct MemoryBinaryFieldData {
    field: String,
    segments: Vec<Arc<BinarySegment>>,
}

impl MemoryBinaryFieldData {
    pub fn new<S: AsRef<[u8]>>(field: &str, segments: &[Vec<Vec<S>>]) -> Self {
        MemoryBinaryFieldData {
            field: field.to_string(),
            segments: segments
                .iter()
                .map(|docs| Arc::new(BinarySegment::new(docs)))
                .collect(),
        }
    }
}

impl IndexFieldData for MemoryBinaryFieldData {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn load(&self, context: &LeafReaderContext<'_>) -> Result<Arc<dyn AtomicFieldData>> {
        let segment = segment_for(&self.field, &self.segments, context)?;
        Ok(Arc::clone(segment) as Arc<dyn AtomicFieldData>)
    }
}

enum NumericColumn {
    Longs(Column<i64>),
    Doubles(Column<f64>),
}

struct NumericSegment {
    max_doc: DocId,
    column: NumericColumn,
}

impl NumericSegment {
    fn native_longs(column: &Column<i64>) -> Box<dyn SortedNumericDocValues> {
        match column.single {
            Some((ref values, ref docs_with_field)) => {
                Box::new(DocValues::singleton_sorted_numeric_doc_values(
                    Arc::clone(values) as Arc<dyn NumericDocValues>,
                    Arc::clone(docs_with_field),
                ))
            }
            None => Box::new(column.cursor()),
        }
    }

    fn native_doubles(column: &Column<f64>) -> Box<dyn SortedNumericDoubleValues> {
        match column.single {
            Some((ref values, ref docs_with_field)) => Box::new(FieldData::singleton_doubles(
                Arc::clone(values) as Arc<dyn NumericDoubleValues>,
                Arc::clone(docs_with_field),
            )),
            None => Box::new(column.cursor()),
        }
    }
}

impl Segment for NumericSegment {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }
}

impl AtomicFieldData for NumericSegment {
    fn bytes_values(&self) -> Result<Box<dyn SortedBinaryDocValues>> {
        Ok(match self.column {
            NumericColumn::Longs(ref c) => FieldData::to_string_longs(Self::native_longs(c)),
            NumericColumn::Doubles(ref c) => FieldData::to_string_doubles(Self::native_doubles(c)),
        })
    }
}

impl AtomicNumericFieldData for NumericSegment {
    fn long_values(&self) -> Result<Box<dyn SortedNumericDocValues>> {
        Ok(match self.column {
            NumericColumn::Longs(ref c) => Self::native_longs(c),
            NumericColumn::Doubles(ref c) => FieldData::cast_double_to_long(Self::native_doubles(c)),
        })
    }

    fn double_values(&self) -> Result<Box<dyn SortedNumericDoubleValues>> {
        Ok(match self.column {
            NumericColumn::Longs(ref c) => FieldData::cast_long_to_double(Self::native_longs(c)),
            NumericColumn::Doubles(ref c) => Self::native_doubles(c),
        })
    }
}

/// Integer or floating point values.
pub struct MemoryNumericFieldData {
    field: String,
    numeric_type: NumericType,
    segments: Vec<Arc<NumericSegment>>,
}

impl MemoryNumericFieldData {
    pub fn longs(field: &str, segments: &[Vec<Vec<i64>>]) -> Self {
        MemoryNumericFieldData {
            field: field.to_string(),
            numeric_type: NumericType::Long,
            segments: segments
                .iter()
                .map(|docs| {
                    let sorted = docs
                        .iter()
                        .map(|d| {
                            let mut d = d.clone();
                            d.sort_unstable();
                            d
                        })
                        .collect();
                    Arc::new(NumericSegment {
                        max_doc: docs.len() as DocId,
                        column: NumericColumn::Longs(Column::new(sorted)),
                    })
                })
                .collect(),
        }
    }

    pub fn doubles(field: &str, segments: &[Vec<Vec<f64>>]) -> Self {
        MemoryNumericFieldData {
            field: field.to_string(),
            numeric_type: NumericType::Double,
            segments: segments
                .iter()
                .map(|docs| {
                    let sorted = docs
                        .iter()
                        .map(|d| {
                            let mut d = d.clone();
                            d.sort_unstable_by(|a, b| a.total_cmp(b));
                            d
                        })
                        .collect();
                    Arc::new(NumericSegment {
                        max_doc: docs.len() as DocId,
                        column: NumericColumn::Doubles(Column::new(sorted)),
                    })
                })
                .collect(),
        }
    }
}

impl IndexNumericFieldData for MemoryNumericFieldData {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn numeric_type(&self) -> NumericType {
        self.numeric_type
    }

    fn load(&self, context: &LeafReaderContext<'_>) -> Result<Arc<dyn AtomicNumericFieldData>> {
        let segment = segment_for(&self.field, &self.segments, context)?;
        Ok(Arc::clone(segment) as Arc<dyn AtomicNumericFieldData>)
    }
}

struct GeoPointSegment {
    max_doc: DocId,
    column: Column<GeoPoint>,
}

impl GeoPointSegment {
    fn values(&self) -> Box<dyn MultiGeoPointValues> {
        match self.column.single {
            Some((ref values, ref docs_with_field)) => Box::new(FieldData::singleton_geo_points(
                Arc::clone(values) as Arc<dyn GeoPointValues>,
                Arc::clone(docs_with_field),
            )),
            None => Box::new(self.column.cursor()),
        }
    }
}

impl Segment for GeoPointSegment {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }
}

impl AtomicFieldData for GeoPointSegment {
    fn bytes_values(&self) -> Result<Box<dyn SortedBinaryDocValues>> {
        Ok(FieldData::to_string_geo_points(self.values()))
    }
}

impl AtomicGeoPointFieldData for GeoPointSegment {
    fn geo_point_values(&self) -> Result<Box<dyn MultiGeoPointValues>> {
        Ok(self.values())
    }
}

/// Geo points, in the order they were given for each document.
pub struct MemoryGeoPointFieldData {
    field: String,
    segments: Vec<Arc<GeoPointSegment>>,
}

impl MemoryGeoPointFieldData {
    pub fn new(field: &str, segments: &[Vec<Vec<GeoPoint>>]) -> Self {
        MemoryGeoPointFieldData {
            field: field.to_string(),
            segments: segments
                .iter()
                .map(|docs| {
                    Arc::new(GeoPointSegment {
                        max_doc: docs.len() as DocId,
                        column: Column::new(docs.clone()),
                    })
                })
                .collect(),
        }
    }
}

impl IndexGeoPointFieldData for MemoryGeoPointFieldData {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn load(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Arc<dyn AtomicGeoPointFieldData>> {
        let segment = segment_for(&self.field, &self.segments, context)?;
        Ok(Arc::clone(segment) as Arc<dyn AtomicGeoPointFieldData>)
    }
}

struct ParentChildSegment {
    max_doc: DocId,
    relations: HashMap<String, Arc<MemorySortedDocValues>>,
    // every id of a document across relations, sorted and deduplicated
    ids: Arc<DocTable<Vec<u8>>>,
}

impl Segment for ParentChildSegment {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }
}

impl AtomicFieldData for ParentChildSegment {
    fn bytes_values(&self) -> Result<Box<dyn SortedBinaryDocValues>> {
        Ok(Box::new(TableCursor {
            table: Arc::clone(&self.ids),
            start: 0,
            end: 0,
        }))
    }
}

impl AtomicParentChildFieldData for ParentChildSegment {
    fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.relations.keys().cloned().collect();
        types.sort();
        types
    }

    fn ordinals_values(&self, relation: &str) -> Result<Arc<dyn SortedDocValues>> {
        Ok(match self.relations.get(relation) {
            Some(values) => Arc::clone(values) as Arc<dyn SortedDocValues>,
            None => Arc::new(EmptySortedDocValues),
        })
    }
}

/// Join field data: each document holds at most one id per relation name,
/// the id of the parent document it belongs to.
pub struct MemoryParentChildFieldData {
    field: String,
    parent_types: Vec<String>,
    segments: Vec<Arc<ParentChildSegment>>,
}

impl MemoryParentChildFieldData {
    /// Each document is a list of `(relation, parent id)` pairs.
    pub fn new(field: &str, segments: &[Vec<Vec<(&str, &str)>>]) -> Result<Self> {
        let mut parent_types = BTreeSet::new();
        let mut built = Vec::with_capacity(segments.len());
        for docs in segments {
            let mut per_relation: HashMap<String, Vec<Option<&str>>> = HashMap::new();
            let mut ids = Vec::with_capacity(docs.len());
            for (doc, pairs) in docs.iter().enumerate() {
                let mut doc_ids = BTreeSet::new();
                for (relation, id) in pairs {
                    let slots = per_relation
                        .entry(relation.to_string())
                        .or_insert_with(|| vec![None; docs.len()]);
                    if slots[doc].is_some() {
                        bail!(ErrorKind::IllegalArgument(format!(
                            "doc {} holds more than one [{}] value in field [{}]",
                            doc, relation, field
                        )));
                    }
                    slots[doc] = Some(*id);
                    doc_ids.insert(id.as_bytes().to_vec());
                }
                ids.push(doc_ids.into_iter().collect());
            }

            let mut relations = HashMap::with_capacity(per_relation.len());
            for (relation, slots) in per_relation {
                let terms: BTreeSet<&str> = slots.iter().filter_map(|s| *s).collect();
                let terms: Vec<Vec<u8>> = terms.into_iter().map(|t| t.as_bytes().to_vec()).collect();
                let ords = slots
                    .iter()
                    .map(|s| match s {
                        Some(id) => terms
                            .binary_search_by(|t| t.as_slice().cmp(id.as_bytes()))
                            .map(|o| o as i32)
                            .unwrap_or(-1),
                        None => -1,
                    })
                    .collect();
                parent_types.insert(relation.clone());
                relations.insert(
                    relation,
                    Arc::new(MemorySortedDocValues {
                        terms: Arc::new(terms),
                        ords,
                    }),
                );
            }
            built.push(Arc::new(ParentChildSegment {
                max_doc: docs.len() as DocId,
                relations,
                ids: Arc::new(DocTable::new(ids)),
            }));
        }
        Ok(MemoryParentChildFieldData {
            field: field.to_string(),
            parent_types: parent_types.into_iter().collect(),
            segments: built,
        })
    }
}

impl IndexParentChildFieldData for MemoryParentChildFieldData {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn parent_types(&self) -> Vec<String> {
        self.parent_types.clone()
    }

    fn load(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Arc<dyn AtomicParentChildFieldData>> {
        let segment = segment_for(&self.field, &self.segments, context)?;
        Ok(Arc::clone(segment) as Arc<dyn AtomicParentChildFieldData>)
    }
}
