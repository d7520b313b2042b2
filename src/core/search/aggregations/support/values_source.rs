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
    FieldData, MultiGeoPointValues, SortedBinaryDocValues, SortedNumericDoubleValues,
};
use crate::core::index::{
    DocValues, IndexReader, LeafReaderContext, RandomAccessOrds, SortedNumericDocValues,
};
use crate::core::search::aggregations::support::ParentChild;
use crate::core::util::BitsRef;
use crate::error::{ErrorKind, Result};

use std::sync::Arc;

/// The values of a field or script, per partition.
pub trait ValuesSource: Send + Sync {
    /// Values as sorted byte sequences.
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>>;

    /// The documents of the partition that have at least one value.
    fn docs_with_value(&self, context: &LeafReaderContext<'_>) -> Result<BitsRef> {
        let mut values = self.bytes_values(context)?;
        match FieldData::unwrap_singleton_bits(values.as_ref()) {
            Some(bits) => Ok(bits),
            None => FieldData::docs_with_value_bytes(values.as_mut(), context.max_doc()),
        }
    }

    /// Whether the values read the relevance score of the document.
    fn needs_scores(&self) -> bool {
        false
    }
}

/// Bytes values backed by per-partition ordinal dictionaries.
pub trait OrdinalsValuesSource: ValuesSource {
    /// Ordinals local to the partition.
    fn ordinals_values(&self, context: &LeafReaderContext<'_>) -> Result<Box<dyn RandomAccessOrds>>;

    /// Ordinals of the partition mapped into the dictionary merged across
    /// every partition of `context.parent`.
    fn global_ordinals_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn RandomAccessOrds>>;

    /// Cardinality of the merged dictionary, 0 for an index without
    /// partitions.
    fn global_max_ord(&self, reader: &dyn IndexReader) -> Result<i64>;
}

pub trait NumericValuesSource: ValuesSource {
    /// Whether the values are floating point. Fixed for the life of the
    /// source.
    fn is_floating_point(&self) -> bool;

    fn long_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedNumericDocValues>>;

    fn double_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedNumericDoubleValues>>;
}

pub trait GeoPointValuesSource: ValuesSource {
    fn geo_point_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn MultiGeoPointValues>>;
}

/// Fails if memoized global ordinals were merged from a reader with a
/// different number of partitions than `reader`.
pub(crate) fn check_segment_count(
    field: &str,
    segment_count: usize,
    reader: &dyn IndexReader,
) -> Result<()> {
    let leaves = reader.leaves().len();
    if segment_count != leaves {
        bail!(ErrorKind::IllegalState(format!(
            "global ordinals of field [{}] were built for {} segments, reader has {}",
            field, segment_count, leaves
        )));
    }
    Ok(())
}

/// Presence of ordinals, through the single-valued view when there is one.
pub(crate) fn ordinals_docs_with_value(
    mut ords: Box<dyn RandomAccessOrds>,
    context: &LeafReaderContext<'_>,
) -> Result<BitsRef> {
    match DocValues::unwrap_singleton(ords.as_ref()) {
        Some(sorted) => Ok(DocValues::docs_with_value_sorted(sorted, context.max_doc())),
        None => DocValues::docs_with_value_sorted_set(ords.as_mut(), context.max_doc()),
    }
}

/// Presence of numeric values, read in the representation the source
/// reports as native.
pub(crate) fn numeric_docs_with_value<S: NumericValuesSource + ?Sized>(
    source: &S,
    context: &LeafReaderContext<'_>,
) -> Result<BitsRef> {
    let max_doc = context.max_doc();
    if source.is_floating_point() {
        let mut values = source.double_values(context)?;
        match FieldData::unwrap_singleton_double_bits(values.as_ref()) {
            Some(bits) => Ok(bits),
            None => FieldData::docs_with_value_doubles(values.as_mut(), max_doc),
        }
    } else {
        let mut values = source.long_values(context)?;
        match DocValues::unwrap_singleton_bits(values.as_ref()) {
            Some(bits) => Ok(bits),
            None => DocValues::docs_with_value_sorted_numeric(values.as_mut(), max_doc),
        }
    }
}

pub(crate) fn geo_point_docs_with_value<S: GeoPointValuesSource + ?Sized>(
    source: &S,
    context: &LeafReaderContext<'_>,
) -> Result<BitsRef> {
    let mut values = source.geo_point_values(context)?;
    match FieldData::unwrap_singleton_geo_bits(values.as_ref()) {
        Some(bits) => Ok(bits),
        None => FieldData::docs_with_value_geo_points(values.as_mut(), context.max_doc()),
    }
}

/// A resolved value source, tagged with the representations it supports.
#[derive(Clone)]
pub enum ValuesSourceKind {
    Bytes(Arc<dyn ValuesSource>),
    Ordinals(Arc<dyn OrdinalsValuesSource>),
    ParentChild(Arc<ParentChild>),
    Numeric(Arc<dyn NumericValuesSource>),
    GeoPoint(Arc<dyn GeoPointValuesSource>),
}

impl ValuesSourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValuesSourceKind::Bytes(_) => "bytes",
            ValuesSourceKind::Ordinals(_) => "ordinals",
            ValuesSourceKind::ParentChild(_) => "parent_child",
            ValuesSourceKind::Numeric(_) => "numeric",
            ValuesSourceKind::GeoPoint(_) => "geo_point",
        }
    }

    pub fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        match self {
            ValuesSourceKind::Bytes(s) => s.bytes_values(context),
            ValuesSourceKind::Ordinals(s) => s.bytes_values(context),
            ValuesSourceKind::ParentChild(s) => s.bytes_values(context),
            ValuesSourceKind::Numeric(s) => s.bytes_values(context),
            ValuesSourceKind::GeoPoint(s) => s.bytes_values(context),
        }
    }

    pub fn docs_with_value(&self, context: &LeafReaderContext<'_>) -> Result<BitsRef> {
        match self {
            ValuesSourceKind::Bytes(s) => s.docs_with_value(context),
            ValuesSourceKind::Ordinals(s) => s.docs_with_value(context),
            ValuesSourceKind::ParentChild(s) => s.docs_with_value(context),
            ValuesSourceKind::Numeric(s) => s.docs_with_value(context),
            ValuesSourceKind::GeoPoint(s) => s.docs_with_value(context),
        }
    }

    pub fn needs_scores(&self) -> bool {
        match self {
            ValuesSourceKind::Bytes(s) => s.needs_scores(),
            ValuesSourceKind::Ordinals(s) => s.needs_scores(),
            ValuesSourceKind::ParentChild(s) => s.needs_scores(),
            ValuesSourceKind::Numeric(s) => s.needs_scores(),
            ValuesSourceKind::GeoPoint(s) => s.needs_scores(),
        }
    }

    pub fn as_numeric(&self) -> Result<&Arc<dyn NumericValuesSource>> {
        match self {
            ValuesSourceKind::Numeric(s) => Ok(s),
            other => bail!(ErrorKind::UnsupportedRepresentation(format!(
                "numeric values requested from a {} values source",
                other.name()
            ))),
        }
    }

    pub fn as_ordinals(&self) -> Result<&Arc<dyn OrdinalsValuesSource>> {
        match self {
            ValuesSourceKind::Ordinals(s) => Ok(s),
            other => bail!(ErrorKind::UnsupportedRepresentation(format!(
                "ordinals requested from a {} values source",
                other.name()
            ))),
        }
    }

    pub fn as_geo_point(&self) -> Result<&Arc<dyn GeoPointValuesSource>> {
        match self {
            ValuesSourceKind::GeoPoint(s) => Ok(s),
            other => bail!(ErrorKind::UnsupportedRepresentation(format!(
                "geo points requested from a {} values source",
                other.name()
            ))),
        }
    }

    pub fn as_parent_child(&self) -> Result<&Arc<ParentChild>> {
        match self {
            ValuesSourceKind::ParentChild(s) => Ok(s),
            other => bail!(ErrorKind::UnsupportedRepresentation(format!(
                "relation ordinals requested from a {} values source",
                other.name()
            ))),
        }
    }
}
