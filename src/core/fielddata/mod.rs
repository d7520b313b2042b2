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

//! Per-partition field data: multi-valued accessors over the values of a
//! field, and the index-level handles that load them for a partition.

mod field_data;

pub use self::field_data::*;

mod sorting;

pub use self::sorting::*;

mod global_ordinals;

pub use self::global_ordinals::*;

pub mod memory;

use crate::core::index::{
    LeafReaderContext, RandomAccessOrds, SortedDocValues, SortedNumericDocValues,
};
use crate::core::search::ScorerAware;
use crate::core::util::{BitsRef, DocId};
use crate::error::Result;

use std::fmt;
use std::sync::Arc;

/// Per-document byte values, sorted ascending within a document.
pub trait SortedBinaryDocValues: Send {
    /// positions to the specified document
    fn set_document(&mut self, doc: DocId) -> Result<()>;

    /// value count for current doc
    fn count(&self) -> usize;

    /// Retrieve the value for the current document at `index`, valid until
    /// the next call to `set_document`.
    fn value_at(&self, index: usize) -> &[u8];

    /// The documents that have a value, if the values are single-valued.
    fn get_docs_with_field(&self) -> Option<BitsRef> {
        None
    }

    fn as_scorer_aware(&mut self) -> Option<&mut dyn ScorerAware> {
        None
    }
}

/// A per-document floating point value.
pub trait NumericDoubleValues: Send + Sync {
    fn get(&self, doc_id: DocId) -> Result<f64>;
}

/// Per-document floating point values, sorted ascending within a document.
pub trait SortedNumericDoubleValues: Send {
    /// positions to the specified document
    fn set_document(&mut self, doc: DocId) -> Result<()>;

    fn value_at(&self, index: usize) -> f64;

    fn count(&self) -> usize;

    /// The documents that have a value, if the values are single-valued.
    fn get_docs_with_field(&self) -> Option<BitsRef> {
        None
    }

    fn as_scorer_aware(&mut self) -> Option<&mut dyn ScorerAware> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}, {:?}", self.lat, self.lon)
    }
}

/// A per-document geo point.
pub trait GeoPointValues: Send + Sync {
    fn get(&self, doc_id: DocId) -> Result<GeoPoint>;
}

/// Per-document geo points.
pub trait MultiGeoPointValues: Send {
    /// positions to the specified document
    fn set_document(&mut self, doc: DocId) -> Result<()>;

    fn value_at(&self, index: usize) -> GeoPoint;

    fn count(&self) -> usize;

    /// The documents that have a value, if the values are single-valued.
    fn get_docs_with_field(&self) -> Option<BitsRef> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    Int,
    Long,
    Float,
    Double,
}

impl NumericType {
    pub fn is_floating_point(self) -> bool {
        match self {
            NumericType::Float | NumericType::Double => true,
            NumericType::Int | NumericType::Long => false,
        }
    }
}

/// The field data of one field, loaded for one partition.
pub trait AtomicFieldData: Send + Sync {
    /// Values as sorted byte sequences.
    fn bytes_values(&self) -> Result<Box<dyn SortedBinaryDocValues>>;
}

pub trait AtomicNumericFieldData: AtomicFieldData {
    fn long_values(&self) -> Result<Box<dyn SortedNumericDocValues>>;

    fn double_values(&self) -> Result<Box<dyn SortedNumericDoubleValues>>;
}

pub trait AtomicOrdinalsFieldData: AtomicFieldData {
    fn ordinals_values(&self) -> Result<Box<dyn RandomAccessOrds>>;
}

pub trait AtomicGeoPointFieldData: AtomicFieldData {
    fn geo_point_values(&self) -> Result<Box<dyn MultiGeoPointValues>>;
}

/// Field data of a join field: one ordinal dictionary per relation name.
pub trait AtomicParentChildFieldData: AtomicFieldData {
    /// The relation names this partition has values for.
    fn types(&self) -> Vec<String>;

    /// Ordinals of `relation`, empty if the partition has none.
    fn ordinals_values(&self, relation: &str) -> Result<Arc<dyn SortedDocValues>>;
}

/// Loads the field data of a field for a partition.
pub trait IndexFieldData: Send + Sync {
    fn field_name(&self) -> &str;

    fn load(&self, context: &LeafReaderContext<'_>) -> Result<Arc<dyn AtomicFieldData>>;
}

pub trait IndexNumericFieldData: Send + Sync {
    fn field_name(&self) -> &str;

    fn numeric_type(&self) -> NumericType;

    fn load(&self, context: &LeafReaderContext<'_>) -> Result<Arc<dyn AtomicNumericFieldData>>;
}

pub trait IndexOrdinalsFieldData: Send + Sync {
    fn field_name(&self) -> &str;

    fn load(&self, context: &LeafReaderContext<'_>) -> Result<Arc<dyn AtomicOrdinalsFieldData>>;
}

pub trait IndexGeoPointFieldData: Send + Sync {
    fn field_name(&self) -> &str;

    fn load(&self, context: &LeafReaderContext<'_>)
        -> Result<Arc<dyn AtomicGeoPointFieldData>>;
}

pub trait IndexParentChildFieldData: Send + Sync {
    fn field_name(&self) -> &str;

    /// Every relation name of the join field, across partitions.
    fn parent_types(&self) -> Vec<String>;

    fn load(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Arc<dyn AtomicParentChildFieldData>>;
}
