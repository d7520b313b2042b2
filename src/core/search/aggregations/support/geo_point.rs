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
    AtomicFieldData, IndexGeoPointFieldData, MultiGeoPointValues, SortedBinaryDocValues,
};
use crate::core::index::LeafReaderContext;
use crate::core::search::aggregations::support::{
    geo_point_docs_with_value, GeoPointValuesSource, ValuesSource,
};
use crate::core::util::BitsRef;
use crate::error::Result;

use std::sync::Arc;

/// Geo points of a field.
pub struct GeoPointFieldData {
    field_data: Arc<dyn IndexGeoPointFieldData>,
}

impl GeoPointFieldData {
    pub fn new(field_data: Arc<dyn IndexGeoPointFieldData>) -> Self {
        GeoPointFieldData { field_data }
    }
}

impl ValuesSource for GeoPointFieldData {
    fn bytes_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn SortedBinaryDocValues>> {
        self.field_data.load(context)?.bytes_values()
    }

    fn docs_with_value(&self, context: &LeafReaderContext<'_>) -> Result<BitsRef> {
        geo_point_docs_with_value(self, context)
    }
}

impl GeoPointValuesSource for GeoPointFieldData {
    fn geo_point_values(
        &self,
        context: &LeafReaderContext<'_>,
    ) -> Result<Box<dyn MultiGeoPointValues>> {
        self.field_data.load(context)?.geo_point_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fielddata::memory::{MemoryGeoPointFieldData, MemoryIndexReader};
    use crate::core::fielddata::{FieldData, GeoPoint};
    use crate::core::index::IndexReader;
    use crate::core::util::Bits;

    #[test]
    fn test_presence_fast_path_agrees_with_scan() {
        let reader = MemoryIndexReader::new(&[3, 3]);
        let field = MemoryGeoPointFieldData::new(
            "loc",
            &[
                vec![vec![GeoPoint::new(1.0, 2.0)], vec![], vec![GeoPoint::new(3.0, 4.0)]],
                vec![
                    vec![],
                    vec![GeoPoint::new(5.0, 6.0), GeoPoint::new(-1.0, 0.5)],
                    vec![GeoPoint::new(7.0, 8.0)],
                ],
            ],
        );
        let source = GeoPointFieldData::new(Arc::new(field));

        let leaves = reader.leaves();
        let first = source.geo_point_values(&leaves[0]).unwrap();
        assert!(FieldData::unwrap_singleton_geo_bits(first.as_ref()).is_some());
        let second = source.geo_point_values(&leaves[1]).unwrap();
        assert!(FieldData::unwrap_singleton_geo_bits(second.as_ref()).is_none());

        for leaf in &leaves {
            let bits = source.docs_with_value(leaf).unwrap();
            let mut points = source.geo_point_values(leaf).unwrap();
            for doc in 0..leaf.max_doc() {
                points.set_document(doc).unwrap();
                assert_eq!(bits.get(doc as usize).unwrap(), points.count() > 0);
            }
        }
    }

    #[test]
    fn test_bytes_are_sorted_text() {
        let reader = MemoryIndexReader::new(&[1]);
        let field = MemoryGeoPointFieldData::new(
            "loc",
            &[vec![vec![GeoPoint::new(5.0, 6.0), GeoPoint::new(-1.0, 0.5)]]],
        );
        let source = GeoPointFieldData::new(Arc::new(field));
        let leaves = reader.leaves();
        let mut bytes = source.bytes_values(&leaves[0]).unwrap();
        bytes.set_document(0).unwrap();
        assert_eq!(bytes.count(), 2);
        assert_eq!(bytes.value_at(0), b"-1.0, 0.5");
        assert_eq!(bytes.value_at(1), b"5.0, 6.0");
    }
}
