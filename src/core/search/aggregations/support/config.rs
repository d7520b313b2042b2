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
    IndexFieldData, IndexGeoPointFieldData, IndexNumericFieldData, IndexOrdinalsFieldData,
    IndexParentChildFieldData,
};
use crate::core::search::aggregations::support::{
    BytesFieldData, BytesScript, BytesWithScript, GeoPointFieldData, NumericFieldData,
    NumericScript, NumericWithScript, OrdinalsFieldData, ParentChild, ValuesSourceKind,
};
use crate::core::search::SearchScript;
use crate::error::{Error, ErrorKind, Result};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The three families of value sources.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ValuesSourceType {
    Bytes,
    Numeric,
    GeoPoint,
}

/// The declared type of the values of a field or script.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Long,
    Double,
    Number,
    Date,
    Ip,
    Boolean,
    GeoPoint,
}

impl ValueType {
    pub fn source_type(self) -> ValuesSourceType {
        match self {
            ValueType::String | ValueType::Ip => ValuesSourceType::Bytes,
            ValueType::Long
            | ValueType::Double
            | ValueType::Number
            | ValueType::Date
            | ValueType::Boolean => ValuesSourceType::Numeric,
            ValueType::GeoPoint => ValuesSourceType::GeoPoint,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.source_type() == ValuesSourceType::Numeric
    }

    pub fn is_floating_point(self) -> bool {
        match self {
            ValueType::Double | ValueType::Number => true,
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Long => "long",
            ValueType::Double => "double",
            ValueType::Number => "number",
            ValueType::Date => "date",
            ValueType::Ip => "ip",
            ValueType::Boolean => "boolean",
            ValueType::GeoPoint => "geo_point",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value_type = match s {
            "string" => ValueType::String,
            "long" => ValueType::Long,
            "double" => ValueType::Double,
            "number" => ValueType::Number,
            "date" => ValueType::Date,
            "ip" => ValueType::Ip,
            "boolean" => ValueType::Boolean,
            "geo_point" => ValueType::GeoPoint,
            _ => bail!(ErrorKind::IllegalArgument(format!(
                "unknown value type [{}]",
                s
            ))),
        };
        Ok(value_type)
    }
}

/// Handle on the field data of a field, tagged with how it is stored.
#[derive(Clone)]
pub enum FieldDataRef {
    Bytes(Arc<dyn IndexFieldData>),
    Ordinals(Arc<dyn IndexOrdinalsFieldData>),
    Numeric(Arc<dyn IndexNumericFieldData>),
    GeoPoint(Arc<dyn IndexGeoPointFieldData>),
    ParentChild(Arc<dyn IndexParentChildFieldData>),
}

impl FieldDataRef {
    pub fn field_name(&self) -> &str {
        match self {
            FieldDataRef::Bytes(f) => f.field_name(),
            FieldDataRef::Ordinals(f) => f.field_name(),
            FieldDataRef::Numeric(f) => f.field_name(),
            FieldDataRef::GeoPoint(f) => f.field_name(),
            FieldDataRef::ParentChild(f) => f.field_name(),
        }
    }

    pub fn source_type(&self) -> ValuesSourceType {
        match self {
            FieldDataRef::Numeric(_) => ValuesSourceType::Numeric,
            FieldDataRef::GeoPoint(_) => ValuesSourceType::GeoPoint,
            FieldDataRef::Bytes(_) | FieldDataRef::Ordinals(_) | FieldDataRef::ParentChild(_) => {
                ValuesSourceType::Bytes
            }
        }
    }

    fn values_source(&self) -> ValuesSourceKind {
        match self {
            FieldDataRef::Bytes(f) => {
                ValuesSourceKind::Bytes(Arc::new(BytesFieldData::new(Arc::clone(f))))
            }
            FieldDataRef::Ordinals(f) => {
                ValuesSourceKind::Ordinals(Arc::new(OrdinalsFieldData::new(Arc::clone(f))))
            }
            FieldDataRef::Numeric(f) => {
                ValuesSourceKind::Numeric(Arc::new(NumericFieldData::new(Arc::clone(f))))
            }
            FieldDataRef::GeoPoint(f) => {
                ValuesSourceKind::GeoPoint(Arc::new(GeoPointFieldData::new(Arc::clone(f))))
            }
            FieldDataRef::ParentChild(f) => {
                ValuesSourceKind::ParentChild(Arc::new(ParentChild::new(Arc::clone(f))))
            }
        }
    }
}

/// What an aggregation reads its values from: a field, a script, or a
/// script applied to every value of a field.
#[derive(Default)]
pub struct ValuesSourceConfig {
    pub field_data: Option<FieldDataRef>,
    pub script: Option<Arc<dyn SearchScript>>,
    pub value_type: Option<ValueType>,
}

impl ValuesSourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_data(mut self, field_data: FieldDataRef) -> Self {
        self.field_data = Some(field_data);
        self
    }

    pub fn script(mut self, script: Arc<dyn SearchScript>) -> Self {
        self.script = Some(script);
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Resolves the values source. Every call returns a new source, with
    /// its own global ordinals.
    pub fn build(&self) -> Result<ValuesSourceKind> {
        match self.field_data {
            Some(ref field_data) => self.build_for_field(field_data),
            None => self.build_for_script(),
        }
    }

    fn build_for_field(&self, field_data: &FieldDataRef) -> Result<ValuesSourceKind> {
        if let Some(value_type) = self.value_type {
            if value_type.source_type() != field_data.source_type() {
                bail!(ErrorKind::UnsupportedRepresentation(format!(
                    "field [{}] cannot be read as [{}]",
                    field_data.field_name(),
                    value_type
                )));
            }
        }

        let source = field_data.values_source();
        let script = match self.script {
            Some(ref script) => Arc::clone(script),
            None => return Ok(source),
        };
        match source {
            ValuesSourceKind::Numeric(numeric) => Ok(ValuesSourceKind::Numeric(Arc::new(
                NumericWithScript::new(numeric, script),
            ))),
            ValuesSourceKind::GeoPoint(_) => bail!(ErrorKind::UnsupportedRepresentation(format!(
                "value scripts are not supported on geo point field [{}]",
                field_data.field_name()
            ))),
            other => Ok(ValuesSourceKind::Bytes(Arc::new(BytesWithScript::new(
                other, script,
            )))),
        }
    }

    fn build_for_script(&self) -> Result<ValuesSourceKind> {
        let script = match self.script {
            Some(ref script) => Arc::clone(script),
            None => bail!(ErrorKind::IllegalArgument(
                "a values source needs a field or a script".into()
            )),
        };
        match self.value_type.map(|t| t.source_type()) {
            Some(ValuesSourceType::Numeric) => Ok(ValuesSourceKind::Numeric(Arc::new(
                NumericScript::new(script, self.value_type),
            ))),
            Some(ValuesSourceType::GeoPoint) => bail!(ErrorKind::UnsupportedRepresentation(
                "geo points cannot be computed by a script".into()
            )),
            Some(ValuesSourceType::Bytes) | None => {
                Ok(ValuesSourceKind::Bytes(Arc::new(BytesScript::new(script))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fielddata::memory::{
        MemoryGeoPointFieldData, MemoryIndexReader, MemoryNumericFieldData,
        MemoryOrdinalsFieldData,
    };
    use crate::core::fielddata::GeoPoint;
    use crate::core::index::IndexReader;
    use crate::core::search::aggregations::support::{NumericValuesSource, OrdinalsValuesSource};
    use crate::core::search::tests::MockSearchScript;
    use crate::core::util::VariantValue;

    #[derive(Deserialize)]
    struct AggregationParams {
        field: Option<String>,
        value_type: Option<ValueType>,
    }

    fn identity() -> Arc<dyn SearchScript> {
        Arc::new(MockSearchScript::new(|_, v, _| Ok(v.clone())))
    }

    fn longs() -> FieldDataRef {
        FieldDataRef::Numeric(Arc::new(MemoryNumericFieldData::longs("n", &[vec![vec![1]]])))
    }

    fn tags() -> FieldDataRef {
        FieldDataRef::Ordinals(Arc::new(MemoryOrdinalsFieldData::new(
            "tag",
            &[vec![vec!["a"]]],
        )))
    }

    fn geo() -> FieldDataRef {
        FieldDataRef::GeoPoint(Arc::new(MemoryGeoPointFieldData::new(
            "loc",
            &[vec![vec![GeoPoint::new(1.0, 1.0)]]],
        )))
    }

    fn assert_kind(res: Result<ValuesSourceKind>, check: fn(&ErrorKind) -> bool) {
        match res {
            Err(e) => assert!(check(e.kind()), "unexpected error {:?}", e.kind()),
            Ok(source) => panic!("expected an error, got a {} source", source.name()),
        }
    }

    fn is_unsupported(kind: &ErrorKind) -> bool {
        match kind {
            ErrorKind::UnsupportedRepresentation(_) => true,
            _ => false,
        }
    }

    #[test]
    fn test_value_type_parsing() {
        let params: AggregationParams =
            serde_json::from_str(r#"{"field": "price", "value_type": "double"}"#).unwrap();
        assert_eq!(params.field.as_ref().map(String::as_str), Some("price"));
        assert_eq!(params.value_type, Some(ValueType::Double));

        let geo: ValueType = serde_json::from_str("\"geo_point\"").unwrap();
        assert_eq!(geo, ValueType::GeoPoint);
        assert!(serde_json::from_str::<ValueType>("\"float\"").is_err());

        assert_eq!("ip".parse::<ValueType>().unwrap(), ValueType::Ip);
        assert!("float".parse::<ValueType>().is_err());
        assert_eq!(ValueType::GeoPoint.to_string(), "geo_point");

        assert!(ValueType::Date.is_numeric());
        assert!(!ValueType::Date.is_floating_point());
        assert!(ValueType::Number.is_floating_point());
        assert!(!ValueType::Ip.is_numeric());
    }

    #[test]
    fn test_field_only() {
        let source = ValuesSourceConfig::new().field_data(longs()).build().unwrap();
        assert!(!source.as_numeric().unwrap().is_floating_point());
        assert!(!source.needs_scores());

        let source = ValuesSourceConfig::new().field_data(tags()).build().unwrap();
        let reader = MemoryIndexReader::new(&[1]);
        assert_eq!(source.as_ordinals().unwrap().global_max_ord(&reader).unwrap(), 1);
        match source.as_numeric() {
            Err(e) => assert!(is_unsupported(e.kind())),
            Ok(_) => panic!("ordinals are not numeric"),
        }

        let source = ValuesSourceConfig::new().field_data(geo()).build().unwrap();
        assert!(source.as_geo_point().is_ok());
    }

    #[test]
    fn test_field_with_script() {
        let source = ValuesSourceConfig::new()
            .field_data(longs())
            .script(identity())
            .build()
            .unwrap();
        assert!(source.as_numeric().unwrap().is_floating_point());
        assert!(source.needs_scores());

        let source = ValuesSourceConfig::new()
            .field_data(tags())
            .script(identity())
            .build()
            .unwrap();
        assert_eq!(source.name(), "bytes");
        let reader = MemoryIndexReader::new(&[1]);
        let leaves = reader.leaves();
        let mut values = source.bytes_values(&leaves[0]).unwrap();
        values.set_document(0).unwrap();
        assert_eq!(values.value_at(0), b"a");

        assert_kind(
            ValuesSourceConfig::new()
                .field_data(geo())
                .script(identity())
                .build(),
            is_unsupported,
        );
    }

    #[test]
    fn test_script_only() {
        let numeric = ValuesSourceConfig::new()
            .script(identity())
            .value_type(ValueType::Long)
            .build()
            .unwrap();
        assert!(!numeric.as_numeric().unwrap().is_floating_point());

        let bytes = ValuesSourceConfig::new().script(identity()).build().unwrap();
        assert_eq!(bytes.name(), "bytes");

        assert_kind(
            ValuesSourceConfig::new()
                .script(identity())
                .value_type(ValueType::GeoPoint)
                .build(),
            is_unsupported,
        );
    }

    #[test]
    fn test_invalid_configs() {
        assert_kind(ValuesSourceConfig::new().build(), |kind| match kind {
            ErrorKind::IllegalArgument(_) => true,
            _ => false,
        });
        assert_kind(
            ValuesSourceConfig::new()
                .field_data(tags())
                .value_type(ValueType::Long)
                .build(),
            is_unsupported,
        );
        let source = ValuesSourceConfig::new()
            .field_data(longs())
            .value_type(ValueType::Date)
            .build();
        assert!(source.is_ok());
    }

    #[test]
    fn test_script_result_for_bytes_source() {
        let script = Arc::new(MockSearchScript::new(|doc, _, _| {
            Ok(VariantValue::from(format!("doc-{}", doc)))
        }));
        let source = ValuesSourceConfig::new()
            .script(script)
            .value_type(ValueType::String)
            .build()
            .unwrap();
        let reader = MemoryIndexReader::new(&[2]);
        let leaves = reader.leaves();
        let mut values = source.bytes_values(&leaves[0]).unwrap();
        values.set_document(1).unwrap();
        assert_eq!(values.value_at(0), b"doc-1");
    }
}
