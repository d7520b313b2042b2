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

use std::cmp::Ordering;
use std::fmt;

use crate::error::{ErrorKind, Result};

/// A dynamically typed value, as produced or consumed by a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantValue {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    VString(String),
    Vec(Vec<VariantValue>),
    Binary(Vec<u8>),
}

impl VariantValue {
    pub fn get_string(&self) -> Option<&str> {
        match self {
            VariantValue::VString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Coerce to a long: doubles are truncated, booleans map to 0/1 and
    /// strings are parsed.
    pub fn to_long(&self) -> Result<i64> {
        match self {
            VariantValue::Long(l) => Ok(*l),
            VariantValue::Double(d) => Ok(*d as i64),
            VariantValue::Bool(b) => Ok(if *b { 1 } else { 0 }),
            VariantValue::VString(s) => Ok(s.trim().parse::<i64>()?),
            other => bail!(ErrorKind::IllegalArgument(format!(
                "cannot convert {} to long",
                other
            ))),
        }
    }

    /// Coerce to a double: booleans map to 0/1 and strings are parsed.
    pub fn to_double(&self) -> Result<f64> {
        match self {
            VariantValue::Long(l) => Ok(*l as f64),
            VariantValue::Double(d) => Ok(*d),
            VariantValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            VariantValue::VString(s) => Ok(s.trim().parse::<f64>()?),
            other => bail!(ErrorKind::IllegalArgument(format!(
                "cannot convert {} to double",
                other
            ))),
        }
    }

    /// The bytes a bytes-valued source exposes for this value.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            VariantValue::Binary(b) => b.clone(),
            other => other.to_string().into_bytes(),
        }
    }

    /// Visits the leaf values; `Null` contributes nothing and nested arrays
    /// are flattened.
    pub fn for_each_value<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut(&VariantValue) -> Result<()>,
    {
        match self {
            VariantValue::Null => Ok(()),
            VariantValue::Vec(values) => {
                for v in values {
                    v.for_each_value(f)?;
                }
                Ok(())
            }
            value => f(value),
        }
    }
}

impl fmt::Display for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VariantValue::Null => write!(f, "null"),
            VariantValue::Bool(b) => write!(f, "{}", b),
            VariantValue::Long(lval) => write!(f, "{}", lval),
            VariantValue::Double(d) => write!(f, "{:?}", d),
            VariantValue::VString(ref s) => write!(f, "{}", s),
            VariantValue::Binary(ref b) => write!(f, "{}", String::from_utf8_lossy(b)),
            VariantValue::Vec(ref v) => {
                write!(f, "[")?;
                for (i, value) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl PartialEq for VariantValue {
    fn eq(&self, other: &VariantValue) -> bool {
        match (self, other) {
            (VariantValue::Null, VariantValue::Null) => true,
            (VariantValue::Bool(b1), VariantValue::Bool(b2)) => b1 == b2,
            (VariantValue::Long(v1), VariantValue::Long(v2)) => v1 == v2,
            (VariantValue::Double(v1), VariantValue::Double(v2)) => v1 == v2,
            (VariantValue::VString(s1), VariantValue::VString(s2)) => s1 == s2,
            (VariantValue::Binary(b1), VariantValue::Binary(b2)) => b1 == b2,
            (VariantValue::Vec(v1), VariantValue::Vec(v2)) => v1 == v2,
            (_, _) => false,
        }
    }
}

impl PartialOrd for VariantValue {
    fn partial_cmp(&self, other: &VariantValue) -> Option<Ordering> {
        match (self, other) {
            (VariantValue::Bool(b1), VariantValue::Bool(b2)) => b1.partial_cmp(b2),
            (VariantValue::Long(v1), VariantValue::Long(v2)) => v1.partial_cmp(v2),
            (VariantValue::Double(v1), VariantValue::Double(v2)) => v1.partial_cmp(v2),
            (VariantValue::VString(s1), VariantValue::VString(s2)) => s1.partial_cmp(s2),
            (VariantValue::Binary(b1), VariantValue::Binary(b2)) => b1.partial_cmp(b2),
            (_, _) => None,
        }
    }
}

impl From<bool> for VariantValue {
    fn from(val: bool) -> Self {
        VariantValue::Bool(val)
    }
}

impl From<i64> for VariantValue {
    fn from(val: i64) -> Self {
        VariantValue::Long(val)
    }
}

impl From<f64> for VariantValue {
    fn from(val: f64) -> Self {
        VariantValue::Double(val)
    }
}

impl<'a> From<&'a str> for VariantValue {
    fn from(val: &'a str) -> Self {
        VariantValue::VString(String::from(val))
    }
}

impl From<String> for VariantValue {
    fn from(val: String) -> Self {
        VariantValue::VString(val)
    }
}

impl<'a> From<&'a [u8]> for VariantValue {
    fn from(val: &'a [u8]) -> Self {
        VariantValue::Binary(val.to_vec())
    }
}

impl From<Vec<VariantValue>> for VariantValue {
    fn from(val: Vec<VariantValue>) -> Self {
        VariantValue::Vec(val)
    }
}
