//! Wire-level parameter representation handed to the warehouse client.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use wharf_core::schema::{DataType, PrimitiveType};

/// The warehouse protocol's parameter type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WireType {
    String,
    Int64,
    Float64,
    Bool,
    Timestamp,
    Date,
}

const PRIMITIVE_WIRE_TYPES: &[(PrimitiveType, WireType)] = &[
    (PrimitiveType::String, WireType::String),
    (PrimitiveType::Int64, WireType::Int64),
    (PrimitiveType::Double, WireType::Float64),
    (PrimitiveType::Boolean, WireType::Bool),
    (PrimitiveType::Timestamp, WireType::Timestamp),
    (PrimitiveType::Date, WireType::Date),
];

impl WireType {
    /// Tag for a scalar type; `None` when the type has no wire form.
    pub fn for_type(ty: &DataType) -> Option<Self> {
        let p = ty.as_primitive()?;
        PRIMITIVE_WIRE_TYPES
            .iter()
            .find(|(k, _)| *k == p)
            .map(|(_, w)| *w)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WireType::String => "STRING",
            WireType::Int64 => "INT64",
            WireType::Float64 => "FLOAT64",
            WireType::Bool => "BOOL",
            WireType::Timestamp => "TIMESTAMP",
            WireType::Date => "DATE",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized scalar ready for the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireValue {
    String(String),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl WireValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            WireValue::String(_) => WireType::String,
            WireValue::Int64(_) => WireType::Int64,
            WireValue::Float64(_) => WireType::Float64,
            WireValue::Bool(_) => WireType::Bool,
            WireValue::Timestamp(_) => WireType::Timestamp,
            WireValue::Date(_) => WireType::Date,
        }
    }
}

/// A named, typed query parameter. Struct parameters nest their fields in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BoundParameter {
    Scalar {
        name: String,
        #[serde(rename = "type")]
        wire_type: WireType,
        value: WireValue,
    },
    Array {
        name: String,
        element_type: WireType,
        values: Vec<WireValue>,
    },
    Struct {
        name: String,
        fields: Vec<BoundParameter>,
    },
}

impl BoundParameter {
    pub fn name(&self) -> &str {
        match self {
            BoundParameter::Scalar { name, .. }
            | BoundParameter::Array { name, .. }
            | BoundParameter::Struct { name, .. } => name,
        }
    }
}
