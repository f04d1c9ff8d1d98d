//! Role × value dispatch for query parameters.

use wharf_core::schema::{DataType, PrimitiveType, StructType};
use wharf_core::types::{parse_naive_datetime, parse_timestamp, Value};

use crate::error::{Error, Result};
use crate::wire::{BoundParameter, WireType, WireValue};

/// Semantic role of a parameter's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Struct,
    Array,
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Date,
}

impl Role {
    /// Role for a declared type. Types with no wire form, including kinds the
    /// warehouse importer did not recognize, are rejected here.
    pub fn of(ty: &DataType) -> Result<Self> {
        let role = match ty {
            DataType::Struct(_) => Role::Struct,
            DataType::Array(_) => Role::Array,
            DataType::Primitive(PrimitiveType::String) => Role::String,
            DataType::Primitive(PrimitiveType::Int64) => Role::Integer,
            DataType::Primitive(PrimitiveType::Double) => Role::Float,
            DataType::Primitive(PrimitiveType::Boolean) => Role::Boolean,
            DataType::Primitive(PrimitiveType::Timestamp) => Role::Timestamp,
            DataType::Primitive(PrimitiveType::Date) => Role::Date,
            DataType::Primitive(_) | DataType::Unrecognized(_) => {
                return Err(Error::UnsupportedType(ty.to_string()))
            }
        };
        Ok(role)
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Struct => "struct",
            Role::Array => "array",
            Role::String => "string",
            Role::Integer => "integer",
            Role::Float => "float",
            Role::Boolean => "boolean",
            Role::Timestamp => "timestamp",
            Role::Date => "date",
        }
    }
}

/// A named parameter slot and its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub data_type: DataType,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Bind `value` to `param`, normalizing it for the wire.
pub fn bind(param: &ParamSpec, value: &Value) -> Result<BoundParameter> {
    #[cfg(feature = "tracing")]
    tracing::trace!(
        name = %param.name,
        ty = %param.data_type,
        value_type = value.native_type_name(),
        "bind parameter"
    );

    match (&param.data_type, value) {
        (DataType::Struct(st), Value::Record(fields)) => bind_struct(&param.name, st, fields),
        (DataType::Array(elem), Value::List(items)) => bind_array(&param.name, elem, items),
        (ty, value) => {
            let value = bind_scalar(Role::of(ty)?, value)?;
            Ok(BoundParameter::Scalar {
                name: param.name.clone(),
                wire_type: value.wire_type(),
                value,
            })
        }
    }
}

fn bind_struct(name: &str, st: &StructType, fields: &[(String, Value)]) -> Result<BoundParameter> {
    if let Some((extra, _)) = fields.iter().find(|(k, _)| st.field(k).is_none()) {
        return Err(Error::UnexpectedField {
            param: name.to_string(),
            field: extra.clone(),
        });
    }

    let children = st
        .fields()
        .iter()
        .map(|(field, ty)| {
            let value = fields
                .iter()
                .find(|(k, _)| k == field)
                .map(|(_, v)| v)
                .ok_or_else(|| Error::MissingField {
                    param: name.to_string(),
                    field: field.clone(),
                })?;
            bind(&ParamSpec::new(field.clone(), ty.clone()), value)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BoundParameter::Struct {
        name: name.to_string(),
        fields: children,
    })
}

fn bind_array(name: &str, elem: &DataType, items: &[Value]) -> Result<BoundParameter> {
    let element_type =
        WireType::for_type(elem).ok_or_else(|| Error::UnsupportedType(elem.to_string()))?;
    let role = Role::of(elem)?;
    let values = items
        .iter()
        .map(|v| bind_scalar(role, v))
        .collect::<Result<Vec<_>>>()?;
    Ok(BoundParameter::Array {
        name: name.to_string(),
        element_type,
        values,
    })
}

/// The scalar rule table. Every (role, value kind) pair without an arm is a
/// `NoMatchingBinding`.
fn bind_scalar(role: Role, value: &Value) -> Result<WireValue> {
    match (role, value) {
        (Role::Timestamp, Value::Timestamp(ts)) => Ok(WireValue::Timestamp(*ts)),
        (Role::Timestamp, Value::DateTime(dt)) => Ok(WireValue::Timestamp(dt.and_utc())),
        (Role::Timestamp, Value::Date(d)) => d
            .and_hms_opt(0, 0, 0)
            .map(|dt| WireValue::Timestamp(dt.and_utc()))
            .ok_or_else(|| invalid(role, format!("{d} has no midnight"))),
        (Role::Timestamp, Value::Str(s)) => parse_timestamp(s)
            .map(WireValue::Timestamp)
            .ok_or_else(|| invalid(role, format!("'{s}' is not a timestamp"))),

        (Role::String, Value::Str(s)) => Ok(WireValue::String(s.clone())),
        (Role::Integer, Value::Int(i)) => Ok(WireValue::Int64(*i)),
        (Role::Float, Value::Float(f)) => Ok(WireValue::Float64(*f)),
        (Role::Boolean, Value::Bool(b)) => Ok(WireValue::Bool(*b)),

        (Role::Date, Value::Str(s)) => {
            let dt = parse_naive_datetime(s)
                .ok_or_else(|| invalid(role, format!("'{s}' is not a date")))?;
            bind_scalar(role, &Value::DateTime(dt))
        }
        (Role::Date, Value::DateTime(dt)) => bind_scalar(role, &Value::Date(dt.date())),
        (Role::Date, Value::Timestamp(ts)) => bind_scalar(role, &Value::Date(ts.date_naive())),
        (Role::Date, Value::Date(d)) => Ok(WireValue::Date(*d)),

        (role, value) => Err(Error::NoMatchingBinding {
            role: role.name(),
            value_type: value.native_type_name(),
        }),
    }
}

fn invalid(role: Role, detail: String) -> Error {
    Error::InvalidValue {
        role: role.name(),
        detail,
    }
}
