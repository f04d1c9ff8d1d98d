//! Reshaping raw result frames through a `Schema`.

use crate::error::{Error, Result};
use crate::schema::{DataType, PrimitiveType, Schema};
use crate::types::{parse_naive_datetime, parse_timestamp, Column, Dtype, Frame, Value};

impl Schema {
    /// Reorder `frame` to this schema's column order and coerce every value
    /// to the declared type. Result columns the schema does not name are dropped.
    pub fn apply_to(&self, mut frame: Frame) -> Result<Frame> {
        let mut columns = Vec::with_capacity(self.len());
        for (name, ty) in self.iter() {
            let pos = frame
                .columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
            let column = frame.columns.swap_remove(pos);
            let values = column
                .values
                .into_iter()
                .map(|v| coerce_value(v, ty))
                .collect::<std::result::Result<Vec<_>, String>>()
                .map_err(|detail| Error::Coercion {
                    column: name.to_string(),
                    detail,
                })?;
            columns.push(Column::new(name, dtype_for(ty), values));
        }
        Ok(Frame::new(columns))
    }
}

fn dtype_for(ty: &DataType) -> Dtype {
    match ty.as_primitive() {
        Some(PrimitiveType::Boolean) => Dtype::Bool,
        Some(PrimitiveType::Int64) => Dtype::Int64,
        Some(PrimitiveType::Double) => Dtype::Float64,
        Some(PrimitiveType::Timestamp) => Dtype::DatetimeNs,
        Some(PrimitiveType::Interval) => Dtype::TimedeltaNs,
        _ => Dtype::Object,
    }
}

/// Convert one value to `ty`. Nulls pass through every type.
pub fn coerce_value(value: Value, ty: &DataType) -> std::result::Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match (ty, value) {
        (DataType::Unrecognized(_), v) => Ok(v),
        (DataType::Primitive(p), v) => coerce_primitive(*p, v),
        (DataType::Array(elem), Value::List(items)) => items
            .into_iter()
            .map(|v| coerce_value(v, elem))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::List),
        (DataType::Struct(st), Value::Record(mut fields)) => {
            let mut out = Vec::with_capacity(st.len());
            for (name, fty) in st.fields() {
                let v = match fields.iter().position(|(n, _)| n == name) {
                    Some(pos) => fields.remove(pos).1,
                    None => Value::Null,
                };
                out.push((name.clone(), coerce_value(v, fty)?));
            }
            if let Some((extra, _)) = fields.first() {
                return Err(format!("record field '{extra}' is not declared in {ty}"));
            }
            Ok(Value::Record(out))
        }
        (ty, v) => Err(mismatch(&v, ty)),
    }
}

fn coerce_primitive(p: PrimitiveType, value: Value) -> std::result::Result<Value, String> {
    let out = match (p, value) {
        (PrimitiveType::Boolean, v @ Value::Bool(_)) => v,
        (PrimitiveType::Int64, v @ Value::Int(_)) => v,
        (PrimitiveType::Int64, Value::Float(f))
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
        {
            Value::Int(f as i64)
        }
        (PrimitiveType::Double, v @ Value::Float(_)) => v,
        (PrimitiveType::Double, Value::Int(i)) => Value::Float(i as f64),
        (PrimitiveType::String, v @ Value::Str(_)) => v,
        (PrimitiveType::Binary, v @ Value::Bytes(_)) => v,
        (PrimitiveType::Time, v @ Value::Time(_)) => v,
        (PrimitiveType::Interval, v @ Value::Timedelta(_)) => v,
        (PrimitiveType::Date, v @ Value::Date(_)) => v,
        (PrimitiveType::Date, Value::DateTime(dt)) => Value::Date(dt.date()),
        (PrimitiveType::Date, Value::Timestamp(ts)) => Value::Date(ts.date_naive()),
        (PrimitiveType::Date, Value::Str(s)) => parse_naive_datetime(&s)
            .map(|dt| Value::Date(dt.date()))
            .ok_or_else(|| format!("'{s}' is not a date"))?,
        (PrimitiveType::Timestamp, v @ Value::Timestamp(_)) => v,
        (PrimitiveType::Timestamp, Value::DateTime(dt)) => Value::Timestamp(dt.and_utc()),
        (PrimitiveType::Timestamp, Value::Date(d)) => d
            .and_hms_opt(0, 0, 0)
            .map(|dt| Value::Timestamp(dt.and_utc()))
            .ok_or_else(|| format!("'{d}' has no midnight"))?,
        (PrimitiveType::Timestamp, Value::Str(s)) => parse_timestamp(&s)
            .map(Value::Timestamp)
            .ok_or_else(|| format!("'{s}' is not a timestamp"))?,
        (p, v) => return Err(mismatch(&v, &DataType::Primitive(p))),
    };
    Ok(out)
}

fn mismatch(value: &Value, ty: &DataType) -> String {
    format!("cannot convert {} value to {ty}", value.native_type_name())
}
