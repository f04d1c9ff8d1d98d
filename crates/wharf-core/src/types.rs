//! Runtime values, columns, and frames: the in-memory tabular representation
//! that query results land in and that schemas can be inferred from.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Wall-clock datetime without a zone.
    DateTime(NaiveDateTime),
    /// Absolute instant.
    Timestamp(DateTime<Utc>),
    /// Signed duration in microseconds.
    Timedelta(i64),
    List(Vec<Value>),
    /// Ordered field → value mapping.
    Record(Vec<(String, Value)>),
}

impl Value {
    pub fn record<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Missing values: explicit nulls and NaN floats.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Name of the value's native runtime type, used in error messages.
    pub fn native_type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Timestamp(_) => "timestamp",
            Value::Timedelta(_) => "timedelta",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Record(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp string as wall-clock time. Offsets, when present, are
/// dropped (the local reading is kept); a bare date means midnight.
pub fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a timestamp string into an absolute UTC instant. Offsets are honored;
/// strings without one are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive_datetime(s).map(|naive| naive.and_utc())
}

/// Machine dtype of a column.
///
/// Anything other than `Object` promises every non-null value has the same
/// scalar kind; `Object` columns may hold anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    DatetimeNs,
    TimedeltaNs,
    Object,
}

impl Dtype {
    pub fn is_object(self) -> bool {
        self == Dtype::Object
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: Dtype,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: Dtype, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn object(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(name, Dtype::Object, values)
    }

    /// Build a column, picking the narrowest machine dtype that holds every
    /// value. Integers mixed with nulls widen to float; everything that is
    /// not homogeneous stays `Object`.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        let dtype = machine_dtype(&values);
        Self::new(name, dtype, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn machine_dtype(values: &[Value]) -> Dtype {
    let has_null = values.iter().any(Value::is_null);
    let mut present = values.iter().filter(|v| !v.is_null()).peekable();
    if present.peek().is_none() {
        return Dtype::Object;
    }

    let (mut bools, mut ints, mut floats, mut instants, mut deltas, mut other) =
        (0, 0, 0, 0, 0, 0);
    for v in present {
        match v {
            Value::Bool(_) => bools += 1,
            Value::Int(_) => ints += 1,
            Value::Float(_) => floats += 1,
            Value::DateTime(_) | Value::Timestamp(_) => instants += 1,
            Value::Timedelta(_) => deltas += 1,
            _ => other += 1,
        }
    }

    match (bools, ints, floats, instants, deltas, other) {
        (_, 0, 0, 0, 0, 0) if !has_null => Dtype::Bool,
        (0, _, 0, 0, 0, 0) if !has_null => Dtype::Int64,
        (0, _, _, 0, 0, 0) => Dtype::Float64,
        (0, 0, 0, _, 0, 0) => Dtype::DatetimeNs,
        (0, 0, 0, 0, _, 0) => Dtype::TimedeltaNs,
        _ => Dtype::Object,
    }
}

/// Ordered set of equally long columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub columns: Vec<Column>,
}

impl Frame {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Transpose row tuples into columns named by `names`.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut columns: Vec<Vec<Value>> = names
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(Error::Schema(format!(
                    "row {i} has {} values, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        Ok(Self::new(
            names
                .into_iter()
                .zip(columns)
                .map(|(name, values)| Column::from_values(name, values))
                .collect(),
        ))
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}
