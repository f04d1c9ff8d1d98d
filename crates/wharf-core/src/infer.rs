//! Schema inference for in-memory frames.
//!
//! Each column yields a list of candidate types: zero (undecidable), one
//! (resolved), or several (ambiguous). Problem columns are collected over the
//! whole frame and reported together in one `InferenceReport`.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::schema::{highest_precedence_of, DataType, PrimitiveType, Schema, StructType};
use crate::types::{Column, Dtype, Frame, Value};

/// What the runtime-value sniffer sees in the non-null values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SniffKind {
    Empty,
    String,
    Bytes,
    Boolean,
    Integer,
    Floating,
    Date,
    Time,
    Datetime,
    Timedelta,
    MixedIntegerFloat,
    MixedInteger,
    Mixed,
}

impl SniffKind {
    pub fn is_mixed(self) -> bool {
        matches!(
            self,
            SniffKind::Mixed | SniffKind::MixedInteger | SniffKind::MixedIntegerFloat
        )
    }
}

/// Sniff kinds that map straight to a type. Kinds missing here leave a column
/// unresolvable.
const SNIFF_KIND_TYPES: &[(SniffKind, PrimitiveType)] = &[
    (SniffKind::String, PrimitiveType::String),
    (SniffKind::Empty, PrimitiveType::Null),
    (SniffKind::Boolean, PrimitiveType::Boolean),
    (SniffKind::Datetime, PrimitiveType::Timestamp),
    (SniffKind::Timedelta, PrimitiveType::Interval),
    (SniffKind::Bytes, PrimitiveType::Binary),
];

const DTYPE_TYPES: &[(Dtype, PrimitiveType)] = &[
    (Dtype::Bool, PrimitiveType::Boolean),
    (Dtype::Int8, PrimitiveType::Int64),
    (Dtype::Int16, PrimitiveType::Int64),
    (Dtype::Int32, PrimitiveType::Int64),
    (Dtype::Int64, PrimitiveType::Int64),
    (Dtype::UInt8, PrimitiveType::Int64),
    (Dtype::UInt16, PrimitiveType::Int64),
    (Dtype::UInt32, PrimitiveType::Int64),
    (Dtype::UInt64, PrimitiveType::Int64),
    (Dtype::Float32, PrimitiveType::Double),
    (Dtype::Float64, PrimitiveType::Double),
    (Dtype::DatetimeNs, PrimitiveType::Timestamp),
    (Dtype::TimedeltaNs, PrimitiveType::Interval),
];

pub fn sniff_kind_type(kind: SniffKind) -> Option<DataType> {
    SNIFF_KIND_TYPES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, p)| DataType::Primitive(*p))
}

/// Type for a homogeneous machine dtype; `None` for `Object`.
pub fn dtype_type(dtype: Dtype) -> Option<DataType> {
    DTYPE_TYPES
        .iter()
        .find(|(d, _)| *d == dtype)
        .map(|(_, p)| DataType::Primitive(*p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ScalarKind {
    Str,
    Bytes,
    Bool,
    Int,
    Float,
    Date,
    Time,
    Datetime,
    Timedelta,
    Nested,
}

/// Classify the non-null values of a column.
pub fn sniff<'a, I>(values: I) -> SniffKind
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut kinds: Vec<ScalarKind> = values
        .into_iter()
        .filter(|v| !v.is_null())
        .map(|v| match v {
            Value::Str(_) => ScalarKind::Str,
            Value::Bytes(_) => ScalarKind::Bytes,
            Value::Bool(_) => ScalarKind::Bool,
            Value::Int(_) => ScalarKind::Int,
            Value::Float(_) => ScalarKind::Float,
            Value::Date(_) => ScalarKind::Date,
            Value::Time(_) => ScalarKind::Time,
            Value::DateTime(_) | Value::Timestamp(_) => ScalarKind::Datetime,
            Value::Timedelta(_) => ScalarKind::Timedelta,
            Value::Null | Value::List(_) | Value::Record(_) => ScalarKind::Nested,
        })
        .collect();
    kinds.sort();
    kinds.dedup();

    match kinds.as_slice() {
        [] => SniffKind::Empty,
        [ScalarKind::Str] => SniffKind::String,
        [ScalarKind::Bytes] => SniffKind::Bytes,
        [ScalarKind::Bool] => SniffKind::Boolean,
        [ScalarKind::Int] => SniffKind::Integer,
        [ScalarKind::Float] => SniffKind::Floating,
        [ScalarKind::Date] => SniffKind::Date,
        [ScalarKind::Time] => SniffKind::Time,
        [ScalarKind::Datetime] => SniffKind::Datetime,
        [ScalarKind::Timedelta] => SniffKind::Timedelta,
        [ScalarKind::Int, ScalarKind::Float] => SniffKind::MixedIntegerFloat,
        ks if ks.contains(&ScalarKind::Int) => SniffKind::MixedInteger,
        _ => SniffKind::Mixed,
    }
}

/// Infer the type of a single runtime value.
pub fn infer_value(value: &Value) -> Result<DataType> {
    let ty = match value {
        Value::Null => DataType::NULL,
        Value::Bool(_) => DataType::BOOLEAN,
        Value::Int(_) => DataType::INT64,
        Value::Float(_) => DataType::DOUBLE,
        Value::Str(_) => DataType::STRING,
        Value::Bytes(_) => DataType::BINARY,
        Value::Date(_) => DataType::DATE,
        Value::Time(_) => DataType::TIME,
        Value::DateTime(_) | Value::Timestamp(_) => DataType::TIMESTAMP,
        Value::Timedelta(_) => DataType::INTERVAL,
        Value::List(items) => {
            let elems = items.iter().map(infer_value).collect::<Result<Vec<_>>>()?;
            if elems.is_empty() {
                DataType::array(DataType::NULL)
            } else {
                DataType::array(highest_precedence_of(&elems)?)
            }
        }
        Value::Record(fields) => {
            let fields = fields
                .iter()
                .map(|(name, v)| Ok((name.clone(), infer_value(v)?)))
                .collect::<Result<Vec<_>>>()?;
            DataType::Struct(StructType::try_new(fields)?)
        }
    };
    Ok(ty)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferOptions {
    /// Infer every value of a mixed column instead of trusting the first.
    pub strict: bool,
    /// Drop missing values before looking at a column.
    pub aggressive_null: bool,
    /// Explicit types; these columns are not inferred.
    pub overrides: BTreeMap<String, DataType>,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            strict: true,
            aggressive_null: true,
            overrides: BTreeMap::new(),
        }
    }
}

impl InferOptions {
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_aggressive_null(mut self, aggressive_null: bool) -> Self {
        self.aggressive_null = aggressive_null;
        self
    }

    pub fn with_override(mut self, column: impl Into<String>, ty: DataType) -> Self {
        self.overrides.insert(column.into(), ty);
        self
    }
}

/// Every column inference could not settle, gathered over a whole frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceReport {
    /// Columns with no candidate type.
    pub unresolved: Vec<String>,
    /// Columns with several conflicting candidate types.
    pub ambiguous: Vec<(String, Vec<DataType>)>,
}

impl InferenceReport {
    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty() && self.ambiguous.is_empty()
    }
}

impl fmt::Display for InferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.unresolved.is_empty() {
            let hints: Vec<String> = self
                .unresolved
                .iter()
                .map(|c| format!("{c}: <explicit type>"))
                .collect();
            write!(
                f,
                "Unable to infer type of column(s) {:?}. Try supplying explicit type overrides:\n\t{}",
                self.unresolved,
                hints.join(",\n\t")
            )?;
        }
        if !self.unresolved.is_empty() && !self.ambiguous.is_empty() {
            f.write_str("\n")?;
        }
        if !self.ambiguous.is_empty() {
            f.write_str("Multiple types found for column(s):")?;
            for (column, types) in &self.ambiguous {
                write!(f, "\n{column}:")?;
                for ty in types {
                    write!(f, "\n\t{ty}")?;
                }
            }
        }
        Ok(())
    }
}

/// Candidate types for one column.
pub fn infer_column(column: &Column, strict: bool, aggressive_null: bool) -> Vec<DataType> {
    let present: Vec<&Value> = column.values.iter().filter(|v| !v.is_null()).collect();

    if aggressive_null && present.is_empty() {
        return vec![DataType::NULL];
    }

    if let Some(ty) = dtype_type(column.dtype) {
        return vec![ty];
    }

    let kind = sniff(present.iter().copied());
    if !kind.is_mixed() {
        return sniff_kind_type(kind).into_iter().collect();
    }

    if strict {
        strict_candidates(&present)
    } else {
        // Best effort: the first value speaks for the whole column.
        present
            .first()
            .and_then(|v| infer_value(v).ok())
            .into_iter()
            .collect()
    }
}

fn strict_candidates(values: &[&Value]) -> Vec<DataType> {
    let mut types: Vec<DataType> = Vec::new();
    for value in values {
        match infer_value(value) {
            Ok(ty) => {
                if !types.contains(&ty) {
                    types.push(ty);
                }
            }
            Err(_) => return Vec::new(),
        }
    }
    match highest_precedence_of(&types) {
        Ok(ty) => vec![ty],
        Err(_) => types,
    }
}

/// Infer a schema for every column of `frame`, reporting all problem columns at once.
pub fn infer_schema(frame: &Frame, options: &InferOptions) -> Result<Schema> {
    let mut pairs = Vec::with_capacity(frame.num_columns());
    let mut report = InferenceReport::default();

    for column in &frame.columns {
        if let Some(ty) = options.overrides.get(&column.name) {
            pairs.push((column.name.clone(), ty.clone()));
            continue;
        }
        let mut candidates = infer_column(column, options.strict, options.aggressive_null);
        match candidates.len() {
            0 => report.unresolved.push(column.name.clone()),
            1 => pairs.push((column.name.clone(), candidates.remove(0))),
            _ => report.ambiguous.push((column.name.clone(), candidates)),
        }
    }

    if !report.is_empty() {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            unresolved = ?report.unresolved,
            ambiguous = report.ambiguous.len(),
            "schema inference failed"
        );
        return Err(Error::TypeInference(report));
    }

    Schema::from_pairs(pairs)
}
