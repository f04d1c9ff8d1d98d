//! Logical type algebra and schemas. Pure data; no warehouse or frame
//! dependency here.
//!
//! A `DataType` is either a primitive kind, an array of some element type, or
//! a struct with named, ordered fields. Types compare structurally and are
//! immutable once built. A `Schema` is an ordered, name-unique list of
//! columns; every derivation (delete/append/project/rename) returns a new one.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Null,
    Boolean,
    Int64,
    Double,
    String,
    Binary,
    Date,
    Time,
    Timestamp,
    Interval,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 10] = [
        PrimitiveType::Null,
        PrimitiveType::Boolean,
        PrimitiveType::Int64,
        PrimitiveType::Double,
        PrimitiveType::String,
        PrimitiveType::Binary,
        PrimitiveType::Date,
        PrimitiveType::Time,
        PrimitiveType::Timestamp,
        PrimitiveType::Interval,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Double => "double",
            PrimitiveType::String => "string",
            PrimitiveType::Binary => "binary",
            PrimitiveType::Date => "date",
            PrimitiveType::Time => "time",
            PrimitiveType::Timestamp => "timestamp",
            PrimitiveType::Interval => "interval",
        }
    }

    /// Look up a primitive by its canonical name or a common alias.
    pub fn from_name(name: &str) -> Option<Self> {
        let p = match name.to_ascii_lowercase().as_str() {
            "null" => PrimitiveType::Null,
            "boolean" | "bool" => PrimitiveType::Boolean,
            "int64" | "int" | "integer" => PrimitiveType::Int64,
            "double" | "float64" | "float" => PrimitiveType::Double,
            "string" | "str" => PrimitiveType::String,
            "binary" | "bytes" => PrimitiveType::Binary,
            "date" => PrimitiveType::Date,
            "time" => PrimitiveType::Time,
            "timestamp" | "datetime" => PrimitiveType::Timestamp,
            "interval" => PrimitiveType::Interval,
            _ => return None,
        };
        Some(p)
    }

    /// Position in an implicit-upcast chain: `(chain, rank)`.
    ///
    /// Kinds on the same chain unify to the higher rank. Kinds without a chain
    /// only unify with themselves (and with `Null`, which casts to anything).
    fn upcast_rank(self) -> Option<(u8, u8)> {
        match self {
            PrimitiveType::Boolean => Some((0, 0)),
            PrimitiveType::Int64 => Some((0, 1)),
            PrimitiveType::Double => Some((0, 2)),
            PrimitiveType::Date => Some((1, 0)),
            PrimitiveType::Timestamp => Some((1, 1)),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Return the type both `left` and `right` can be implicitly cast to.
pub fn higher_precedence(left: PrimitiveType, right: PrimitiveType) -> Result<PrimitiveType> {
    if left == right {
        return Ok(left);
    }
    match (left, right) {
        (PrimitiveType::Null, other) | (other, PrimitiveType::Null) => Ok(other),
        _ => match (left.upcast_rank(), right.upcast_rank()) {
            (Some((lc, lr)), Some((rc, rr))) if lc == rc => {
                Ok(if lr >= rr { left } else { right })
            }
            _ => Err(Error::Precedence {
                left: left.to_string(),
                right: right.to_string(),
            }),
        },
    }
}

/// Unify a set of primitive observations into the single highest-precedence kind.
///
/// The input is sorted and deduplicated before reduction, so any permutation
/// of the same set produces the same result (or the same error).
pub fn highest_precedence<I>(types: I) -> Result<PrimitiveType>
where
    I: IntoIterator<Item = PrimitiveType>,
{
    let mut types: Vec<PrimitiveType> = types.into_iter().collect();
    types.sort();
    types.dedup();

    let mut iter = types.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| Error::Schema("cannot compute precedence of an empty type set".into()))?;
    iter.try_fold(first, higher_precedence)
}

/// `highest_precedence` lifted to full types: arrays unify element-wise,
/// structs with the same field names unify field-wise.
pub fn highest_precedence_of<'a, I>(types: I) -> Result<DataType>
where
    I: IntoIterator<Item = &'a DataType>,
{
    let mut types: Vec<&DataType> = types.into_iter().collect();
    types.sort();
    types.dedup();

    let mut iter = types.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| Error::Schema("cannot compute precedence of an empty type set".into()))?
        .clone();
    iter.try_fold(first, |acc, next| higher_precedence_of(&acc, next))
}

fn higher_precedence_of(left: &DataType, right: &DataType) -> Result<DataType> {
    use DataType::*;

    match (left, right) {
        _ if left == right => Ok(left.clone()),
        (Primitive(l), Primitive(r)) => Ok(Primitive(higher_precedence(*l, *r)?)),
        (Primitive(PrimitiveType::Null), other) | (other, Primitive(PrimitiveType::Null)) => {
            Ok(other.clone())
        }
        (Array(l), Array(r)) => Ok(Array(Box::new(higher_precedence_of(l, r)?))),
        (Struct(l), Struct(r))
            if l.len() == r.len()
                && l.fields().iter().zip(r.fields()).all(|((a, _), (b, _))| a == b) =>
        {
            let fields = l
                .fields()
                .iter()
                .zip(r.fields())
                .map(|((name, lt), (_, rt))| Ok((name.clone(), higher_precedence_of(lt, rt)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Struct(StructType::try_new(fields)?))
        }
        _ => Err(Error::Precedence {
            left: left.to_string(),
            right: right.to_string(),
        }),
    }
}

/// Ordered, name-unique struct fields. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructType {
    fields: Vec<(String, DataType)>,
}

impl StructType {
    pub fn try_new(fields: Vec<(String, DataType)>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::Schema(
                "struct type must have at least one field".into(),
            ));
        }
        let dups = duplicate_names(fields.iter().map(|(n, _)| n.as_str()));
        if !dups.is_empty() {
            return Err(Error::SchemaIntegrity(dups));
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[(String, DataType)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&DataType> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Primitive(PrimitiveType),
    Array(Box<DataType>),
    Struct(StructType),
    /// A warehouse kind the importer did not recognize, kept verbatim.
    Unrecognized(String),
}

impl DataType {
    pub const NULL: DataType = DataType::Primitive(PrimitiveType::Null);
    pub const BOOLEAN: DataType = DataType::Primitive(PrimitiveType::Boolean);
    pub const INT64: DataType = DataType::Primitive(PrimitiveType::Int64);
    pub const DOUBLE: DataType = DataType::Primitive(PrimitiveType::Double);
    pub const STRING: DataType = DataType::Primitive(PrimitiveType::String);
    pub const BINARY: DataType = DataType::Primitive(PrimitiveType::Binary);
    pub const DATE: DataType = DataType::Primitive(PrimitiveType::Date);
    pub const TIME: DataType = DataType::Primitive(PrimitiveType::Time);
    pub const TIMESTAMP: DataType = DataType::Primitive(PrimitiveType::Timestamp);
    pub const INTERVAL: DataType = DataType::Primitive(PrimitiveType::Interval);

    pub fn array(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    pub fn structure<N, I>(fields: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, DataType)>,
    {
        let fields = fields.into_iter().map(|(n, t)| (n.into(), t)).collect();
        Ok(DataType::Struct(StructType::try_new(fields)?))
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            DataType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataType::Primitive(PrimitiveType::Null))
    }

    /// Parse the textual form produced by `Display`, e.g.
    /// `struct<a: int64, tags: array<string>>`.
    pub fn parse(src: &str) -> Result<Self> {
        let mut parser = TypeParser { src, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != src.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(ty)
    }
}

impl From<PrimitiveType> for DataType {
    fn from(p: PrimitiveType) -> Self {
        DataType::Primitive(p)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Primitive(p) => write!(f, "{p}"),
            DataType::Array(elem) => write!(f, "array<{elem}>"),
            DataType::Struct(st) => {
                f.write_str("struct<")?;
                for (i, (name, ty)) in st.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_field_name(f, name)?;
                    write!(f, ": {ty}")?;
                }
                f.write_str(">")
            }
            DataType::Unrecognized(kind) => write!(f, "unrecognized<{kind}>"),
        }
    }
}

/// Field names outside `[A-Za-z0-9_]+` are written in backticks, with
/// embedded backticks doubled.
fn write_field_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        f.write_str(name)
    } else {
        write!(f, "`{}`", name.replace('`', "``"))
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DataType::parse(s)
    }
}

impl TryFrom<String> for DataType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        DataType::parse(&s)
    }
}

impl From<DataType> for String {
    fn from(ty: DataType) -> Self {
        ty.to_string()
    }
}

struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn error(&self, what: &str) -> Error {
        Error::Schema(format!(
            "invalid type string '{}' at offset {}: {what}",
            self.src, self.pos
        ))
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn ident(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn field_name(&mut self) -> Result<String> {
        self.skip_ws();
        if self.peek() != Some('`') {
            return self.ident().map(str::to_string);
        }
        self.pos += 1;
        let src: &'a str = self.src;
        let mut name = String::new();
        let mut chars = src[self.pos..].char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '`' {
                name.push(c);
                continue;
            }
            if chars.peek().map(|&(_, next)| next) == Some('`') {
                chars.next();
                name.push('`');
                continue;
            }
            self.pos += i + 1;
            return Ok(name);
        }
        self.pos = self.src.len();
        Err(self.error("unterminated quoted field name"))
    }

    fn parse_type(&mut self) -> Result<DataType> {
        let ident = self.ident()?;
        match ident.to_ascii_lowercase().as_str() {
            "array" => {
                self.expect('<')?;
                let elem = self.parse_type()?;
                self.expect('>')?;
                Ok(DataType::array(elem))
            }
            "struct" => {
                self.expect('<')?;
                let mut fields = Vec::new();
                loop {
                    let name = self.field_name()?;
                    self.expect(':')?;
                    let ty = self.parse_type()?;
                    fields.push((name, ty));
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => self.pos += 1,
                        Some('>') => {
                            self.pos += 1;
                            break;
                        }
                        _ => return Err(self.error("expected ',' or '>'")),
                    }
                }
                Ok(DataType::Struct(StructType::try_new(fields)?))
            }
            "unrecognized" => {
                self.expect('<')?;
                let rest = &self.src[self.pos..];
                let end = rest.find('>').ok_or_else(|| self.error("expected '>'"))?;
                let kind = rest[..end].trim().to_string();
                self.pos += end + 1;
                Ok(DataType::Unrecognized(kind))
            }
            other => PrimitiveType::from_name(other)
                .map(DataType::Primitive)
                .ok_or_else(|| self.error(&format!("unknown type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column names and types plus a name → position index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Field>", into = "Vec<Field>")]
pub struct Schema {
    names: Vec<String>,
    types: Vec<DataType>,
    name_locs: HashMap<String, usize>,
}

impl Schema {
    pub fn try_new(names: Vec<String>, types: Vec<DataType>) -> Result<Self> {
        if names.len() != types.len() {
            return Err(Error::Schema(format!(
                "got {} column names but {} types",
                names.len(),
                types.len()
            )));
        }
        let dups = duplicate_names(names.iter().map(String::as_str));
        if !dups.is_empty() {
            return Err(Error::SchemaIntegrity(dups));
        }
        let name_locs = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Ok(Self {
            names,
            types,
            name_locs,
        })
    }

    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let (names, types) = fields.into_iter().map(|f| (f.name, f.data_type)).unzip();
        Self::try_new(names, types)
    }

    pub fn from_pairs<N, I>(pairs: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, DataType)>,
    {
        let (names, types) = pairs.into_iter().map(|(n, t)| (n.into(), t)).unzip();
        Self::try_new(names, types)
    }

    pub fn empty() -> Self {
        Self {
            names: Vec::new(),
            types: Vec::new(),
            name_locs: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    pub fn fields(&self) -> Vec<Field> {
        self.iter()
            .map(|(n, t)| Field::new(n, t.clone()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataType)> {
        self.names.iter().map(String::as_str).zip(self.types.iter())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_locs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DataType> {
        self.name_locs.get(name).map(|&i| &self.types[i])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_locs.get(name).copied()
    }

    pub fn name_at_position(&self, index: usize) -> Result<&str> {
        if self.names.is_empty() {
            return Err(Error::Schema(format!(
                "cannot read column {index} of a schema with no columns"
            )));
        }
        self.names
            .get(index)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfBounds {
                index,
                upper: self.names.len().saturating_sub(1),
            })
    }

    /// New schema without the named columns. Every name must exist.
    pub fn delete(&self, names: &[&str]) -> Result<Self> {
        if let Some(missing) = names.iter().find(|n| !self.contains(n)) {
            return Err(Error::ColumnNotFound(missing.to_string()));
        }
        Self::from_pairs(
            self.iter()
                .filter(|(n, _)| !names.contains(n))
                .map(|(n, t)| (n, t.clone())),
        )
    }

    /// New schema with `other`'s columns after this one's.
    pub fn append(&self, other: &Schema) -> Result<Self> {
        Self::from_pairs(
            self.iter()
                .chain(other.iter())
                .map(|(n, t)| (n, t.clone())),
        )
    }

    /// New schema holding only `names`, in the given order.
    pub fn project(&self, names: &[&str]) -> Result<Self> {
        let pairs = names
            .iter()
            .map(|n| {
                self.get(n)
                    .map(|t| (*n, t.clone()))
                    .ok_or_else(|| Error::ColumnNotFound(n.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_pairs(pairs)
    }

    /// New schema with columns relabeled `from → to`; positions are kept.
    pub fn rename(&self, mapping: &[(&str, &str)]) -> Result<Self> {
        if let Some((missing, _)) = mapping.iter().find(|(from, _)| !self.contains(from)) {
            return Err(Error::ColumnNotFound(missing.to_string()));
        }
        let names = self
            .names
            .iter()
            .map(|n| {
                mapping
                    .iter()
                    .find(|(from, _)| from == n)
                    .map(|(_, to)| to.to_string())
                    .unwrap_or_else(|| n.clone())
            })
            .collect();
        Self::try_new(names, self.types.clone())
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names && self.types == other.types
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.names.hash(state);
        self.types.hash(state);
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let space = 2 + self.names.iter().map(String::len).max().unwrap_or(0);
        f.write_str("Schema {")?;
        for (name, ty) in self.iter() {
            write!(f, "\n  {name:<space$}{ty}")?;
        }
        f.write_str("\n}")
    }
}

impl TryFrom<Vec<Field>> for Schema {
    type Error = Error;

    fn try_from(fields: Vec<Field>) -> Result<Self> {
        Schema::new(fields)
    }
}

impl From<Schema> for Vec<Field> {
    fn from(schema: Schema) -> Self {
        schema.fields()
    }
}

/// Names appearing more than once, in first-seen order.
fn duplicate_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashMap::new();
    let mut dups = Vec::new();
    for name in names {
        let count = seen.entry(name).or_insert(0usize);
        *count += 1;
        if *count == 2 {
            dups.push(name.to_string());
        }
    }
    dups
}
