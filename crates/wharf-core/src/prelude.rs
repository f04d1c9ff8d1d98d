//! Convenient re-exports for downstream crates.

pub use crate::config::AdapterConfig;
pub use crate::error::{Error, Result};
pub use crate::infer::{infer_schema, InferOptions, InferenceReport};
pub use crate::schema::{highest_precedence, DataType, Field, PrimitiveType, Schema, StructType};
pub use crate::types::{Column, Dtype, Frame, Value};
