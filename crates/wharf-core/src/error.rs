use thiserror::Error;

use crate::infer::InferenceReport;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Duplicate column names: {0:?}")]
    SchemaIntegrity(Vec<String>),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column index must be between 0 and {upper}, inclusive (got {index})")]
    IndexOutOfBounds { index: usize, upper: usize },

    #[error("{0}")]
    TypeInference(InferenceReport),

    /// Two types with no common supertype were asked to unify.
    #[error("Cannot compute precedence for {left} and {right} types")]
    Precedence { left: String, right: String },

    #[error("Cannot coerce column '{column}': {detail}")]
    Coercion { column: String, detail: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}
