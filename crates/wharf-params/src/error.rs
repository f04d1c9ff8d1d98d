use thiserror::Error;

/// Result type local to wharf-params.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("type {0} has no parameter wire representation")]
    UnsupportedType(String),

    #[error("no binding rule for a {role} parameter given a {value_type} value")]
    NoMatchingBinding {
        role: &'static str,
        value_type: &'static str,
    },

    #[error("invalid {role} parameter value: {detail}")]
    InvalidValue { role: &'static str, detail: String },

    #[error("struct parameter '{param}' is missing field '{field}'")]
    MissingField { param: String, field: String },

    #[error("struct parameter '{param}' has no field '{field}'")]
    UnexpectedField { param: String, field: String },
}
