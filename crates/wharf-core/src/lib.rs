#![forbid(unsafe_code)]
//! wharf-core: the type algebra shared by every wharf crate.
//!
//! - `schema`: primitive/array/struct types, precedence, and `Schema`.
//! - `types`: runtime values, columns, and frames.
//! - `infer`: schema inference over frames, with all failures reported at once.
//! - `coerce`: reshaping result frames through a schema.
//!
//! No warehouse client or I/O lives here.

pub mod coerce;
pub mod config;
pub mod error;
pub mod infer;
pub mod prelude;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
