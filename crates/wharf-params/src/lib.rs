#![forbid(unsafe_code)]
//! wharf-params: query parameter binding.
//!
//! A parameter's declared type picks a binding role; the role and the runtime
//! value's native kind together pick one normalization rule, which yields a
//! wire-tagged `BoundParameter`. Pairs without a rule are errors.

pub mod bind;
pub mod error;
pub mod wire;

pub use bind::{bind, ParamSpec, Role};
pub use error::{Error, Result};
pub use wire::{BoundParameter, WireType, WireValue};
