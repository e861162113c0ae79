//! Inbound value coercion.
//!
//! Two routes exist: the permissive scalar matrix ([`coerce_scalar`]) for single-value queries,
//! and the structured field coercer ([`coerce_field`]) for record fields, which falls back to the
//! checked [`change_type`] conversion.

mod convert;
mod field;
mod scalar;

pub use convert::{ConversionError, change_type};
pub use field::{FieldFault, coerce_field};
pub use scalar::{coerce_enum_scalar, coerce_scalar, stringify_scalar};
