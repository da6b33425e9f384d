//! # jsonschema-draft4
//!
//! A crate for validating JSON documents against JSON Schema Draft-04. A
//! schema compiles once into a validation graph; validating against the
//! compiled graph reports the first point of divergence as a pair of JSON
//! Pointers, one into the instance and one into the schema.
//!
//! Supports:
//!   - the Draft-04 dialect, with every schema meta-validated before compiling;
//!   - `$ref` resolution across JSON Pointer fragments, HTTP(S) URLs and
//!     filesystem paths, with recursive schemas shared through a definition
//!     table;
//!   - rejection of reference cycles that carry no concrete constraint.
//!
//! ## Example:
//!
//! ```rust
//! use jsonschema_draft4::get_schema;
//! use serde_json::json;
//!
//! fn main() -> Result<(), jsonschema_draft4::SchemaError> {
//!     let schema = get_schema(&json!({
//!         "type": "object",
//!         "properties": {"name": {"type": "string"}},
//!         "required": ["name"]
//!     }))?;
//!     let response = schema.validate(&json!({"name": 42}));
//!     if !response.is_valid() {
//!         println!("{}", response);
//!     }
//!     Ok(())
//! }
//! ```
#![warn(
    clippy::doc_markdown,
    clippy::redundant_closure,
    clippy::explicit_iter_loop,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::print_stdout,
    clippy::trivially_copy_pass_by_ref,
    clippy::needless_pass_by_value,
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]
#[macro_use]
extern crate lazy_static;

mod compilation;
mod cycles;
mod error;
mod helpers;
mod loader;
mod meta;
mod pointer;
mod primitive_type;
mod response;
mod schema;

pub use compilation::{get_schema, get_schema_from_file, get_schema_from_url, Schema};
pub use error::{SchemaError, SchemaErrorKind};
pub use pointer::JsonPointer;
pub use response::Response;
use serde_json::Value;

/// A shortcut for validating `instance` against `schema`.
/// ```rust
/// use jsonschema_draft4::is_valid;
/// use serde_json::json;
///
/// let schema = json!({"maxLength": 5});
/// let instance = json!("foo");
/// assert!(is_valid(&schema, &instance));
/// ```
///
/// This function panics if an invalid schema is passed.
#[must_use]
#[inline]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    let compiled = get_schema(schema).expect("Invalid schema");
    compiled.validate(instance).is_valid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_valid() {
        let schema = json!({"minLength": 5});
        let valid = json!("foobar");
        let invalid = json!("foo");
        assert!(is_valid(&schema, &valid));
        assert!(!is_valid(&schema, &invalid));
    }
}
