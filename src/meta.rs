//! The embedded Draft-04 meta-schema.
//! Every user-supplied schema is validated against it before compiling. The
//! meta-schema itself is compiled without that gate (it is its own dialect).
use crate::{
    compilation::{compile_document, Schema},
    loader::Loader,
    response::Response,
};
use serde_json::Value;

pub(crate) const META_SCHEMA_JSON: &str = include_str!("meta_schema.json");

lazy_static! {
    static ref META_SCHEMA: Schema = {
        let raw: Value =
            serde_json::from_str(META_SCHEMA_JSON).expect("embedded meta-schema is valid JSON");
        let mut loader = Loader::new();
        compile_document(raw, false, &mut loader).expect("embedded meta-schema compiles")
    };
}

/// Validate a raw schema document against the Draft-04 meta-schema.
pub(crate) fn validate_draft4(schema: &Value) -> Response {
    META_SCHEMA.validate(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_schema_validates_itself() {
        let raw: Value = serde_json::from_str(META_SCHEMA_JSON).unwrap();
        assert!(validate_draft4(&raw).is_valid());
    }

    #[test]
    fn meta_schema_compiles_through_the_public_gate() {
        // The bootstrap skip is only needed for the embedded copy; the same
        // document also passes the full pipeline.
        let raw: Value = serde_json::from_str(META_SCHEMA_JSON).unwrap();
        assert!(crate::get_schema(&raw).is_ok());
    }

    #[test]
    fn rejects_non_object_type() {
        use serde_json::json;
        assert!(!validate_draft4(&json!({"type": 1})).is_valid());
    }

    #[test]
    fn rejects_exclusive_bound_without_bound() {
        use serde_json::json;
        assert!(!validate_draft4(&json!({"exclusiveMaximum": true})).is_valid());
        assert!(validate_draft4(&json!({"exclusiveMaximum": true, "maximum": 3})).is_valid());
    }

    #[test]
    fn accepts_common_schemas() {
        use serde_json::json;
        assert!(validate_draft4(&json!({})).is_valid());
        assert!(validate_draft4(&json!({"type": "integer", "minimum": 0})).is_valid());
        assert!(validate_draft4(&json!({
            "type": "object",
            "properties": {"a": {"type": ["string", "null"]}},
            "required": ["a"]
        }))
        .is_valid());
    }
}
