//! `minLength`, `maxLength` and `pattern`. `format` is accepted but carries
//! no checks.
use crate::{
    error::SchemaError,
    helpers::convert_regex,
    response::Response,
    schema::keyword_unsigned,
};
use regex::Regex;
use serde_json::{Map, Value};

#[derive(Debug)]
pub(crate) struct StringKeywords {
    min_length: Option<u64>,
    max_length: Option<u64>,
    pattern: Option<Regex>,
}

impl StringKeywords {
    pub(crate) fn compile(object: &Map<String, Value>) -> Result<StringKeywords, SchemaError> {
        let pattern = match object.get("pattern") {
            Some(Value::String(pattern)) => Some(convert_regex(pattern)?),
            Some(_) => {
                return Err(SchemaError::malformed_document("'pattern' must be a string"));
            }
            None => None,
        };
        Ok(StringKeywords {
            min_length: keyword_unsigned(object, "minLength")?,
            max_length: keyword_unsigned(object, "maxLength")?,
            pattern,
        })
    }

    pub(crate) fn validate(&self, instance: &str) -> Response {
        let length = instance.chars().count() as u64;
        if let Some(min_length) = self.min_length {
            if length < min_length {
                return Response::failure(vec![], vec!["minLength".to_string()]);
            }
        }
        if let Some(max_length) = self.max_length {
            if length > max_length {
                return Response::failure(vec![], vec!["maxLength".to_string()]);
            }
        }
        if let Some(pattern) = &self.pattern {
            // Search semantics: a match anywhere in the string passes.
            if !pattern.is_match(instance) {
                return Response::failure(vec![], vec!["pattern".to_string()]);
            }
        }
        Response::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn compile(schema: Value) -> StringKeywords {
        StringKeywords::compile(schema.as_object().unwrap()).unwrap()
    }

    #[test_case(json!({"minLength": 2}), "ab", true)]
    #[test_case(json!({"minLength": 2}), "a", false)]
    #[test_case(json!({"maxLength": 2}), "ab", true)]
    #[test_case(json!({"maxLength": 2}), "abc", false)]
    #[test_case(json!({"pattern": "^a"}), "abc", true)]
    #[test_case(json!({"pattern": "b"}), "abc", true; "searched anywhere")]
    #[test_case(json!({"pattern": "^b"}), "abc", false)]
    fn checks(schema: Value, instance: &str, expected: bool) {
        assert_eq!(compile(schema).validate(instance).is_valid(), expected)
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let keywords = compile(json!({"maxLength": 2}));
        assert!(keywords.validate("äö").is_valid());
    }

    #[test]
    fn max_length_pointer() {
        let response = compile(json!({"maxLength": 1})).validate("ab");
        assert_eq!(response.schema_pointer().unwrap().tokens(), &["maxLength"]);
    }

    #[test]
    fn bad_pattern_fails_compilation() {
        let schema = json!({"pattern": "([unclosed"});
        assert!(StringKeywords::compile(schema.as_object().unwrap()).is_err());
    }
}
