//! Validation outcome with dual pointers into the instance and the schema.
use crate::pointer::JsonPointer;
use std::fmt;

/// The result of validating an instance against a compiled schema.
///
/// When invalid, `instance_pointer` addresses the failing node of the
/// instance and `schema_pointer` the keyword that rejected it. Responses are
/// built at the failure site and each parent node prepends its own path
/// tokens while the failure unwinds.
#[derive(Debug, Clone)]
pub struct Response {
    is_valid: bool,
    instance_pointer: Option<JsonPointer>,
    schema_pointer: Option<JsonPointer>,
}

impl Response {
    pub(crate) fn valid() -> Response {
        Response {
            is_valid: true,
            instance_pointer: None,
            schema_pointer: None,
        }
    }

    pub(crate) fn failure(instance_tokens: Vec<String>, schema_tokens: Vec<String>) -> Response {
        Response {
            is_valid: false,
            instance_pointer: Some(JsonPointer::from_tokens(instance_tokens)),
            schema_pointer: Some(JsonPointer::from_tokens(schema_tokens)),
        }
    }

    /// Prepend path tokens on the way up. No-op for valid responses.
    pub(crate) fn prepend(
        mut self,
        instance_tokens: Vec<String>,
        schema_tokens: Vec<String>,
    ) -> Response {
        if let Some(pointer) = self.instance_pointer.as_mut() {
            pointer.prepend(instance_tokens);
        }
        if let Some(pointer) = self.schema_pointer.as_mut() {
            pointer.prepend(schema_tokens);
        }
        self
    }

    /// Whether the instance conformed to the schema.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Pointer to the instance node that failed. `None` when valid.
    #[must_use]
    pub fn instance_pointer(&self) -> Option<&JsonPointer> {
        self.instance_pointer.as_ref()
    }

    /// Pointer to the schema keyword that was not satisfied. `None` when valid.
    #[must_use]
    pub fn schema_pointer(&self) -> Option<&JsonPointer> {
        self.schema_pointer.as_ref()
    }
}

impl From<&Response> for bool {
    fn from(response: &Response) -> bool {
        response.is_valid
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid {
            write!(f, "Valid JSON!")
        } else {
            write!(
                f,
                "Document failed on: {}\nOn Schema: {}",
                self.instance_pointer.as_ref().map_or_else(String::new, ToString::to_string),
                self.schema_pointer.as_ref().map_or_else(String::new, ToString::to_string),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_valid() {
        assert_eq!(Response::valid().to_string(), "Valid JSON!");
    }

    #[test]
    fn display_invalid() {
        let response = Response::failure(
            vec!["a".to_string(), "b".to_string()],
            vec!["properties".to_string(), "a".to_string(), "type".to_string()],
        );
        assert_eq!(
            response.to_string(),
            "Document failed on: /a/b\nOn Schema: /properties/a/type"
        );
    }

    #[test]
    fn prepend_accumulates_bottom_up() {
        let response = Response::failure(vec![], vec!["type".to_string()])
            .prepend(vec!["b".to_string()], vec!["properties".to_string(), "b".to_string()])
            .prepend(vec!["a".to_string()], vec!["properties".to_string(), "a".to_string()]);
        assert_eq!(
            response.instance_pointer().unwrap().tokens(),
            &["a", "b"]
        );
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["properties", "a", "properties", "b", "type"]
        );
    }

    #[test]
    fn prepend_keeps_valid_untouched() {
        let response = Response::valid().prepend(vec!["a".to_string()], vec!["not".to_string()]);
        assert!(response.is_valid());
        assert!(response.instance_pointer().is_none());
    }

    #[test]
    fn truthiness() {
        assert!(bool::from(&Response::valid()));
        assert!(!bool::from(&Response::failure(vec![], vec![])));
    }
}
