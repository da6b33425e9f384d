use crate::response::Response;
use std::fmt::{self, Formatter};
use std::{error, io};

/// An error raised while compiling a schema document.
///
/// Validation itself never errors; it returns a [`Response`](crate::Response).
#[derive(Debug)]
pub struct SchemaError {
    kind: SchemaErrorKind,
}

/// Kinds of schema compilation failures.
#[derive(Debug)]
pub enum SchemaErrorKind {
    /// A `$ref` chain loops back on itself without any concrete constraint
    /// in between.
    CircularReference(String),
    /// A `$ref` target is missing from the referenced document.
    UnresolvableReference(String),
    /// A `$ref` value is not a usable reference string.
    InvalidReference(String),
    /// The document is not structurally a schema (e.g. a subschema position
    /// holds a non-object).
    MalformedDocument(String),
    /// The document was rejected by the Draft-04 meta-schema. Carries the
    /// meta-validation response with the failing pointers.
    InvalidSchema(Response),
    /// A referenced file could not be read.
    FileNotFound(io::Error),
    /// A remote document could not be fetched.
    Fetch(reqwest::Error),
    /// A loaded document is not valid JSON.
    JsonParse(serde_json::Error),
    /// A reference is not a valid URL.
    UrlParse(url::ParseError),
    /// A `pattern` or `patternProperties` key is not a valid regular
    /// expression.
    Regex(regex::Error),
}

/// Shortcuts for creation of specific error kinds.
impl SchemaError {
    pub(crate) fn circular_reference(reference: &str) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::CircularReference(reference.to_string()),
        }
    }
    pub(crate) fn unresolvable_reference(reference: &str) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::UnresolvableReference(reference.to_string()),
        }
    }
    pub(crate) fn invalid_reference(reference: String) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::InvalidReference(reference),
        }
    }
    pub(crate) fn malformed_document(detail: &str) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::MalformedDocument(detail.to_string()),
        }
    }
    pub(crate) fn invalid_schema(response: Response) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::InvalidSchema(response),
        }
    }

    /// The specific failure.
    #[must_use]
    pub fn kind(&self) -> &SchemaErrorKind {
        &self.kind
    }

    /// True when the schema failed meta-schema validation.
    #[must_use]
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self.kind, SchemaErrorKind::InvalidSchema(_))
    }

    /// True for every structural failure detected before or during
    /// compilation: broken references, cycles, I/O and parse errors.
    #[must_use]
    pub fn is_malformed_schema(&self) -> bool {
        !self.is_invalid_schema()
    }
}

impl From<io::Error> for SchemaError {
    fn from(err: io::Error) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::FileNotFound(err),
        }
    }
}
impl From<reqwest::Error> for SchemaError {
    fn from(err: reqwest::Error) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::Fetch(err),
        }
    }
}
impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::JsonParse(err),
        }
    }
}
impl From<url::ParseError> for SchemaError {
    fn from(err: url::ParseError) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::UrlParse(err),
        }
    }
}
impl From<regex::Error> for SchemaError {
    fn from(err: regex::Error) -> SchemaError {
        SchemaError {
            kind: SchemaErrorKind::Regex(err),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaErrorKind::CircularReference(reference) => {
                write!(f, "'{}' forms a reference cycle with no content", reference)
            }
            SchemaErrorKind::UnresolvableReference(reference) => {
                write!(f, "'{}' does not resolve to a schema", reference)
            }
            SchemaErrorKind::InvalidReference(reference) => {
                write!(f, "'{}' is not a valid reference", reference)
            }
            SchemaErrorKind::MalformedDocument(detail) => write!(f, "{}", detail),
            SchemaErrorKind::InvalidSchema(response) => {
                write!(f, "schema rejected by the Draft-04 meta-schema: {}", response)
            }
            SchemaErrorKind::FileNotFound(err) => write!(f, "{}", err),
            SchemaErrorKind::Fetch(err) => write!(f, "{}", err),
            SchemaErrorKind::JsonParse(err) => write!(f, "{}", err),
            SchemaErrorKind::UrlParse(err) => write!(f, "{}", err),
            SchemaErrorKind::Regex(err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            SchemaErrorKind::FileNotFound(err) => Some(err),
            SchemaErrorKind::Fetch(err) => Some(err),
            SchemaErrorKind::JsonParse(err) => Some(err),
            SchemaErrorKind::UrlParse(err) => Some(err),
            SchemaErrorKind::Regex(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    #[test]
    fn families() {
        assert!(SchemaError::circular_reference("#/definitions/S").is_malformed_schema());
        assert!(SchemaError::unresolvable_reference("#/definitions/T").is_malformed_schema());
        let invalid =
            SchemaError::invalid_schema(Response::failure(vec![], vec!["type".to_string()]));
        assert!(invalid.is_invalid_schema());
        assert!(!invalid.is_malformed_schema());
    }

    #[test]
    fn display() {
        let err = SchemaError::circular_reference("#/definitions/S");
        assert_eq!(
            err.to_string(),
            "'#/definitions/S' forms a reference cycle with no content"
        );
    }
}
