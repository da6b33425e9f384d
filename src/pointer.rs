//! RFC 6901 JSON Pointers.
//! Tokens are stored in decoded form; `~0`/`~1` escaping and percent-decoding
//! happen on parse, escaping happens on emit.
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::fmt;

/// A parsed JSON Pointer: an ordered sequence of decoded reference tokens.
///
/// The empty sequence denotes the document root. A leading `#` token marks a
/// URI-fragment pointer and is skipped during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    pub(crate) fn from_tokens(tokens: Vec<String>) -> JsonPointer {
        JsonPointer { tokens }
    }

    /// Parse a pointer string. The empty string is the root sentinel `["#"]`;
    /// otherwise the string is percent-decoded, split on `/` and each token
    /// is unescaped. A `#` at position 0 is kept as a distinct token.
    pub fn parse(pointer: &str) -> JsonPointer {
        if pointer.is_empty() {
            return JsonPointer {
                tokens: vec!["#".to_string()],
            };
        }
        let decoded = percent_decode_str(pointer).decode_utf8_lossy();
        let tokens = decoded.split('/').map(unescape).collect();
        JsonPointer { tokens }
    }

    /// The decoded reference tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Insert `tokens` in front of the current ones. Used while a failure
    /// unwinds through parent schema nodes.
    pub(crate) fn prepend(&mut self, tokens: Vec<String>) {
        if !tokens.is_empty() {
            let mut new_tokens = tokens;
            new_tokens.extend(self.tokens.drain(..));
            self.tokens = new_tokens;
        }
    }

    /// Walk the tokens against `document`. Object tokens are key lookups,
    /// array tokens are decimal indices, the `#` sentinel is skipped.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut target = document;
        for token in &self.tokens {
            if token == "#" {
                continue;
            }
            target = match target {
                Value::Object(map) => map.get(token)?,
                Value::Array(items) => parse_index(token).and_then(|index| items.get(index))?,
                _ => return None,
            };
        }
        Some(target)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, token) in self.tokens.iter().enumerate() {
            if token == "#" && position == 0 {
                write!(f, "#")?;
            } else {
                write!(f, "/{}", escape(token))?;
            }
        }
        Ok(())
    }
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn parse_index(token: &str) -> Option<usize> {
    if token.starts_with('+') || (token.starts_with('0') && token.len() != 1) {
        return None;
    }
    token.parse().ok()
}
