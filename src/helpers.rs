use regex::Regex;
use serde_json::Value;
use std::str::Chars;

/// Structural equality used by `enum` and `uniqueItems`.
///
/// Distinct variants are never equal: a boolean does not match an integer
/// and `1` does not match `1.0` (integer and float representations are kept
/// apart). Object key order is insignificant. This is exactly the equality
/// `serde_json` implements for `Value`; the helper pins the discipline down
/// in one place.
#[inline]
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    left == right
}

/// ECMA 262 whitespace, spelled out so `\s` keeps its ECMA character set
/// instead of the regex crate's Unicode default.
const WHITESPACE_SET: &str = " \\t\\n\\r\\x{0B}\\x{0C}\\x{A0}\\x{1680}\\x{2000}-\\x{200A}\\x{2028}\\x{2029}\\x{202F}\\x{205F}\\x{3000}\\x{FEFF}";

/// The ECMA character set behind a shorthand class letter, and whether the
/// shorthand is negated.
fn ecma_set(shorthand: char) -> Option<(&'static str, bool)> {
    match shorthand {
        'd' => Some(("0-9", false)),
        'D' => Some(("0-9", true)),
        'w' => Some(("A-Za-z0-9_", false)),
        'W' => Some(("A-Za-z0-9_", true)),
        's' => Some((WHITESPACE_SET, false)),
        'S' => Some((WHITESPACE_SET, true)),
        _ => None,
    }
}

/// Translate a Draft-04 pattern, written against ECMA 262 regex, into the
/// regex crate's dialect.
///
/// Shorthand classes are expanded to their ECMA character sets, `\cX`
/// control escapes become hex escapes, and escaped pairs (including `\\`)
/// pass through untouched, so a literal backslash never triggers an
/// expansion. Negated shorthands inside a bracket class are left to the
/// regex crate, which accepts them there.
pub(crate) fn convert_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut translated = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    let mut in_class = false;
    while let Some(current) = chars.next() {
        match current {
            '\\' => match chars.next() {
                Some('c') => push_control_escape(&mut chars, &mut translated),
                Some(escaped) => match ecma_set(escaped) {
                    Some((set, negated)) if in_class => {
                        if negated {
                            translated.push('\\');
                            translated.push(escaped);
                        } else {
                            translated.push_str(set);
                        }
                    }
                    Some((set, negated)) => {
                        translated.push('[');
                        if negated {
                            translated.push('^');
                        }
                        translated.push_str(set);
                        translated.push(']');
                    }
                    None => {
                        translated.push('\\');
                        translated.push(escaped);
                    }
                },
                None => translated.push('\\'),
            },
            '[' if !in_class => {
                in_class = true;
                translated.push('[');
            }
            ']' if in_class => {
                in_class = false;
                translated.push(']');
            }
            other => translated.push(other),
        }
    }
    Regex::new(&translated)
}

/// `\cX` selects a control character by letter; `\cJ` is the line feed.
fn push_control_escape(chars: &mut Chars<'_>, translated: &mut String) {
    match chars.next() {
        Some(letter) if letter.is_ascii_alphabetic() => {
            let code = u32::from(letter.to_ascii_uppercase()) - u32::from('A') + 1;
            translated.push_str(&format!("\\x{{{:X}}}", code));
        }
        Some(other) => {
            translated.push_str("\\c");
            translated.push(other);
        }
        None => translated.push_str("\\c"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!(1), json!(1), true ; "equal ints")]
    #[test_case(json!(1), json!(true), false ; "int vs bool")]
    #[test_case(json!(0), json!(false), false ; "zero vs false")]
    #[test_case(json!(1), json!(1.0), false ; "int vs float")]
    #[test_case(json!(1.5), json!(1.5), true ; "equal floats")]
    #[test_case(json!("1"), json!(1), false ; "string vs int")]
    #[test_case(json!(null), json!(0), false ; "null vs zero")]
    #[test_case(json!([1, "a"]), json!([1, "a"]), true ; "equal arrays")]
    #[test_case(json!([1]), json!([1.0]), false ; "array int vs float")]
    #[test_case(json!({"a": 1, "b": 2}), json!({"b": 2, "a": 1}), true ; "equal objects different order")]
    fn equality(left: Value, right: Value, expected: bool) {
        assert_eq!(equal(&left, &right), expected)
    }

    #[test]
    fn digit_class() {
        let re = convert_regex(r"^\d+$").unwrap();
        assert!(re.is_match("123"));
        assert!(!re.is_match("x"));
    }

    #[test]
    fn digit_class_inside_brackets() {
        let re = convert_regex(r"^[\da-f]+$").unwrap();
        assert!(re.is_match("3f"));
        assert!(!re.is_match("g"));
    }

    #[test]
    fn negated_digit_class() {
        let re = convert_regex(r"^\D$").unwrap();
        assert!(re.is_match("x"));
        assert!(!re.is_match("5"));
    }

    #[test]
    fn word_class_includes_underscore() {
        let re = convert_regex(r"^\w+$").unwrap();
        assert!(re.is_match("a_1"));
        assert!(!re.is_match("a-1"));
    }

    #[test]
    fn escaped_backslash_is_not_expanded() {
        let re = convert_regex(r"^a\\d$").unwrap();
        assert!(re.is_match("a\\d"));
        assert!(!re.is_match("a5"));
    }

    #[test]
    fn control_escape() {
        let re = convert_regex(r"^a\cJb$").unwrap();
        assert!(re.is_match("a\nb"));
    }

    #[test]
    fn whitespace_class() {
        let re = convert_regex(r"^\s$").unwrap();
        assert!(re.is_match(" "));
        assert!(re.is_match("\t"));
        assert!(!re.is_match("x"));
    }

    #[test]
    fn search_is_unanchored() {
        let re = convert_regex("b.d").unwrap();
        assert!(re.is_match("abcde"));
    }
}
