//! `multipleOf`, `minimum`, `maximum` and their exclusive flags, shared by
//! the integer and number variants.
use crate::{error::SchemaError, response::Response, schema::keyword_bool};
use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

#[derive(Debug)]
pub(crate) struct NumberKeywords {
    multiple_of: Option<Number>,
    minimum: Option<Number>,
    maximum: Option<Number>,
    exclusive_minimum: bool,
    exclusive_maximum: bool,
}

impl NumberKeywords {
    pub(crate) fn compile(object: &Map<String, Value>) -> Result<NumberKeywords, SchemaError> {
        Ok(NumberKeywords {
            multiple_of: keyword_number(object, "multipleOf")?,
            minimum: keyword_number(object, "minimum")?,
            maximum: keyword_number(object, "maximum")?,
            exclusive_minimum: keyword_bool(object, "exclusiveMinimum")?,
            exclusive_maximum: keyword_bool(object, "exclusiveMaximum")?,
        })
    }

    pub(crate) fn validate(&self, instance: &Number) -> Response {
        if let Some(multiple_of) = &self.multiple_of {
            // Zero is trivially a multiple of anything.
            if !is_zero(instance) && !is_multiple_of(instance, multiple_of) {
                return Response::failure(vec![], vec!["multipleOf".to_string()]);
            }
        }
        if let Some(minimum) = &self.minimum {
            match compare(instance, minimum) {
                Some(Ordering::Less) => {
                    return Response::failure(vec![], vec!["minimum".to_string()]);
                }
                Some(Ordering::Equal) if self.exclusive_minimum => {
                    return Response::failure(vec![], vec!["exclusiveMinimum".to_string()]);
                }
                _ => {}
            }
        }
        if let Some(maximum) = &self.maximum {
            match compare(instance, maximum) {
                Some(Ordering::Greater) => {
                    return Response::failure(vec![], vec!["maximum".to_string()]);
                }
                Some(Ordering::Equal) if self.exclusive_maximum => {
                    return Response::failure(vec![], vec!["exclusiveMaximum".to_string()]);
                }
                _ => {}
            }
        }
        Response::valid()
    }
}

fn keyword_number(
    object: &Map<String, Value>,
    keyword: &str,
) -> Result<Option<Number>, SchemaError> {
    match object.get(keyword) {
        Some(Value::Number(number)) => Ok(Some(number.clone())),
        Some(_) => Err(SchemaError::malformed_document(&format!(
            "'{}' must be a number",
            keyword
        ))),
        None => Ok(None),
    }
}

/// Exact ordering across the `u64`/`i64`/`f64` representations of two JSON
/// numbers. `None` never happens for JSON input (no NaN).
pub(crate) fn compare(left: &Number, right: &Number) -> Option<Ordering> {
    if let Some(left) = left.as_u64() {
        if let Some(right) = right.as_u64() {
            NumCmp::num_cmp(left, right)
        } else if let Some(right) = right.as_i64() {
            NumCmp::num_cmp(left, right)
        } else {
            NumCmp::num_cmp(left, right.as_f64()?)
        }
    } else if let Some(left) = left.as_i64() {
        if let Some(right) = right.as_u64() {
            NumCmp::num_cmp(left, right)
        } else if let Some(right) = right.as_i64() {
            NumCmp::num_cmp(left, right)
        } else {
            NumCmp::num_cmp(left, right.as_f64()?)
        }
    } else {
        let left = left.as_f64()?;
        if let Some(right) = right.as_u64() {
            NumCmp::num_cmp(left, right)
        } else if let Some(right) = right.as_i64() {
            NumCmp::num_cmp(left, right)
        } else {
            NumCmp::num_cmp(left, right.as_f64()?)
        }
    }
}

fn is_zero(number: &Number) -> bool {
    number.as_f64().map_or(false, |value| value == 0.)
}

/// Whether `instance / multiple_of` is an integer. Integer pairs divide
/// exactly in `i128`; float pairs fall back to an epsilon remainder check,
/// since plain division is unreliable at the representation edges.
pub(crate) fn is_multiple_of(instance: &Number, multiple_of: &Number) -> bool {
    if let (Some(instance), Some(multiple_of)) = (as_i128(instance), as_i128(multiple_of)) {
        if multiple_of == 0 {
            return true;
        }
        return instance % multiple_of == 0;
    }
    match (instance.as_f64(), multiple_of.as_f64()) {
        (Some(instance), Some(multiple_of)) => {
            if multiple_of == 0. {
                return true;
            }
            let remainder = (instance / multiple_of).fract().abs();
            remainder < f64::EPSILON || remainder > 1. - f64::EPSILON
        }
        _ => true,
    }
}

fn as_i128(number: &Number) -> Option<i128> {
    if let Some(value) = number.as_u64() {
        Some(i128::from(value))
    } else if let Some(value) = number.as_i64() {
        Some(i128::from(value))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn number(value: Value) -> Number {
        match value {
            Value::Number(number) => number,
            _ => panic!("not a number"),
        }
    }

    #[test_case(json!(1), json!(2), Ordering::Less)]
    #[test_case(json!(2), json!(2), Ordering::Equal)]
    #[test_case(json!(3), json!(2.5), Ordering::Greater)]
    #[test_case(json!(2.5), json!(3), Ordering::Less)]
    #[test_case(json!(-1), json!(1), Ordering::Less)]
    #[test_case(json!(10.0), json!(10), Ordering::Equal)]
    #[test_case(json!(u64::max_value()), json!(i64::max_value()), Ordering::Greater)]
    fn comparisons(left: Value, right: Value, expected: Ordering) {
        assert_eq!(compare(&number(left), &number(right)), Some(expected));
    }

    #[test_case(json!(10), json!(5), true)]
    #[test_case(json!(7), json!(2), false)]
    #[test_case(json!(-4), json!(2), true)]
    #[test_case(json!(7.5), json!(2.5), true)]
    #[test_case(json!(7.5), json!(2.0), false)]
    #[test_case(json!(10), json!(2.5), true)]
    #[test_case(json!(1_000_000_007), json!(1_000_000_007), true)]
    fn multiples(instance: Value, multiple_of: Value, expected: bool) {
        assert_eq!(
            is_multiple_of(&number(instance), &number(multiple_of)),
            expected
        );
    }

    #[test]
    fn exclusive_maximum_pointer() {
        let object = json!({"maximum": 10, "exclusiveMaximum": true});
        let keywords = NumberKeywords::compile(object.as_object().unwrap()).unwrap();
        assert!(keywords.validate(&number(json!(9))).is_valid());
        let response = keywords.validate(&number(json!(10)));
        assert!(!response.is_valid());
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["exclusiveMaximum"]
        );
        let response = keywords.validate(&number(json!(11)));
        assert_eq!(response.schema_pointer().unwrap().tokens(), &["maximum"]);
    }

    #[test]
    fn exclusive_minimum_pointer() {
        let object = json!({"minimum": 3, "exclusiveMinimum": true});
        let keywords = NumberKeywords::compile(object.as_object().unwrap()).unwrap();
        assert!(keywords.validate(&number(json!(4))).is_valid());
        let response = keywords.validate(&number(json!(3)));
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["exclusiveMinimum"]
        );
        let response = keywords.validate(&number(json!(2)));
        assert_eq!(response.schema_pointer().unwrap().tokens(), &["minimum"]);
    }

    #[test]
    fn zero_conforms_to_any_divisor() {
        let object = json!({"multipleOf": 3});
        let keywords = NumberKeywords::compile(object.as_object().unwrap()).unwrap();
        assert!(keywords.validate(&number(json!(0))).is_valid());
    }
}
