//! Array keywords: `items`, `additionalItems`, `minItems`, `maxItems` and
//! `uniqueItems`, checked in that order.
use crate::{
    compilation::Compiler,
    error::SchemaError,
    helpers::equal,
    response::Response,
    schema::{keyword_bool, keyword_unsigned, object::Additional, EvalStack, NodeSlot},
};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) enum Items {
    /// A single schema applied to every element.
    Schema(Arc<NodeSlot>),
    /// Positional schemas; elements past the list are `additionalItems`.
    List(Vec<Arc<NodeSlot>>),
}

#[derive(Debug)]
pub(crate) struct ArrayKeywords {
    items: Option<Items>,
    additional_items: Additional,
    min_items: Option<u64>,
    max_items: Option<u64>,
    unique_items: bool,
}

impl ArrayKeywords {
    pub(crate) fn compile(
        object: &Map<String, Value>,
        compiler: &mut Compiler<'_>,
    ) -> Result<ArrayKeywords, SchemaError> {
        let items = match object.get("items") {
            Some(Value::Array(subschemas)) => {
                let mut list = Vec::with_capacity(subschemas.len());
                for subschema in subschemas {
                    list.push(compiler.compile_node(subschema)?);
                }
                Some(Items::List(list))
            }
            Some(subschema @ Value::Object(_)) => {
                Some(Items::Schema(compiler.compile_node(subschema)?))
            }
            Some(_) => {
                return Err(SchemaError::malformed_document(
                    "'items' must be a schema or an array of schemas",
                ));
            }
            None => None,
        };
        Ok(ArrayKeywords {
            items,
            additional_items: Additional::compile(object, "additionalItems", compiler)?,
            min_items: keyword_unsigned(object, "minItems")?,
            max_items: keyword_unsigned(object, "maxItems")?,
            unique_items: keyword_bool(object, "uniqueItems")?,
        })
    }

    pub(crate) fn validate(&self, items: &[Value], stack: &mut EvalStack) -> Response {
        match &self.items {
            Some(Items::Schema(subschema)) => {
                for (index, element) in items.iter().enumerate() {
                    let response = subschema.validate(element, stack);
                    if !response.is_valid() {
                        return response
                            .prepend(vec![index.to_string()], vec!["items".to_string()]);
                    }
                }
            }
            Some(Items::List(subschemas)) => {
                for (index, (element, subschema)) in items.iter().zip(subschemas).enumerate() {
                    let response = subschema.validate(element, stack);
                    if !response.is_valid() {
                        return response.prepend(
                            vec![index.to_string()],
                            vec!["items".to_string(), index.to_string()],
                        );
                    }
                }
                // Elements past the positional list are governed here.
                match &self.additional_items {
                    Additional::Unrestricted => {}
                    Additional::Forbidden => {
                        if items.len() > subschemas.len() {
                            return Response::failure(
                                vec![subschemas.len().to_string()],
                                vec!["additionalItems".to_string()],
                            );
                        }
                    }
                    Additional::Schema(subschema) => {
                        for (index, element) in items.iter().enumerate().skip(subschemas.len()) {
                            let response = subschema.validate(element, stack);
                            if !response.is_valid() {
                                return response.prepend(
                                    vec![index.to_string()],
                                    vec!["additionalItems".to_string()],
                                );
                            }
                        }
                    }
                }
            }
            None => {}
        }
        if let Some(min_items) = self.min_items {
            if (items.len() as u64) < min_items {
                return Response::failure(vec![], vec!["minItems".to_string()]);
            }
        }
        if let Some(max_items) = self.max_items {
            if (items.len() as u64) > max_items {
                return Response::failure(vec![], vec!["maxItems".to_string()]);
            }
        }
        if self.unique_items {
            if let Some(index) = find_repeated(items) {
                return Response::failure(
                    vec![index.to_string()],
                    vec!["uniqueItems".to_string()],
                );
            }
        }
        Response::valid()
    }
}

/// Index of the second occurrence of the first repeated element.
fn find_repeated(items: &[Value]) -> Option<usize> {
    for second in 1..items.len() {
        for first in 0..second {
            if equal(&items[first], &items[second]) {
                return Some(second);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::get_schema;
    use serde_json::{json, Value};
    use test_case::test_case;

    fn check(schema: Value, instance: Value) -> bool {
        get_schema(&schema).unwrap().validate(&instance).is_valid()
    }

    #[test_case(json!({"items": {"type": "integer"}}), json!([1, 2, 3]), true)]
    #[test_case(json!({"items": {"type": "integer"}}), json!([1, "x"]), false)]
    #[test_case(json!({"items": {"type": "integer"}}), json!([]), true)]
    #[test_case(json!({"items": [{"type": "string"}, {"type": "integer"}]}), json!(["x", 1]), true)]
    #[test_case(json!({"items": [{"type": "string"}, {"type": "integer"}]}), json!(["x"]), true; "shorter than the list")]
    #[test_case(json!({"items": [{"type": "string"}, {"type": "integer"}]}), json!([1, 1]), false)]
    #[test_case(json!({"items": [{"type": "string"}], "additionalItems": false}), json!(["x"]), true)]
    #[test_case(json!({"items": [{"type": "string"}], "additionalItems": false}), json!(["x", 1]), false)]
    #[test_case(json!({"items": [{"type": "string"}], "additionalItems": {"type": "integer"}}), json!(["x", 1, 2]), true)]
    #[test_case(json!({"items": [{"type": "string"}], "additionalItems": {"type": "integer"}}), json!(["x", 1, "y"]), false)]
    #[test_case(json!({"additionalItems": false}), json!([1, 2]), true; "no positional list means no extras")]
    #[test_case(json!({"minItems": 1}), json!([]), false)]
    #[test_case(json!({"maxItems": 2}), json!([1, 2, 3]), false)]
    #[test_case(json!({"uniqueItems": true}), json!([1, 2, 3]), true)]
    #[test_case(json!({"uniqueItems": true}), json!([1, 2, 1]), false)]
    #[test_case(json!({"uniqueItems": true}), json!([1, true]), true; "boolean distinct from integer")]
    #[test_case(json!({"uniqueItems": true}), json!([1, 1.0]), true; "float distinct from integer")]
    #[test_case(json!({"uniqueItems": true}), json!([{"a": 1, "b": 2}, {"b": 2, "a": 1}]), false; "key order insignificant")]
    #[test_case(json!({"uniqueItems": false}), json!([1, 1]), true)]
    fn checks(schema: Value, instance: Value, expected: bool) {
        assert_eq!(check(schema, instance), expected)
    }

    #[test]
    fn additional_items_pointer() {
        let schema = get_schema(&json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "integer"}],
            "additionalItems": false
        }))
        .unwrap();
        assert!(schema.validate(&json!(["x", 1])).is_valid());
        let response = schema.validate(&json!(["x", 1, 2]));
        assert!(!response.is_valid());
        assert_eq!(response.instance_pointer().unwrap().tokens(), &["2"]);
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["additionalItems"]
        );
    }

    #[test]
    fn positional_item_pointer() {
        let schema = get_schema(&json!({"items": [{"type": "string"}, {"type": "integer"}]})).unwrap();
        let response = schema.validate(&json!(["x", "y"]));
        assert_eq!(response.instance_pointer().unwrap().tokens(), &["1"]);
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["items", "1", "type"]
        );
    }

    #[test]
    fn uniform_item_pointer() {
        let schema = get_schema(&json!({"items": {"type": "integer"}})).unwrap();
        let response = schema.validate(&json!([1, "x"]));
        assert_eq!(response.instance_pointer().unwrap().tokens(), &["1"]);
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["items", "type"]
        );
    }

    #[test]
    fn unique_items_reports_second_occurrence() {
        let schema = get_schema(&json!({"uniqueItems": true})).unwrap();
        let response = schema.validate(&json!(["a", "b", "a"]));
        assert_eq!(response.instance_pointer().unwrap().tokens(), &["2"]);
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["uniqueItems"]
        );
    }
}
