//! Object keywords: `required`, `properties`, `minProperties`,
//! `maxProperties`, `dependencies`, `additionalProperties` and
//! `patternProperties`, checked in that order.
use crate::{
    compilation::Compiler,
    error::SchemaError,
    helpers::convert_regex,
    response::Response,
    schema::{keyword_unsigned, EvalStack, NodeSlot},
};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

/// What the schema says about keys outside `properties` and
/// `patternProperties`. The same shape governs array items past a positional
/// `items` list.
#[derive(Debug)]
pub(crate) enum Additional {
    Unrestricted,
    Forbidden,
    Schema(Arc<NodeSlot>),
}

impl Additional {
    pub(crate) fn compile(
        object: &Map<String, Value>,
        keyword: &str,
        compiler: &mut Compiler<'_>,
    ) -> Result<Additional, SchemaError> {
        match object.get(keyword) {
            None | Some(Value::Bool(true)) => Ok(Additional::Unrestricted),
            Some(Value::Bool(false)) => Ok(Additional::Forbidden),
            Some(schema @ Value::Object(_)) => {
                Ok(Additional::Schema(compiler.compile_node(schema)?))
            }
            Some(_) => Err(SchemaError::malformed_document(&format!(
                "'{}' must be a boolean or a schema",
                keyword
            ))),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ObjectKeywords {
    required: Vec<String>,
    properties: Vec<(String, Arc<NodeSlot>)>,
    min_properties: Option<u64>,
    max_properties: Option<u64>,
    property_dependencies: Vec<(String, Vec<String>)>,
    schema_dependencies: Vec<(String, Arc<NodeSlot>)>,
    pattern_properties: Vec<(String, Regex, Arc<NodeSlot>)>,
    additional_properties: Additional,
}

impl ObjectKeywords {
    pub(crate) fn compile(
        object: &Map<String, Value>,
        compiler: &mut Compiler<'_>,
    ) -> Result<ObjectKeywords, SchemaError> {
        let mut properties = Vec::new();
        if let Some(value) = object.get("properties") {
            let map = value
                .as_object()
                .ok_or_else(|| SchemaError::malformed_document("'properties' must be an object"))?;
            for (key, subschema) in map {
                properties.push((key.clone(), compiler.compile_node(subschema)?));
            }
        }
        let mut property_dependencies = Vec::new();
        let mut schema_dependencies = Vec::new();
        if let Some(value) = object.get("dependencies") {
            let map = value.as_object().ok_or_else(|| {
                SchemaError::malformed_document("'dependencies' must be an object")
            })?;
            for (trigger, dependency) in map {
                match dependency {
                    Value::Array(keys) => {
                        property_dependencies.push((trigger.clone(), string_list(keys)?));
                    }
                    _ => schema_dependencies
                        .push((trigger.clone(), compiler.compile_node(dependency)?)),
                }
            }
        }
        let mut pattern_properties = Vec::new();
        if let Some(value) = object.get("patternProperties") {
            let map = value.as_object().ok_or_else(|| {
                SchemaError::malformed_document("'patternProperties' must be an object")
            })?;
            for (pattern, subschema) in map {
                pattern_properties.push((
                    pattern.clone(),
                    convert_regex(pattern)?,
                    compiler.compile_node(subschema)?,
                ));
            }
        }
        Ok(ObjectKeywords {
            required: match object.get("required") {
                Some(value) => {
                    let keys = value.as_array().ok_or_else(|| {
                        SchemaError::malformed_document("'required' must be an array")
                    })?;
                    string_list(keys)?
                }
                None => Vec::new(),
            },
            properties,
            min_properties: keyword_unsigned(object, "minProperties")?,
            max_properties: keyword_unsigned(object, "maxProperties")?,
            property_dependencies,
            schema_dependencies,
            pattern_properties,
            additional_properties: Additional::compile(object, "additionalProperties", compiler)?,
        })
    }

    pub(crate) fn validate(
        &self,
        instance: &Value,
        map: &Map<String, Value>,
        stack: &mut EvalStack,
    ) -> Response {
        for key in &self.required {
            if !map.contains_key(key) {
                return Response::failure(vec![], vec!["required".to_string(), key.clone()]);
            }
        }
        for (key, subschema) in &self.properties {
            if let Some(value) = map.get(key) {
                let response = subschema.validate(value, stack);
                if !response.is_valid() {
                    return response.prepend(
                        vec![key.clone()],
                        vec!["properties".to_string(), key.clone()],
                    );
                }
            }
        }
        if let Some(min_properties) = self.min_properties {
            if (map.len() as u64) < min_properties {
                return Response::failure(vec![], vec!["minProperties".to_string()]);
            }
        }
        if let Some(max_properties) = self.max_properties {
            if (map.len() as u64) > max_properties {
                return Response::failure(vec![], vec!["maxProperties".to_string()]);
            }
        }
        for (trigger, needed) in &self.property_dependencies {
            if map.contains_key(trigger) && !needed.iter().all(|key| map.contains_key(key)) {
                return Response::failure(
                    vec![trigger.clone()],
                    vec!["dependencies".to_string(), trigger.clone()],
                );
            }
        }
        for (trigger, subschema) in &self.schema_dependencies {
            if map.contains_key(trigger) {
                // A schema dependency constrains the whole object.
                let response = subschema.validate(instance, stack);
                if !response.is_valid() {
                    return response.prepend(
                        vec![trigger.clone()],
                        vec!["dependencies".to_string(), trigger.clone()],
                    );
                }
            }
        }
        match &self.additional_properties {
            Additional::Unrestricted => {}
            Additional::Forbidden => {
                for key in map.keys() {
                    if self.is_additional(key) {
                        return Response::failure(
                            vec![key.clone()],
                            vec!["additionalProperties".to_string()],
                        );
                    }
                }
            }
            Additional::Schema(subschema) => {
                for (key, value) in map {
                    if self.is_additional(key) {
                        let response = subschema.validate(value, stack);
                        if !response.is_valid() {
                            return response.prepend(
                                vec![key.clone()],
                                vec!["additionalProperties".to_string(), key.clone()],
                            );
                        }
                    }
                }
            }
        }
        for (key, value) in map {
            for (pattern_source, pattern, subschema) in &self.pattern_properties {
                if pattern.is_match(key) {
                    let response = subschema.validate(value, stack);
                    if !response.is_valid() {
                        return response.prepend(
                            vec![key.clone()],
                            vec!["patternProperties".to_string(), pattern_source.clone()],
                        );
                    }
                }
            }
        }
        Response::valid()
    }

    /// A key is additional if it is not a declared property, not required and
    /// not matched by any `patternProperties` pattern.
    fn is_additional(&self, key: &str) -> bool {
        !self.properties.iter().any(|(name, _)| name == key)
            && !self.required.iter().any(|name| name == key)
            && !self
                .pattern_properties
                .iter()
                .any(|(_, pattern, _)| pattern.is_match(key))
    }
}

fn string_list(values: &[Value]) -> Result<Vec<String>, SchemaError> {
    values
        .iter()
        .map(|value| {
            value
                .as_str()
                .map(ToString::to_string)
                .ok_or_else(|| SchemaError::malformed_document("expected an array of strings"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::get_schema;
    use serde_json::{json, Value};
    use test_case::test_case;

    fn check(schema: Value, instance: Value) -> bool {
        get_schema(&schema).unwrap().validate(&instance).is_valid()
    }

    #[test_case(json!({"required": ["a"]}), json!({"a": 1}), true)]
    #[test_case(json!({"required": ["a"]}), json!({"b": 1}), false)]
    #[test_case(json!({"minProperties": 1}), json!({}), false)]
    #[test_case(json!({"minProperties": 1}), json!({"a": 1}), true)]
    #[test_case(json!({"maxProperties": 1}), json!({"a": 1, "b": 2}), false)]
    #[test_case(json!({"dependencies": {"a": ["b"]}}), json!({"a": 1, "b": 2}), true)]
    #[test_case(json!({"dependencies": {"a": ["b"]}}), json!({"a": 1}), false)]
    #[test_case(json!({"dependencies": {"a": ["b"]}}), json!({"c": 1}), true; "dependency not triggered")]
    #[test_case(json!({"dependencies": {"a": {"required": ["b"]}}}), json!({"a": 1}), false; "schema dependency over the whole object")]
    #[test_case(json!({"dependencies": {"a": {"required": ["b"]}}}), json!({"a": 1, "b": 2}), true)]
    #[test_case(json!({"properties": {"a": {"type": "integer"}}, "additionalProperties": false}), json!({"a": 1}), true)]
    #[test_case(json!({"properties": {"a": {"type": "integer"}}, "additionalProperties": false}), json!({"a": 1, "b": 2}), false)]
    #[test_case(json!({"additionalProperties": {"type": "integer"}}), json!({"a": 1}), true)]
    #[test_case(json!({"additionalProperties": {"type": "integer"}}), json!({"a": "x"}), false)]
    #[test_case(json!({"patternProperties": {"^x": {"type": "integer"}}, "additionalProperties": false}), json!({"xa": 1}), true)]
    #[test_case(json!({"patternProperties": {"^x": {"type": "integer"}}, "additionalProperties": false}), json!({"xa": "s"}), false)]
    #[test_case(json!({"patternProperties": {"^x": {"type": "integer"}}, "additionalProperties": false}), json!({"y": 1}), false; "no pattern match and additional forbidden")]
    #[test_case(json!({"patternProperties": {"a+": {"type": "integer"}}}), json!({"xxaxx": 1}), true; "pattern searched inside the key")]
    #[test_case(json!({"patternProperties": {"a+": {"type": "integer"}}}), json!({"xxaxx": "s"}), false)]
    fn checks(schema: Value, instance: Value, expected: bool) {
        assert_eq!(check(schema, instance), expected)
    }

    #[test]
    fn required_pointer() {
        let schema = get_schema(&json!({"required": ["a"]})).unwrap();
        let response = schema.validate(&json!({}));
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["required", "a"]
        );
        assert!(response.instance_pointer().unwrap().tokens().is_empty());
    }

    #[test]
    fn nested_property_pointer() {
        let schema = get_schema(&json!({
            "properties": {"a": {"properties": {"b": {"type": "string"}}}}
        }))
        .unwrap();
        let response = schema.validate(&json!({"a": {"b": 5}}));
        assert!(!response.is_valid());
        assert_eq!(response.instance_pointer().unwrap().tokens(), &["a", "b"]);
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["properties", "a", "properties", "b", "type"]
        );
    }

    #[test]
    fn additional_properties_pointer() {
        let schema = get_schema(&json!({
            "patternProperties": {"^x": {"type": "integer"}},
            "additionalProperties": false
        }))
        .unwrap();
        let response = schema.validate(&json!({"y": 1}));
        assert_eq!(response.instance_pointer().unwrap().tokens(), &["y"]);
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["additionalProperties"]
        );
    }

    #[test]
    fn pattern_properties_pointer() {
        let schema = get_schema(&json!({"patternProperties": {"^x": {"type": "integer"}}})).unwrap();
        let response = schema.validate(&json!({"xa": "s"}));
        assert_eq!(response.instance_pointer().unwrap().tokens(), &["xa"]);
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["patternProperties", "^x", "type"]
        );
    }

    #[test]
    fn dependency_pointer() {
        let schema = get_schema(&json!({"dependencies": {"a": ["b"]}})).unwrap();
        let response = schema.validate(&json!({"a": 1}));
        assert_eq!(response.instance_pointer().unwrap().tokens(), &["a"]);
        assert_eq!(
            response.schema_pointer().unwrap().tokens(),
            &["dependencies", "a"]
        );
    }
}
