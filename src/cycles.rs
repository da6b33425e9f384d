//! Pre-compile check over the raw `$ref` graph.
//! A chain of reference jumps that returns to a reference already being
//! resolved is only legal if a concrete constraint was seen while that
//! reference was on the stack; a content-free loop can never terminate and is
//! rejected before compilation starts.
use crate::{
    error::SchemaError,
    loader::Reference,
    pointer::JsonPointer,
    schema::{ARRAY_KEYWORDS, NUMBER_KEYWORDS, OBJECT_KEYWORDS, STRING_KEYWORDS},
};
use serde_json::Value;

/// Keywords that constrain an instance on their own. Seeing one of these
/// while a reference is being resolved turns a loop through that reference
/// into ordinary recursion.
fn is_concrete_keyword(keyword: &str) -> bool {
    keyword == "type"
        || keyword == "enum"
        || OBJECT_KEYWORDS.contains(&keyword)
        || ARRAY_KEYWORDS.contains(&keyword)
        || STRING_KEYWORDS.contains(&keyword)
        || NUMBER_KEYWORDS.contains(&keyword)
}

pub(crate) fn check_refs(document: &Value) -> Result<(), SchemaError> {
    let mut walker = RefWalker {
        root: document,
        stack: Vec::new(),
    };
    walker.walk(document)
}

struct RefFrame {
    reference: String,
    contentful: bool,
}

struct RefWalker<'a> {
    root: &'a Value,
    stack: Vec<RefFrame>,
}

impl RefWalker<'_> {
    fn walk(&mut self, schema: &Value) -> Result<(), SchemaError> {
        let object = match schema {
            Value::Object(object) => object,
            _ => return Ok(()),
        };
        if object.keys().any(|keyword| is_concrete_keyword(keyword)) {
            for frame in &mut self.stack {
                frame.contentful = true;
            }
        }
        if let Some(reference) = object.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| SchemaError::invalid_reference(reference.to_string()))?;
            // Remote references are checked when their own document compiles.
            if let Reference::Pointer = Reference::classify(reference) {
                self.follow(reference)?;
            }
            // `$ref` overrides its siblings in Draft-04.
            return Ok(());
        }
        for keyword in &["anyOf", "allOf", "oneOf"] {
            if let Some(Value::Array(children)) = object.get(*keyword) {
                for child in children {
                    self.walk(child)?;
                }
            }
        }
        if let Some(child) = object.get("not") {
            self.walk(child)?;
        }
        if let Some(Value::Object(definitions)) = object.get("definitions") {
            // Definitions are not on the same jump chain unless reached
            // through a reference.
            for definition in definitions.values() {
                let outer = std::mem::replace(&mut self.stack, Vec::new());
                let result = self.walk(definition);
                self.stack = outer;
                result?;
            }
        }
        Ok(())
    }

    fn follow(&mut self, reference: &str) -> Result<(), SchemaError> {
        if let Some(frame) = self.stack.iter().find(|frame| frame.reference == reference) {
            if frame.contentful {
                // Recursion through a chain that already carries a constraint.
                return Ok(());
            }
            return Err(SchemaError::circular_reference(reference));
        }
        let target = JsonPointer::parse(reference)
            .resolve(self.root)
            .ok_or_else(|| SchemaError::unresolvable_reference(reference))?;
        self.stack.push(RefFrame {
            reference: reference.to_string(),
            contentful: false,
        });
        let result = self.walk(target);
        self.stack.pop();
        result
    }
}
