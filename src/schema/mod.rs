//! The compiled validator graph.
//! A schema compiles to a tree of [`SchemaNode`]s: a combinator base shared
//! by every variant plus a typed keyword set. `$ref` sites share nodes
//! through slots that are filled once during compilation and only read
//! afterwards.
pub(crate) mod array;
pub(crate) mod number;
pub(crate) mod object;
pub(crate) mod string;

use crate::{
    compilation::Compiler,
    error::SchemaError,
    helpers::equal,
    primitive_type::PrimitiveType,
    response::Response,
};
use self::array::ArrayKeywords;
use self::number::NumberKeywords;
use self::object::ObjectKeywords;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::convert::TryFrom;
use std::sync::Arc;

/// Keywords that imply `object` when `type` is absent.
pub(crate) const OBJECT_KEYWORDS: &[&str] = &[
    "properties",
    "required",
    "additionalProperties",
    "minProperties",
    "maxProperties",
    "dependencies",
    "patternProperties",
];
/// Keywords that imply `array` when `type` is absent.
pub(crate) const ARRAY_KEYWORDS: &[&str] = &[
    "items",
    "additionalItems",
    "minItems",
    "maxItems",
    "uniqueItems",
];
/// Keywords that imply `string` when `type` is absent.
pub(crate) const STRING_KEYWORDS: &[&str] = &["minLength", "maxLength", "pattern", "format"];
/// Keywords that imply `number` when `type` is absent.
pub(crate) const NUMBER_KEYWORDS: &[&str] = &[
    "multipleOf",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
];

/// A share-able slot holding a compiled node.
///
/// Slots referenced from several `$ref` sites are inserted into the
/// definition table before their target compiles, so recursive references
/// resolve to the placeholder and the graph stays finite. After compilation
/// the lock is only ever read.
#[derive(Debug)]
pub(crate) struct NodeSlot {
    node: RwLock<Option<SchemaNode>>,
}

impl NodeSlot {
    pub(crate) fn empty() -> NodeSlot {
        NodeSlot {
            node: RwLock::new(None),
        }
    }

    pub(crate) fn filled(node: SchemaNode) -> NodeSlot {
        NodeSlot {
            node: RwLock::new(Some(node)),
        }
    }

    pub(crate) fn fill(&self, node: SchemaNode) {
        *self.node.write() = Some(node);
    }

    pub(crate) fn validate(&self, instance: &Value, stack: &mut EvalStack) -> Response {
        let frame = (
            self as *const NodeSlot as usize,
            instance as *const Value as usize,
        );
        if !stack.enter(frame) {
            // Same node against the same instance node again: this branch can
            // only succeed by infinite descent, so it fails here.
            return Response::failure(vec![], vec![]);
        }
        let guard = self.node.read();
        let response = guard
            .as_ref()
            .expect("slot is filled during compilation")
            .validate(instance, stack);
        drop(guard);
        stack.leave();
        response
    }
}

/// Identity pairs of the nodes currently being evaluated, used to cut
/// self-referential recursion that does not consume the instance.
#[derive(Debug)]
pub(crate) struct EvalStack {
    frames: Vec<(usize, usize)>,
}

impl EvalStack {
    pub(crate) fn new() -> EvalStack {
        EvalStack { frames: Vec::new() }
    }

    fn enter(&mut self, frame: (usize, usize)) -> bool {
        if self.frames.contains(&frame) {
            return false;
        }
        self.frames.push(frame);
        true
    }

    fn leave(&mut self) {
        self.frames.pop();
    }
}

/// One compiled schema node: the combinator base every variant shares plus
/// the typed keyword set.
#[derive(Debug)]
pub(crate) struct SchemaNode {
    base: Base,
    kind: Kind,
}

impl SchemaNode {
    pub(crate) fn new(base: Base, kind: Kind) -> SchemaNode {
        SchemaNode { base, kind }
    }

    /// A node that is nothing but a jump to a shared slot. `$ref` overrides
    /// its siblings in Draft-04, so no base is carried.
    pub(crate) fn reference(target: Arc<NodeSlot>) -> SchemaNode {
        SchemaNode {
            base: Base::default(),
            kind: Kind::Ref(target),
        }
    }

    pub(crate) fn validate(&self, instance: &Value, stack: &mut EvalStack) -> Response {
        let base = self.base.validate(instance, stack);
        if !base.is_valid() {
            return base;
        }
        self.kind.validate(instance, stack)
    }
}

/// Keywords shared by every variant, evaluated before the type check:
/// `anyOf`, `oneOf`, `allOf`, `not`, `enum`.
#[derive(Debug, Default)]
pub(crate) struct Base {
    any_of: Vec<Arc<NodeSlot>>,
    one_of: Vec<Arc<NodeSlot>>,
    all_of: Vec<Arc<NodeSlot>>,
    not: Option<Arc<NodeSlot>>,
    options: Vec<Value>,
}

impl Base {
    pub(crate) fn compile(
        object: &Map<String, Value>,
        compiler: &mut Compiler<'_>,
    ) -> Result<Base, SchemaError> {
        let options = match object.get("enum") {
            Some(Value::Array(options)) => options.clone(),
            Some(_) => {
                return Err(SchemaError::malformed_document("'enum' must be an array"));
            }
            None => Vec::new(),
        };
        Ok(Base {
            any_of: compile_children(object, "anyOf", compiler)?,
            one_of: compile_children(object, "oneOf", compiler)?,
            all_of: compile_children(object, "allOf", compiler)?,
            not: match object.get("not") {
                Some(child) => Some(compiler.compile_node(child)?),
                None => None,
            },
            options,
        })
    }

    fn validate(&self, instance: &Value, stack: &mut EvalStack) -> Response {
        if !self.any_of.is_empty() {
            let (count, last_failure) = count_passing(&self.any_of, instance, stack);
            if count < 1 {
                let (index, response) =
                    last_failure.expect("zero passing children means some child failed");
                return response.prepend(vec![], vec!["anyOf".to_string(), index.to_string()]);
            }
        }
        if !self.one_of.is_empty() {
            let (count, last_failure) = count_passing(&self.one_of, instance, stack);
            if count == 0 {
                let (index, response) =
                    last_failure.expect("zero passing children means some child failed");
                return response.prepend(vec![], vec!["oneOf".to_string(), index.to_string()]);
            }
            if count > 1 {
                return Response::failure(vec![], vec!["oneOf".to_string()]);
            }
        }
        if !self.all_of.is_empty() {
            let (_, last_failure) = count_passing(&self.all_of, instance, stack);
            if let Some((index, response)) = last_failure {
                return response.prepend(vec![], vec!["allOf".to_string(), index.to_string()]);
            }
        }
        if let Some(not) = &self.not {
            if not.validate(instance, stack).is_valid() {
                return Response::failure(vec![], vec!["not".to_string()]);
            }
        }
        if !self.options.is_empty() && !self.options.iter().any(|option| equal(option, instance)) {
            return Response::failure(vec![], vec!["enum".to_string()]);
        }
        Response::valid()
    }
}

/// Evaluate every child; pass counts matter for `oneOf`/`anyOf`, so there is
/// no short-circuit. Returns the pass count and the last failing child.
fn count_passing(
    children: &[Arc<NodeSlot>],
    instance: &Value,
    stack: &mut EvalStack,
) -> (usize, Option<(usize, Response)>) {
    let mut count = 0;
    let mut last_failure = None;
    for (index, child) in children.iter().enumerate() {
        let response = child.validate(instance, stack);
        if response.is_valid() {
            count += 1;
        } else {
            last_failure = Some((index, response));
        }
    }
    (count, last_failure)
}

fn compile_children(
    object: &Map<String, Value>,
    keyword: &str,
    compiler: &mut Compiler<'_>,
) -> Result<Vec<Arc<NodeSlot>>, SchemaError> {
    match object.get(keyword) {
        Some(Value::Array(children)) => children
            .iter()
            .map(|child| compiler.compile_node(child))
            .collect(),
        Some(_) => Err(SchemaError::malformed_document(&format!(
            "'{}' must be an array of schemas",
            keyword
        ))),
        None => Ok(Vec::new()),
    }
}

/// The typed variant of a node.
#[derive(Debug)]
pub(crate) enum Kind {
    Object(Box<ObjectKeywords>),
    Array(Box<ArrayKeywords>),
    String(string::StringKeywords),
    Integer(NumberKeywords),
    Number(NumberKeywords),
    Boolean,
    Null,
    Multi(MultiKeywords),
    /// The universal schema: only the base constrains anything.
    Any,
    /// A jump to a shared slot.
    Ref(Arc<NodeSlot>),
}

impl Kind {
    pub(crate) fn compile_typed(
        name: &str,
        object: &Map<String, Value>,
        compiler: &mut Compiler<'_>,
    ) -> Result<Kind, SchemaError> {
        match PrimitiveType::try_from(name) {
            Ok(PrimitiveType::Object) => Ok(Kind::Object(Box::new(ObjectKeywords::compile(
                object, compiler,
            )?))),
            Ok(PrimitiveType::Array) => Ok(Kind::Array(Box::new(ArrayKeywords::compile(
                object, compiler,
            )?))),
            Ok(PrimitiveType::String) => {
                Ok(Kind::String(string::StringKeywords::compile(object)?))
            }
            Ok(PrimitiveType::Integer) => Ok(Kind::Integer(NumberKeywords::compile(object)?)),
            Ok(PrimitiveType::Number) => Ok(Kind::Number(NumberKeywords::compile(object)?)),
            Ok(PrimitiveType::Boolean) => Ok(Kind::Boolean),
            Ok(PrimitiveType::Null) => Ok(Kind::Null),
            Err(()) => Err(SchemaError::malformed_document(&format!(
                "'{}' is not a JSON type",
                name
            ))),
        }
    }

    fn validate(&self, instance: &Value, stack: &mut EvalStack) -> Response {
        match self {
            Kind::Any => Response::valid(),
            Kind::Ref(target) => target.validate(instance, stack),
            Kind::Null => match instance {
                Value::Null => Response::valid(),
                _ => type_failure(),
            },
            Kind::Boolean => match instance {
                Value::Bool(_) => Response::valid(),
                _ => type_failure(),
            },
            Kind::String(keywords) => match instance {
                Value::String(value) => keywords.validate(value),
                _ => type_failure(),
            },
            Kind::Integer(keywords) => match instance {
                Value::Number(number) if !number.is_f64() => keywords.validate(number),
                _ => type_failure(),
            },
            Kind::Number(keywords) => match instance {
                Value::Number(number) => keywords.validate(number),
                _ => type_failure(),
            },
            Kind::Object(keywords) => match instance {
                Value::Object(map) => keywords.validate(instance, map, stack),
                _ => type_failure(),
            },
            Kind::Array(keywords) => match instance {
                Value::Array(items) => keywords.validate(items, stack),
                _ => type_failure(),
            },
            Kind::Multi(multi) => multi.validate(instance, stack),
        }
    }
}

fn type_failure() -> Response {
    Response::failure(vec![], vec!["type".to_string()])
}

/// A node accepting several types: one keyword set per listed (or inferred)
/// type, each built from the same raw object. The combinator base runs once
/// at the enclosing node, not per sub-type.
#[derive(Debug, Default)]
pub(crate) struct MultiKeywords {
    boolean: bool,
    null: bool,
    object: Option<Box<ObjectKeywords>>,
    array: Option<Box<ArrayKeywords>>,
    string: Option<string::StringKeywords>,
    integer: Option<NumberKeywords>,
    number: Option<NumberKeywords>,
    accepts_untyped: bool,
}

impl MultiKeywords {
    /// Build from an explicit `type` array.
    pub(crate) fn compile_listed(
        types: &[Value],
        object: &Map<String, Value>,
        compiler: &mut Compiler<'_>,
    ) -> Result<MultiKeywords, SchemaError> {
        let mut multi = MultiKeywords::default();
        for item in types {
            let name = item.as_str().ok_or_else(|| {
                SchemaError::malformed_document("'type' entries must be strings")
            })?;
            let primitive = PrimitiveType::try_from(name).map_err(|()| {
                SchemaError::malformed_document(&format!("'{}' is not a JSON type", name))
            })?;
            multi.add(primitive, object, compiler)?;
        }
        Ok(multi)
    }

    /// `type` is absent: infer the accepted set from which keyword families
    /// appear. An empty inference is the universal schema.
    pub(crate) fn infer(
        object: &Map<String, Value>,
        compiler: &mut Compiler<'_>,
    ) -> Result<Kind, SchemaError> {
        let mut inferred = Vec::new();
        for keyword in object.keys() {
            let primitive = if OBJECT_KEYWORDS.contains(&keyword.as_str()) {
                PrimitiveType::Object
            } else if ARRAY_KEYWORDS.contains(&keyword.as_str()) {
                PrimitiveType::Array
            } else if STRING_KEYWORDS.contains(&keyword.as_str()) {
                PrimitiveType::String
            } else if NUMBER_KEYWORDS.contains(&keyword.as_str()) {
                PrimitiveType::Number
            } else {
                continue;
            };
            if !inferred.contains(&primitive) {
                inferred.push(primitive);
            }
        }
        if inferred.is_empty() {
            return Ok(Kind::Any);
        }
        let mut multi = MultiKeywords {
            accepts_untyped: true,
            ..MultiKeywords::default()
        };
        for primitive in inferred {
            multi.add(primitive, object, compiler)?;
        }
        Ok(Kind::Multi(multi))
    }

    fn add(
        &mut self,
        primitive: PrimitiveType,
        object: &Map<String, Value>,
        compiler: &mut Compiler<'_>,
    ) -> Result<(), SchemaError> {
        match primitive {
            PrimitiveType::Object => {
                self.object = Some(Box::new(ObjectKeywords::compile(object, compiler)?));
            }
            PrimitiveType::Array => {
                self.array = Some(Box::new(ArrayKeywords::compile(object, compiler)?));
            }
            PrimitiveType::String => {
                self.string = Some(string::StringKeywords::compile(object)?);
            }
            PrimitiveType::Integer => self.integer = Some(NumberKeywords::compile(object)?),
            PrimitiveType::Number => self.number = Some(NumberKeywords::compile(object)?),
            PrimitiveType::Boolean => self.boolean = true,
            PrimitiveType::Null => self.null = true,
        }
        Ok(())
    }

    fn validate(&self, instance: &Value, stack: &mut EvalStack) -> Response {
        match instance {
            Value::Null => {
                if self.null {
                    Response::valid()
                } else {
                    self.untyped_fallback()
                }
            }
            // Booleans are never dispatched to numeric sub-nodes.
            Value::Bool(_) => {
                if self.boolean {
                    Response::valid()
                } else {
                    self.untyped_fallback()
                }
            }
            Value::Number(number) if !number.is_f64() => {
                if let Some(keywords) = &self.integer {
                    keywords.validate(number)
                } else if let Some(keywords) = &self.number {
                    keywords.validate(number)
                } else {
                    self.untyped_fallback()
                }
            }
            Value::Number(number) => {
                if let Some(keywords) = &self.number {
                    keywords.validate(number)
                } else if self.integer.is_some() {
                    // A float is not an integer.
                    type_failure()
                } else {
                    self.untyped_fallback()
                }
            }
            Value::String(value) => match &self.string {
                Some(keywords) => keywords.validate(value),
                None => self.untyped_fallback(),
            },
            Value::Object(map) => match &self.object {
                Some(keywords) => keywords.validate(instance, map, stack),
                None => self.untyped_fallback(),
            },
            Value::Array(items) => match &self.array {
                Some(keywords) => keywords.validate(items, stack),
                None => self.untyped_fallback(),
            },
        }
    }

    fn untyped_fallback(&self) -> Response {
        if self.accepts_untyped {
            Response::valid()
        } else {
            type_failure()
        }
    }
}

pub(crate) fn keyword_unsigned(
    object: &Map<String, Value>,
    keyword: &str,
) -> Result<Option<u64>, SchemaError> {
    match object.get(keyword) {
        Some(value) => match value.as_u64() {
            Some(value) => Ok(Some(value)),
            None => Err(SchemaError::malformed_document(&format!(
                "'{}' must be a non-negative integer",
                keyword
            ))),
        },
        None => Ok(None),
    }
}

pub(crate) fn keyword_bool(
    object: &Map<String, Value>,
    keyword: &str,
) -> Result<bool, SchemaError> {
    match object.get(keyword) {
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(SchemaError::malformed_document(&format!(
            "'{}' must be a boolean",
            keyword
        ))),
        None => Ok(false),
    }
}
