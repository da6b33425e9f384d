//! Schema compilation.
//! A raw document flows through the `$ref` cycle check and the meta-schema
//! gate, then compiles into a graph of typed nodes. `$ref` sites resolve to
//! shared slots through a definition table, so recursive schemas become a
//! finite graph with back-edges.
use crate::{
    cycles,
    error::SchemaError,
    loader::{self, Loader, Reference},
    meta,
    pointer::JsonPointer,
    response::Response,
    schema::{Base, EvalStack, Kind, MultiKeywords, NodeSlot, SchemaNode},
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// A compiled, immutable Draft-04 schema.
///
/// Compilation happens once; afterwards the schema is read-only and may be
/// shared freely between threads. Each [`validate`](Schema::validate) call
/// allocates its own bookkeeping, so concurrent validations do not contend.
#[derive(Debug)]
pub struct Schema {
    raw: Value,
    pub(crate) root: Arc<NodeSlot>,
}

impl Schema {
    /// Validate `instance`, reporting the first point of divergence as a pair
    /// of JSON Pointers into the instance and the schema.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> Response {
        let mut stack = EvalStack::new();
        self.root.validate(instance, &mut stack)
    }

    /// The raw schema document this graph was compiled from.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.raw
    }
}

/// Compile a schema from an in-memory JSON document.
///
/// The document is checked for content-free `$ref` cycles, validated against
/// the Draft-04 meta-schema and then compiled. Remote references are fetched
/// eagerly during compilation.
///
/// ```rust
/// use serde_json::json;
///
/// let schema = jsonschema_draft4::get_schema(&json!({"maxLength": 5})).unwrap();
/// assert!(schema.validate(&json!("foo")).is_valid());
/// assert!(!schema.validate(&json!("foo bar")).is_valid());
/// ```
pub fn get_schema(schema: &Value) -> Result<Schema, SchemaError> {
    let mut loader = Loader::new();
    compile_document(schema.clone(), true, &mut loader)
}

/// Compile a schema read from the filesystem.
pub fn get_schema_from_file<P: AsRef<Path>>(path: P) -> Result<Schema, SchemaError> {
    let mut loader = Loader::new();
    let document = loader.load_path(path.as_ref())?;
    compile_document((*document).clone(), true, &mut loader)
}

/// Compile a schema fetched from a URL.
///
/// If the URL carries a fragment that is a JSON Pointer, the pointed-to
/// subschema is compiled against the fetched document; other fragments fall
/// back to the document root.
pub fn get_schema_from_url(url: &str) -> Result<Schema, SchemaError> {
    let mut loader = Loader::new();
    let url = Url::parse(url)?;
    let document = loader.load_url(&url)?;
    compile_document_at(
        (*document).clone(),
        loader::fragment_pointer(&url),
        true,
        &mut loader,
    )
}

pub(crate) fn compile_document(
    raw: Value,
    check_meta: bool,
    loader: &mut Loader,
) -> Result<Schema, SchemaError> {
    compile_document_at(raw, None, check_meta, loader)
}

pub(crate) fn compile_document_at(
    raw: Value,
    start: Option<JsonPointer>,
    check_meta: bool,
    loader: &mut Loader,
) -> Result<Schema, SchemaError> {
    cycles::check_refs(&raw)?;
    let root = {
        let target = match &start {
            Some(pointer) => pointer
                .resolve(&raw)
                .ok_or_else(|| SchemaError::unresolvable_reference(&pointer.to_string()))?,
            None => &raw,
        };
        if check_meta {
            let report = meta::validate_draft4(target);
            if !report.is_valid() {
                return Err(SchemaError::invalid_schema(report));
            }
        }
        let mut compiler = Compiler::new(&raw, loader);
        compiler.compile_node(target)?
    };
    Ok(Schema { raw, root })
}

/// One compilation session over one document. The definition table maps
/// canonical reference strings to their shared slots; nested remote documents
/// get their own session but share the loader's caches.
pub(crate) struct Compiler<'a> {
    whole: &'a Value,
    definitions: HashMap<String, Arc<NodeSlot>>,
    loader: &'a mut Loader,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(whole: &'a Value, loader: &'a mut Loader) -> Compiler<'a> {
        Compiler {
            whole,
            definitions: HashMap::new(),
            loader,
        }
    }

    /// Compile a subschema into a slot. `$ref` objects resolve through the
    /// definition table or the loader; anything else compiles in place.
    pub(crate) fn compile_node(&mut self, schema: &Value) -> Result<Arc<NodeSlot>, SchemaError> {
        if let Some(reference) = schema.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| SchemaError::invalid_reference(reference.to_string()))?;
            return match Reference::classify(reference) {
                Reference::Pointer => self.compile_pointer(reference),
                remote => self.compile_remote(reference, remote),
            };
        }
        Ok(Arc::new(NodeSlot::filled(self.compile_keywords(schema)?)))
    }

    /// A local reference. The slot is registered before its target compiles,
    /// so a reference back to the same key resolves to the placeholder and
    /// recursion terminates.
    fn compile_pointer(&mut self, reference: &str) -> Result<Arc<NodeSlot>, SchemaError> {
        if let Some(slot) = self.definitions.get(reference) {
            return Ok(Arc::clone(slot));
        }
        let slot = Arc::new(NodeSlot::empty());
        self.definitions
            .insert(reference.to_string(), Arc::clone(&slot));
        let target = JsonPointer::parse(reference)
            .resolve(self.whole)
            .ok_or_else(|| SchemaError::unresolvable_reference(reference))?;
        let node = if target.get("$ref").is_some() {
            // A chain of references stays pointer-transparent.
            SchemaNode::reference(self.compile_node(target)?)
        } else {
            self.compile_keywords(target)?
        };
        slot.fill(node);
        Ok(slot)
    }

    /// A remote reference spawns a fresh session over the fetched document.
    /// The placeholder goes into the loader's cache first, so documents that
    /// reference each other terminate.
    fn compile_remote(
        &mut self,
        reference: &str,
        target: Reference,
    ) -> Result<Arc<NodeSlot>, SchemaError> {
        if let Some(slot) = self.loader.compiled(reference) {
            return Ok(slot);
        }
        let slot = Arc::new(NodeSlot::empty());
        self.loader.insert_compiled(reference, Arc::clone(&slot));
        let compiled = match target {
            Reference::Url(url) => {
                let document = self.loader.load_url(&url)?;
                compile_document_at(
                    (*document).clone(),
                    loader::fragment_pointer(&url),
                    true,
                    self.loader,
                )?
            }
            Reference::Path(path) => {
                let document = self.loader.load_path(&path)?;
                compile_document((*document).clone(), true, self.loader)?
            }
            Reference::Pointer => {
                return Err(SchemaError::invalid_reference(reference.to_string()));
            }
        };
        slot.fill(SchemaNode::reference(compiled.root));
        Ok(slot)
    }

    /// Build the typed node: the shared combinator base plus the variant
    /// selected by `type` (or inferred from the keyword families).
    pub(crate) fn compile_keywords(&mut self, schema: &Value) -> Result<SchemaNode, SchemaError> {
        let object = match schema {
            Value::Object(object) => object,
            _ => {
                return Err(SchemaError::malformed_document(
                    "a schema must be a JSON object",
                ));
            }
        };
        let base = Base::compile(object, self)?;
        let kind = match object.get("type") {
            Some(Value::String(name)) => Kind::compile_typed(name, object, self)?,
            Some(Value::Array(types)) => {
                Kind::Multi(MultiKeywords::compile_listed(types, object, self)?)
            }
            Some(_) => {
                return Err(SchemaError::malformed_document(
                    "'type' must be a string or an array of strings",
                ));
            }
            None => MultiKeywords::infer(object, self)?,
        };
        Ok(SchemaNode::new(base, kind))
    }
}
