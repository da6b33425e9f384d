//! Loading of referenced schema documents.
//! Raw documents are fetched over HTTP(S), read from the filesystem or taken
//! from memory, and cached per origin so that a document referenced from
//! several `$ref` sites is fetched once.
use crate::{error::SchemaError, pointer::JsonPointer, schema::NodeSlot};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Url schemes a `$ref` may carry to count as a remote reference.
pub(crate) const VALID_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// A classified `$ref` string.
#[derive(Debug)]
pub(crate) enum Reference {
    /// Empty string or fragment: a JSON Pointer into the current document.
    Pointer,
    /// Absolute URL with an `http`, `https` or `ftp` scheme.
    Url(Url),
    /// Anything else is read from the filesystem.
    Path(PathBuf),
}

impl Reference {
    pub(crate) fn classify(reference: &str) -> Reference {
        if reference.is_empty() || reference.starts_with('#') {
            return Reference::Pointer;
        }
        if let Ok(url) = Url::parse(reference) {
            if VALID_SCHEMES.contains(&url.scheme()) {
                return Reference::Url(url);
            }
        }
        Reference::Path(PathBuf::from(reference))
    }
}

/// A fragment that starts with `/` is honoured as a JSON Pointer into the
/// fetched document; anything else falls back to the document root.
pub(crate) fn fragment_pointer(url: &Url) -> Option<JsonPointer> {
    match url.fragment() {
        Some(fragment) if fragment.starts_with('/') => {
            Some(JsonPointer::parse(&format!("#{}", fragment)))
        }
        _ => None,
    }
}

/// Fetches and caches raw schema documents for one compilation.
pub(crate) struct Loader {
    documents: HashMap<String, Arc<Value>>,
    compiled: HashMap<String, Arc<NodeSlot>>,
}

impl Loader {
    pub(crate) fn new() -> Loader {
        Loader {
            documents: HashMap::new(),
            compiled: HashMap::new(),
        }
    }

    /// Fetch the document behind `url`, ignoring its fragment. The content is
    /// decoded as UTF-8 JSON.
    pub(crate) fn load_url(&mut self, url: &Url) -> Result<Arc<Value>, SchemaError> {
        let mut resource = url.clone();
        resource.set_fragment(None);
        let origin = resource.to_string();
        if let Some(document) = self.documents.get(&origin) {
            return Ok(Arc::clone(document));
        }
        let document: Value = reqwest::blocking::get(resource)?.json()?;
        let document = Arc::new(document);
        self.documents.insert(origin, Arc::clone(&document));
        Ok(document)
    }

    /// Read and parse a schema document from the filesystem.
    pub(crate) fn load_path(&mut self, path: &Path) -> Result<Arc<Value>, SchemaError> {
        let origin = path.to_string_lossy().into_owned();
        if let Some(document) = self.documents.get(&origin) {
            return Ok(Arc::clone(document));
        }
        let file = File::open(path)?;
        let document: Value = serde_json::from_reader(file)?;
        let document = Arc::new(document);
        self.documents.insert(origin, Arc::clone(&document));
        Ok(document)
    }

    /// Compiled root for a full remote reference string, if it was already
    /// compiled during this session.
    pub(crate) fn compiled(&self, reference: &str) -> Option<Arc<NodeSlot>> {
        self.compiled.get(reference).map(Arc::clone)
    }

    /// Register a compiled root. Called with an empty slot before the remote
    /// document compiles, so mutually-referencing documents terminate.
    pub(crate) fn insert_compiled(&mut self, reference: &str, slot: Arc<NodeSlot>) {
        self.compiled.insert(reference.to_string(), slot);
    }
}
