//! Typed travel-data tree and the source document it is loaded from.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Number, Value};
use tracing::{debug, info};

use crate::errors::RagError;

/// Leaf value of a [`TravelNode`].
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// Tree-shaped travel data. Object keys are kept sorted, so the serialized
/// form of a node is canonical.
#[derive(Clone, Debug, PartialEq)]
pub enum TravelNode {
    Object(BTreeMap<String, TravelNode>),
    Array(Vec<TravelNode>),
    Scalar(Scalar),
}

impl TravelNode {
    pub fn empty_object() -> Self {
        TravelNode::Object(BTreeMap::new())
    }

    /// Scalars and empty containers.
    pub fn is_leaf(&self) -> bool {
        match self {
            TravelNode::Object(m) => m.is_empty(),
            TravelNode::Array(a) => a.is_empty(),
            TravelNode::Scalar(_) => true,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            TravelNode::Object(m) => Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_value())).collect(),
            ),
            TravelNode::Array(a) => Value::Array(a.iter().map(TravelNode::to_value).collect()),
            TravelNode::Scalar(Scalar::Null) => Value::Null,
            TravelNode::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            TravelNode::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            TravelNode::Scalar(Scalar::String(s)) => Value::String(s.clone()),
        }
    }

    /// Compact canonical JSON text.
    pub fn to_json(&self) -> String {
        // Serializing a `Value` built from owned data cannot fail.
        serde_json::to_string(&self.to_value()).unwrap_or_default()
    }

    /// Length of [`to_json`](Self::to_json) in chars.
    pub fn json_len(&self) -> usize {
        self.to_json().chars().count()
    }
}

impl From<Value> for TravelNode {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => TravelNode::Scalar(Scalar::Null),
            Value::Bool(b) => TravelNode::Scalar(Scalar::Bool(b)),
            Value::Number(n) => TravelNode::Scalar(Scalar::Number(n)),
            Value::String(s) => TravelNode::Scalar(Scalar::String(s)),
            Value::Array(a) => TravelNode::Array(a.into_iter().map(TravelNode::from).collect()),
            Value::Object(m) => {
                TravelNode::Object(m.into_iter().map(|(k, v)| (k, TravelNode::from(v))).collect())
            }
        }
    }
}

/// The travel data the index is built from, with a content fingerprint.
#[derive(Clone, Debug)]
pub struct SourceDocument {
    pub root: TravelNode,
    /// Label stored with each record (usually the file name).
    pub source: String,
    /// blake3 hex of the canonical JSON.
    pub fingerprint: String,
}

impl SourceDocument {
    /// Loads and parses a JSON file.
    ///
    /// # Errors
    /// [`RagError::Io`] if the file cannot be read, [`RagError::Parse`] if it is not JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RagError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading source document");
        let raw = std::fs::read_to_string(path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let doc = Self::from_json_str(&raw, source)?;
        info!(path = %path.display(), fingerprint = %doc.fingerprint, "source document loaded");
        Ok(doc)
    }

    /// Parses a JSON string.
    pub fn from_json_str(raw: &str, source: impl Into<String>) -> Result<Self, RagError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::new(TravelNode::from(value), source))
    }

    pub fn new(root: TravelNode, source: impl Into<String>) -> Self {
        let fingerprint = blake3::hash(root.to_json().as_bytes()).to_hex().to_string();
        Self {
            root,
            source: source.into(),
            fingerprint,
        }
    }
}
