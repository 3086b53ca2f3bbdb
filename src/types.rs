//! Identity and payload types shared by live, referenced, and detached forms.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Opaque element identifier.
///
/// The same id is carried by the live, referenced, and detached forms of an element.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    /// Numeric identifier.
    Int(i64),
    /// String identifier.
    Str(String),
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Int(v) => write!(f, "{v}"),
            ElementId::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ElementId {
    fn from(value: i64) -> Self {
        ElementId::Int(value)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        ElementId::Str(value.to_string())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        ElementId::Str(value)
    }
}

/// Which kind of graph element an identity refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A vertex.
    Vertex,
    /// An edge.
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => f.write_str("vertex"),
            ElementKind::Edge => f.write_str("edge"),
        }
    }
}

/// Representation tier of an element or property.
///
/// Dispatch on the tier goes through this tag rather than on concrete types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Form {
    /// Backed by an active graph; fully mutable.
    Live,
    /// Identity only, no payload.
    Referenced,
    /// Identity plus a payload copy.
    Detached,
}

impl Form {
    /// Returns true for the live tier.
    pub fn is_live(self) -> bool {
        matches!(self, Form::Live)
    }

    /// Whether instances of this tier can be resolved back to live state.
    pub fn is_attachable(self) -> bool {
        matches!(self, Form::Detached)
    }
}

/// Property payload.
///
/// `Null` exists so that payloads decoded from the wire can be represented, but a
/// property never carries it: construction rejects a null value.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float. Compared and hashed by bit pattern.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Binary payload.
    Bytes(Vec<u8>),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Nested key/value structure.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::String(_) => 4,
            Value::Bytes(_) => 5,
            Value::List(_) => 6,
            Value::Map(_) => 7,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.discriminant());
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
            Value::List(v) => v.hash(state),
            Value::Map(v) => v.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.partial_cmp(b),
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "bytes(len={})", v.len()),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (idx, (k, v)) in entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

/// Identity snapshot copied by value from an element.
///
/// Label and kind never change after construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementReference {
    id: ElementId,
    label: String,
    kind: ElementKind,
}

impl ElementReference {
    /// Creates a reference from its parts.
    pub fn new(id: impl Into<ElementId>, label: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }

    /// The element id.
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// The element label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Vertex or edge.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }
}

/// Reversible encoding that marks a property key as system-internal.
pub mod keys {
    /// Prefix prepended to hidden keys in their stored form.
    pub const HIDDEN_PREFIX: &str = "~";

    /// Encodes `key` as hidden. Already hidden keys are returned unchanged.
    pub fn hide(key: &str) -> String {
        if is_hidden(key) {
            key.to_string()
        } else {
            format!("{HIDDEN_PREFIX}{key}")
        }
    }

    /// Decodes a stored key to its user-visible name.
    pub fn unhide(key: &str) -> &str {
        key.strip_prefix(HIDDEN_PREFIX).unwrap_or(key)
    }

    /// Tests the stored form of a key.
    pub fn is_hidden(key: &str) -> bool {
        key.starts_with(HIDDEN_PREFIX)
    }

    /// Produces the stored form for a visible name and hidden flag.
    pub fn stored(key: &str, hidden: bool) -> String {
        if hidden {
            hide(key)
        } else {
            key.to_string()
        }
    }
}
