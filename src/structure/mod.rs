//! Live graph object model consumed by detachment and reattachment.
//!
//! Only id/label accessors, property-by-key lookup, outgoing-edge adjacency, and
//! id-based lookup on a target graph are required from a graph engine. Everything
//! here is object safe so heterogeneous engines can sit behind `dyn` handles.

pub mod mem;
pub mod strings;

use std::fmt;

use crate::detached::{DetachedElement, ReferencedElement};
use crate::error::Result;
use crate::types::{keys, ElementId, ElementKind, ElementReference, Form, Value};

/// A vertex or an edge.
pub trait Element: fmt::Debug + Send + Sync {
    /// Element id.
    fn id(&self) -> ElementId;

    /// Element label.
    fn label(&self) -> String;

    /// Vertex or edge.
    fn kind(&self) -> ElementKind;

    /// Representation tier. Graph engines only produce live elements.
    fn form(&self) -> Form {
        Form::Live
    }

    /// Looks up a property by its stored key (hidden keys keep their prefix).
    fn property(&self, key: &str) -> Result<Option<Box<dyn Property>>>;

    /// All properties currently set on the element.
    fn properties(&self) -> Result<Vec<Box<dyn Property>>>;

    /// Writes a property, returning the new live property.
    fn set_property(&self, key: &str, value: Value) -> Result<Box<dyn Property>>;

    /// Removes the element from its graph.
    fn remove(&self) -> Result<()>;

    /// Outgoing and incoming vertex identities for edges.
    fn endpoints(&self) -> Option<(ElementReference, ElementReference)> {
        None
    }

    /// Identity snapshot of this element.
    fn reference(&self) -> ElementReference {
        ElementReference::new(self.id(), self.label(), self.kind())
    }
}

/// A vertex, which additionally exposes its outgoing adjacency.
pub trait Vertex: Element {
    /// Outgoing edges carrying `label`.
    fn out_edges(&self, label: &str) -> Result<Vec<Box<dyn Element>>>;

    /// Views the vertex as a plain element.
    fn as_element(&self) -> &dyn Element;

    /// Clones the handle into a new box.
    fn clone_vertex(&self) -> Box<dyn Vertex>;
}

/// A target graph that resolves elements by id.
pub trait Graph {
    /// Looks up a vertex by id.
    fn vertex(&self, id: &ElementId) -> Result<Option<Box<dyn Vertex>>>;

    /// Looks up an edge by id.
    fn edge(&self, id: &ElementId) -> Result<Option<Box<dyn Element>>>;
}

/// Owner of a property, tagged by representation tier.
#[derive(Debug)]
pub enum Owner {
    /// Owned by a live element.
    Live(Box<dyn Element>),
    /// Owned by an identity-only stand-in.
    Referenced(ReferencedElement),
    /// Owned by a detached snapshot.
    Detached(DetachedElement),
}

impl Owner {
    /// Identity of the owning element.
    pub fn reference(&self) -> ElementReference {
        match self {
            Owner::Live(element) => element.reference(),
            Owner::Referenced(element) => element.reference().clone(),
            Owner::Detached(element) => element.reference().clone(),
        }
    }

    /// Representation tier of the owner.
    pub fn form(&self) -> Form {
        match self {
            Owner::Live(_) => Form::Live,
            Owner::Referenced(_) => Form::Referenced,
            Owner::Detached(_) => Form::Detached,
        }
    }
}

/// A key/value pair attached to an element.
pub trait Property: fmt::Debug + Send + Sync {
    /// User-visible key. Never exposes the hidden encoding.
    fn key(&self) -> String;

    /// Whether the key is system-internal.
    fn is_hidden(&self) -> bool;

    /// Property payload.
    fn value(&self) -> Value;

    /// Whether the property exists. Absent properties only come from live lookups.
    fn is_present(&self) -> bool {
        true
    }

    /// The owning element.
    fn element(&self) -> Owner;

    /// Removes the property from its element.
    fn remove(&self) -> Result<()>;

    /// Representation tier. Graph engines only produce live properties.
    fn form(&self) -> Form {
        Form::Live
    }

    /// Key in its stored form (hidden keys carry the prefix).
    fn stored_key(&self) -> String {
        keys::stored(&self.key(), self.is_hidden())
    }

    /// Logical identity of the property: owner, stored key, and value.
    fn identity(&self) -> PropertyIdentity {
        let owner = self.element().reference();
        PropertyIdentity {
            owner_kind: owner.kind(),
            owner: owner.id().clone(),
            key: self.stored_key(),
            value: self.value(),
        }
    }
}

/// The (owner, key, value) triple that defines property equality.
///
/// Live and detached properties denoting the same logical property produce equal
/// identities, so this is the key to use in hashed containers mixing both.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyIdentity {
    /// Kind of the owning element.
    pub owner_kind: ElementKind,
    /// Id of the owning element.
    pub owner: ElementId,
    /// Stored key.
    pub key: String,
    /// Payload.
    pub value: Value,
}

/// Compares two properties by logical identity regardless of their tier.
pub fn properties_equal(a: &dyn Property, b: &dyn Property) -> bool {
    a.is_present() && b.is_present() && a.identity() == b.identity()
}
