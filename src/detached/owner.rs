use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::structure::Owner;
use crate::types::{ElementId, ElementKind, ElementReference, Form};

use super::{DetachedElement, ReferencedElement};

/// Non-owning back-reference from a detached property to its element.
///
/// On the wire only the owner's identity travels; a deserialized owner is always
/// referenced.
#[derive(Clone, Debug)]
pub enum OwnerRef {
    /// Identity-only owner.
    Referenced(ReferencedElement),
    /// Owner with its own payload snapshot.
    Detached(DetachedElement),
}

impl OwnerRef {
    /// Converts any owner to its non-live form.
    ///
    /// Live owners are detached; referenced and detached owners are reused as is,
    /// so applying this to an already non-live owner is a no-op.
    pub fn normalize(owner: Owner) -> Result<Self> {
        match owner {
            Owner::Live(element) => Ok(OwnerRef::Detached(DetachedElement::snapshot(
                element.as_ref(),
            )?)),
            Owner::Referenced(element) => Ok(OwnerRef::Referenced(element)),
            Owner::Detached(element) => Ok(OwnerRef::Detached(element)),
        }
    }

    /// Identity of the owner.
    pub fn reference(&self) -> &ElementReference {
        match self {
            OwnerRef::Referenced(element) => element.reference(),
            OwnerRef::Detached(element) => element.reference(),
        }
    }

    /// Owner id.
    pub fn id(&self) -> &ElementId {
        self.reference().id()
    }

    /// Owner label.
    pub fn label(&self) -> &str {
        self.reference().label()
    }

    /// Owner kind.
    pub fn kind(&self) -> ElementKind {
        self.reference().kind()
    }

    /// Representation tier of the owner.
    pub fn form(&self) -> Form {
        match self {
            OwnerRef::Referenced(_) => Form::Referenced,
            OwnerRef::Detached(_) => Form::Detached,
        }
    }

    pub(crate) fn to_owner(&self) -> Owner {
        match self {
            OwnerRef::Referenced(element) => Owner::Referenced(element.clone()),
            OwnerRef::Detached(element) => Owner::Detached(element.clone()),
        }
    }

    pub(crate) fn display(&self) -> String {
        match self {
            OwnerRef::Referenced(element) => element.to_string(),
            OwnerRef::Detached(element) => element.to_string(),
        }
    }
}

impl From<ReferencedElement> for OwnerRef {
    fn from(element: ReferencedElement) -> Self {
        OwnerRef::Referenced(element)
    }
}

impl From<DetachedElement> for OwnerRef {
    fn from(element: DetachedElement) -> Self {
        OwnerRef::Detached(element)
    }
}

impl From<ElementReference> for OwnerRef {
    fn from(reference: ElementReference) -> Self {
        OwnerRef::Referenced(reference.into())
    }
}

impl Serialize for OwnerRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.reference().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OwnerRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        ElementReference::deserialize(deserializer).map(OwnerRef::from)
    }
}
