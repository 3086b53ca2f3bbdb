use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TetherError};
use crate::structure::{strings, Element, Property};
use crate::types::{ElementId, ElementKind, ElementReference, Form, Value};

/// Identity-only stand-in for an element.
///
/// Used where only "which element" matters, e.g. when tracking vertices across
/// machine boundaries. Every property access and mutation fails, and there is no
/// reattachment at this tier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferencedElement {
    reference: ElementReference,
}

impl ReferencedElement {
    /// Copies id, label, and kind from `element`.
    pub fn of(element: &dyn Element) -> Self {
        Self {
            reference: element.reference(),
        }
    }

    /// The wrapped identity.
    pub fn reference(&self) -> &ElementReference {
        &self.reference
    }
}

impl From<ElementReference> for ReferencedElement {
    fn from(reference: ElementReference) -> Self {
        Self { reference }
    }
}

impl fmt::Display for ReferencedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&strings::reference_string(&self.reference, None))
    }
}

impl Element for ReferencedElement {
    fn id(&self) -> ElementId {
        self.reference.id().clone()
    }

    fn label(&self) -> String {
        self.reference.label().to_string()
    }

    fn kind(&self) -> ElementKind {
        self.reference.kind()
    }

    fn form(&self) -> Form {
        Form::Referenced
    }

    fn property(&self, _key: &str) -> Result<Option<Box<dyn Property>>> {
        Err(TetherError::unsupported(format!(
            "referenced elements do not have properties: {self}"
        )))
    }

    fn properties(&self) -> Result<Vec<Box<dyn Property>>> {
        Err(TetherError::unsupported(format!(
            "referenced elements do not have properties: {self}"
        )))
    }

    fn set_property(&self, _key: &str, _value: Value) -> Result<Box<dyn Property>> {
        Err(TetherError::unsupported(format!(
            "referenced elements do not have properties: {self}"
        )))
    }

    fn remove(&self) -> Result<()> {
        Err(TetherError::unsupported(format!(
            "referenced elements can not be removed: {self}"
        )))
    }

    fn reference(&self) -> ElementReference {
        self.reference.clone()
    }
}
