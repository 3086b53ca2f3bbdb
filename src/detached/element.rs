use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TetherError};
use crate::structure::{strings, Element, Property};
use crate::types::{keys, ElementId, ElementKind, ElementReference, Form, Value};

use super::DetachedProperty;

#[derive(Debug, Serialize, Deserialize)]
struct DetachedInner {
    #[serde(flatten)]
    reference: ElementReference,
    properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endpoints: Option<(ElementReference, ElementReference)>,
}

/// Identity plus a full property snapshot of a vertex or edge.
///
/// Clones share the same snapshot; [`DetachedElement::same_instance`] tells whether
/// two handles point at one snapshot. Properties are exclusively owned by the
/// element and handed out as [`DetachedProperty`] values pointing back at it.
#[derive(Clone, Debug)]
pub struct DetachedElement {
    inner: Arc<DetachedInner>,
}

impl DetachedElement {
    /// Builds a detached element from explicit parts.
    ///
    /// Keys must be non-empty and values non-null. Endpoints are only accepted for
    /// edges.
    pub fn new(
        reference: ElementReference,
        properties: BTreeMap<String, Value>,
        endpoints: Option<(ElementReference, ElementReference)>,
    ) -> Result<Self> {
        for (key, value) in &properties {
            if keys::unhide(key).is_empty() {
                return Err(TetherError::argument_can_not_be_null("key"));
            }
            if value.is_null() {
                return Err(TetherError::argument_can_not_be_null("value"));
            }
        }
        if endpoints.is_some() && reference.kind() != ElementKind::Edge {
            return Err(TetherError::InvalidArgument(format!(
                "only edges have endpoints: {}",
                strings::reference_string(&reference, None)
            )));
        }
        Ok(Self {
            inner: Arc::new(DetachedInner {
                reference,
                properties,
                endpoints,
            }),
        })
    }

    /// Detaches a live element.
    ///
    /// Fails with an invalid-argument error when `element` is already referenced or
    /// detached.
    pub fn detach(element: &dyn Element) -> Result<Self> {
        match element.form() {
            Form::Live => Self::snapshot(element),
            Form::Referenced | Form::Detached => Err(TetherError::InvalidArgument(format!(
                "element is already detached: {}",
                strings::element_string(element)
            ))),
        }
    }

    /// Copies identity and properties from a live element.
    pub(crate) fn snapshot(element: &dyn Element) -> Result<Self> {
        let mut properties = BTreeMap::new();
        for property in element.properties()? {
            properties.insert(property.stored_key(), property.value());
        }
        Self::new(element.reference(), properties, element.endpoints())
    }

    /// The element identity.
    pub fn reference(&self) -> &ElementReference {
        &self.inner.reference
    }

    /// Edge endpoints, when known.
    pub fn edge_endpoints(&self) -> Option<&(ElementReference, ElementReference)> {
        self.inner.endpoints.as_ref()
    }

    /// Property by stored key.
    pub fn detached_property(&self, key: &str) -> Option<DetachedProperty> {
        self.inner
            .properties
            .get_key_value(key)
            .map(|(key, value)| DetachedProperty::owned_by(key.clone(), value.clone(), self))
    }

    /// All properties, ordered by stored key.
    pub fn detached_properties(&self) -> Vec<DetachedProperty> {
        self.inner
            .properties
            .iter()
            .map(|(key, value)| DetachedProperty::owned_by(key.clone(), value.clone(), self))
            .collect()
    }

    /// Number of properties in the snapshot.
    pub fn property_count(&self) -> usize {
        self.inner.properties.len()
    }

    /// True when both handles share one snapshot.
    pub fn same_instance(&self, other: &DetachedElement) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read_only(&self) -> TetherError {
        TetherError::unsupported(format!("detached elements are readonly: {self}"))
    }
}

impl PartialEq for DetachedElement {
    fn eq(&self, other: &Self) -> bool {
        self.reference().id() == other.reference().id()
            && self.reference().kind() == other.reference().kind()
    }
}

impl Eq for DetachedElement {}

impl Serialize for DetachedElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.inner.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DetachedElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let inner = DetachedInner::deserialize(deserializer)?;
        DetachedElement::new(inner.reference, inner.properties, inner.endpoints)
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for DetachedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&strings::reference_string(
            self.reference(),
            self.edge_endpoints(),
        ))
    }
}

impl Element for DetachedElement {
    fn id(&self) -> ElementId {
        self.reference().id().clone()
    }

    fn label(&self) -> String {
        self.reference().label().to_string()
    }

    fn kind(&self) -> ElementKind {
        self.reference().kind()
    }

    fn form(&self) -> Form {
        Form::Detached
    }

    fn property(&self, key: &str) -> Result<Option<Box<dyn Property>>> {
        Ok(self
            .detached_property(key)
            .map(|p| Box::new(p) as Box<dyn Property>))
    }

    fn properties(&self) -> Result<Vec<Box<dyn Property>>> {
        Ok(self
            .detached_properties()
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn Property>)
            .collect())
    }

    fn set_property(&self, _key: &str, _value: Value) -> Result<Box<dyn Property>> {
        Err(self.read_only())
    }

    fn remove(&self) -> Result<()> {
        Err(self.read_only())
    }

    fn endpoints(&self) -> Option<(ElementReference, ElementReference)> {
        self.inner.endpoints.clone()
    }

    fn reference(&self) -> ElementReference {
        self.inner.reference.clone()
    }
}
