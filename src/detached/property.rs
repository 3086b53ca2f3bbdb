use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TetherError};
use crate::structure::{properties_equal, strings, Owner, Property, PropertyIdentity};
use crate::types::{keys, ElementKind, Form, Value};

use super::{DetachedElement, OwnerRef};

/// Read-only snapshot of a property: stored key, payload, and owner identity.
///
/// Equality and hashing follow the (owner, key, value) triple, so a detached
/// property equals the live property it was taken from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "PropertyFields")]
pub struct DetachedProperty {
    key: String,
    value: Value,
    owner: OwnerRef,
}

#[derive(Deserialize)]
struct PropertyFields {
    key: String,
    value: Value,
    owner: OwnerRef,
}

impl TryFrom<PropertyFields> for DetachedProperty {
    type Error = TetherError;

    fn try_from(fields: PropertyFields) -> Result<Self> {
        DetachedProperty::new(fields.key, fields.value, fields.owner)
    }
}

impl DetachedProperty {
    /// Builds a detached property from explicit parts.
    ///
    /// `key` is the stored form; pass it through [`keys::hide`] to mark it hidden.
    /// An empty key or a null value is rejected and nothing is constructed.
    pub fn new(key: impl Into<String>, value: Value, owner: impl Into<OwnerRef>) -> Result<Self> {
        let key = key.into();
        if keys::unhide(&key).is_empty() {
            return Err(TetherError::argument_can_not_be_null("key"));
        }
        if value.is_null() {
            return Err(TetherError::argument_can_not_be_null("value"));
        }
        Ok(Self {
            key,
            value,
            owner: owner.into(),
        })
    }

    /// Detaches a live property.
    ///
    /// Rejects absent properties and properties that are already referenced or
    /// detached. The owner is converted with [`OwnerRef::normalize`], which reuses
    /// owners that are already non-live.
    pub fn detach(property: &dyn Property) -> Result<Self> {
        if !property.is_present() {
            return Err(TetherError::argument_can_not_be_null("property"));
        }
        if !property.form().is_live() {
            return Err(TetherError::InvalidArgument(format!(
                "property is already detached: {}",
                strings::live_property_string(property)
            )));
        }
        let owner = OwnerRef::normalize(property.element())?;
        Self::new(property.stored_key(), property.value(), owner)
    }

    /// Property handed out by a detached element. Inputs were validated when the
    /// element was built.
    pub(crate) fn owned_by(key: String, value: Value, owner: &DetachedElement) -> Self {
        Self {
            key,
            value,
            owner: OwnerRef::Detached(owner.clone()),
        }
    }

    /// The owning element.
    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    pub(crate) fn raw_key(&self) -> &str {
        &self.key
    }

    pub(crate) fn owner_kind(&self) -> ElementKind {
        self.owner.kind()
    }

    fn local_identity(&self) -> PropertyIdentity {
        PropertyIdentity {
            owner_kind: self.owner.kind(),
            owner: self.owner.id().clone(),
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

impl Property for DetachedProperty {
    fn key(&self) -> String {
        keys::unhide(&self.key).to_string()
    }

    fn is_hidden(&self) -> bool {
        keys::is_hidden(&self.key)
    }

    fn value(&self) -> Value {
        self.value.clone()
    }

    fn element(&self) -> Owner {
        self.owner.to_owner()
    }

    fn remove(&self) -> Result<()> {
        Err(TetherError::unsupported(format!(
            "detached properties are readonly: {self}"
        )))
    }

    fn form(&self) -> Form {
        Form::Detached
    }

    fn stored_key(&self) -> String {
        self.key.clone()
    }

    fn identity(&self) -> PropertyIdentity {
        self.local_identity()
    }
}

impl PartialEq for DetachedProperty {
    fn eq(&self, other: &Self) -> bool {
        self.local_identity() == other.local_identity()
    }
}

impl Eq for DetachedProperty {}

impl PartialEq<dyn Property + '_> for DetachedProperty {
    fn eq(&self, other: &(dyn Property + '_)) -> bool {
        properties_equal(self, other)
    }
}

impl Hash for DetachedProperty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local_identity().hash(state);
    }
}

impl fmt::Display for DetachedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {}",
            strings::property_string(keys::unhide(&self.key), &self.value),
            self.owner.display()
        )
    }
}
