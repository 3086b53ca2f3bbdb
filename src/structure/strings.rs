//! Canonical diagnostic strings for elements and properties.

use crate::types::{ElementKind, ElementReference, Value};

use super::{Element, Property};

const MAX_VALUE_CHARS: usize = 20;

/// `v[id]`
pub fn vertex_string(reference: &ElementReference) -> String {
    format!("v[{}]", reference.id())
}

/// `e[id][out-label->in]`, or `e[id][label]` when endpoints are unknown.
pub fn edge_string(
    reference: &ElementReference,
    endpoints: Option<&(ElementReference, ElementReference)>,
) -> String {
    match endpoints {
        Some((out_v, in_v)) => format!(
            "e[{}][{}-{}->{}]",
            reference.id(),
            out_v.id(),
            reference.label(),
            in_v.id()
        ),
        None => format!("e[{}][{}]", reference.id(), reference.label()),
    }
}

/// Dispatches on the reference kind.
pub fn reference_string(
    reference: &ElementReference,
    endpoints: Option<&(ElementReference, ElementReference)>,
) -> String {
    match reference.kind() {
        ElementKind::Vertex => vertex_string(reference),
        ElementKind::Edge => edge_string(reference, endpoints),
    }
}

/// Canonical string of any element.
pub fn element_string(element: &dyn Element) -> String {
    reference_string(&element.reference(), element.endpoints().as_ref())
}

/// `p[key->value]` with the value truncated.
pub fn property_string(key: &str, value: &Value) -> String {
    let rendered = value.to_string();
    let shown: String = rendered.chars().take(MAX_VALUE_CHARS).collect();
    format!("p[{key}->{shown}]")
}

/// Canonical string of any property, or `p[empty]` for an absent one.
pub fn live_property_string(property: &dyn Property) -> String {
    if property.is_present() {
        property_string(&property.key(), &property.value())
    } else {
        "p[empty]".to_string()
    }
}
