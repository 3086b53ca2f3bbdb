//! In-memory live graph.
//!
//! Handles are cheap clones over shared state, so a property or element fetched
//! from the graph always reads through to the current state on the next lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{Result, TetherError};
use crate::types::{ElementId, ElementKind, ElementReference, Value};

use super::{strings, Element, Graph, Owner, Property, Vertex};

#[derive(Debug, Default)]
struct GraphState {
    next_id: i64,
    vertices: BTreeMap<ElementId, VertexRecord>,
    edges: BTreeMap<ElementId, EdgeRecord>,
}

#[derive(Debug)]
struct VertexRecord {
    label: String,
    props: BTreeMap<String, Value>,
}

#[derive(Debug)]
struct EdgeRecord {
    label: String,
    out_v: ElementReference,
    in_v: ElementReference,
    props: BTreeMap<String, Value>,
}

impl GraphState {
    fn allocate_id(&mut self) -> ElementId {
        self.next_id += 1;
        ElementId::Int(self.next_id)
    }

    fn props(&self, owner: &ElementReference) -> Option<&BTreeMap<String, Value>> {
        match owner.kind() {
            ElementKind::Vertex => self.vertices.get(owner.id()).map(|v| &v.props),
            ElementKind::Edge => self.edges.get(owner.id()).map(|e| &e.props),
        }
    }

    fn props_mut(&mut self, owner: &ElementReference) -> Option<&mut BTreeMap<String, Value>> {
        match owner.kind() {
            ElementKind::Vertex => self.vertices.get_mut(owner.id()).map(|v| &mut v.props),
            ElementKind::Edge => self.edges.get_mut(owner.id()).map(|e| &mut e.props),
        }
    }
}

/// Shared in-memory graph.
#[derive(Clone, Debug, Default)]
pub struct MemGraph {
    state: Arc<RwLock<GraphState>>,
}

fn collect_props<K, I>(props: I) -> BTreeMap<String, Value>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    props
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.into(), v))
        .collect()
}

impl MemGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex with a generated id. Null values are skipped.
    pub fn add_vertex<K, I>(&self, label: &str, props: I) -> MemVertex
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut state = self.state.write();
        let id = state.allocate_id();
        state.vertices.insert(
            id.clone(),
            VertexRecord {
                label: label.to_string(),
                props: collect_props(props),
            },
        );
        trace!(%id, label, "vertex added");
        MemVertex {
            graph: self.clone(),
            reference: ElementReference::new(id, label, ElementKind::Vertex),
        }
    }

    /// Adds an edge from `out_v` to `in_v`.
    pub fn add_edge<K, I>(
        &self,
        out_v: &MemVertex,
        label: &str,
        in_v: &MemVertex,
        props: I,
    ) -> Result<MemEdge>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut state = self.state.write();
        for endpoint in [&out_v.reference, &in_v.reference] {
            if !state.vertices.contains_key(endpoint.id()) {
                return Err(TetherError::not_found(format!(
                    "edge endpoint {} does not exist",
                    strings::vertex_string(endpoint)
                )));
            }
        }
        let id = state.allocate_id();
        state.edges.insert(
            id.clone(),
            EdgeRecord {
                label: label.to_string(),
                out_v: out_v.reference.clone(),
                in_v: in_v.reference.clone(),
                props: collect_props(props),
            },
        );
        trace!(%id, label, "edge added");
        Ok(MemEdge {
            graph: self.clone(),
            reference: ElementReference::new(id, label, ElementKind::Edge),
        })
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.state.read().vertices.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.state.read().edges.len()
    }

    fn lookup_property(
        &self,
        owner: &ElementReference,
        key: &str,
    ) -> Result<Option<Box<dyn Property>>> {
        let state = self.state.read();
        let props = state.props(owner).ok_or_else(|| {
            TetherError::not_found(format!(
                "{} no longer exists",
                strings::reference_string(owner, None)
            ))
        })?;
        Ok(props.get(key).map(|value| {
            Box::new(MemProperty {
                graph: self.clone(),
                owner: owner.clone(),
                key: key.to_string(),
                value: value.clone(),
            }) as Box<dyn Property>
        }))
    }

    fn all_properties(&self, owner: &ElementReference) -> Result<Vec<Box<dyn Property>>> {
        let state = self.state.read();
        let props = state.props(owner).ok_or_else(|| {
            TetherError::not_found(format!(
                "{} no longer exists",
                strings::reference_string(owner, None)
            ))
        })?;
        Ok(props
            .iter()
            .map(|(key, value)| {
                Box::new(MemProperty {
                    graph: self.clone(),
                    owner: owner.clone(),
                    key: key.clone(),
                    value: value.clone(),
                }) as Box<dyn Property>
            })
            .collect())
    }

    fn write_property(
        &self,
        owner: &ElementReference,
        key: &str,
        value: Value,
    ) -> Result<Box<dyn Property>> {
        if key.is_empty() {
            return Err(TetherError::argument_can_not_be_null("key"));
        }
        if value.is_null() {
            return Err(TetherError::argument_can_not_be_null("value"));
        }
        let mut state = self.state.write();
        let props = state.props_mut(owner).ok_or_else(|| {
            TetherError::not_found(format!(
                "{} no longer exists",
                strings::reference_string(owner, None)
            ))
        })?;
        props.insert(key.to_string(), value.clone());
        Ok(Box::new(MemProperty {
            graph: self.clone(),
            owner: owner.clone(),
            key: key.to_string(),
            value,
        }))
    }

    fn owner_handle(&self, owner: &ElementReference) -> Box<dyn Element> {
        match owner.kind() {
            ElementKind::Vertex => Box::new(MemVertex {
                graph: self.clone(),
                reference: owner.clone(),
            }),
            ElementKind::Edge => Box::new(MemEdge {
                graph: self.clone(),
                reference: owner.clone(),
            }),
        }
    }
}

impl Graph for MemGraph {
    fn vertex(&self, id: &ElementId) -> Result<Option<Box<dyn Vertex>>> {
        let state = self.state.read();
        Ok(state.vertices.get(id).map(|record| {
            Box::new(MemVertex {
                graph: self.clone(),
                reference: ElementReference::new(id.clone(), &record.label, ElementKind::Vertex),
            }) as Box<dyn Vertex>
        }))
    }

    fn edge(&self, id: &ElementId) -> Result<Option<Box<dyn Element>>> {
        let state = self.state.read();
        Ok(state.edges.get(id).map(|record| {
            Box::new(MemEdge {
                graph: self.clone(),
                reference: ElementReference::new(id.clone(), &record.label, ElementKind::Edge),
            }) as Box<dyn Element>
        }))
    }
}

/// Live vertex handle.
#[derive(Clone, Debug)]
pub struct MemVertex {
    graph: MemGraph,
    reference: ElementReference,
}

impl Element for MemVertex {
    fn id(&self) -> ElementId {
        self.reference.id().clone()
    }

    fn label(&self) -> String {
        self.reference.label().to_string()
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Vertex
    }

    fn property(&self, key: &str) -> Result<Option<Box<dyn Property>>> {
        self.graph.lookup_property(&self.reference, key)
    }

    fn properties(&self) -> Result<Vec<Box<dyn Property>>> {
        self.graph.all_properties(&self.reference)
    }

    fn set_property(&self, key: &str, value: Value) -> Result<Box<dyn Property>> {
        self.graph.write_property(&self.reference, key, value)
    }

    fn remove(&self) -> Result<()> {
        let mut state = self.graph.state.write();
        if state.vertices.remove(self.reference.id()).is_none() {
            return Err(TetherError::not_found(strings::vertex_string(
                &self.reference,
            )));
        }
        let id = self.reference.id();
        state
            .edges
            .retain(|_, edge| edge.out_v.id() != id && edge.in_v.id() != id);
        Ok(())
    }

    fn reference(&self) -> ElementReference {
        self.reference.clone()
    }
}

impl Vertex for MemVertex {
    fn out_edges(&self, label: &str) -> Result<Vec<Box<dyn Element>>> {
        let state = self.graph.state.read();
        Ok(state
            .edges
            .iter()
            .filter(|(_, edge)| edge.out_v.id() == self.reference.id() && edge.label == label)
            .map(|(id, edge)| {
                Box::new(MemEdge {
                    graph: self.graph.clone(),
                    reference: ElementReference::new(id.clone(), &edge.label, ElementKind::Edge),
                }) as Box<dyn Element>
            })
            .collect())
    }

    fn as_element(&self) -> &dyn Element {
        self
    }

    fn clone_vertex(&self) -> Box<dyn Vertex> {
        Box::new(self.clone())
    }
}

/// Live edge handle.
#[derive(Clone, Debug)]
pub struct MemEdge {
    graph: MemGraph,
    reference: ElementReference,
}

impl Element for MemEdge {
    fn id(&self) -> ElementId {
        self.reference.id().clone()
    }

    fn label(&self) -> String {
        self.reference.label().to_string()
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn property(&self, key: &str) -> Result<Option<Box<dyn Property>>> {
        self.graph.lookup_property(&self.reference, key)
    }

    fn properties(&self) -> Result<Vec<Box<dyn Property>>> {
        self.graph.all_properties(&self.reference)
    }

    fn set_property(&self, key: &str, value: Value) -> Result<Box<dyn Property>> {
        self.graph.write_property(&self.reference, key, value)
    }

    fn remove(&self) -> Result<()> {
        let mut state = self.graph.state.write();
        state
            .edges
            .remove(self.reference.id())
            .map(|_| ())
            .ok_or_else(|| TetherError::not_found(strings::edge_string(&self.reference, None)))
    }

    fn endpoints(&self) -> Option<(ElementReference, ElementReference)> {
        let state = self.graph.state.read();
        state
            .edges
            .get(self.reference.id())
            .map(|edge| (edge.out_v.clone(), edge.in_v.clone()))
    }

    fn reference(&self) -> ElementReference {
        self.reference.clone()
    }
}

/// Live property handle carrying the value it was read with.
#[derive(Clone, Debug)]
pub struct MemProperty {
    graph: MemGraph,
    owner: ElementReference,
    key: String,
    value: Value,
}

impl Property for MemProperty {
    fn key(&self) -> String {
        crate::types::keys::unhide(&self.key).to_string()
    }

    fn is_hidden(&self) -> bool {
        crate::types::keys::is_hidden(&self.key)
    }

    fn value(&self) -> Value {
        self.value.clone()
    }

    fn element(&self) -> Owner {
        Owner::Live(self.graph.owner_handle(&self.owner))
    }

    fn remove(&self) -> Result<()> {
        let mut state = self.graph.state.write();
        let props = state.props_mut(&self.owner).ok_or_else(|| {
            TetherError::not_found(format!(
                "{} no longer exists",
                strings::reference_string(&self.owner, None)
            ))
        })?;
        props.remove(&self.key);
        Ok(())
    }

    fn stored_key(&self) -> String {
        self.key.clone()
    }
}
