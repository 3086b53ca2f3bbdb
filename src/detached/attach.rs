use tracing::{debug, trace};

use crate::error::{Result, TetherError};
use crate::structure::{strings, Element, Graph, Property, Vertex};
use crate::types::{ElementId, ElementKind};

use super::{DetachedElement, DetachedProperty};

/// Resolution of a detached snapshot back to authoritative live state.
///
/// Both scopes return whatever the live graph holds now, never the snapshot.
/// When the target is absent in the searched scope the call fails with
/// [`TetherError::NotFound`]. Nothing is ever created.
pub trait Attachable {
    /// Live counterpart type.
    type Live;

    /// Resolves within one vertex's own properties and outgoing edges.
    fn attach_to_vertex(&self, host: &dyn Vertex) -> Result<Self::Live>;

    /// Resolves by id against an entire graph.
    fn attach_to_graph(&self, host: &dyn Graph) -> Result<Self::Live>;
}

/// Live element produced by reattaching a [`DetachedElement`].
#[derive(Debug)]
pub enum LiveElement {
    /// A live vertex.
    Vertex(Box<dyn Vertex>),
    /// A live edge.
    Edge(Box<dyn Element>),
}

impl LiveElement {
    /// The element regardless of kind.
    pub fn as_element(&self) -> &dyn Element {
        match self {
            LiveElement::Vertex(vertex) => vertex.as_element(),
            LiveElement::Edge(edge) => edge.as_ref(),
        }
    }

    /// The vertex, if this is one.
    pub fn into_vertex(self) -> Option<Box<dyn Vertex>> {
        match self {
            LiveElement::Vertex(vertex) => Some(vertex),
            LiveElement::Edge(_) => None,
        }
    }
}

fn find_out_edge(
    host: &dyn Vertex,
    label: &str,
    id: &ElementId,
) -> Result<Option<Box<dyn Element>>> {
    trace!(host = %host.id(), label, %id, "scanning outgoing edges");
    Ok(host
        .out_edges(label)?
        .into_iter()
        .find(|edge| &edge.id() == id))
}

impl Attachable for DetachedProperty {
    type Live = Box<dyn Property>;

    fn attach_to_vertex(&self, host: &dyn Vertex) -> Result<Self::Live> {
        debug!(property = %self, host = %host.id(), "attaching property to vertex");
        match self.owner_kind() {
            ElementKind::Vertex => host.property(self.raw_key())?.ok_or_else(|| {
                TetherError::not_found(format!(
                    "the detached property could not be found at the provided vertex: {self}"
                ))
            }),
            ElementKind::Edge => {
                let owner = self.owner();
                let edge = find_out_edge(host, owner.label(), owner.id())?
                    .ok_or_else(|| {
                        TetherError::not_found(format!(
                            "the detached property could not be found at the provided \
                             vertex's edges: {self}"
                        ))
                    })?;
                edge.property(self.raw_key())?.ok_or_else(|| {
                    TetherError::not_found(format!(
                        "the detached property could not be found at {}: {self}",
                        strings::element_string(edge.as_ref())
                    ))
                })
            }
        }
    }

    fn attach_to_graph(&self, host: &dyn Graph) -> Result<Self::Live> {
        debug!(property = %self, "attaching property to graph");
        let id = self.owner().id();
        let found = match self.owner_kind() {
            ElementKind::Vertex => match host.vertex(id)? {
                Some(vertex) => vertex.property(self.raw_key())?,
                None => None,
            },
            ElementKind::Edge => match host.edge(id)? {
                Some(edge) => edge.property(self.raw_key())?,
                None => None,
            },
        };
        found.ok_or_else(|| {
            TetherError::not_found(format!(
                "the detached property could not be found in the provided graph: {self}"
            ))
        })
    }
}

impl Attachable for DetachedElement {
    type Live = LiveElement;

    fn attach_to_vertex(&self, host: &dyn Vertex) -> Result<Self::Live> {
        debug!(element = %self, host = %host.id(), "attaching element to vertex");
        let reference = self.reference();
        match reference.kind() {
            ElementKind::Vertex if &host.id() == reference.id() => {
                Ok(LiveElement::Vertex(host.clone_vertex()))
            }
            ElementKind::Vertex => Err(TetherError::not_found(format!(
                "the detached vertex is not the provided vertex {}: {self}",
                strings::element_string(host.as_element())
            ))),
            ElementKind::Edge => find_out_edge(host, reference.label(), reference.id())?
                .map(LiveElement::Edge)
                .ok_or_else(|| {
                    TetherError::not_found(format!(
                        "the detached edge could not be found at the provided \
                         vertex's edges: {self}"
                    ))
                }),
        }
    }

    fn attach_to_graph(&self, host: &dyn Graph) -> Result<Self::Live> {
        debug!(element = %self, "attaching element to graph");
        let reference = self.reference();
        let found = match reference.kind() {
            ElementKind::Vertex => host.vertex(reference.id())?.map(LiveElement::Vertex),
            ElementKind::Edge => host.edge(reference.id())?.map(LiveElement::Edge),
        };
        found.ok_or_else(|| {
            TetherError::not_found(format!(
                "the detached element could not be found in the provided graph: {self}"
            ))
        })
    }
}
