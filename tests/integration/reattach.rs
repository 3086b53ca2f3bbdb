#![allow(missing_docs)]

use std::collections::HashSet;
use std::thread;

use tether::structure::mem::{MemEdge, MemGraph, MemVertex};
use tether::structure::{Element, Property};
use tether::{
    Attachable, DetachedElement, DetachedProperty, ElementKind, Form, OwnerRef, Result, Value,
};

fn people() -> Result<(MemGraph, MemVertex, MemVertex, MemEdge)> {
    let graph = MemGraph::new();
    let alice = graph.add_vertex(
        "person",
        [("name", Value::from("alice")), ("~token", Value::Int(7))],
    );
    let bob = graph.add_vertex("person", [("name", Value::from("bob"))]);
    let knows = graph.add_edge(&alice, "knows", &bob, [("since", Value::Int(2019))])?;
    Ok((graph, alice, bob, knows))
}

#[test]
fn reattach_reflects_live_state_not_snapshot() -> Result<()> {
    let (_graph, alice, _, _) = people()?;
    let live = alice.property("name")?.expect("name");
    let detached = DetachedProperty::detach(live.as_ref())?;

    assert_eq!(
        detached.attach_to_vertex(&alice)?.value(),
        Value::from("alice")
    );

    alice.set_property("name", Value::from("bob"))?;
    assert_eq!(
        detached.attach_to_vertex(&alice)?.value(),
        Value::from("bob")
    );
    assert_eq!(detached.value(), Value::from("alice"));
    Ok(())
}

#[test]
fn detached_property_crosses_threads() -> Result<()> {
    let (graph, alice, _, _) = people()?;
    let detached = DetachedProperty::detach(alice.property("name")?.expect("name").as_ref())?;

    let moved = thread::spawn(move || detached)
        .join()
        .expect("thread panicked");
    let back = moved.attach_to_graph(&graph)?;
    assert_eq!(back.value(), Value::from("alice"));
    Ok(())
}

#[test]
fn serialized_property_reattaches_by_identity() -> Result<()> {
    let (graph, _, _, knows) = people()?;
    let detached = DetachedProperty::detach(knows.property("since")?.expect("since").as_ref())?;

    let json = serde_json::to_string(&detached)?;
    let back: DetachedProperty = serde_json::from_str(&json)?;
    assert_eq!(back, detached);
    assert_eq!(back.owner().form(), Form::Referenced);
    assert_eq!(back.owner().kind(), ElementKind::Edge);
    assert_eq!(back.attach_to_graph(&graph)?.value(), Value::Int(2019));
    Ok(())
}

#[test]
fn hidden_properties_keep_their_marking() -> Result<()> {
    let (graph, alice, _, _) = people()?;
    let element = DetachedElement::detach(&alice)?;
    let token = element.detached_property("~token").expect("token");
    assert_eq!(token.key(), "token");
    assert!(token.is_hidden());
    assert!(element.detached_property("token").is_none());

    let live = token.attach_to_graph(&graph)?;
    assert!(live.is_hidden());
    assert_eq!(live.key(), "token");
    Ok(())
}

#[test]
fn element_properties_point_back_at_the_element() -> Result<()> {
    let (_graph, alice, _, _) = people()?;
    let element = DetachedElement::detach(&alice)?;
    assert_eq!(element.property_count(), 2);
    for property in element.detached_properties() {
        match property.owner() {
            OwnerRef::Detached(owner) => assert!(owner.same_instance(&element)),
            other => panic!("unexpected owner {other:?}"),
        }
        // Strict entry point: already detached input is rejected.
        assert!(DetachedProperty::detach(&property)
            .unwrap_err()
            .is_invalid_argument());
    }
    Ok(())
}

#[test]
fn detached_instances_are_read_only() -> Result<()> {
    let (_graph, alice, _, knows) = people()?;
    let vertex = DetachedElement::detach(&alice)?;
    let edge = DetachedElement::detach(&knows)?;

    assert!(vertex
        .set_property("name", Value::from("eve"))
        .unwrap_err()
        .is_unsupported());
    assert!(edge.remove().unwrap_err().is_unsupported());
    let since = edge.detached_property("since").expect("since");
    assert!(since.remove().unwrap_err().is_unsupported());

    assert_eq!(
        alice.property("name")?.expect("name").value(),
        Value::from("alice")
    );
    Ok(())
}

#[test]
fn reattach_never_creates_data() -> Result<()> {
    let (graph, alice, bob, knows) = people()?;
    let edge = DetachedElement::detach(&knows)?;
    let since = edge.detached_property("since").expect("since");

    knows.remove()?;
    assert!(edge.attach_to_graph(&graph).unwrap_err().is_not_found());
    assert!(edge.attach_to_vertex(&alice).unwrap_err().is_not_found());
    assert!(since.attach_to_vertex(&alice).unwrap_err().is_not_found());
    assert_eq!(graph.edge_count(), 0);

    let vertex = DetachedElement::detach(&bob)?;
    bob.remove()?;
    assert!(vertex.attach_to_graph(&graph).unwrap_err().is_not_found());
    assert_eq!(graph.vertex_count(), 1);
    Ok(())
}

#[test]
fn detached_and_live_share_hash_buckets() -> Result<()> {
    let (_graph, alice, bob, _) = people()?;
    let mut seen = HashSet::new();
    for vertex in [&alice, &bob] {
        for property in vertex.properties()? {
            seen.insert(property.identity());
        }
    }
    let element = DetachedElement::detach(&alice)?;
    for property in element.detached_properties() {
        assert!(seen.contains(&property.identity()));
    }
    Ok(())
}

#[test]
fn canonical_strings() -> Result<()> {
    let (_graph, alice, _, knows) = people()?;
    let vertex = DetachedElement::detach(&alice)?;
    let edge = DetachedElement::detach(&knows)?;
    assert_eq!(vertex.to_string(), format!("v[{}]", alice.id()));
    assert!(edge.to_string().starts_with(&format!("e[{}][", knows.id())));
    assert!(edge.to_string().contains("-knows->"));
    Ok(())
}
