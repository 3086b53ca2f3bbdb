#![allow(missing_docs)]

use proptest::prelude::*;
use tether::storage::{Database, MemDatabase, Row, RowKey, Table};
use tether::structure::mem::MemGraph;
use tether::structure::{Element, Property};
use tether::types::keys;
use tether::{Attachable, DetachedProperty, Value};

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-z]{1,30}".prop_map(Value::String),
        any::<f64>().prop_map(|f| Value::Float(if f.is_nan() { 0.0 } else { f })),
    ]
}

proptest! {
    #[test]
    fn prop_hidden_marking_survives_detach(
        key in "[a-z]{1,12}",
        hidden in any::<bool>(),
        value in arb_value(),
    ) {
        let graph = MemGraph::new();
        let stored = keys::stored(&key, hidden);
        let vertex = graph.add_vertex("node", [(stored.clone(), value.clone())]);
        let live = vertex.property(&stored).unwrap().expect("stored property");
        let detached = DetachedProperty::detach(live.as_ref()).unwrap();

        prop_assert_eq!(detached.key(), key.clone());
        prop_assert_eq!(detached.is_hidden(), hidden);
        prop_assert_eq!(detached.value(), value);

        let back = detached.attach_to_vertex(&vertex).unwrap();
        prop_assert_eq!(back.key(), key);
        prop_assert_eq!(back.is_hidden(), hidden);
        prop_assert_eq!(back.identity(), detached.identity());
    }

    #[test]
    fn prop_size_matches_entries(
        names in prop::collection::btree_set("[a-z]{1,8}", 0..12),
        rows in 0i64..5,
    ) {
        let db = MemDatabase::new();
        for name in &names {
            let table = db.create_table(name);
            for key in 0..rows {
                let mut row = Row::new();
                row.insert("n".to_string(), Value::Int(key));
                table.set(&RowKey::Int(key), row).unwrap();
            }
        }
        let listed: Vec<String> = db
            .entries()
            .unwrap()
            .map(|e| e.map(|(name, _)| name))
            .collect::<tether::Result<_>>()
            .unwrap();
        prop_assert_eq!(db.size().unwrap(), listed.len());
        prop_assert_eq!(listed, names.iter().cloned().collect::<Vec<_>>());
        for name in &names {
            prop_assert_eq!(db.value(name).size().unwrap(), rows as usize);
        }
    }
}
