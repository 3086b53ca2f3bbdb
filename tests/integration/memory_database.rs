#![allow(missing_docs)]

use tether::storage::{Database, MemDatabase, Row, RowKey, SqliteDatabase, Table};
use tether::{Result, Value};

fn row(name: &str) -> Row {
    let mut row = Row::new();
    row.insert("name".to_string(), Value::from(name));
    row
}

#[test]
fn catalog_follows_writes() -> Result<()> {
    let db = MemDatabase::new();
    assert_eq!(db.size()?, 0);

    let users = db.value("users");
    assert!(!db.has("users")?);
    users.set(&RowKey::Int(1), row("alice"))?;
    assert!(db.has("users")?);
    assert_eq!(db.size()?, 1);

    db.remove("users")?;
    assert!(!db.has("users")?);
    assert_eq!(users.size()?, 0);
    Ok(())
}

#[test]
fn copies_tables_across_adapters() -> Result<()> {
    let source = SqliteDatabase::open_in_memory()?;
    source.execute_batch(
        "CREATE TABLE users (name TEXT);
         INSERT INTO users (rowid, name) VALUES (1, 'alice'), (2, 'bob');",
    )?;
    let target = MemDatabase::new();
    target.set("users", &source.value("users"))?;

    let copy = target.value("users");
    assert_eq!(copy.size()?, 2);
    assert_eq!(copy.value(&RowKey::Int(2))?, Some(row("bob")));

    // The copy is detached from its source.
    source.execute_batch("DELETE FROM users")?;
    assert_eq!(copy.size()?, 2);
    source.close()
}

#[test]
fn string_keys_are_allowed_in_memory() -> Result<()> {
    let db = MemDatabase::new();
    let tags = db.create_table("tags");
    tags.set(&RowKey::from("b"), row("beta"))?;
    tags.set(&RowKey::from("a"), row("alpha"))?;
    let keys: Vec<RowKey> = tags
        .entries()?
        .map(|e| e.map(|(key, _)| key))
        .collect::<Result<_>>()?;
    assert_eq!(keys, vec![RowKey::from("a"), RowKey::from("b")]);
    Ok(())
}
