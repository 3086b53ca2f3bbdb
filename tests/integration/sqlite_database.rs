#![allow(missing_docs)]

use std::path::PathBuf;

use tempfile::TempDir;
use tether::config::SqliteOptions;
use tether::storage::{with_database, Database, Row, RowKey, SqliteDatabase, Table};
use tether::{Result, TetherError, Value};

fn seeded_file() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new().map_err(TetherError::backing)?;
    let path = dir.path().join("shop.db");
    let db = SqliteDatabase::open(&path.to_string_lossy(), SqliteOptions::default())?;
    db.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, total REAL);
         INSERT INTO users (id, name) VALUES (1, 'alice'), (2, 'bob');
         INSERT INTO orders (id, user_id, total) VALUES (10, 1, 9.5);",
    )?;
    db.close()?;
    Ok((dir, path))
}

fn names<D: Database>(db: &D) -> Result<Vec<String>> {
    db.entries()?.map(|e| e.map(|(name, _)| name)).collect()
}

#[test]
fn catalog_scenario() -> Result<()> {
    let (_dir, path) = seeded_file()?;
    let db = SqliteDatabase::open(
        &format!("sqlite://{}", path.display()),
        SqliteOptions::default(),
    )?;

    assert!(db.has("USERS")?);
    let ghost = db.value("ghost");
    assert_eq!(ghost.name(), "ghost");
    assert!(!db.has("ghost")?);

    db.remove("orders")?;
    assert_eq!(names(&db)?, vec!["users".to_string()]);
    db.close()
}

#[test]
fn size_matches_exhausted_entries() -> Result<()> {
    let (_dir, path) = seeded_file()?;
    with_database(&path.to_string_lossy(), SqliteOptions::default(), |db| {
        assert_eq!(db.size()?, names(db)?.len());
        assert_eq!(db.size()?, 2);
        Ok(())
    })
}

#[test]
fn enumerations_are_independent() -> Result<()> {
    let (_dir, path) = seeded_file()?;
    with_database(&path.to_string_lossy(), SqliteOptions::default(), |db| {
        let mut first = db.entries()?;
        let mut second = db.entries()?;
        let (a, _) = first.next().expect("first")?;
        let (b, _) = second.next().expect("second")?;
        assert_eq!(a, b);
        assert_eq!(first.count() + 1, 2);
        assert_eq!(second.count() + 1, 2);
        Ok(())
    })
}

#[test]
fn empty_catalog_has_no_entries() -> Result<()> {
    let db = SqliteDatabase::open_in_memory()?;
    assert_eq!(db.size()?, 0);
    assert!(names(&db)?.is_empty());
    assert!(db.entries()?.next().is_none());
    db.close()
}

#[test]
fn single_table_catalog() -> Result<()> {
    let db = SqliteDatabase::open_in_memory()?;
    db.execute_batch("CREATE TABLE solo (id INTEGER PRIMARY KEY)")?;
    assert_eq!(db.size()?, 1);
    assert_eq!(names(&db)?, vec!["solo".to_string()]);
    assert_eq!(db.value("solo").size()?, 0);
    db.close()
}

#[test]
fn catalog_cursor_sees_changes_ahead_of_it() -> Result<()> {
    let (_dir, path) = seeded_file()?;
    with_database(&path.to_string_lossy(), SqliteOptions::default(), |db| {
        let mut entries = db.entries()?;
        let (first, _) = entries.next().expect("first")?;
        assert_eq!(first, "orders");

        db.execute_batch(
            "CREATE TABLE archive (id INTEGER PRIMARY KEY);
             CREATE TABLE zones (id INTEGER PRIMARY KEY);
             DROP TABLE users;",
        )?;
        let rest: Vec<String> = entries
            .map(|e| e.map(|(name, _)| name))
            .collect::<Result<_>>()?;
        assert_eq!(rest, vec!["zones".to_string()]);
        assert_eq!(db.size()?, 3);
        Ok(())
    })
}

#[test]
fn external_changes_are_visible() -> Result<()> {
    let (_dir, path) = seeded_file()?;
    let uri = path.to_string_lossy().to_string();
    let db = SqliteDatabase::open(&uri, SqliteOptions::default())?;
    assert!(!db.has("audit")?);

    // A second session changes the catalog behind the first one's back.
    with_database(&uri, SqliteOptions::default(), |other| {
        other.execute_batch("CREATE TABLE audit (entry TEXT)")
    })?;
    assert!(db.has("Audit")?);
    assert_eq!(db.size()?, 3);
    db.close()
}

#[test]
fn table_handles_read_rows_live() -> Result<()> {
    let (_dir, path) = seeded_file()?;
    with_database(&path.to_string_lossy(), SqliteOptions::default(), |db| {
        let users = db.value("users");
        assert_eq!(users.size()?, 2);
        let bob = users.value(&RowKey::Int(2))?.expect("bob");
        assert_eq!(bob.get("name"), Some(&Value::from("bob")));
        assert_eq!(bob.get("id"), Some(&Value::Int(2)));

        let mut carol = Row::new();
        carol.insert("name".to_string(), Value::from("carol"));
        users.add(&RowKey::Int(2), carol)?;
        let merged = users.value(&RowKey::Int(2))?.expect("merged");
        assert_eq!(merged.get("name"), Some(&Value::from("carol")));

        db.connection()
            .execute("DELETE FROM users WHERE id = 1", [])
            .map_err(TetherError::from)?;
        assert!(!users.has(&RowKey::Int(1))?);
        assert_eq!(users.size()?, 1);
        Ok(())
    })
}

#[test]
fn read_only_sessions_reject_writes() -> Result<()> {
    let (_dir, path) = seeded_file()?;
    with_database(&path.to_string_lossy(), SqliteOptions::read_only(), |db| {
        assert!(db.has("users")?);
        match db.remove("users") {
            Err(TetherError::Backing { .. }) => {}
            other => panic!("expected backing failure, got {other:?}"),
        }
        Ok(())
    })
}

#[test]
fn missing_file_is_not_created_when_asked() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("absent.db");
    let options = SqliteOptions {
        create_if_missing: false,
        ..SqliteOptions::default()
    };
    let err = SqliteDatabase::open(&path.to_string_lossy(), options).unwrap_err();
    assert!(matches!(err, TetherError::Backing { .. }));
    assert!(!path.exists());
}

#[test]
fn scoped_session_prefers_the_callers_error() -> Result<()> {
    let (_dir, path) = seeded_file()?;
    let err = with_database(&path.to_string_lossy(), SqliteOptions::default(), |db| {
        db.has("users")?;
        Err::<(), _>(TetherError::NotFound("stop".into()))
    })
    .unwrap_err();
    assert!(err.is_not_found());

    // The file is released and can be reopened.
    let db = SqliteDatabase::open(&path.to_string_lossy(), SqliteOptions::default())?;
    assert!(db.has("orders")?);
    db.close()
}

#[test]
fn diagnostics_hide_credentials() -> Result<()> {
    let db = SqliteDatabase::open(
        "file:memdb1?mode=memory&cache=shared",
        SqliteOptions::default(),
    )?;
    let shown = db.to_string();
    assert!(shown.starts_with("<database#sqlite:"));
    assert!(!shown.contains("cache=shared"));
    db.close()
}
