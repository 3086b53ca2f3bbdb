#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;
use tether::config::SqliteOptions;
use tether::storage::{Database, SqliteDatabase};

fn setup_db() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("shop.db");
    let db = SqliteDatabase::open(&path.to_string_lossy(), SqliteOptions::default())
        .expect("open sqlite");
    db.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE orders (id INTEGER PRIMARY KEY, total REAL);
         INSERT INTO users (id, name) VALUES (1, 'alice'), (2, 'bob');",
    )
    .expect("seed");
    db.close().expect("close");
    (dir, path)
}

fn no_config(dir: &TempDir) -> PathBuf {
    dir.path().join("absent.toml")
}

#[test]
fn tables_lists_catalog() {
    let (dir, db_path) = setup_db();
    let output = cargo_bin_cmd!("tether")
        .env("TETHER_CONFIG", no_config(&dir))
        .args(["--format", "json", "--database"])
        .arg(&db_path)
        .arg("tables")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(json["count"], 2);
    assert_eq!(json["tables"], serde_json::json!(["orders", "users"]));
}

#[test]
fn has_is_case_insensitive() {
    let (dir, db_path) = setup_db();
    let output = cargo_bin_cmd!("tether")
        .env("TETHER_CONFIG", no_config(&dir))
        .arg("--database")
        .arg(&db_path)
        .args(["has", "USERS"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8_lossy(&output).trim(), "true");
}

#[test]
fn drop_removes_table() {
    let (dir, db_path) = setup_db();
    cargo_bin_cmd!("tether")
        .env("TETHER_CONFIG", no_config(&dir))
        .arg("--database")
        .arg(&db_path)
        .args(["drop", "orders"])
        .assert()
        .success();

    let db = SqliteDatabase::open(&db_path.to_string_lossy(), SqliteOptions::read_only())
        .expect("reopen");
    assert!(!db.has("orders").expect("has"));
}

#[test]
fn rows_dump_as_json() {
    let (dir, db_path) = setup_db();
    let output = cargo_bin_cmd!("tether")
        .env("TETHER_CONFIG", no_config(&dir))
        .args(["--format", "json", "--database"])
        .arg(&db_path)
        .args(["rows", "users"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json output");
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["key"], 1);
    assert_eq!(rows[0]["row"]["name"], "alice");
}

#[test]
fn database_falls_back_to_config() {
    let (dir, db_path) = setup_db();
    let config = dir.path().join("cli.toml");
    fs::write(
        &config,
        format!("[database]\ndefault = \"{}\"\n", db_path.display()),
    )
    .expect("write config");
    cargo_bin_cmd!("tether")
        .env("TETHER_CONFIG", &config)
        .args(["has", "orders"])
        .assert()
        .success();
}

#[test]
fn failures_exit_with_error() {
    let (dir, db_path) = setup_db();
    let output = cargo_bin_cmd!("tether")
        .env("TETHER_CONFIG", no_config(&dir))
        .arg("--database")
        .arg(&db_path)
        .args(["drop", "ghost"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("error:"));

    cargo_bin_cmd!("tether")
        .env("TETHER_CONFIG", no_config(&dir))
        .arg("tables")
        .assert()
        .failure()
        .code(1);
}
