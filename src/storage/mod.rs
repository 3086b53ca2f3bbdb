//! Storage-agnostic two-level keyed collections.
//!
//! A [`Database`] is a keyed collection of named [`Table`]s; a table is a keyed
//! collection of rows. Handles are live views: every call consults the backing
//! store, nothing is cached. Enumeration goes through pull-based [`Cursor`]s, where
//! each advance reports the next item or the end in one step, so forward-only
//! backing cursors fit without a look-ahead.

pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::types::{ElementId, Value};

pub use memory::{MemDatabase, MemTable};
pub use sqlite::{with_database, SqliteDatabase, SqliteTable};

/// Row key within a table.
pub type RowKey = ElementId;

/// Row payload: column name to value.
pub type Row = BTreeMap<String, Value>;

/// One step of a forward-only cursor.
pub trait Advance {
    /// Item produced per step.
    type Item;

    /// Positions on the next item and returns it, or `None` at the end.
    fn advance(&mut self) -> Result<Option<Self::Item>>;
}

/// Single-pass iterator over an [`Advance`] source.
///
/// Fused after the end or the first error. Not restartable: callers ask the
/// database or table for a new cursor instead.
#[derive(Debug)]
pub struct Cursor<A> {
    source: A,
    done: bool,
}

impl<A: Advance> Cursor<A> {
    /// Wraps an advance source.
    pub fn new(source: A) -> Self {
        Self {
            source,
            done: false,
        }
    }
}

impl<A: Advance> Iterator for Cursor<A> {
    type Item = Result<A::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.source.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Counts a cursor to exhaustion, propagating the first failure.
pub fn exhaust<T>(entries: impl Iterator<Item = Result<T>>) -> Result<usize> {
    let mut count = 0;
    for entry in entries {
        entry?;
        count += 1;
    }
    Ok(count)
}

/// Keyed collection of rows.
pub trait Table {
    /// Cursor over `(key, row)` pairs.
    type Rows<'r>: Iterator<Item = Result<(RowKey, Row)>>
    where
        Self: 'r;

    /// Table name.
    fn name(&self) -> &str;

    /// Whether a row exists under `key`.
    fn has(&self, key: &RowKey) -> Result<bool>;

    /// Row under `key`, if any.
    fn value(&self, key: &RowKey) -> Result<Option<Row>>;

    /// Inserts or replaces the row under `key`.
    fn set(&self, key: &RowKey, row: Row) -> Result<()>;

    /// Merges `row` into the existing row under `key`, or inserts it.
    fn add(&self, key: &RowKey, row: Row) -> Result<()> {
        let merged = match self.value(key)? {
            Some(mut existing) => {
                existing.extend(row);
                existing
            }
            None => row,
        };
        self.set(key, merged)
    }

    /// Deletes the row under `key`.
    fn remove(&self, key: &RowKey) -> Result<()>;

    /// Row count, from an independent pass over [`Table::entries`].
    fn size(&self) -> Result<usize> {
        exhaust(self.entries()?)
    }

    /// Fresh single-pass cursor over the current rows.
    ///
    /// The cursor resumes after the last key it produced, so it observes rows
    /// written or deleted while it is being consumed when their keys sort after
    /// that position. Keys sorting before it are not revisited.
    fn entries(&self) -> Result<Self::Rows<'_>>;
}

/// Keyed collection of named tables over one backing store.
pub trait Database: fmt::Display {
    /// Table handle type, bound to the database session.
    type Table<'a>: Table
    where
        Self: 'a;

    /// Cursor over `(name, table)` pairs.
    type Entries<'a>: Iterator<Item = Result<(String, Self::Table<'a>)>>
    where
        Self: 'a;

    /// Live existence check.
    fn has(&self, name: &str) -> Result<bool>;

    /// Handle for `name`. Does not check that the table exists.
    fn value<'a>(&'a self, name: &str) -> Self::Table<'a>;

    /// Defines or replaces `name` with the contents of `table`.
    fn set<T: Table + ?Sized>(&self, name: &str, table: &T) -> Result<()>;

    /// Creates `name` from `table`, merging into an existing table.
    fn add<T: Table + ?Sized>(&self, name: &str, table: &T) -> Result<()>;

    /// Deletes `name` from the backing store.
    fn remove(&self, name: &str) -> Result<()>;

    /// Table count, from an independent pass over [`Database::entries`].
    fn size(&self) -> Result<usize> {
        exhaust(self.entries()?)
    }

    /// Fresh single-pass cursor over the tables currently in the catalog.
    ///
    /// The cursor resumes after the last name it produced, so it observes tables
    /// created or dropped while it is being consumed when their names sort after
    /// that position. Names sorting before it are not revisited.
    fn entries(&self) -> Result<Self::Entries<'_>>;
}
