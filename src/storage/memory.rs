//! In-memory map adapter.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use tracing::debug;

use crate::error::{Result, TetherError};

use super::{Advance, Cursor, Database, Row, RowKey, Table};

type Rows = BTreeMap<RowKey, Row>;

/// Database over plain in-memory maps.
///
/// Single-threaded like every adapter: callers serialize access themselves.
#[derive(Debug, Default)]
pub struct MemDatabase {
    tables: RefCell<BTreeMap<String, Rows>>,
}

impl MemDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `name` if it does not exist yet and returns its handle.
    pub fn create_table(&self, name: &str) -> MemTable<'_> {
        self.tables
            .borrow_mut()
            .entry(name.to_string())
            .or_default();
        self.value(name)
    }

    fn copy_rows<T: Table + ?Sized>(table: &T) -> Result<Rows> {
        let mut rows = Rows::new();
        for entry in table.entries()? {
            let (key, row) = entry?;
            rows.insert(key, row);
        }
        Ok(rows)
    }
}

impl fmt::Display for MemDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<database#memory>")
    }
}

impl Database for MemDatabase {
    type Table<'a> = MemTable<'a>;
    type Entries<'a> = Cursor<MemCatalogCursor<'a>>;

    fn has(&self, name: &str) -> Result<bool> {
        Ok(self.tables.borrow().contains_key(name))
    }

    fn value<'a>(&'a self, name: &str) -> MemTable<'a> {
        MemTable {
            db: self,
            name: name.to_string(),
        }
    }

    fn set<T: Table + ?Sized>(&self, name: &str, table: &T) -> Result<()> {
        let rows = Self::copy_rows(table)?;
        debug!(name, rows = rows.len(), "replacing table");
        self.tables.borrow_mut().insert(name.to_string(), rows);
        Ok(())
    }

    fn add<T: Table + ?Sized>(&self, name: &str, table: &T) -> Result<()> {
        let rows = Self::copy_rows(table)?;
        debug!(name, rows = rows.len(), "merging table");
        let mut tables = self.tables.borrow_mut();
        let target = tables.entry(name.to_string()).or_default();
        for (key, row) in rows {
            target.entry(key).or_default().extend(row);
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.tables
            .borrow_mut()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| TetherError::not_found(format!("no such table: {name} in {self}")))
    }

    fn entries(&self) -> Result<Self::Entries<'_>> {
        Ok(Cursor::new(MemCatalogCursor {
            db: self,
            last: None,
        }))
    }
}

/// Catalog cursor resuming after the last name it produced.
#[derive(Debug)]
pub struct MemCatalogCursor<'a> {
    db: &'a MemDatabase,
    last: Option<String>,
}

impl<'a> Advance for MemCatalogCursor<'a> {
    type Item = (String, MemTable<'a>);

    fn advance(&mut self) -> Result<Option<Self::Item>> {
        let next = {
            let tables = self.db.tables.borrow();
            let lower = match &self.last {
                Some(last) => Bound::Excluded(last.clone()),
                None => Bound::Unbounded,
            };
            tables
                .range((lower, Bound::Unbounded))
                .next()
                .map(|(name, _)| name.clone())
        };
        Ok(next.map(|name| {
            self.last = Some(name.clone());
            let table = self.db.value(&name);
            (name, table)
        }))
    }
}

/// Live handle onto one in-memory table.
///
/// Writing through a handle whose table does not exist creates it.
#[derive(Clone, Debug)]
pub struct MemTable<'a> {
    db: &'a MemDatabase,
    name: String,
}

impl<'a> Table for MemTable<'a> {
    type Rows<'r>
        = Cursor<MemRowCursor<'r>>
    where
        Self: 'r;

    fn name(&self) -> &str {
        &self.name
    }

    fn has(&self, key: &RowKey) -> Result<bool> {
        Ok(self
            .db
            .tables
            .borrow()
            .get(&self.name)
            .is_some_and(|rows| rows.contains_key(key)))
    }

    fn value(&self, key: &RowKey) -> Result<Option<Row>> {
        Ok(self
            .db
            .tables
            .borrow()
            .get(&self.name)
            .and_then(|rows| rows.get(key).cloned()))
    }

    fn set(&self, key: &RowKey, row: Row) -> Result<()> {
        self.db
            .tables
            .borrow_mut()
            .entry(self.name.clone())
            .or_default()
            .insert(key.clone(), row);
        Ok(())
    }

    fn remove(&self, key: &RowKey) -> Result<()> {
        if let Some(rows) = self.db.tables.borrow_mut().get_mut(&self.name) {
            rows.remove(key);
        }
        Ok(())
    }

    fn entries(&self) -> Result<Self::Rows<'_>> {
        Ok(Cursor::new(MemRowCursor {
            db: self.db,
            name: &self.name,
            last: None,
        }))
    }
}

/// Row cursor resuming after the last key it produced.
#[derive(Debug)]
pub struct MemRowCursor<'r> {
    db: &'r MemDatabase,
    name: &'r str,
    last: Option<RowKey>,
}

impl<'r> Advance for MemRowCursor<'r> {
    type Item = (RowKey, Row);

    fn advance(&mut self) -> Result<Option<Self::Item>> {
        let tables = self.db.tables.borrow();
        let Some(rows) = tables.get(self.name) else {
            return Ok(None);
        };
        let lower = match &self.last {
            Some(last) => Bound::Excluded(last),
            None => Bound::Unbounded,
        };
        let next = rows
            .range::<RowKey, _>((lower, Bound::Unbounded))
            .next()
            .map(|(key, row)| (key.clone(), row.clone()));
        if let Some((key, _)) = &next {
            self.last = Some(key.clone());
        }
        Ok(next)
    }
}
