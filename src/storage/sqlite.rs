//! Relational reference adapter over SQLite.
//!
//! Catalog and row enumeration re-query the store on every advance, resuming after
//! the last name or rowid produced, so cursors never hold a statement open across
//! calls. `set` and `add` at the database level are capability gaps: `set` is a
//! logged no-op and `add` reports [`TetherError::Unsupported`].

use std::fmt;
use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, trace, warn};

use crate::config::SqliteOptions;
use crate::error::{Result, TetherError};
use crate::types::{ElementId, Value};

use super::{Advance, Cursor, Database, Row, RowKey, Table};

const SCHEMES: [&str; 3] = ["jdbc:sqlite:", "sqlite://", "sqlite:"];

/// SQLite-backed database session.
///
/// Owns exactly one connection for its whole lifetime. Table handles borrow the
/// session, so none can outlive it. The connection is released by
/// [`SqliteDatabase::close`], which reports failures, or on drop.
pub struct SqliteDatabase {
    conn: Connection,
    location: String,
    options: SqliteOptions,
}

impl SqliteDatabase {
    /// Opens a session for `uri`.
    ///
    /// Accepts a bare path, `:memory:`, a SQLite `file:` URI, or the same prefixed
    /// with `sqlite:`, `sqlite://`, or `jdbc:sqlite:`.
    pub fn open(uri: &str, options: SqliteOptions) -> Result<Self> {
        let target = strip_scheme(uri);
        if target.is_empty() {
            return Err(TetherError::argument_can_not_be_null("connection uri"));
        }
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if options.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if options.create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        let conn = Connection::open_with_flags(target, flags)?;
        if options.busy_timeout_ms > 0 {
            conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
        }
        let location = redact_uri(uri);
        info!(%location, read_only = options.read_only, "sqlite database opened");
        Ok(Self {
            conn,
            location,
            options,
        })
    }

    /// Opens a private in-memory session.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:", SqliteOptions::default())
    }

    /// The underlying connection, for schema setup the contract does not cover.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs a batch of SQL statements.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Releases the connection, reporting any failure to do so.
    pub fn close(self) -> Result<()> {
        debug!(location = %self.location, "closing sqlite database");
        self.conn
            .close()
            .map_err(|(_, err)| TetherError::backing(err))
    }

    fn catalog_filter(&self) -> &'static str {
        if self.options.include_system_tables {
            ""
        } else {
            " AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'"
        }
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT name FROM sqlite_master WHERE type = 'table'{} ORDER BY name",
            self.catalog_filter()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for name in names {
            out.push(name?);
        }
        Ok(out)
    }

    fn next_table_after(&self, last: Option<&str>) -> Result<Option<String>> {
        let sql = format!(
            "SELECT name FROM sqlite_master WHERE type = 'table'{} \
             AND (?1 IS NULL OR name > ?1) ORDER BY name LIMIT 1",
            self.catalog_filter()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let next = stmt
            .query_row(params![last], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(next)
    }
}

impl fmt::Display for SqliteDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<database#sqlite:{}>", self.location)
    }
}

impl fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("location", &self.location)
            .field("options", &self.options)
            .finish()
    }
}

impl Database for SqliteDatabase {
    type Table<'a> = SqliteTable<'a>;
    type Entries<'a> = Cursor<SqliteCatalogCursor<'a>>;

    fn has(&self, name: &str) -> Result<bool> {
        trace!(name, "catalog lookup");
        Ok(self
            .table_names()?
            .iter()
            .any(|table| table.eq_ignore_ascii_case(name)))
    }

    fn value<'a>(&'a self, name: &str) -> SqliteTable<'a> {
        SqliteTable {
            db: self,
            name: name.to_string(),
        }
    }

    fn set<T: Table + ?Sized>(&self, name: &str, table: &T) -> Result<()> {
        warn!(
            name,
            source = table.name(),
            "sqlite adapter does not redefine tables; set ignored"
        );
        Ok(())
    }

    fn add<T: Table + ?Sized>(&self, name: &str, table: &T) -> Result<()> {
        Err(TetherError::unsupported(format!(
            "{self} can not add table {name} from {}",
            table.name()
        )))
    }

    fn remove(&self, name: &str) -> Result<()> {
        debug!(name, "dropping table");
        self.conn
            .execute(&format!("DROP TABLE {}", quote_ident(name)), [])?;
        Ok(())
    }

    fn entries(&self) -> Result<Self::Entries<'_>> {
        Ok(Cursor::new(SqliteCatalogCursor {
            db: self,
            last: None,
        }))
    }
}

/// Forward-only cursor over the SQLite catalog.
#[derive(Debug)]
pub struct SqliteCatalogCursor<'a> {
    db: &'a SqliteDatabase,
    last: Option<String>,
}

impl<'a> Advance for SqliteCatalogCursor<'a> {
    type Item = (String, SqliteTable<'a>);

    fn advance(&mut self) -> Result<Option<Self::Item>> {
        let Some(name) = self.db.next_table_after(self.last.as_deref())? else {
            return Ok(None);
        };
        self.last = Some(name.clone());
        let table = self.db.value(&name);
        Ok(Some((name, table)))
    }
}

/// Handle onto one SQLite table. Rows are keyed by `rowid`.
#[derive(Clone, Debug)]
pub struct SqliteTable<'a> {
    db: &'a SqliteDatabase,
    name: String,
}

impl<'a> SqliteTable<'a> {
    fn rowid(&self, key: &RowKey) -> Result<i64> {
        match key {
            ElementId::Int(id) => Ok(*id),
            other => Err(TetherError::InvalidArgument(format!(
                "rows of {} are keyed by integer rowid, got {other}",
                self.name
            ))),
        }
    }
}

impl<'a> Table for SqliteTable<'a> {
    type Rows<'r>
        = Cursor<SqliteRowCursor<'r>>
    where
        Self: 'r;

    fn name(&self) -> &str {
        &self.name
    }

    fn has(&self, key: &RowKey) -> Result<bool> {
        let rowid = self.rowid(key)?;
        let sql = format!("SELECT 1 FROM {} WHERE rowid = ?1", quote_ident(&self.name));
        let mut stmt = self.db.conn.prepare_cached(&sql)?;
        let found = stmt
            .query_row([rowid], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn value(&self, key: &RowKey) -> Result<Option<Row>> {
        let rowid = self.rowid(key)?;
        let sql = format!("SELECT * FROM {} WHERE rowid = ?1", quote_ident(&self.name));
        let mut stmt = self.db.conn.prepare_cached(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let mut rows = stmt.query([rowid])?;
        match rows.next()? {
            Some(row) => Ok(Some(decode_row(row, &columns, 0)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &RowKey, row: Row) -> Result<()> {
        let rowid = self.rowid(key)?;
        let mut columns = vec!["rowid".to_string()];
        let mut values = vec![Value::Int(rowid)];
        for (column, value) in row {
            columns.push(quote_ident(&column));
            values.push(value);
        }
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote_ident(&self.name),
            columns.join(", "),
            placeholders.join(", ")
        );
        self.db
            .conn
            .execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    fn remove(&self, key: &RowKey) -> Result<()> {
        let rowid = self.rowid(key)?;
        let sql = format!("DELETE FROM {} WHERE rowid = ?1", quote_ident(&self.name));
        self.db.conn.execute(&sql, [rowid])?;
        Ok(())
    }

    fn entries(&self) -> Result<Self::Rows<'_>> {
        Ok(Cursor::new(SqliteRowCursor {
            db: self.db,
            sql: format!(
                "SELECT rowid, * FROM {} WHERE (?1 IS NULL OR rowid > ?1) ORDER BY rowid LIMIT 1",
                quote_ident(&self.name)
            ),
            last: None,
        }))
    }
}

/// Forward-only cursor over the rows of one SQLite table.
#[derive(Debug)]
pub struct SqliteRowCursor<'r> {
    db: &'r SqliteDatabase,
    sql: String,
    last: Option<i64>,
}

impl<'r> Advance for SqliteRowCursor<'r> {
    type Item = (RowKey, Row);

    fn advance(&mut self) -> Result<Option<Self::Item>> {
        let mut stmt = self.db.conn.prepare_cached(&self.sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let mut rows = stmt.query(params![self.last])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let rowid: i64 = row.get(0)?;
        let decoded = decode_row(row, &columns, 1)?;
        self.last = Some(rowid);
        Ok(Some((ElementId::Int(rowid), decoded)))
    }
}

/// Runs `f` against a session on `uri` and releases the connection on every exit
/// path. The closure's error wins over a failure to close.
pub fn with_database<T, F>(uri: &str, options: SqliteOptions, f: F) -> Result<T>
where
    F: FnOnce(&SqliteDatabase) -> Result<T>,
{
    let db = SqliteDatabase::open(uri, options)?;
    let outcome = f(&db);
    let closed = db.close();
    let value = outcome?;
    closed?;
    Ok(value)
}

fn decode_row(row: &rusqlite::Row<'_>, columns: &[String], skip: usize) -> Result<Row> {
    let mut out = Row::new();
    for (idx, column) in columns.iter().enumerate().skip(skip) {
        out.insert(column.clone(), from_sql(row.get_ref(idx)?));
    }
    Ok(out)
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Bool(v) => ToSqlOutput::from(*v),
            Value::Int(v) => ToSqlOutput::from(*v),
            Value::Float(v) => ToSqlOutput::from(*v),
            Value::String(v) => ToSqlOutput::from(v.as_str()),
            Value::Bytes(v) => ToSqlOutput::from(v.as_slice()),
            Value::List(_) | Value::Map(_) => {
                let json = serde_json::to_string(self)
                    .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
                ToSqlOutput::from(json)
            }
        })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn strip_scheme(uri: &str) -> &str {
    SCHEMES
        .iter()
        .find_map(|scheme| uri.strip_prefix(scheme))
        .unwrap_or(uri)
}

/// Drops user info and query parameters so credentials never reach logs.
fn redact_uri(uri: &str) -> String {
    let without_query = uri.split('?').next().unwrap_or(uri);
    match without_query.split_once("://") {
        Some((scheme, rest)) => {
            let authority_end = rest.find('/').unwrap_or(rest.len());
            let rest = match rest[..authority_end].rfind('@') {
                Some(at) => &rest[at + 1..],
                None => rest,
            };
            format!("{scheme}://{rest}")
        }
        None => without_query.to_string(),
    }
}
