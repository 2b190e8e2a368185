//! SQLite session backend.

use std::collections::HashSet;
use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::backend::{SessionRecord, StoreBackend};
use crate::error::{Result, SessionError};
use crate::gc::ExpiryFilter;

/// Session backend over a SQLite database.
///
/// Each table is created on first use with the layout
/// `(id TEXT PRIMARY KEY, data BLOB, last_accessed INTEGER)`. Table names
/// must be plain identifiers since they are interpolated into SQL.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    /// Tables already created in this connection.
    ready: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("ready", &*self.ready.lock())
            .finish()
    }
}

impl SqliteBackend {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!(path = %path.display(), "Opened session database");
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            ready: Mutex::new(HashSet::new()),
        }
    }

    /// Create `table` if it does not exist yet.
    pub fn ensure_table(&self, table: &str) -> Result<()> {
        self.conn_for(table).map(drop)
    }

    /// Number of records in `table`.
    pub fn count(&self, table: &str) -> Result<usize> {
        let conn = self.conn_for(table)?;
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
            row.get(0)
        })?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Lock the connection with `table` validated and created.
    fn conn_for(&self, table: &str) -> Result<MutexGuard<'_, Connection>> {
        validate_table(table)?;
        let conn = self.conn.lock();
        let mut ready = self.ready.lock();
        if !ready.contains(table) {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (
                    id TEXT PRIMARY KEY NOT NULL,
                    data BLOB NOT NULL,
                    last_accessed INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS \"idx_{table}_last_accessed\"
                    ON \"{table}\" (last_accessed);"
            ))?;
            ready.insert(table.to_string());
            debug!(table = %table, "Session table ready");
        }
        drop(ready);
        Ok(conn)
    }
}

/// Accept `[A-Za-z_][A-Za-z0-9_]*` only.
fn validate_table(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidTable(table.to_string()))
    }
}

impl StoreBackend for SqliteBackend {
    fn read_item(&self, table: &str, id: &str) -> Result<Option<SessionRecord>> {
        let conn = self.conn_for(table)?;
        let record = conn
            .query_row(
                &format!("SELECT id, data, last_accessed FROM \"{table}\" WHERE id = ?1"),
                params![id],
                |row| {
                    Ok(SessionRecord {
                        id: row.get(0)?,
                        data: row.get(1)?,
                        last_accessed: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn create_item(&self, table: &str, record: &SessionRecord) -> Result<()> {
        self.conn_for(table)?.execute(
            &format!("INSERT INTO \"{table}\" (id, data, last_accessed) VALUES (?1, ?2, ?3)"),
            params![record.id, record.data, record.last_accessed],
        )?;
        Ok(())
    }

    fn update_item(&self, table: &str, id: &str, data: &[u8], last_accessed: i64) -> Result<()> {
        self.conn_for(table)?.execute(
            &format!("UPDATE \"{table}\" SET data = ?1, last_accessed = ?2 WHERE id = ?3"),
            params![data, last_accessed, id],
        )?;
        Ok(())
    }

    fn delete_item(&self, table: &str, id: &str) -> Result<()> {
        self.conn_for(table)?.execute(
            &format!("DELETE FROM \"{table}\" WHERE id = ?1"),
            params![id],
        )?;
        Ok(())
    }

    fn delete_where(&self, table: &str, filter: &ExpiryFilter) -> Result<usize> {
        let [max_lifetime, now] = filter.params();
        let deleted = self.conn_for(table)?.execute(
            &format!("DELETE FROM \"{table}\" WHERE {}", ExpiryFilter::PREDICATE),
            params![max_lifetime, now],
        )?;
        Ok(deleted)
    }
}
