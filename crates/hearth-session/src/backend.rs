//! Storage backends for session records.
//!
//! The session store is decoupled from specific storage through the
//! [`StoreBackend`] trait: a keyed-record CRUD surface over named tables plus
//! a filtered delete used by garbage collection. [`MemoryBackend`] keeps
//! records in process; [`SqliteBackend`](crate::SqliteBackend) persists them.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{Result, SessionError};
use crate::gc::ExpiryFilter;

/// One persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Session identifier. Unique per table.
    pub id: String,

    /// Serialized session map at the last write.
    pub data: Vec<u8>,

    /// Seconds since the epoch of the last write.
    pub last_accessed: i64,
}

impl SessionRecord {
    /// Create a record.
    pub fn new(id: impl Into<String>, data: impl Into<Vec<u8>>, last_accessed: i64) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
            last_accessed,
        }
    }
}

/// Trait for session storage backends.
///
/// "Not found" is never an error here: reads return `Ok(None)`, and updates
/// or deletes of a missing id succeed without effect. Any other failure is
/// returned to the caller unmodified.
pub trait StoreBackend: Send + Sync {
    /// Look up a record by id.
    fn read_item(&self, table: &str, id: &str) -> Result<Option<SessionRecord>>;

    /// Insert a new record. Fails if the id already exists.
    fn create_item(&self, table: &str, record: &SessionRecord) -> Result<()>;

    /// Replace `data` and `last_accessed` of an existing record.
    fn update_item(&self, table: &str, id: &str, data: &[u8], last_accessed: i64) -> Result<()>;

    /// Delete a record by id.
    fn delete_item(&self, table: &str, id: &str) -> Result<()>;

    /// Delete every record matched by `filter`. Returns the number deleted.
    fn delete_where(&self, table: &str, filter: &ExpiryFilter) -> Result<usize>;
}

/// In-process backend. Records live as long as the backend does.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, HashMap<String, SessionRecord>>>,
}

impl MemoryBackend {
    /// Backend with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables.lock().get(table).map_or(0, HashMap::len)
    }

    /// Whether `table` holds no records.
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

impl StoreBackend for MemoryBackend {
    fn read_item(&self, table: &str, id: &str) -> Result<Option<SessionRecord>> {
        Ok(self
            .tables
            .lock()
            .get(table)
            .and_then(|rows| rows.get(id))
            .cloned())
    }

    fn create_item(&self, table: &str, record: &SessionRecord) -> Result<()> {
        let mut tables = self.tables.lock();
        let rows = tables.entry(table.to_string()).or_default();
        if rows.contains_key(&record.id) {
            return Err(SessionError::Backend(format!(
                "duplicate session id in {table:?}: {}",
                record.id
            )));
        }
        rows.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn update_item(&self, table: &str, id: &str, data: &[u8], last_accessed: i64) -> Result<()> {
        if let Some(row) = self
            .tables
            .lock()
            .get_mut(table)
            .and_then(|rows| rows.get_mut(id))
        {
            row.data = data.to_vec();
            row.last_accessed = last_accessed;
        }
        Ok(())
    }

    fn delete_item(&self, table: &str, id: &str) -> Result<()> {
        if let Some(rows) = self.tables.lock().get_mut(table) {
            rows.remove(id);
        }
        Ok(())
    }

    fn delete_where(&self, table: &str, filter: &ExpiryFilter) -> Result<usize> {
        let mut tables = self.tables.lock();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|_, row| !filter.matches(row.last_accessed));
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_read() {
        let backend = MemoryBackend::new();
        let record = SessionRecord::new("s1", b"blob".to_vec(), 10);
        backend.create_item("sessions", &record).unwrap();

        assert_eq!(backend.read_item("sessions", "s1").unwrap(), Some(record));
        assert_eq!(backend.read_item("sessions", "s2").unwrap(), None);
        assert_eq!(backend.read_item("other", "s1").unwrap(), None);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let backend = MemoryBackend::new();
        let record = SessionRecord::new("s1", Vec::<u8>::new(), 10);
        backend.create_item("t", &record).unwrap();

        let result = backend.create_item("t", &record);
        assert!(matches!(result, Err(SessionError::Backend(_))));
    }

    #[test]
    fn test_update_missing_is_noop() {
        let backend = MemoryBackend::new();
        backend.update_item("t", "ghost", b"x", 1).unwrap();
        assert!(backend.is_empty("t"));
    }

    #[test]
    fn test_update_replaces_data() {
        let backend = MemoryBackend::new();
        backend
            .create_item("t", &SessionRecord::new("s1", b"old".to_vec(), 1))
            .unwrap();
        backend.update_item("t", "s1", b"new", 2).unwrap();

        let row = backend.read_item("t", "s1").unwrap().unwrap();
        assert_eq!(row.data, b"new");
        assert_eq!(row.last_accessed, 2);
    }

    #[test]
    fn test_delete_where() {
        let backend = MemoryBackend::new();
        for (id, ts) in [("a", 10), ("b", 50), ("c", 90)] {
            backend
                .create_item("t", &SessionRecord::new(id, Vec::<u8>::new(), ts))
                .unwrap();
        }

        let deleted = backend.delete_where("t", &ExpiryFilter::new(30, 100)).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(backend.len("t"), 1);
        assert!(backend.read_item("t", "c").unwrap().is_some());

        assert_eq!(backend.delete_where("empty", &ExpiryFilter::new(0, 100)).unwrap(), 0);
    }
}
