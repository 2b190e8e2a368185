//! CLI command handlers.

pub mod count;
pub mod gc;
pub mod purge;
pub mod show;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use hearth_session::{SessionConfig, SessionStore, SqliteBackend};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Session database path.
    pub db: PathBuf,
    /// Session table name.
    pub table: String,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Open the session database.
    pub fn backend(&self) -> Result<Arc<SqliteBackend>> {
        let backend = SqliteBackend::open(&self.db)
            .with_context(|| format!("Failed to open session database: {}", self.db.display()))?;
        Ok(Arc::new(backend))
    }

    /// A store over the configured table. GC never runs on open.
    pub fn store(&self, backend: Arc<SqliteBackend>) -> SessionStore {
        SessionStore::new(
            backend,
            SessionConfig::new()
                .with_table(self.table.clone())
                .with_gc_lotto(0, 100),
        )
    }
}
