//! Session store: persistence and lifecycle of session records.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::ambient::AmbientSession;
use crate::backend::{SessionRecord, StoreBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::{GcMode, SessionConfig};
use crate::error::Result;
use crate::gc::ExpiryFilter;

/// Session store over a [`StoreBackend`].
///
/// The host request lifecycle drives it as
/// `open` → (`read` | `write`)* → [`destroy`] → `close`:
///
/// - `open` may run a GC sweep, decided by the configured lottery
/// - `read` treats a missing record as an empty session
/// - `write` looks the record up first, then updates or creates it
///
/// `write` is two backend round-trips and is not atomic. Two requests
/// writing the same id concurrently race; the last write wins.
///
/// [`destroy`]: SessionStore::destroy
pub struct SessionStore {
    backend: Arc<dyn StoreBackend>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    /// Ambient map cleared on destroy, if attached.
    ambient: Option<Arc<AmbientSession>>,
    /// Logical session name, set by `open` and released by `close`.
    session_name: Mutex<Option<String>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .field("session_name", &*self.session_name.lock())
            .field("has_ambient", &self.ambient.is_some())
            .finish()
    }
}

impl SessionStore {
    /// Create a store over `backend` using the wall clock.
    pub fn new(backend: Arc<dyn StoreBackend>, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            clock: Arc::new(SystemClock),
            ambient: None,
            session_name: Mutex::new(None),
        }
    }

    /// Use `clock` for `last_accessed` stamps and GC cutoffs.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach the ambient map that `destroy` clears.
    pub fn with_ambient(mut self, ambient: Arc<AmbientSession>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Get the store configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Name passed to the last `open`, until `close`.
    pub fn session_name(&self) -> Option<String> {
        self.session_name.lock().clone()
    }

    /// Start a request cycle for `session_name` and maybe run GC.
    ///
    /// Never fails. A sweep that errors is logged and dropped.
    pub fn open(&self, session_name: &str) {
        self.open_with_rng(session_name, &mut rand::rng());
    }

    /// [`open`](Self::open) with an explicit source of randomness.
    pub fn open_with_rng<R: Rng + ?Sized>(&self, session_name: &str, rng: &mut R) {
        *self.session_name.lock() = Some(session_name.to_string());
        trace!(session_name = %session_name, "Session opened");

        if !self.config.gclotto.draw(rng) {
            return;
        }

        let max_lifetime = self.config.max_lifetime_secs();
        match self.config.gc_mode {
            GcMode::Inline => {
                if let Err(e) = self.gc(max_lifetime) {
                    warn!(error = %e, "Session GC failed");
                }
            }
            GcMode::Background => self.spawn_gc(max_lifetime),
        }
    }

    /// Hand a sweep to the blocking pool, or run it inline without a runtime.
    fn spawn_gc(&self, max_lifetime: i64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No Tokio runtime, running session GC inline");
            if let Err(e) = self.gc(max_lifetime) {
                warn!(error = %e, "Session GC failed");
            }
            return;
        };

        let backend = Arc::clone(&self.backend);
        let table = self.config.table.clone();
        let filter = ExpiryFilter::new(max_lifetime, self.clock.now());
        handle.spawn_blocking(move || {
            if let Err(e) = sweep(backend.as_ref(), &table, &filter) {
                warn!(error = %e, "Background session GC failed");
            }
        });
    }

    /// Stored data for `id`, or an empty blob when there is no record.
    pub fn read(&self, id: &str) -> Result<Vec<u8>> {
        match self.backend.read_item(&self.config.table, id)? {
            Some(record) => {
                trace!(session_id = %id, bytes = record.data.len(), "Session read");
                Ok(record.data)
            }
            None => {
                trace!(session_id = %id, "No stored session");
                Ok(Vec::new())
            }
        }
    }

    /// Persist `data` for `id`, creating the record on first write.
    pub fn write(&self, id: &str, data: &[u8]) -> Result<()> {
        let table = &self.config.table;
        let now = self.clock.now();

        if self.backend.read_item(table, id)?.is_some() {
            self.backend.update_item(table, id, data, now)?;
            trace!(session_id = %id, bytes = data.len(), "Session updated");
        } else {
            self.backend
                .create_item(table, &SessionRecord::new(id, data, now))?;
            debug!(session_id = %id, bytes = data.len(), "Session created");
        }
        Ok(())
    }

    /// Delete the record for `id` and clear the ambient map.
    pub fn destroy(&self, id: &str) -> Result<()> {
        self.backend.delete_item(&self.config.table, id)?;
        if let Some(ambient) = &self.ambient {
            ambient.clear();
        }
        debug!(session_id = %id, "Session destroyed");
        Ok(())
    }

    /// Delete every record idle for more than `max_lifetime` seconds.
    ///
    /// Returns the number of records deleted.
    pub fn gc(&self, max_lifetime: i64) -> Result<usize> {
        let filter = ExpiryFilter::new(max_lifetime, self.clock.now());
        sweep(self.backend.as_ref(), &self.config.table, &filter)
    }

    /// End the request cycle.
    pub fn close(&self) {
        if let Some(name) = self.session_name.lock().take() {
            trace!(session_name = %name, "Session closed");
        }
    }
}

fn sweep(backend: &dyn StoreBackend, table: &str, filter: &ExpiryFilter) -> Result<usize> {
    let count = backend.delete_where(table, filter)?;
    if count > 0 {
        debug!(count = count, table = %table, "Collected expired sessions");
    }
    Ok(count)
}
