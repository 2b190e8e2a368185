//! Session facade: store registration and the ambient session map.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ambient::{AmbientSession, decode_map};
use crate::backend::StoreBackend;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::store::SessionStore;
use crate::value::{SessionMap, SessionValue};

/// Identity of the session being served.
#[derive(Debug, Default)]
struct ActiveSession {
    name: Option<String>,
    id: Option<String>,
}

/// Single point of session bootstrap and access.
///
/// Construct one per host and pass it to whatever serves requests. The first
/// [`register`](Self::register) installs the store; later calls are no-ops.
/// Between [`start_session`](Self::start_session) and
/// [`commit`](Self::commit) the accessors read and write the ambient map,
/// which is loaded from and flushed to the stored blob.
#[derive(Debug, Default)]
pub struct SessionManager {
    store: OnceLock<Arc<SessionStore>>,
    ambient: Arc<AmbientSession>,
    active: Mutex<ActiveSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and install a store over `backend`.
    ///
    /// Returns false without touching anything when a store is already
    /// registered, so the first configuration wins.
    pub fn register(&self, backend: Arc<dyn StoreBackend>, config: SessionConfig) -> bool {
        if self.store.get().is_some() {
            debug!("Session store already registered");
            return false;
        }
        self.register_store(SessionStore::new(backend, config))
    }

    /// Install a pre-built store, attaching this manager's ambient map.
    pub fn register_store(&self, store: SessionStore) -> bool {
        let store = store.with_ambient(Arc::clone(&self.ambient));
        let table = store.config().table.clone();
        let installed = self.store.set(Arc::new(store)).is_ok();
        if installed {
            info!(table = %table, "Session store registered");
        }
        installed
    }

    /// Whether a store has been registered.
    pub fn is_registered(&self) -> bool {
        self.store.get().is_some()
    }

    /// The registered store.
    pub fn store(&self) -> Result<&Arc<SessionStore>> {
        self.store.get().ok_or(SessionError::NotRegistered)
    }

    /// Open the session `name` with identifier `id` and load its map.
    ///
    /// A fresh identifier is generated when `id` is `None`. Returns the
    /// identifier in use.
    ///
    /// If the stored data cannot be read or decoded, the ambient map is
    /// emptied and the store closed before the error is returned.
    pub fn start_session(&self, name: &str, id: Option<&str>) -> Result<String> {
        let store = self.store()?;
        let id = id.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

        store.open(name);
        let map = match store.read(&id).and_then(|blob| decode_map(&blob)) {
            Ok(map) => map,
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to load session");
                self.ambient.clear();
                store.close();
                self.end();
                return Err(e);
            }
        };
        self.ambient.replace(map);

        let mut active = self.active.lock();
        active.name = Some(name.to_string());
        active.id = Some(id.clone());
        debug!(session_id = %id, session_name = %name, keys = self.ambient.len(), "Session started");
        Ok(id)
    }

    /// Identifier of the started session.
    pub fn session_id(&self) -> Option<String> {
        self.active.lock().id.clone()
    }

    /// Name of the started session.
    pub fn session_name(&self) -> Option<String> {
        self.active.lock().name.clone()
    }

    /// Flush the ambient map to the store and close the session.
    pub fn commit(&self) -> Result<()> {
        let store = self.store()?;
        let id = self.active_id()?;

        store.write(&id, &self.ambient.encode()?)?;
        store.close();
        self.end();
        debug!(session_id = %id, "Session committed");
        Ok(())
    }

    /// Delete the started session, clear the ambient map and close.
    pub fn destroy(&self) -> Result<()> {
        let store = self.store()?;
        let id = self.active_id()?;

        store.destroy(&id)?;
        store.close();
        self.end();
        Ok(())
    }

    fn active_id(&self) -> Result<String> {
        self.active
            .lock()
            .id
            .clone()
            .ok_or(SessionError::NoActiveSession)
    }

    fn end(&self) {
        *self.active.lock() = ActiveSession::default();
    }

    // ── Ambient map ─────────────────────────────────────────────────

    /// Value at `key`.
    pub fn get(&self, key: &str) -> Option<SessionValue> {
        self.ambient.get(key)
    }

    /// Value at `key`, or `fallback` when absent.
    pub fn get_or(&self, key: &str, fallback: impl Into<SessionValue>) -> SessionValue {
        self.ambient.get(key).unwrap_or_else(|| fallback.into())
    }

    /// Set or overwrite `key`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<SessionValue>) {
        self.ambient.set(key, value);
    }

    /// Merge `values` into the mapping at `key`. See [`AmbientSession::merge`].
    pub fn merge(&self, key: &str, values: SessionMap) -> Result<()> {
        self.ambient.merge(key, values)
    }

    /// Remove `key` if present.
    pub fn remove(&self, key: &str) {
        self.ambient.remove(key);
    }

    /// Empty the ambient map.
    pub fn clear(&self) {
        self.ambient.clear();
    }

    /// Copy of the ambient map.
    pub fn snapshot(&self) -> SessionMap {
        self.ambient.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, SessionRecord, StoreBackend};

    fn registered(backend: &Arc<MemoryBackend>) -> SessionManager {
        let manager = SessionManager::new();
        assert!(manager.register(
            backend.clone(),
            SessionConfig::new().with_table("sessions").with_gc_lotto(0, 1),
        ));
        manager
    }

    #[test]
    fn test_register_is_idempotent() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = registered(&backend);

        let second = manager.register(
            Arc::new(MemoryBackend::new()),
            SessionConfig::new().with_table("other").with_timeout(1),
        );
        assert!(!second);
        let config = manager.store().unwrap().config();
        assert_eq!(config.table, "sessions");
        assert_eq!(config.timeout, 120);
    }

    #[test]
    fn test_unregistered() {
        let manager = SessionManager::new();
        assert!(!manager.is_registered());
        assert!(matches!(
            manager.start_session("SID", None),
            Err(SessionError::NotRegistered)
        ));
        assert!(matches!(manager.commit(), Err(SessionError::NotRegistered)));
    }

    #[test]
    fn test_commit_without_session() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = registered(&backend);
        assert!(matches!(manager.commit(), Err(SessionError::NoActiveSession)));
        assert!(matches!(manager.destroy(), Err(SessionError::NoActiveSession)));
    }

    #[test]
    fn test_round_trip_through_store() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = registered(&backend);

        let id = manager.start_session("SID", None).unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(manager.session_name().as_deref(), Some("SID"));
        manager.set("user", "ada");
        manager.set("visits", 1i64);
        manager.commit().unwrap();

        assert_eq!(manager.session_id(), None);
        assert_eq!(backend.len("sessions"), 1);

        manager.clear();
        let same = manager.start_session("SID", Some(&id)).unwrap();
        assert_eq!(same, id);
        assert_eq!(manager.get("user"), Some("ada".into()));
        assert_eq!(manager.get_or("visits", 0i64), SessionValue::Int(1));
        assert_eq!(manager.get_or("missing", "dflt"), SessionValue::from("dflt"));
    }

    #[test]
    fn test_start_replaces_stale_ambient_state() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = registered(&backend);
        manager.set("leftover", true);

        manager.start_session("SID", Some("fresh")).unwrap();
        assert_eq!(manager.get("leftover"), None);
    }

    #[test]
    fn test_destroy_clears_everything() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = registered(&backend);

        let id = manager.start_session("SID", None).unwrap();
        manager.set("user", "ada");
        manager.commit().unwrap();

        manager.start_session("SID", Some(&id)).unwrap();
        assert!(manager.get("user").is_some());
        manager.destroy().unwrap();

        assert!(manager.snapshot().is_empty());
        assert!(backend.is_empty("sessions"));
        assert_eq!(manager.session_id(), None);
    }

    #[test]
    fn test_failed_start_does_not_leak_previous_session() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = registered(&backend);

        manager.start_session("SID", Some("alice")).unwrap();
        manager.set("user", "alice");
        manager.commit().unwrap();

        backend
            .create_item("sessions", &SessionRecord::new("bob", b"not json".to_vec(), 0))
            .unwrap();
        manager.start_session("SID", Some("alice")).unwrap();
        assert_eq!(manager.get("user"), Some("alice".into()));

        let result = manager.start_session("SID", Some("bob"));
        assert!(matches!(result, Err(SessionError::Serialization(_))));
        assert_eq!(manager.get("user"), None);
        assert!(manager.snapshot().is_empty());
        assert_eq!(manager.session_id(), None);
        assert_eq!(manager.store().unwrap().session_name(), None);
        assert!(matches!(manager.commit(), Err(SessionError::NoActiveSession)));
    }

    #[test]
    fn test_merge_and_remove() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = registered(&backend);

        let mut existing = SessionMap::new();
        existing.insert("b".into(), 2i64.into());
        manager.set("prefs", existing);

        let mut incoming = SessionMap::new();
        incoming.insert("a".into(), 1i64.into());
        manager.merge("prefs", incoming).unwrap();

        let prefs = manager.get("prefs").unwrap();
        let prefs = prefs.as_map().unwrap();
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs["a"], SessionValue::Int(1));
        assert_eq!(prefs["b"], SessionValue::Int(2));

        manager.remove("prefs");
        manager.remove("prefs");
        assert_eq!(manager.get("prefs"), None);
    }
}
