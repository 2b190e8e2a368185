//! The ambient session map for the current request.

use parking_lot::Mutex;

use crate::error::{Result, SessionError};
use crate::value::{SessionMap, SessionValue};

/// In-memory key/value state of the session being served.
///
/// Shared between the [`SessionManager`](crate::SessionManager), which reads
/// and writes it, and the [`SessionStore`](crate::SessionStore), which clears
/// it when the session is destroyed.
#[derive(Debug, Default)]
pub struct AmbientSession {
    values: Mutex<SessionMap>,
}

impl AmbientSession {
    /// Create an empty ambient map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored at `key`.
    pub fn get(&self, key: &str) -> Option<SessionValue> {
        self.values.lock().get(key).cloned()
    }

    /// Set or overwrite `key`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<SessionValue>) {
        self.values.lock().insert(key.into(), value.into());
    }

    /// Merge `incoming` into the mapping at `key`.
    ///
    /// Incoming entries override existing ones with the same name. An absent
    /// key starts from an empty mapping; any other non-mapping value is left
    /// untouched and reported as [`SessionError::MergeTarget`].
    pub fn merge(&self, key: &str, incoming: SessionMap) -> Result<()> {
        let mut values = self.values.lock();
        match values
            .entry(key.to_string())
            .or_insert_with(|| SessionValue::Map(SessionMap::new()))
        {
            SessionValue::Map(existing) => {
                existing.extend(incoming);
                Ok(())
            }
            _ => Err(SessionError::MergeTarget {
                key: key.to_string(),
            }),
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&self, key: &str) -> Option<SessionValue> {
        self.values.lock().remove(key)
    }

    /// Remove every key.
    pub fn clear(&self) {
        self.values.lock().clear();
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Whether the map holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// Copy of the whole map.
    pub fn snapshot(&self) -> SessionMap {
        self.values.lock().clone()
    }

    /// Replace the whole map.
    pub fn replace(&self, map: SessionMap) {
        *self.values.lock() = map;
    }

    /// Serialize the map into a stored blob.
    ///
    /// JSON has no NaN or infinity, so a non-finite float anywhere in the map
    /// is rejected with [`SessionError::NonFiniteFloat`] rather than stored as
    /// `null`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let values = self.values.lock();
        if let Some((key, _)) = values.iter().find(|(_, v)| v.has_non_finite_float()) {
            return Err(SessionError::NonFiniteFloat { key: key.clone() });
        }
        Ok(serde_json::to_vec(&*values)?)
    }

    /// Replace the map with the contents of a stored blob. An empty blob is an
    /// empty session. On error the map is left unchanged.
    pub fn load(&self, blob: &[u8]) -> Result<()> {
        self.replace(decode_map(blob)?);
        Ok(())
    }
}

/// Decode a stored blob into a session map.
pub fn decode_map(blob: &[u8]) -> Result<SessionMap> {
    if blob.is_empty() {
        return Ok(SessionMap::new());
    }
    Ok(serde_json::from_slice(blob)?)
}
