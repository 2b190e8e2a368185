//! Server-side session persistence.
//!
//! This crate stores per-session key/value state in a backing table keyed by
//! session identifier:
//! - Read-before-write upserts of whole-session blobs
//! - Probabilistic garbage collection of idle sessions on open
//! - A request-scoped facade over the ambient session map
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hearth_session::{SessionConfig, SessionManager, SqliteBackend};
//!
//! let backend = Arc::new(SqliteBackend::open(path)?);
//! let sessions = SessionManager::new();
//! sessions.register(backend, SessionConfig::new().with_table("sessions"));
//!
//! let id = sessions.start_session("SID", cookie_value)?;
//! sessions.set("user", "ada");
//! sessions.commit()?;
//! ```

mod ambient;
mod backend;
mod clock;
mod config;
mod error;
mod gc;
mod manager;
mod sqlite;
mod store;
mod value;

pub use ambient::{AmbientSession, decode_map};
pub use backend::{MemoryBackend, SessionRecord, StoreBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_TIMEOUT_MINUTES, GcMode, SessionConfig};
pub use error::{Result, SessionError};
pub use gc::{ExpiryFilter, GcLotto};
pub use manager::SessionManager;
pub use sqlite::SqliteBackend;
pub use store::SessionStore;
pub use value::{SessionMap, SessionValue};
