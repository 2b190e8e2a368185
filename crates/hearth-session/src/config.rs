//! Configuration for the session store.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gc::GcLotto;

/// Default idle lifetime of a session, in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 120;

/// How a GC sweep triggered by the lottery is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GcMode {
    /// Run the sweep synchronously inside `open`.
    #[default]
    Inline,

    /// Hand the sweep to Tokio's blocking pool when a runtime is available.
    /// Falls back to inline execution otherwise.
    Background,
}

/// Configuration for a [`SessionStore`](crate::SessionStore).
///
/// Set once at construction. Field names match the TOML surface:
///
/// ```toml
/// table = "sessions"
/// timeout = 120
/// gclotto = [1, 100]
/// gc_mode = "inline"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Backing collection the store operates against.
    pub table: String,

    /// Max idle lifetime in minutes before a record is GC-eligible.
    pub timeout: u64,

    /// GC trigger probability as `(odds, max)`.
    pub gclotto: GcLotto,

    /// Execution mode for lottery-triggered sweeps.
    pub gc_mode: GcMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            timeout: DEFAULT_TIMEOUT_MINUTES,
            gclotto: GcLotto::default(),
            gc_mode: GcMode::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Set the backing table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the idle timeout in minutes.
    pub fn with_timeout(mut self, minutes: u64) -> Self {
        self.timeout = minutes;
        self
    }

    /// Set the GC lottery odds.
    pub fn with_gc_lotto(mut self, odds: i64, max: i64) -> Self {
        self.gclotto = GcLotto::new(odds, max);
        self
    }

    /// Set the GC execution mode.
    pub fn with_gc_mode(mut self, mode: GcMode) -> Self {
        self.gc_mode = mode;
        self
    }

    /// Idle timeout in seconds, the unit of `last_accessed`.
    pub fn max_lifetime_secs(&self) -> i64 {
        i64::try_from(self.timeout.saturating_mul(60)).unwrap_or(i64::MAX)
    }
}
