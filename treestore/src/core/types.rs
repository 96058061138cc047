//! Shared types passed between the store, its plugins, and watchers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Describes one executed mutation handler, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationDescriptor {
    /// Fully-qualified mutation type (e.g. `a/addA`).
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

/// How the strict-mode guard reacts to a write outside `commit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictMode {
    /// No guard is installed.
    #[default]
    Off,
    /// Violations are logged and counted.
    Warn,
    /// Violations are logged, counted, then escalated to a panic.
    Panic,
}

impl StrictMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, StrictMode::Off)
    }
}

/// Options for [`crate::Reactivity::watch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Compare the full selected value instead of only its top level.
    pub deep: bool,
    /// Run the callback inside the write that triggered it rather than on the
    /// next flush.
    pub sync: bool,
}

impl WatchOptions {
    /// Deep, synchronous watching: the options the strict-mode guard uses.
    pub fn deep_sync() -> Self {
        Self {
            deep: true,
            sync: true,
        }
    }
}
