//! Configuration for the store.
//!
//! # Example
//!
//! ```
//! use treewatch::StoreConfig;
//!
//! // Minimal config (uses defaults)
//! let config = StoreConfig::default();
//! assert_eq!(config.sweep_delay_ms, 1000);
//!
//! // Full config
//! let config = StoreConfig {
//!     sweep_delay_ms: 250,
//!     default_watch_buffer: 128,
//! };
//! assert_eq!(config.default_watch_buffer, 128);
//! ```

use serde::Deserialize;

/// Configuration for the store.
///
/// All fields have sensible defaults; `StoreConfig::default()` is fine for
/// most embedders.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Delay before the sweeper prunes a branch left empty by a watcher
    /// removal, in milliseconds (default: 1000). Deletes prune eagerly;
    /// only watcher teardown goes through the sweeper.
    #[serde(default = "default_sweep_delay_ms")]
    pub sweep_delay_ms: u64,

    /// Event buffer capacity used when `watch` is called with a buffer
    /// size of zero (default: 64).
    #[serde(default = "default_watch_buffer")]
    pub default_watch_buffer: usize,
}

fn default_sweep_delay_ms() -> u64 {
    1000
}
fn default_watch_buffer() -> usize {
    64
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_delay_ms: default_sweep_delay_ms(),
            default_watch_buffer: default_watch_buffer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.sweep_delay_ms, 1000);
        assert_eq!(config.default_watch_buffer, 64);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: StoreConfig = serde_json::from_str(r#"{"sweep_delay_ms": 50}"#).unwrap();
        assert_eq!(config.sweep_delay_ms, 50);
        assert_eq!(config.default_watch_buffer, 64);
    }
}
