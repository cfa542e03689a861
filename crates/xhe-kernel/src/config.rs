//! Kernel configuration.

use serde::{Deserialize, Serialize};
use xhe_kernel_core::content::DEFAULT_PREVIEW_LEN;
use xhe_kernel_core::GENESIS_BALANCE;

use crate::error::Result;

/// Configuration for the Kernel.
///
/// Missing fields take their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Balance granted to a new identity.
    pub genesis_balance: u64,
    /// Version stamped into every pulse.
    pub kernel_version: String,
    /// Characters kept in address index previews.
    pub preview_len: usize,
    /// Global feed length when the caller gives no limit.
    pub default_feed_limit: usize,
    /// Buffer size of the broadcast event channel.
    pub event_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            genesis_balance: GENESIS_BALANCE,
            kernel_version: env!("CARGO_PKG_VERSION").to_string(),
            preview_len: DEFAULT_PREVIEW_LEN,
            default_feed_limit: 50,
            event_capacity: 256,
        }
    }
}

impl KernelConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_genesis_balance(mut self, amount: u64) -> Self {
        self.genesis_balance = amount;
        self
    }

    pub fn with_kernel_version(mut self, version: impl Into<String>) -> Self {
        self.kernel_version = version.into();
        self
    }

    pub fn with_preview_len(mut self, len: usize) -> Self {
        self.preview_len = len;
        self
    }

    pub fn with_default_feed_limit(mut self, limit: usize) -> Self {
        self.default_feed_limit = limit;
        self
    }

    /// Broadcast buffer size; clamped to at least 1.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KernelConfig::default();
        assert_eq!(config.genesis_balance, 100);
        assert_eq!(config.preview_len, 50);
        assert_eq!(config.default_feed_limit, 50);
        assert_eq!(config.kernel_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_partial_json() {
        let config = KernelConfig::from_json(r#"{"genesis_balance": 500}"#).unwrap();
        assert_eq!(config.genesis_balance, 500);
        assert_eq!(config.default_feed_limit, 50);
    }

    #[test]
    fn test_bad_json() {
        assert!(KernelConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_builders() {
        let config = KernelConfig::default()
            .with_genesis_balance(0)
            .with_kernel_version("9.9.9")
            .with_event_capacity(0);
        assert_eq!(config.genesis_balance, 0);
        assert_eq!(config.kernel_version, "9.9.9");
        assert_eq!(config.event_capacity, 1);
    }
}
