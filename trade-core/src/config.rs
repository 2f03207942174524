//! Configuration for the engine

use docstore::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Transaction retry configuration
    pub transaction: TransactionConfig,

    /// Allocation configuration
    pub allocation: AllocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "trade-core".to_string(),
            transaction: TransactionConfig::default(),
            allocation: AllocationConfig::default(),
        }
    }
}

/// Transaction retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Maximum commit attempts per logical operation
    pub max_attempts: u32,

    /// Pause between attempts (milliseconds)
    pub backoff_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_ms: 10,
        }
    }
}

/// Allocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Oversampling factor used when a SKU does not carry its own.
    /// Widens the shard candidate window to keep concurrent allocations
    /// from racing for the same minimal candidate set.
    pub default_number_of_fetch: u32,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            default_number_of_fetch: 2,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(attempts) = std::env::var("TRADE_MAX_ATTEMPTS") {
            config.transaction.max_attempts = attempts
                .parse()
                .map_err(|e| crate::Error::Config(format!("TRADE_MAX_ATTEMPTS: {}", e)))?;
        }

        if let Ok(fetch) = std::env::var("TRADE_NUMBER_OF_FETCH") {
            config.allocation.default_number_of_fetch = fetch
                .parse()
                .map_err(|e| crate::Error::Config(format!("TRADE_NUMBER_OF_FETCH: {}", e)))?;
        }

        Ok(config)
    }

    /// Retry policy handed to the document store
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.transaction.max_attempts,
            backoff: Duration::from_millis(self.transaction.backoff_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "trade-core");
        assert_eq!(config.transaction.max_attempts, 5);
        assert_eq!(config.allocation.default_number_of_fetch, 2);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
service_name = "checkout"

[transaction]
max_attempts = 8
backoff_ms = 25

[allocation]
default_number_of_fetch = 3
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.service_name, "checkout");
        assert_eq!(config.transaction.max_attempts, 8);
        assert_eq!(config.retry_policy().backoff, Duration::from_millis(25));
        assert_eq!(config.allocation.default_number_of_fetch, 3);
    }
}
