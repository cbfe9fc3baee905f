use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_DELAY_MS: u64 = 60_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_KEY_PREFIX: &str = "saga_execution";

/// Orchestrator settings.
///
/// Loaded from TOML; every field is optional:
///
/// ```toml
/// base_delay_ms = 1000
/// max_delay_ms = 60000
/// default_max_retries = 3
/// default_timeout_ms = 30000
/// retention_secs = 604800
/// key_prefix = "saga_execution"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    base_delay_ms: u64,
    max_delay_ms: u64,
    default_max_retries: u32,
    default_timeout_ms: u64,
    retention_secs: u64,
    key_prefix: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            default_max_retries: DEFAULT_MAX_RETRIES,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            retention_secs: DEFAULT_RETENTION_SECS,
            key_prefix: String::from(DEFAULT_KEY_PREFIX),
        }
    }
}

impl OrchestratorConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML or unknown keys, and
    /// `ConfigError::Invalid` if the values fail validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, otherwise the
    /// errors of [`OrchestratorConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_retries == 0 {
            return Err(ConfigError::Invalid(
                "default_max_retries must be at least 1".to_string(),
            ));
        }
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "default_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.retention_secs == 0 {
            return Err(ConfigError::Invalid(
                "retention_secs must be greater than 0".to_string(),
            ));
        }
        if self.key_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "key_prefix must not be empty".to_string(),
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "max_delay_ms ({}) must not be less than base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    #[must_use]
    pub fn default_max_retries(&self) -> u32 {
        self.default_max_retries
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Store key for an execution record.
    #[must_use]
    pub fn record_key(&self, saga_id: &str) -> String {
        format!("{}:{saga_id}", self.key_prefix)
    }

    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = duration_millis(delay);
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = duration_millis(delay);
        self
    }

    #[must_use]
    pub fn with_default_max_retries(mut self, max_retries: u32) -> Self {
        self.default_max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = duration_millis(timeout);
        self
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention_secs = retention.as_secs();
        self
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
