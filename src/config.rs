//! # Configuration Management
//!
//! Centralized configuration for packet assembly.
//!
//! This module provides structured configuration for buffer growth limits,
//! buffer pooling, the part cache and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Limits
//! - Default growth limit (16 MB) stops a stray offset from allocating
//!   unbounded memory
//! - Pooled buffers above 4 KB are freed instead of recycled

use crate::error::{BufferError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Max size a packet buffer may grow to (16 MB)
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Largest buffer capacity a pool keeps for reuse (4 KB)
pub const MAX_POOLED_CAPACITY: usize = 4096;

/// Default capacity reserved for freshly allocated pooled buffers
pub const DEFAULT_POOLED_CAPACITY: usize = 1024;

/// Default time-to-live for cached parts
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PacketConfig {
    /// Buffer sizing
    #[serde(default)]
    pub buffer: BufferLimits,

    /// Buffer pool configuration
    #[serde(default)]
    pub pool: PoolConfig,

    /// Part cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PacketConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| BufferError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| BufferError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| BufferError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("PACKET_BUFFER_INITIAL_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.buffer.initial_size = val;
            }
        }

        if let Ok(size) = std::env::var("PACKET_BUFFER_MAX_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.buffer.max_size = val;
            }
        }

        if let Ok(size) = std::env::var("PACKET_BUFFER_POOL_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.pool.pool_size = val;
            }
        }

        if let Ok(ttl) = std::env::var("PACKET_BUFFER_CACHE_TTL_MS") {
            if let Ok(val) = ttl.parse::<u64>() {
                config.cache.ttl = Duration::from_millis(val);
            }
        }

        if let Ok(level) = std::env::var("PACKET_BUFFER_LOG_LEVEL") {
            if let Ok(val) = level.parse::<Level>() {
                config.logging.log_level = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BufferError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| BufferError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.buffer.validate());
        errors.extend(self.pool.validate());
        errors.extend(self.cache.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BufferError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Sizing for individual packet buffers
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BufferLimits {
    /// Number of unpopulated slots a new buffer starts with
    pub initial_size: usize,

    /// Length a buffer may never grow beyond
    pub max_size: usize,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            initial_size: 0,
            max_size: MAX_BUFFER_SIZE,
        }
    }
}

impl BufferLimits {
    /// Validate buffer sizing
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_size == 0 {
            errors.push("Max buffer size must be greater than 0".to_string());
        } else if self.max_size > 256 * 1024 * 1024 {
            errors.push(format!(
                "Max buffer size too large: {} bytes (maximum recommended: 256 MB)",
                self.max_size
            ));
        }

        if self.initial_size > self.max_size {
            errors.push(format!(
                "Initial buffer size {} exceeds max buffer size {}",
                self.initial_size, self.max_size
            ));
        }

        errors
    }
}

/// Buffer pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of buffers pre-allocated in the pool
    pub pool_size: usize,

    /// Capacity reserved for each pre-allocated buffer
    pub buffer_capacity: usize,

    /// Buffers whose capacity grew past this are freed instead of recycled
    pub max_pooled_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 50,
            buffer_capacity: DEFAULT_POOLED_CAPACITY,
            max_pooled_capacity: MAX_POOLED_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Validate pool configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.pool_size > 100_000 {
            errors.push(format!(
                "Pool size too large: {} (max recommended: 100,000)",
                self.pool_size
            ));
        }

        if self.buffer_capacity > self.max_pooled_capacity {
            errors.push(format!(
                "Pooled buffer capacity {} exceeds max pooled capacity {}",
                self.buffer_capacity, self.max_pooled_capacity
            ));
        }

        errors
    }
}

/// Part cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time an entry stays in the cache
    #[serde(with = "duration_serde")]
    pub ttl: Duration,

    /// Maximum number of entries before the oldest are evicted
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    /// Validate cache configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.ttl.as_millis() < 10 {
            errors.push("Cache TTL too short (minimum: 10ms)".to_string());
        }

        if self.max_entries == 0 {
            errors.push("Cache max entries must be greater than 0".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("packet-buffer"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        use crate::error::constants::{ERR_LOG_FILE_MISSING, ERR_NO_LOG_OUTPUT};

        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push(ERR_LOG_FILE_MISSING.to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors.push(ERR_NO_LOG_OUTPUT.to_string());
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
