//! Store configuration.
//!
//! Settings come from the environment (with `.env` support) or from a TOML
//! file, then can be adjusted with builder methods:
//!
//! ```toml
//! [database]
//! url = "postgres://${PGUSER}@localhost/jobly"
//! pool_max_size = 16
//! query_timeout_ms = 5000
//! slow_query_ms = 250
//! ```

use crate::error::{StoreError, StoreResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_POOL_MAX_SIZE: usize = 16;

/// Connection, pool and per-call timing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub pool_max_size: usize,
    /// Per-call timeout. `None` leaves timing to the server.
    pub query_timeout: Option<Duration>,
    /// Calls slower than this are logged at WARN.
    pub slow_query_threshold: Option<Duration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    database: DatabaseSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseSection {
    url: String,
    pool_max_size: Option<usize>,
    query_timeout_ms: Option<u64>,
    slow_query_ms: Option<u64>,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
            query_timeout: None,
            slow_query_threshold: None,
        }
    }

    pub fn pool_max_size(mut self, max_size: usize) -> Self {
        self.pool_max_size = max_size;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Read settings from the process environment, loading `.env` first if present.
    ///
    /// - `DATABASE_URL` (required)
    /// - `JOBLY_POOL_MAX_SIZE`
    /// - `JOBLY_QUERY_TIMEOUT_MS`
    /// - `JOBLY_SLOW_QUERY_MS`
    pub fn from_env() -> StoreResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`StoreConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| StoreError::Config("DATABASE_URL must be set".to_string()))?;

        let mut config = Self::new(database_url);
        if let Some(raw) = lookup("JOBLY_POOL_MAX_SIZE") {
            config.pool_max_size = parse_number("JOBLY_POOL_MAX_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("JOBLY_QUERY_TIMEOUT_MS") {
            config.query_timeout = millis(parse_number("JOBLY_QUERY_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = lookup("JOBLY_SLOW_QUERY_MS") {
            config.slow_query_threshold = millis(parse_number("JOBLY_SLOW_QUERY_MS", &raw)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file. `${VAR}` references are expanded from the environment.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> StoreResult<Self> {
        let file: ConfigFile = toml::from_str(raw)
            .map_err(|e| StoreError::Config(format!("failed to parse config: {e}")))?;
        let db = file.database;

        let mut config = Self::new(expand_env_vars(&db.url)?);
        if let Some(n) = db.pool_max_size {
            config.pool_max_size = n;
        }
        config.query_timeout = db.query_timeout_ms.and_then(millis);
        config.slow_query_threshold = db.slow_query_ms.and_then(millis);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> StoreResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(StoreError::Config("database url must not be empty".to_string()));
        }
        if self.pool_max_size == 0 {
            return Err(StoreError::Config("pool_max_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

// Zero disables the setting.
fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> StoreResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| StoreError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn expand_env_vars(input: &str) -> StoreResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            StoreError::Config(format!("unterminated env var reference in {input:?}"))
        })?;
        let key = &after[..end];
        if key.is_empty() {
            return Err(StoreError::Config("invalid env var reference: ${}".to_string()));
        }
        let value = std::env::var(key).map_err(|_| {
            StoreError::Config(format!("missing env var for config expansion: {key}"))
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
