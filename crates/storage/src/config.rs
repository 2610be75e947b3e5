use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:vocab.sqlite3";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the `SQLite` backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Read settings from `VOCAB_DB_URL`, `VOCAB_DB_MAX_CONNECTIONS` and
    /// `VOCAB_DB_ACQUIRE_TIMEOUT_SECS`. Missing or unparsable values fall back
    /// to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let database_url = lookup("VOCAB_DB_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.database_url);
        let max_connections = lookup("VOCAB_DB_MAX_CONNECTIONS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_connections);
        let acquire_timeout = lookup("VOCAB_DB_ACQUIRE_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(defaults.acquire_timeout, Duration::from_secs);

        Self {
            database_url,
            max_connections,
            acquire_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = StorageConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, StorageConfig::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = StorageConfig::from_lookup(lookup_from(&[
            ("VOCAB_DB_URL", "sqlite::memory:"),
            ("VOCAB_DB_MAX_CONNECTIONS", "2"),
            ("VOCAB_DB_ACQUIRE_TIMEOUT_SECS", "30"),
        ]));
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = StorageConfig::from_lookup(lookup_from(&[
            ("VOCAB_DB_URL", "   "),
            ("VOCAB_DB_MAX_CONNECTIONS", "0"),
            ("VOCAB_DB_ACQUIRE_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config, StorageConfig::default());
    }
}
