// ⚙️ Configuration from environment (optionally seeded by a .env file)

use crate::entities::Language;
use crate::error::Result;
use std::env;
use std::path::PathBuf;
use std::sync::Once;

pub const DEFAULT_DB_PATH: &str = "./data/couple-ledger.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
    pub default_language: Language,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            default_language: Language::English,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing or blank keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Config::default();

        let default_language = match get("DEFAULT_LANGUAGE") {
            Some(code) => code.parse::<Language>()?,
            None => defaults.default_language,
        };

        Ok(Config {
            db_path: get("DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            default_language,
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

        fmt().with_env_filter(filter).with_target(false).init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.db_path, PathBuf::from("./data/couple-ledger.db"));
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DB_PATH", "/tmp/x.db"),
            ("LOG_LEVEL", "debug"),
            ("DEFAULT_LANGUAGE", "es_AR"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.default_language, Language::SpanishArgentina);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = Config::from_lookup(lookup(&[("LOG_LEVEL", "  ")])).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_language_is_error() {
        assert!(Config::from_lookup(lookup(&[("DEFAULT_LANGUAGE", "klingon")])).is_err());
    }
}
