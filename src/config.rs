//! Startup configuration.
//!
//! Configuration is read once, before any request is accepted, from an
//! optional TOML file and then overridden by environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SUPABASE_DB_PASSWORD` | `db.password` |
//! | `DATABASE_URL` | `db.url` |
//! | `OPENAI_API_KEY` | `embedding.api_key` |
//! | `PORT` | `server.port` |
//! | `MATCH_THRESHOLD` | `search.match_threshold` |
//!
//! Every section has defaults matching the production deployment, so an
//! empty file (or no file) plus the two credentials is a valid setup.
//!
//! ```toml
//! [db]
//! host = "aws-0-us-east-2.pooler.supabase.com"
//! port = 6543
//! table = "Phase2Website"
//!
//! [search]
//! match_threshold = 0.5
//! default_limit = 5
//! max_limit = 20
//!
//! [server]
//! port = 3000
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Full connection string; takes precedence over the discrete fields.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_db_name")]
    pub database: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_require_tls")]
    pub require_tls: bool,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: None,
            database: default_db_name(),
            table: default_table(),
            require_tls: default_require_tls(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_db_host() -> String {
    "aws-0-us-east-2.pooler.supabase.com".to_string()
}
fn default_db_port() -> u16 {
    6543
}
fn default_db_user() -> String {
    "postgres.ldfcmkqfcicjqmwiclur".to_string()
}
fn default_db_name() -> String {
    "postgres".to_string()
}
fn default_table() -> String {
    "Phase2Website".to_string()
}
fn default_require_tls() -> bool {
    true
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Minimum similarity (exclusive) for a document to be returned.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_match_threshold() -> f64 {
    0.5
}
fn default_limit() -> i64 {
    5
}
fn default_max_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Overlay environment variables onto the file-based settings.
    ///
    /// `lookup` abstracts `std::env::var` so tests can supply a fixed map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = lookup("SUPABASE_DB_PASSWORD") {
            self.db.password = Some(password);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.db.url = Some(url);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(threshold) = lookup("MATCH_THRESHOLD") {
            self.search.match_threshold = threshold.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("MATCH_THRESHOLD is not a number: {threshold}"))
            })?;
        }
        Ok(())
    }

    /// Check required credentials and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_db_credential = self.db.url.as_deref().is_some_and(|u| !u.is_empty())
            || self.db.password.as_deref().is_some_and(|p| !p.is_empty());
        if !has_db_credential {
            return Err(ConfigError::MissingCredential("SUPABASE_DB_PASSWORD"));
        }
        if !self.embedding.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            return Err(ConfigError::MissingCredential("OPENAI_API_KEY"));
        }

        let threshold = self.search.match_threshold;
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(
                "search.match_threshold must be in [-1.0, 1.0]".to_string(),
            ));
        }
        if self.search.max_limit < 1 {
            return Err(ConfigError::Invalid(
                "search.max_limit must be >= 1".to_string(),
            ));
        }
        if self.search.default_limit < 1 || self.search.default_limit > self.search.max_limit {
            return Err(ConfigError::Invalid(format!(
                "search.default_limit must be in [1, {}]",
                self.search.max_limit
            )));
        }
        if !is_safe_identifier(&self.db.table) {
            return Err(ConfigError::Invalid(format!(
                "db.table is not a plain identifier: '{}'",
                self.db.table
            )));
        }
        if self.db.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "db.max_connections must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Table names are interpolated into SQL, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Load and validate the configuration.
///
/// Reads `path` when given, falls back to defaults otherwise, then applies
/// the process environment and validates the result.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => Config::default(),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn credentials() -> Vec<(&'static str, &'static str)> {
        vec![("SUPABASE_DB_PASSWORD", "pw"), ("OPENAI_API_KEY", "sk-test")]
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.db.port, 6543);
        assert_eq!(config.db.table, "Phase2Website");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.search.match_threshold, 0.5);
        assert_eq!(config.search.default_limit, 5);
        assert_eq!(config.search.max_limit, 20);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let mut vars = credentials();
        vars.push(("PORT", "8080"));
        vars.push(("MATCH_THRESHOLD", "0.7"));
        config.apply_env(env(&vars)).unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.search.match_threshold, 0.7);
        assert_eq!(config.db.password.as_deref(), Some("pw"));
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_missing_db_password() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential("SUPABASE_DB_PASSWORD")
        ));
    }

    #[test]
    fn test_database_url_satisfies_db_credential() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("DATABASE_URL", "postgres://u:p@localhost/db"),
                ("OPENAI_API_KEY", "sk-test"),
            ]))
            .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_openai_key() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("SUPABASE_DB_PASSWORD", "pw")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("OPENAI_API_KEY")));
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let mut config = Config::default();
        let mut vars = credentials();
        vars.push(("MATCH_THRESHOLD", "high"));
        assert!(config.apply_env(env(&vars)).is_err());

        let mut config = Config::default();
        config.apply_env(env(&credentials())).unwrap();
        config.search.match_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_limit_above_max_rejected() {
        let mut config = Config::default();
        config.apply_env(env(&credentials())).unwrap();
        config.search.default_limit = 25;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_table_identifier() {
        assert!(is_safe_identifier("Phase2Website"));
        assert!(is_safe_identifier("_docs_v2"));
        assert!(!is_safe_identifier("2docs"));
        assert!(!is_safe_identifier("docs\"; DROP TABLE x; --"));
        assert!(!is_safe_identifier(""));
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: Config = toml::from_str(
            r#"
[db]
table = "SiteContent"
max_connections = 10

[search]
match_threshold = 0.3

[logging]
json = true
"#,
        )
        .unwrap();
        assert_eq!(config.db.table, "SiteContent");
        assert_eq!(config.db.max_connections, 10);
        assert_eq!(config.db.port, 6543);
        assert_eq!(config.search.match_threshold, 0.3);
        assert_eq!(config.search.default_limit, 5);
        assert!(config.logging.json);
    }
}
