//! PostgreSQL connection pool.
//!
//! The pool is created once at startup and shared by every request. It is
//! lazy: no connection is opened until the first query, so the server
//! starts (and reports unhealthy) while the database is unreachable.
//!
//! Connections are leased per query and returned to the pool on
//! completion, error, or cancellation of the awaiting task.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DbConfig;
use crate::error::ConfigError;

/// Build the shared pool from configuration.
///
/// `db.url` wins over the discrete host/port/user fields when set, and its
/// own `sslmode` is honored; `db.require_tls` applies to the discrete fields.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if `db.url` cannot be parsed.
pub fn connect(config: &DbConfig) -> Result<PgPool, ConfigError> {
    let options = connect_options(config)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy_with(options);

    Ok(pool)
}

fn connect_options(config: &DbConfig) -> Result<PgConnectOptions, ConfigError> {
    let options = match config.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => PgConnectOptions::from_str(url)
            .map_err(|e| ConfigError::Invalid(format!("DATABASE_URL: {e}")))?,
        None => {
            let mut options = PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .database(&config.database);
            if let Some(password) = &config.password {
                options = options.password(password);
            }
            // The pooler presents a certificate that is not verified, matching `sslmode=require`.
            if config.require_tls {
                options = options.ssl_mode(PgSslMode::Require);
            }
            options
        }
    };

    Ok(options)
}
