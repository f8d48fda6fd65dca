//! Connection settings for the job store (and, by reuse, the broker).
//!
//! Two sources are supported:
//!
//! | Env Var                              | Notes                                      |
//! |--------------------------------------|--------------------------------------------|
//! | `AZURE_POSTGRESQL_CONNECTIONSTRING`  | `host=..;dbname=..;user=..;password=..;Port=..`, forces TLS |
//! | `DATABASE_URL`                       | standard `postgres://` URL                  |
//! | `DB_MAX_CONNECTIONS`                 | pool size, default `20`                     |
//!
//! The Azure connection string wins when both are set.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::DEFAULT_MAX_CONNECTIONS;

/// Default PostgreSQL port when a connection string omits `Port`.
const DEFAULT_PORT: u16 = 5432;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Resolved store connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub connect_options: PgConnectOptions,
    pub max_connections: u32,
}

impl DbConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let connect_options = match lookup("AZURE_POSTGRESQL_CONNECTIONSTRING") {
            Some(conn) if !conn.trim().is_empty() => parse_azure_connection_string(&conn)?,
            _ => {
                let url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
                parse_database_url("DATABASE_URL", &url)?
            }
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS",
                message: format!("expected a positive integer, got '{raw}'"),
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            connect_options,
            max_connections,
        })
    }
}

/// Parse a PostgreSQL URL, assuming `postgres://` when no scheme is given.
///
/// `var` names the variable the URL came from, for error messages.
pub fn parse_database_url(var: &'static str, url: &str) -> Result<PgConnectOptions, ConfigError> {
    let url = url.trim();
    let url = if url.contains("://") {
        url.to_string()
    } else {
        format!("postgres://{url}")
    };

    PgConnectOptions::from_str(&url).map_err(|e| ConfigError::Invalid {
        var,
        message: e.to_string(),
    })
}

/// Parse a semicolon-separated `key=value` connection string.
///
/// Keys are matched case-insensitively; unknown keys are ignored. The
/// resulting options always require TLS.
pub fn parse_azure_connection_string(conn: &str) -> Result<PgConnectOptions, ConfigError> {
    const VAR: &str = "AZURE_POSTGRESQL_CONNECTIONSTRING";

    let mut options = PgConnectOptions::new_without_pgpass().ssl_mode(PgSslMode::Require);
    let mut has_host = false;

    for pair in conn.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "host" => {
                options = options.host(value);
                has_host = !value.is_empty();
            }
            "dbname" => options = options.database(value),
            "user" => options = options.username(value),
            "password" => options = options.password(value),
            "port" => {
                let port = value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                    var: VAR,
                    message: format!("Port must be a valid u16, got '{value}'"),
                })?;
                options = options.port(port);
            }
            _ => {}
        }
    }

    if !has_host {
        return Err(ConfigError::Invalid {
            var: VAR,
            message: "missing host".to_string(),
        });
    }

    if !conn.to_ascii_lowercase().contains("port=") {
        options = options.port(DEFAULT_PORT);
    }

    Ok(options)
}

/// Force TLS on an existing set of options.
pub fn require_tls(options: PgConnectOptions) -> PgConnectOptions {
    options.ssl_mode(PgSslMode::Require)
}
