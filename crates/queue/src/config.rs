use jobrelay_db::connection::{parse_database_url, require_tls, ConfigError};
use jobrelay_db::DbPool;
use sqlx::postgres::PgConnectOptions;

/// Default pool size for a dedicated broker connection.
const DEFAULT_BROKER_MAX_CONNECTIONS: u32 = 10;

/// Broker connection settings.
///
/// | Env Var              | Default                                |
/// |----------------------|----------------------------------------|
/// | `BROKER_URL`         | unset: share the job store's pool      |
/// | `BROKER_REQUIRE_TLS` | `false` (forces `sslmode=require`)     |
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// `None` when the broker shares the job store's database.
    pub connect_options: Option<PgConnectOptions>,
    pub max_connections: u32,
}

impl BrokerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = match lookup("BROKER_REQUIRE_TLS") {
            Some(raw) => parse_bool("BROKER_REQUIRE_TLS", &raw)?,
            None => false,
        };

        let connect_options = lookup("BROKER_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| parse_database_url("BROKER_URL", &url))
            .transpose()?
            .map(|options| if require { require_tls(options) } else { options });

        Ok(Self {
            connect_options,
            max_connections: DEFAULT_BROKER_MAX_CONNECTIONS,
        })
    }

    /// Whether the broker shares the job store's pool.
    pub fn is_shared(&self) -> bool {
        self.connect_options.is_none()
    }

    /// Open the broker pool, or reuse `store` when no `BROKER_URL` is set.
    pub async fn connect(&self, store: &DbPool) -> Result<DbPool, sqlx::Error> {
        match &self.connect_options {
            Some(options) => jobrelay_db::connect(options.clone(), self.max_connections).await,
            None => Ok(store.clone()),
        }
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
