use std::time::Duration;

use status_common::{env_flag, env_opt, env_or};
use thiserror::Error;
use tokio_postgres::config::SslMode;
use tokio_postgres::Config;

use crate::pool::PoolSettings;

const DEFAULT_DB_PORT: u16 = 26257;
const DEFAULT_SSL_MODE: &str = "verify-full";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is invalid: {0}")]
    InvalidUrl(#[source] tokio_postgres::Error),
    #[error("set DATABASE_URL or DB_HOST, DB_USER, DB_NAME")]
    MissingDatabase,
    #[error("unsupported sslmode {0:?}")]
    InvalidSslMode(String),
}

#[derive(Clone)]
pub struct IngestConfig {
    pub port: u16,
    pub database: Config,
    pub pool_size: u32,
    pub acquire_timeout: Duration,
    pub max_tx_attempts: u32,
    pub request_timeout: Duration,
    pub bootstrap_schema: bool,
}

/// Connection parts used when no `DATABASE_URL` is given.
#[derive(Debug, Default, Clone)]
pub struct DatabaseParts {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub routing_id: Option<String>,
    pub ssl_mode: Option<String>,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut database = match env_opt::<String>("DATABASE_URL") {
            Some(url) => database_from_url(&url)?,
            None => database_from_parts(&DatabaseParts::from_env())?,
        };
        if let Some(mode) = env_opt::<String>("DB_SSLMODE") {
            database.ssl_mode(parse_ssl_mode(&mode)?);
        }

        Ok(Self {
            port: env_or("PORT", 8080u16),
            database,
            pool_size: env_or("DB_POOL_SIZE", default_pool_size()),
            acquire_timeout: Duration::from_millis(env_or("DB_ACQUIRE_TIMEOUT_MS", 5000u64)),
            max_tx_attempts: env_or("TX_MAX_ATTEMPTS", 3u32),
            request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 15u64)),
            bootstrap_schema: env_flag("SCHEMA_BOOTSTRAP", true),
        })
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            size: self.pool_size,
            acquire_timeout: self.acquire_timeout,
        }
    }
}

impl DatabaseParts {
    pub fn from_env() -> Self {
        Self {
            host: env_opt("DB_HOST"),
            port: env_opt("DB_PORT"),
            user: env_opt("DB_USER"),
            password: env_opt("DB_PASSWORD"),
            name: env_opt("DB_NAME"),
            routing_id: env_opt("DB_ROUTING_ID"),
            ssl_mode: env_opt("DB_SSLMODE"),
        }
    }
}

/// Connections per core, as recommended for CockroachDB.
fn default_pool_size() -> u32 {
    std::thread::available_parallelism()
        .map(|cores| u32::try_from(cores.get() * 4).unwrap_or(u32::MAX))
        .unwrap_or(8)
}

/// libpq sslmode names. The rustls connector always checks the chain and
/// host name, so `verify-ca` and `verify-full` both mean "require TLS".
pub fn parse_ssl_mode(value: &str) -> Result<SslMode, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "disable" => Ok(SslMode::Disable),
        "prefer" | "allow" => Ok(SslMode::Prefer),
        "require" | "verify-ca" | "verify-full" => Ok(SslMode::Require),
        other => Err(ConfigError::InvalidSslMode(other.to_string())),
    }
}

pub fn database_from_url(url: &str) -> Result<Config, ConfigError> {
    // The driver's own parser only knows disable/prefer/require.
    let url = url
        .replace("sslmode=verify-full", "sslmode=require")
        .replace("sslmode=verify-ca", "sslmode=require");
    url.parse::<Config>().map_err(ConfigError::InvalidUrl)
}

pub fn database_from_parts(parts: &DatabaseParts) -> Result<Config, ConfigError> {
    let (Some(host), Some(user), Some(name)) = (&parts.host, &parts.user, &parts.name) else {
        return Err(ConfigError::MissingDatabase);
    };

    let mut config = Config::new();
    config
        .host(host)
        .port(parts.port.unwrap_or(DEFAULT_DB_PORT))
        .user(user)
        // CockroachDB folds database names to lower case.
        .dbname(&name.to_lowercase())
        .ssl_mode(parse_ssl_mode(
            parts.ssl_mode.as_deref().unwrap_or(DEFAULT_SSL_MODE),
        )?);
    if let Some(password) = &parts.password {
        config.password(password);
    }
    if let Some(routing_id) = &parts.routing_id {
        config.options(&format!("--cluster={routing_id}"));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_build_cluster_routed_config() {
        let config = database_from_parts(&DatabaseParts {
            host: Some("free-tier.example.cloud".into()),
            port: None,
            user: Some("sentry".into()),
            password: Some("secret".into()),
            name: Some("StatusSentry".into()),
            routing_id: Some("blue-cluster-42".into()),
            ssl_mode: None,
        })
        .expect("config");

        assert_eq!(config.get_dbname(), Some("statussentry"));
        assert_eq!(config.get_user(), Some("sentry"));
        assert_eq!(config.get_ports(), &[DEFAULT_DB_PORT]);
        assert_eq!(config.get_options(), Some("--cluster=blue-cluster-42"));
        assert_eq!(config.get_ssl_mode(), SslMode::Require);
    }

    #[test]
    fn parts_can_disable_tls() {
        let config = database_from_parts(&DatabaseParts {
            host: Some("localhost".into()),
            user: Some("ingest".into()),
            name: Some("status".into()),
            ssl_mode: Some("disable".into()),
            ..Default::default()
        })
        .expect("config");
        assert_eq!(config.get_ssl_mode(), SslMode::Disable);
    }

    #[test]
    fn unknown_ssl_mode_is_rejected() {
        assert!(matches!(
            parse_ssl_mode("sometimes"),
            Err(ConfigError::InvalidSslMode(_))
        ));
    }

    #[test]
    fn missing_parts_is_an_error() {
        let err = database_from_parts(&DatabaseParts {
            host: Some("localhost".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabase));
    }

    #[test]
    fn url_is_parsed() {
        let config = database_from_url("postgresql://ingest@localhost:5432/status").expect("url");
        assert_eq!(config.get_dbname(), Some("status"));
        assert!(database_from_url("postgresql://localhost:notaport/status").is_err());

        let config = database_from_url("postgresql://ingest@localhost/status?sslmode=verify-full")
            .expect("verify-full url");
        assert_eq!(config.get_ssl_mode(), SslMode::Require);
    }
}
