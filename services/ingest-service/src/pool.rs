//! Bounded `bb8` pool of TLS-capable `tokio_postgres` connections.

use std::time::Duration;

use bb8::{ErrorSink, Pool, PooledConnection, RunError};
use bb8_postgres::PostgresConnectionManager;
use tokio_postgres::Config;
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::error::StoreError;
use crate::tls::{make_connector, transport_for};

pub type Manager = PostgresConnectionManager<MakeRustlsConnect>;
pub type StorePool = Pool<Manager>;
/// A checked-out connection. Dropping it returns it to the pool.
pub type PooledClient<'a> = PooledConnection<'a, Manager>;

#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub size: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
struct TracingErrorSink;

impl ErrorSink<tokio_postgres::Error> for TracingErrorSink {
    fn sink(&self, error: tokio_postgres::Error) {
        tracing::error!(error = %error, "database connection error");
    }

    fn boxed_clone(&self) -> Box<dyn ErrorSink<tokio_postgres::Error>> {
        Box::new(*self)
    }
}

impl From<RunError<tokio_postgres::Error>> for StoreError {
    fn from(err: RunError<tokio_postgres::Error>) -> Self {
        match err {
            RunError::User(err) => StoreError::Connect(err),
            RunError::TimedOut => StoreError::PoolTimeout,
        }
    }
}

fn manager(config: Config) -> Result<Manager, StoreError> {
    tracing::info!(transport = ?transport_for(&config), "database transport");
    Ok(PostgresConnectionManager::new(config, make_connector()?))
}

fn builder(settings: PoolSettings) -> bb8::Builder<Manager> {
    Pool::builder()
        .max_size(settings.size.max(1))
        .connection_timeout(settings.acquire_timeout)
        .test_on_check_out(true)
        .error_sink(Box::new(TracingErrorSink))
}

/// Build the pool and open its first connection, so bad credentials fail at
/// startup rather than on the first request.
pub async fn connect(config: Config, settings: PoolSettings) -> Result<StorePool, StoreError> {
    let pool = builder(settings)
        .min_idle(Some(1))
        .build(manager(config)?)
        .await
        .map_err(StoreError::Connect)?;
    tracing::info!(size = settings.size, "database pool ready");
    Ok(pool)
}

/// Build the pool without connecting; connections open on first checkout.
pub fn connect_lazy(config: Config, settings: PoolSettings) -> Result<StorePool, StoreError> {
    Ok(builder(settings).build_unchecked(manager(config)?))
}

pub async fn acquire(pool: &StorePool) -> Result<PooledClient<'_>, StoreError> {
    Ok(pool.get().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_database() -> Config {
        "host=127.0.0.1 port=1 user=ingest dbname=status sslmode=disable"
            .parse()
            .expect("config")
    }

    #[tokio::test]
    async fn unreachable_store_times_out_instead_of_blocking() {
        let pool = connect_lazy(
            unreachable_database(),
            PoolSettings {
                size: 2,
                acquire_timeout: Duration::from_millis(50),
            },
        )
        .expect("lazy pool");
        let err = acquire(&pool).await.err().expect("no connection available");
        // Refused connects may surface before the deadline.
        assert!(matches!(err, StoreError::PoolTimeout | StoreError::Connect(_)));
    }

    #[test]
    fn run_errors_map_to_store_errors() {
        assert!(matches!(
            StoreError::from(RunError::<tokio_postgres::Error>::TimedOut),
            StoreError::PoolTimeout
        ));
    }
}
