use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use tokio_postgres::config::SslMode;
use tokio_postgres::Config;
use tokio_postgres_rustls::MakeRustlsConnect;

/// How a pooled connection reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// `sslmode=disable`: the connector is never consulted.
    Plain,
    /// TLS verified against the webpki roots, including the host name.
    Tls,
}

pub fn transport_for(config: &Config) -> Transport {
    match config.get_ssl_mode() {
        SslMode::Disable => Transport::Plain,
        _ => Transport::Tls,
    }
}

pub fn make_connector() -> Result<MakeRustlsConnect, rustls::Error> {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();
    Ok(MakeRustlsConnect::new(config))
}
