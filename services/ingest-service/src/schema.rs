use tokio_postgres::Client;

const SQL_CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS services (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL UNIQUE,
    domain TEXT,
    status_page TEXT
);

CREATE TABLE IF NOT EXISTS message_events (
    id BIGSERIAL PRIMARY KEY,
    service_id UUID NOT NULL REFERENCES services (id) ON UPDATE CASCADE ON DELETE CASCADE,
    message TEXT,
    raw_message TEXT,
    published_at TIMESTAMPTZ,
    status_page TEXT
);

CREATE INDEX IF NOT EXISTS message_events_service_idx ON message_events (service_id);

CREATE TABLE IF NOT EXISTS probe_events (
    id BIGSERIAL PRIMARY KEY,
    service_id UUID NOT NULL REFERENCES services (id) ON UPDATE CASCADE ON DELETE CASCADE,
    url TEXT,
    status_code INTEGER,
    error_text TEXT,
    polled_at TIMESTAMPTZ NOT NULL,
    dns_ms BIGINT,
    tls_ms BIGINT,
    connect_ms BIGINT,
    first_response_ms BIGINT,
    cert_verified BOOLEAN,
    cert_valid_from TIMESTAMPTZ,
    cert_valid_until TIMESTAMPTZ,
    issuer TEXT,
    subject TEXT
);

CREATE INDEX IF NOT EXISTS probe_events_service_idx ON probe_events (service_id);
";

/// Create the tables the writer relies on. Safe to run on every start.
pub async fn bootstrap(db: &mut Client) -> Result<(), tokio_postgres::Error> {
    let transaction = db.transaction().await?;
    transaction.batch_execute(SQL_CREATE_TABLES).await?;
    transaction.commit().await?;
    tracing::info!("schema bootstrap complete");
    Ok(())
}
