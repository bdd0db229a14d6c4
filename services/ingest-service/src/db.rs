use tokio_postgres::GenericClient;
use uuid::Uuid;

use crate::rows::{MessageEventRow, ProbeEventRow, ServiceRow};

// Both statements run find-or-create and the event insert server-side in one
// round trip. `created` yields the new key; on a name conflict it is empty
// and `resolved` falls back to the existing row. An empty `resolved` inserts
// nothing, which the caller reports as an unresolved conflict.
const SQL_INSERT_MESSAGE_EVENT: &str = "WITH created AS ( \
    INSERT INTO services (name, domain, status_page) VALUES ($1, $2, $3) \
    ON CONFLICT (name) DO NOTHING \
    RETURNING id \
), resolved AS ( \
    SELECT id FROM created \
    UNION ALL \
    SELECT id FROM services WHERE name = $1 \
    LIMIT 1 \
) \
INSERT INTO message_events (service_id, message, raw_message, published_at, status_page) \
SELECT resolved.id, $4, $5, $6, $7 FROM resolved \
RETURNING id, service_id";

const SQL_INSERT_PROBE_EVENT: &str = "WITH created AS ( \
    INSERT INTO services (name, domain, status_page) VALUES ($1, $2, $3) \
    ON CONFLICT (name) DO NOTHING \
    RETURNING id \
), resolved AS ( \
    SELECT id FROM created \
    UNION ALL \
    SELECT id FROM services WHERE name = $1 \
    LIMIT 1 \
) \
INSERT INTO probe_events (service_id, url, status_code, error_text, polled_at, \
    dns_ms, tls_ms, connect_ms, first_response_ms, \
    cert_verified, cert_valid_from, cert_valid_until, issuer, subject) \
SELECT resolved.id, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16 FROM resolved \
RETURNING id, service_id";

const SQL_PING: &str = "SELECT 1";

/// Keys of a freshly written event row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertedEvent {
    pub event_id: i64,
    pub service_id: Uuid,
}

fn inserted(row: tokio_postgres::Row) -> InsertedEvent {
    InsertedEvent {
        event_id: row.get("id"),
        service_id: row.get("service_id"),
    }
}

pub async fn insert_message_event(
    db: &impl GenericClient,
    service: &ServiceRow,
    event: &MessageEventRow,
) -> Result<Option<InsertedEvent>, tokio_postgres::Error> {
    let row = db
        .query_opt(
            SQL_INSERT_MESSAGE_EVENT,
            &[
                &service.name,
                &service.domain,
                &service.status_page,
                &event.message,
                &event.raw_message,
                &event.published_at,
                &event.status_page,
            ],
        )
        .await?;
    Ok(row.map(inserted))
}

pub async fn insert_probe_event(
    db: &impl GenericClient,
    service: &ServiceRow,
    event: &ProbeEventRow,
) -> Result<Option<InsertedEvent>, tokio_postgres::Error> {
    let cert = &event.certificate;
    let row = db
        .query_opt(
            SQL_INSERT_PROBE_EVENT,
            &[
                &service.name,
                &service.domain,
                &service.status_page,
                &event.url,
                &event.status_code,
                &event.error_text,
                &event.polled_at,
                &event.dns_ms,
                &event.tls_ms,
                &event.connect_ms,
                &event.first_response_ms,
                &cert.verified,
                &cert.valid_from,
                &cert.valid_until,
                &cert.issuer,
                &cert.subject,
            ],
        )
        .await?;
    Ok(row.map(inserted))
}

pub async fn ping(db: &impl GenericClient) -> Result<(), tokio_postgres::Error> {
    db.query_one(SQL_PING, &[]).await?;
    Ok(())
}
