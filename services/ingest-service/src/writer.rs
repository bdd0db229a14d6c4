use chrono::{DateTime, Utc};
use tokio_postgres::{error::SqlState, Client, IsolationLevel, Transaction};

use crate::classify::{ClassifiedEvent, EventKind};
use crate::db::{self, InsertedEvent};
use crate::error::{IngestError, StoreError};
use crate::rows::{MessageEventRow, ProbeEventRow, ServiceRow};
use crate::timestamps::to_iso8601;

/// Result of one durably recorded event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedEvent {
    pub kind: &'static str,
    pub inserted: InsertedEvent,
}

enum EventRow {
    Message(MessageEventRow),
    Probe(ProbeEventRow),
}

impl EventRow {
    fn event_time(&self) -> Option<DateTime<Utc>> {
        match self {
            EventRow::Message(message) => message.published_at,
            EventRow::Probe(probe) => Some(probe.polled_at),
        }
    }
}

/// An event mapped to its row shapes, ready to be written. Building it
/// normalizes timestamps, so malformed input fails before a connection is
/// taken from the pool.
pub struct PreparedEvent {
    kind: &'static str,
    service: ServiceRow,
    row: EventRow,
}

impl PreparedEvent {
    pub fn build(event: &ClassifiedEvent) -> Result<Self, IngestError> {
        let row = match &event.kind {
            EventKind::Message(message) => {
                EventRow::Message(MessageEventRow::build(&event.service, message)?)
            }
            EventKind::Probe(probe) => EventRow::Probe(ProbeEventRow::build(probe)?),
        };
        Ok(Self {
            kind: event.kind.as_str(),
            service: ServiceRow::from_key(&event.service),
            row,
        })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn service_name(&self) -> &str {
        &self.service.name
    }
}

/// Record one event and make sure its service exists, atomically.
///
/// Each attempt is its own SERIALIZABLE transaction. Only serialization
/// failures are retried, up to `max_attempts`; any other failure rolls the
/// attempt back and is returned.
pub async fn record_event(
    client: &mut Client,
    event: &PreparedEvent,
    max_attempts: u32,
) -> Result<RecordedEvent, IngestError> {
    let service = &event.service;
    let max_attempts = max_attempts.max(1);
    let event_time = event.row.event_time().map(to_iso8601);
    let mut attempt = 1;
    loop {
        match write_once(client, service, &event.row).await {
            Ok(inserted) => {
                tracing::info!(
                    service = service.name.as_str(),
                    service_id = %inserted.service_id,
                    event_id = inserted.event_id,
                    kind = event.kind,
                    event_time = event_time.as_deref(),
                    attempt,
                    "event recorded"
                );
                return Ok(RecordedEvent {
                    kind: event.kind,
                    inserted,
                });
            }
            Err(err) if is_serialization_failure(&err) && attempt < max_attempts => {
                tracing::warn!(
                    service = service.name.as_str(),
                    attempt,
                    "serialization conflict, retrying transaction"
                );
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn write_once(
    client: &mut Client,
    service: &ServiceRow,
    row: &EventRow,
) -> Result<InsertedEvent, IngestError> {
    let transaction = client
        .build_transaction()
        .isolation_level(IsolationLevel::Serializable)
        .start()
        .await?;

    match insert_row(&transaction, service, row).await {
        Ok(inserted) => {
            transaction.commit().await?;
            Ok(inserted)
        }
        Err(err) => {
            if let Err(rollback_err) = transaction.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

async fn insert_row(
    transaction: &Transaction<'_>,
    service: &ServiceRow,
    row: &EventRow,
) -> Result<InsertedEvent, IngestError> {
    let inserted = match row {
        EventRow::Message(message) => db::insert_message_event(transaction, service, message).await?,
        EventRow::Probe(probe) => db::insert_probe_event(transaction, service, probe).await?,
    };
    resolve_inserted(inserted, service)
}

/// No returned row means the service key could not be found or created.
fn resolve_inserted(
    inserted: Option<InsertedEvent>,
    service: &ServiceRow,
) -> Result<InsertedEvent, IngestError> {
    inserted.ok_or_else(|| IngestError::ConflictResolution {
        service_name: service.name.clone(),
    })
}

fn is_serialization_failure(err: &IngestError) -> bool {
    match err {
        IngestError::Store(StoreError::Database(db_err)) => {
            db_err.code() == Some(&SqlState::T_R_SERIALIZATION_FAILURE)
        }
        _ => false,
    }
}
