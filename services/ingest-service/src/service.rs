use crate::classify::classify;
use crate::db;
use crate::error::{IngestError, ServiceError};
use crate::models::{EventPayload, IngestResponse};
use crate::pool;
use crate::state::AppState;
use crate::writer::{record_event, PreparedEvent};

/// Classify, then record, one inbound event.
pub async fn ingest(state: &AppState, payload: EventPayload) -> Result<IngestResponse, ServiceError> {
    let service_name = payload.service_name.clone();
    let prepared = classify(payload)
        .and_then(|event| PreparedEvent::build(&event))
        .map_err(|err| {
            tracing::warn!(
                service = service_name.as_str(),
                code = err.code(),
                error = %err,
                "payload rejected"
            );
            ServiceError::from(err)
        })?;

    let recorded = match pool::acquire(&state.pool).await {
        Ok(mut client) => record_event(&mut client, &prepared, state.max_tx_attempts).await,
        Err(err) => Err(IngestError::from(err)),
    };
    let recorded = recorded.map_err(|err| {
        tracing::error!(
            service = prepared.service_name(),
            kind = prepared.kind(),
            code = err.code(),
            error = %err,
            "event not recorded"
        );
        ServiceError::from(err)
    })?;

    Ok(IngestResponse {
        status: "ok",
        kind: recorded.kind,
        service_id: recorded.inserted.service_id,
        event_id: recorded.inserted.event_id,
    })
}

pub async fn ready(state: &AppState) -> Result<(), IngestError> {
    let client = pool::acquire(&state.pool).await?;
    db::ping(&*client).await?;
    Ok(())
}
