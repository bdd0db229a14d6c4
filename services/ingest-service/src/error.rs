use axum::http::StatusCode;
use thiserror::Error;

use crate::models::ErrorResponse;

/// Everything that can stop an inbound event from being recorded.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload cannot be stored; rejected before touching the store.
    #[error("invalid payload: {0}")]
    Validation(String),
    /// The find-or-create step returned no service key, e.g. the conflicting
    /// row vanished mid-transaction. Nothing was written.
    #[error("could not resolve service key for {service_name:?}")]
    ConflictResolution { service_name: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("invalid timestamp in {field}: {source}")]
    Timestamp {
        field: &'static str,
        #[source]
        source: chrono::ParseError,
    },
    #[error("timed out waiting for a pooled database connection")]
    PoolTimeout,
    #[error("database connect failed: {0}")]
    Connect(#[source] tokio_postgres::Error),
    #[error("tls setup failed: {0}")]
    Tls(#[from] rustls::Error),
}

impl From<tokio_postgres::Error> for IngestError {
    fn from(err: tokio_postgres::Error) -> Self {
        IngestError::Store(StoreError::Database(err))
    }
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::Validation(_) => StatusCode::BAD_REQUEST,
            IngestError::ConflictResolution { .. } => StatusCode::SERVICE_UNAVAILABLE,
            IngestError::Store(StoreError::PoolTimeout | StoreError::Connect(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            IngestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Validation(_) => "invalid_payload",
            IngestError::ConflictResolution { .. } => "conflict_unresolved",
            IngestError::Store(StoreError::Timestamp { .. }) => "invalid_timestamp",
            IngestError::Store(StoreError::PoolTimeout) => "pool_exhausted",
            IngestError::Store(StoreError::Connect(_)) => "store_unavailable",
            IngestError::Store(_) => "db_error",
        }
    }
}

/// HTTP-facing error: a status plus the JSON body sent to the publisher.
pub struct ServiceError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ServiceError {
    pub fn new(status: StatusCode, code: &'static str, message: String) -> Self {
        Self {
            status,
            body: ErrorResponse { code, message },
        }
    }
}

impl From<IngestError> for ServiceError {
    fn from(err: IngestError) -> Self {
        ServiceError::new(err.status(), err.code(), err.to_string())
    }
}
