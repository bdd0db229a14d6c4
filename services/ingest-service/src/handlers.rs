use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::ServiceError;
use crate::models::{EventPayload, IndexResponse};
use crate::service;
use crate::state::AppState;

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match service::ready(&state).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        status: "success",
        note: "were you looking for the /receive endpoint?",
    })
}

pub async fn receive(
    State(state): State<AppState>,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "undecodable event body");
            let err = ServiceError::new(
                StatusCode::BAD_REQUEST,
                "invalid_json",
                rejection.body_text(),
            );
            return (err.status, Json(err.body)).into_response();
        }
    };

    match service::ingest(&state, payload).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => (err.status, Json(err.body)).into_response(),
    }
}
