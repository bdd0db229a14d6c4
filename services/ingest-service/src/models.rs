use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound body of `POST /receive`, as published by the status sentries.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub service_name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub status_page: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub raw_message: Option<String>,
    #[serde(default)]
    pub message_published_at: Option<String>,
    #[serde(default)]
    pub probe_result: Option<ProbeResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    #[serde(default)]
    pub status_code: Option<i32>,
    #[serde(default)]
    pub error_text: Option<String>,
    pub probed_at: String,
    #[serde(default)]
    pub certificates: Vec<ProbeCertificate>,
    #[serde(default)]
    pub response_times: ResponseTimes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeCertificate {
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub valid_from: String,
    #[serde(default)]
    pub valid_until: String,
    #[serde(default)]
    pub connection_verified: bool,
}

/// Probe phase latencies in milliseconds. `None` means "not measured".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseTimes {
    pub dns_ms: Option<i64>,
    pub tls_handshake_ms: Option<i64>,
    pub connect_ms: Option<i64>,
    pub first_response_ms: Option<i64>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub kind: &'static str,
    pub service_id: Uuid,
    pub event_id: i64,
}

#[derive(Serialize)]
pub struct IndexResponse {
    pub status: &'static str,
    pub note: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}
