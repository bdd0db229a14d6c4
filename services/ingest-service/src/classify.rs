use crate::error::IngestError;
use crate::models::{EventPayload, ProbeResult};

/// Natural key plus the service attributes recorded on first sight.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceKey {
    pub name: String,
    pub domain: String,
    pub status_page: String,
}

#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub message: String,
    pub raw_message: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    Message(MessageEvent),
    Probe(ProbeResult),
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Message(_) => "message",
            EventKind::Probe(_) => "probe",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedEvent {
    pub service: ServiceKey,
    pub kind: EventKind,
}

/// Decide which write path a payload takes.
///
/// A probe result always wins, even when a message is present too. Without
/// one the payload must carry a non-empty message, whitespace included;
/// anything else is rejected before the store is touched.
pub fn classify(payload: EventPayload) -> Result<ClassifiedEvent, IngestError> {
    let EventPayload {
        service_name,
        domain,
        status_page,
        message,
        raw_message,
        message_published_at,
        probe_result,
    } = payload;

    let kind = match (probe_result, message) {
        (Some(probe), _) => EventKind::Probe(probe),
        (None, Some(message)) if !message.is_empty() => EventKind::Message(MessageEvent {
            message,
            raw_message,
            published_at: message_published_at,
        }),
        (None, _) => {
            return Err(IngestError::Validation(format!(
                "no message or probe_result for service {service_name:?}"
            )));
        }
    };

    Ok(ClassifiedEvent {
        service: ServiceKey {
            name: service_name,
            domain,
            status_page,
        },
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: serde_json::Value) -> EventPayload {
        serde_json::from_value(value).expect("payload")
    }

    #[test]
    fn message_payload_takes_message_path() {
        let event = classify(payload(serde_json::json!({
            "service_name": "api",
            "domain": "api.example.com",
            "status_page": "https://status.example.com",
            "message": "degraded",
            "message_published_at": "2024-01-01T00:00:00Z"
        })))
        .expect("classified");

        assert_eq!(event.service.name, "api");
        match event.kind {
            EventKind::Message(message) => {
                assert_eq!(message.message, "degraded");
                assert_eq!(message.published_at.as_deref(), Some("2024-01-01T00:00:00Z"));
            }
            EventKind::Probe(_) => panic!("expected message event"),
        }
    }

    #[test]
    fn probe_result_wins_over_message() {
        let event = classify(payload(serde_json::json!({
            "service_name": "api",
            "domain": "api.example.com",
            "status_page": "https://status.example.com",
            "message": "also here",
            "probe_result": {
                "url": "https://api.example.com",
                "probed_at": "2024-01-01T00:00:00Z",
                "response_times": {}
            }
        })))
        .expect("classified");
        assert_eq!(event.kind.as_str(), "probe");
    }

    #[test]
    fn null_probe_result_is_absent() {
        let event = classify(payload(serde_json::json!({
            "service_name": "api",
            "message": "up",
            "probe_result": null
        })))
        .expect("classified");
        assert_eq!(event.kind.as_str(), "message");
    }

    #[test]
    fn empty_message_without_probe_is_rejected() {
        let err = classify(payload(serde_json::json!({
            "service_name": "api",
            "domain": "api.example.com",
            "status_page": "https://status.example.com",
            "message": ""
        })))
        .unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));

        let err = classify(payload(serde_json::json!({ "service_name": "api" }))).unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn whitespace_message_is_still_a_message() {
        let event = classify(payload(serde_json::json!({
            "service_name": "api",
            "message": "   "
        })))
        .expect("classified");
        match event.kind {
            EventKind::Message(message) => assert_eq!(message.message, "   "),
            EventKind::Probe(_) => panic!("expected a message event"),
        }
        assert_eq!(event.service.name, "api");
    }
}
