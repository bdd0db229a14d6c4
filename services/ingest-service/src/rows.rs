//! Row shapes written by the reconciling writer. Optional payload fields
//! become SQL NULL here, never zero values or empty strings.

use chrono::{DateTime, Utc};

use crate::classify::{MessageEvent, ServiceKey};
use crate::error::StoreError;
use crate::models::{ProbeCertificate, ProbeResult};
use crate::timestamps::encode_utc;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRow {
    pub name: String,
    pub domain: Option<String>,
    pub status_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageEventRow {
    pub message: Option<String>,
    pub raw_message: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub status_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeEventRow {
    pub url: Option<String>,
    pub status_code: Option<i32>,
    pub error_text: Option<String>,
    pub polled_at: DateTime<Utc>,
    pub dns_ms: Option<i64>,
    pub tls_ms: Option<i64>,
    pub connect_ms: Option<i64>,
    pub first_response_ms: Option<i64>,
    pub certificate: CertificateColumns,
}

/// Columns describing the primary certificate; all `None` when the probe
/// presented no verified certificate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertificateColumns {
    pub verified: Option<bool>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub issuer: Option<String>,
    pub subject: Option<String>,
}

pub fn nullable(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn nullable_opt(value: Option<&str>) -> Option<String> {
    value.and_then(nullable)
}

fn nullable_time(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    match value.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => encode_utc(text)
            .map(Some)
            .map_err(|source| StoreError::Timestamp { field, source }),
        None => Ok(None),
    }
}

/// First certificate whose connection was verified. Later verified
/// certificates are ignored.
pub fn primary_certificate(certificates: &[ProbeCertificate]) -> Option<&ProbeCertificate> {
    certificates.iter().find(|cert| cert.connection_verified)
}

impl ServiceRow {
    pub fn from_key(key: &ServiceKey) -> Self {
        Self {
            name: key.name.clone(),
            domain: nullable(&key.domain),
            status_page: nullable(&key.status_page),
        }
    }
}

impl MessageEventRow {
    pub fn build(service: &ServiceKey, event: &MessageEvent) -> Result<Self, StoreError> {
        Ok(Self {
            message: nullable(&event.message),
            raw_message: nullable_opt(event.raw_message.as_deref()),
            published_at: nullable_time("message_published_at", event.published_at.as_deref())?,
            status_page: nullable(&service.status_page),
        })
    }
}

impl ProbeEventRow {
    pub fn build(probe: &ProbeResult) -> Result<Self, StoreError> {
        let polled_at = encode_utc(&probe.probed_at).map_err(|source| StoreError::Timestamp {
            field: "probed_at",
            source,
        })?;
        let certificate = match primary_certificate(&probe.certificates) {
            Some(cert) => CertificateColumns {
                verified: Some(true),
                valid_from: nullable_time("valid_from", Some(cert.valid_from.as_str()))?,
                valid_until: nullable_time("valid_until", Some(cert.valid_until.as_str()))?,
                issuer: nullable(&cert.issuer),
                subject: nullable(&cert.subject),
            },
            None => CertificateColumns::default(),
        };
        let times = &probe.response_times;

        Ok(Self {
            url: nullable(&probe.url),
            status_code: probe.status_code,
            error_text: nullable_opt(probe.error_text.as_deref()),
            polled_at,
            dns_ms: times.dns_ms,
            tls_ms: times.tls_handshake_ms,
            connect_ms: times.connect_ms,
            first_response_ms: times.first_response_ms,
            certificate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseTimes;
    use chrono::TimeZone;

    fn cert(issuer: &str, verified: bool) -> ProbeCertificate {
        ProbeCertificate {
            issuer: issuer.to_string(),
            subject: format!("CN={issuer}"),
            valid_from: "2024-01-01T00:00:00Z".to_string(),
            valid_until: "2024-12-31T23:59:59+02:00".to_string(),
            connection_verified: verified,
        }
    }

    fn probe(certificates: Vec<ProbeCertificate>) -> ProbeResult {
        ProbeResult {
            url: "https://api.example.com".to_string(),
            status_code: Some(200),
            error_text: Some(String::new()),
            probed_at: "2024-03-01T09:00:00+01:00".to_string(),
            certificates,
            response_times: ResponseTimes {
                dns_ms: Some(0),
                tls_handshake_ms: None,
                connect_ms: Some(12),
                first_response_ms: Some(40),
            },
        }
    }

    #[test]
    fn no_certificates_gives_null_columns() {
        let row = ProbeEventRow::build(&probe(Vec::new())).expect("row");
        assert_eq!(row.certificate, CertificateColumns::default());
    }

    #[test]
    fn picks_first_verified_certificate() {
        let row = ProbeEventRow::build(&probe(vec![
            cert("first", false),
            cert("second", true),
            cert("third", false),
        ]))
        .expect("row");
        assert_eq!(row.certificate.verified, Some(true));
        assert_eq!(row.certificate.issuer.as_deref(), Some("second"));
        assert_eq!(row.certificate.subject.as_deref(), Some("CN=second"));
        assert_eq!(
            row.certificate.valid_until,
            Some(Utc.with_ymd_and_hms(2024, 12, 31, 21, 59, 59).unwrap())
        );
    }

    #[test]
    fn only_the_first_of_several_verified_is_kept() {
        let certs = vec![cert("a", true), cert("b", true)];
        assert_eq!(primary_certificate(&certs).map(|c| c.issuer.as_str()), Some("a"));
    }

    #[test]
    fn unmeasured_times_stay_null_and_zero_stays_zero() {
        let row = ProbeEventRow::build(&probe(Vec::new())).expect("row");
        assert_eq!(row.dns_ms, Some(0));
        assert_eq!(row.tls_ms, None);
        assert_eq!(row.error_text, None);
        assert_eq!(row.polled_at, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn message_row_nulls_empty_text() {
        let service = ServiceKey {
            name: "api".into(),
            domain: String::new(),
            status_page: "https://status.example.com".into(),
        };
        let event = MessageEvent {
            message: "degraded".into(),
            raw_message: Some(String::new()),
            published_at: None,
        };
        let row = MessageEventRow::build(&service, &event).expect("row");
        assert_eq!(row.raw_message, None);
        assert_eq!(row.published_at, None);
        assert_eq!(row.status_page.as_deref(), Some("https://status.example.com"));
        assert_eq!(ServiceRow::from_key(&service).domain, None);
    }

    #[test]
    fn malformed_timestamp_is_reported_with_field() {
        let mut bad = probe(Vec::new());
        bad.probed_at = "not a time".into();
        match ProbeEventRow::build(&bad) {
            Err(StoreError::Timestamp { field, .. }) => assert_eq!(field, "probed_at"),
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }
}
