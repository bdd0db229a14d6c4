//! Event times arrive as RFC 3339 text in the publisher's offset and are
//! stored as UTC instants. Consumers re-localize on read.

use chrono::{DateTime, FixedOffset, ParseError, SecondsFormat, Utc};

pub fn encode_utc(text: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(text.trim()).map(|parsed| parsed.with_timezone(&Utc))
}

/// UTC RFC 3339 text, e.g. `2024-03-01T08:00:00Z`.
pub fn to_iso8601(stored: DateTime<Utc>) -> String {
    stored.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn decode_in(stored: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    stored.with_timezone(&offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn offset_time_is_stored_as_utc() {
        let stored = encode_utc("2024-03-01T09:00:00+01:00").expect("parse");
        assert_eq!(stored, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
        assert_eq!(to_iso8601(stored), "2024-03-01T08:00:00Z");
    }

    #[test]
    fn decode_restores_original_instant_and_offset() {
        let stored = encode_utc("2024-03-01T09:00:00+01:00").expect("parse");
        let plus_one = FixedOffset::east_opt(3600).expect("offset");
        let local = decode_in(stored, plus_one);
        assert_eq!(local.to_rfc3339(), "2024-03-01T09:00:00+01:00");
        assert_eq!(local.with_timezone(&Utc), stored);
    }

    #[test]
    fn rejects_non_rfc3339() {
        assert!(encode_utc("01/03/2024 09:00").is_err());
        assert!(encode_utc("").is_err());
    }
}
