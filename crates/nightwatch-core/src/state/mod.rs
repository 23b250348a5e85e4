// Client-side read model: the authoritative snapshot plus the components
// that each own one slice of derived history.

pub mod chat;
pub mod store;
pub mod timeline;
pub mod votes;

use chrono::{DateTime, NaiveDateTime};

/// Parse a server timestamp. The server emits naive local ISO-8601
/// (`2024-05-01T20:15:03.123456`); RFC 3339 with an offset is accepted too.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_naive_iso_with_fraction() {
        let ts = parse_timestamp("2024-05-01T20:15:03.123456").unwrap();
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (20, 15, 3));
    }

    #[test]
    fn parses_rfc3339() {
        let ts = parse_timestamp("2024-05-01T20:15:03+02:00").unwrap();
        assert_eq!(ts.hour(), 20);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
