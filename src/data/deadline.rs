use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

/// Parse a deadline cell. Returns `None` for empty or unrecognised input.
pub fn parse_deadline(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Date-only when the time is midnight, otherwise a full timestamp.
pub fn format_deadline(dt: &NaiveDateTime) -> String {
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn parses_iso_and_dotted_dates() {
        assert_eq!(parse_deadline("2025-03-01"), Some(ymd(2025, 3, 1)));
        assert_eq!(parse_deadline(" 01.03.2025 "), Some(ymd(2025, 3, 1)));
        assert_eq!(parse_deadline("2025/03/01"), Some(ymd(2025, 3, 1)));
        assert_eq!(parse_deadline("03/01/2025"), Some(ymd(2025, 3, 1)));
    }

    #[test]
    fn parses_timestamps() {
        let dt = parse_deadline("2025-03-01 14:30").unwrap();
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        let rfc = parse_deadline("2025-03-01T09:15:00+03:00").unwrap();
        assert_eq!(rfc.hour(), 9);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_deadline(""), None);
        assert_eq!(parse_deadline("next spring"), None);
        assert_eq!(parse_deadline("2025-13-40"), None);
        assert_eq!(parse_deadline("31.02.2025"), None);
    }

    #[test]
    fn formats_midnight_as_date() {
        assert_eq!(format_deadline(&ymd(2024, 12, 31)), "2024-12-31");
        let dt = parse_deadline("2024-12-31 08:05:09").unwrap();
        assert_eq!(format_deadline(&dt), "2024-12-31 08:05:09");
    }
}
