//! Utility functions shared across the client.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use encoding_rs::{Encoding, UTF_8};

/// Parse an ISO-8601 timestamp into milliseconds since the Unix epoch.
///
/// Timestamps that fail to parse are treated as the epoch (0) so that
/// ordering stays stable instead of failing.
///
/// # Example
///
/// ```
/// use gradian_client::utils::timestamp_millis;
///
/// assert_eq!(timestamp_millis("1970-01-01T00:00:01Z"), 1000);
/// assert_eq!(timestamp_millis("2024-01-01T00:00:00.000+00:00"), 1_704_067_200_000);
/// assert_eq!(timestamp_millis("not a date"), 0);
/// ```
pub fn timestamp_millis(value: &str) -> i64 {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.timestamp_millis();
    }

    // A trailing `Z` is spelled out so the offset formats below accept it
    let zoned = value
        .strip_suffix(['Z', 'z'])
        .map(|rest| format!("{rest}+00:00"));
    let zoned = zoned.as_deref().unwrap_or(value);
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(zoned, format) {
            return parsed.timestamp_millis();
        }
    }

    // Some backends omit the offset entirely; treat those as UTC
    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return naive.and_utc().timestamp_millis();
        }
    }
    for format in DATE_FORMATS {
        if let Some(midnight) = NaiveDate::parse_from_str(value, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return midnight.and_utc().timestamp_millis();
        }
    }
    0
}

/// ISO-8601 shapes RFC 3339 rejects: colonless offsets, minute precision
/// and the basic format.
const OFFSET_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y%m%dT%H%M%S%:z",
    "%Y%m%dT%H%M%S%z",
];

const LOCAL_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Build display initials from a name.
///
/// Takes the first character of the first two words, uppercased.
/// Returns `"?"` when the name has no usable characters.
///
/// # Example
///
/// ```
/// use gradian_client::utils::initials;
///
/// assert_eq!(initials("Ada Lovelace"), "AL");
/// assert_eq!(initials("grace"), "G");
/// assert_eq!(initials("  "), "?");
/// ```
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(|c| c.to_uppercase())
        .collect();

    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

/// Strip a surrounding markdown code fence from model output.
///
/// Language models often wrap JSON in ```` ```json ... ``` ````; this returns the
/// inner text, or the trimmed input if there is no fence.
///
/// # Example
///
/// ```
/// use gradian_client::utils::strip_code_fences;
///
/// assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
/// ```
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the optional language tag on the opening line
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Decode a response body to text using the charset from a `Content-Type` header.
///
/// Falls back to UTF-8 when no charset is declared or the label is unknown.
/// Invalid sequences are replaced rather than rejected.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_millis_rfc3339() {
        assert_eq!(timestamp_millis("2024-01-01T00:00:00Z"), 1_704_067_200_000);
        assert_eq!(
            timestamp_millis("2024-01-01T01:00:00+01:00"),
            1_704_067_200_000
        );
    }

    #[test]
    fn test_timestamp_millis_without_offset() {
        assert_eq!(timestamp_millis("2024-01-01T00:00:00.500"), 1_704_067_200_500);
        assert_eq!(timestamp_millis("2024-01-01 00:00:00"), 1_704_067_200_000);
    }

    #[test]
    fn test_timestamp_millis_minute_precision() {
        assert_eq!(timestamp_millis("2024-01-15T10:30Z"), 1_705_314_600_000);
        assert_eq!(timestamp_millis("2024-01-15T12:30+02:00"), 1_705_314_600_000);
        assert_eq!(timestamp_millis("2024-01-15T10:30"), 1_705_314_600_000);
        assert_eq!(timestamp_millis("2024-01-15T11:30:00+0100"), 1_705_314_600_000);
    }

    #[test]
    fn test_timestamp_millis_basic_format() {
        assert_eq!(timestamp_millis("20240115T103000Z"), 1_705_314_600_000);
        assert_eq!(timestamp_millis("20240115T113000+0100"), 1_705_314_600_000);
        assert_eq!(timestamp_millis("20240115T103000"), 1_705_314_600_000);
    }

    #[test]
    fn test_timestamp_millis_date_only_is_midnight_utc() {
        assert_eq!(timestamp_millis("2024-01-15"), 1_705_276_800_000);
        assert_eq!(timestamp_millis("20240115"), 1_705_276_800_000);
    }

    #[test]
    fn test_timestamp_millis_invalid_is_epoch() {
        assert_eq!(timestamp_millis(""), 0);
        assert_eq!(timestamp_millis("yesterday"), 0);
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Ada Lovelace"), "AL");
        assert_eq!(initials("ada king lovelace"), "AK");
        assert_eq!(initials("x"), "X");
        assert_eq!(initials(""), "?");
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fences("```json\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("plain"), "plain");
    }

    #[test]
    fn test_decode_body_charset() {
        // "café" in windows-1252
        let body = [0x63, 0x61, 0x66, 0xE9];
        assert_eq!(
            decode_body(&body, Some("text/plain; charset=windows-1252")),
            "café"
        );
        assert_eq!(decode_body("café".as_bytes(), Some("application/json")), "café");
        assert_eq!(decode_body("café".as_bytes(), None), "café");
    }
}
