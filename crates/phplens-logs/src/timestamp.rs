//! Timestamps in the brackets that open PHP log lines.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// Zone-less layouts seen in PHP, Apache and WordPress logs
const NAIVE_FORMATS: &[&str] = &[
    "%d-%b-%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%b/%Y:%H:%M:%S%.f",
    "%a %b %d %H:%M:%S%.f %Y",
    "%a %b %e %H:%M:%S%.f %Y",
];

/// Parse a bracketed log timestamp
///
/// Times without a zone are interpreted in `default_tz`. Returns `None`
/// for anything unrecognised.
pub fn parse_timestamp(raw: &str, default_tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some((head, zone)) = raw.rsplit_once(' ') {
        if let Ok(tz) = zone.parse::<Tz>() {
            return parse_naive(head).and_then(|naive| localize(&tz, &naive));
        }
        if let Some(offset) = parse_offset(zone) {
            return parse_naive(head).and_then(|naive| localize(&offset, &naive));
        }
        // Abbreviations like CEST are ambiguous; fall back to the server zone
        if zone.len() <= 5 && zone.chars().all(|c| c.is_ascii_uppercase()) {
            if let Some(naive) = parse_naive(head) {
                return localize(&default_tz, &naive);
            }
        }
    }

    parse_naive(raw).and_then(|naive| localize(&default_tz, &naive))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

fn localize<Z: TimeZone>(tz: &Z, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        // Skipped by a DST change: read with the offset in force before the gap
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&naive.checked_sub_signed(TimeDelta::days(1))?)
                .fix();
            let shift = TimeDelta::seconds(i64::from(before.local_minus_utc()));
            let utc = naive.checked_sub_signed(shift)?;
            Some(Utc.from_utc_datetime(&utc))
        }
    }
}

/// `+0200`, `-05:30`
fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let (sign, rest) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
