use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::models::{NormalizedSubmission, SubmissionRecord};

const HARI: [&str; 7] = ["Minggu", "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu"];
const BULAN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

// Offsets written without a colon, e.g. `+0700`.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

// Zone-less server timestamps are UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Attach a sort key and a display date to every submission.
///
/// Output order and length match the input. A record whose `created_at` is
/// missing or unparseable keeps its place with `original_created_at: None`
/// and the raw timestamp as its display date.
pub fn normalize_submissions(records: Vec<SubmissionRecord>, tz: &Tz) -> Vec<NormalizedSubmission> {
    let mut unparsed = 0usize;
    let normalized: Vec<NormalizedSubmission> = records
        .into_iter()
        .map(|record| {
            let raw = record.created_at.as_deref().unwrap_or("");
            let original_created_at = parse_created_at(raw);
            let tanggal = match &original_created_at {
                Some(instant) => format_display_date(instant, tz),
                None => {
                    unparsed += 1;
                    raw.to_string()
                }
            };
            NormalizedSubmission {
                record,
                original_created_at,
                tanggal,
            }
        })
        .collect();

    if unparsed > 0 {
        debug!(unparsed, total = normalized.len(), "submissions without a usable created_at");
    }
    normalized
}

/// Parse a server timestamp into an instant. Returns `None` for anything
/// that is not a recognizable date.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Render `Senin, 06 Jan 2025` in the given zone.
pub fn format_display_date(instant: &DateTime<Utc>, tz: &Tz) -> String {
    let local = instant.with_timezone(tz);
    format!(
        "{}, {:02} {} {}",
        HARI[local.weekday().num_days_from_sunday() as usize],
        local.day(),
        BULAN[local.month0() as usize],
        local.year()
    )
}

/// Newest first; entries without a timestamp go last in their input order.
pub fn sort_newest_first(entries: &mut [NormalizedSubmission]) {
    entries.sort_by(|a, b| match (&a.original_created_at, &b.original_created_at) {
        (Some(left), Some(right)) => right.cmp(left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Kategori, Waktu};
    use chrono_tz::Asia::Jakarta;

    fn submission(id: i64, created_at: Option<&str>) -> SubmissionRecord {
        SubmissionRecord {
            id,
            mahasantri_id: 12,
            mentor_id: 2,
            juz: 29,
            halaman: "562".to_string(),
            total_setoran: 1,
            kategori: Kategori::Ziyadah,
            waktu: Waktu::Shubuh,
            catatan: "lancar".to_string(),
            created_at: created_at.map(str::to_string),
        }
    }

    #[test]
    fn keeps_every_record_in_order() {
        assert!(normalize_submissions(Vec::new(), &Jakarta).is_empty());

        let records = vec![
            submission(1, Some("2025-01-06T05:00:00Z")),
            submission(2, Some("")),
            submission(3, None),
            submission(4, Some("kemarin sore")),
        ];
        let normalized = normalize_submissions(records, &Jakarta);
        let ids: Vec<i64> = normalized.iter().map(|entry| entry.record.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn parses_server_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 6, 5, 0, 0).unwrap();
        assert_eq!(parse_created_at("2025-01-06T05:00:00Z"), Some(expected));
        assert_eq!(parse_created_at("2025-01-06T12:00:00+07:00"), Some(expected));
        assert_eq!(parse_created_at("2025-01-06T12:00:00+0700"), Some(expected));
        assert_eq!(parse_created_at("2025-01-06 12:00:00+0700"), Some(expected));
        assert_eq!(parse_created_at("2025-01-06T05:00:00.000000Z"), Some(expected));
        assert_eq!(parse_created_at("2025-01-06 05:00:00"), Some(expected));
        assert_eq!(
            parse_created_at("2025-01-06T05:00:00.250"),
            Some(expected + chrono::Duration::milliseconds(250))
        );
        assert_eq!(
            parse_created_at("2025-01-06"),
            Some(Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_non_dates_without_panicking() {
        for raw in ["", "   ", "not-a-date", "2025-13-40", "06/01/2025", "🕌"] {
            assert_eq!(parse_created_at(raw), None, "input {raw:?}");
        }
    }

    #[test]
    fn formats_in_display_zone() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 6, 5, 0, 0).unwrap();
        assert_eq!(format_display_date(&instant, &Jakarta), "Senin, 06 Jan 2025");

        let late_evening = Utc.with_ymd_and_hms(2025, 8, 16, 20, 30, 0).unwrap();
        assert_eq!(format_display_date(&late_evening, &Tz::UTC), "Sabtu, 16 Agu 2025");
        assert_eq!(format_display_date(&late_evening, &Jakarta), "Minggu, 17 Agu 2025");
    }

    #[test]
    fn bad_timestamp_falls_back_to_raw_text() {
        let normalized = normalize_submissions(vec![submission(9, Some("not-a-date"))], &Jakarta);
        assert_eq!(normalized[0].original_created_at, None);
        assert_eq!(normalized[0].tanggal, "not-a-date");

        let missing = normalize_submissions(vec![submission(10, None)], &Jakarta);
        assert_eq!(missing[0].tanggal, "");
    }

    #[test]
    fn ties_and_undated_records_keep_input_order() {
        let records = vec![
            submission(1, Some("x")),
            submission(2, Some("2025-01-01")),
            submission(3, Some("y")),
            submission(4, Some("2025-01-01T00:00:00Z")),
            submission(5, None),
            submission(6, Some("2025-01-06T12:00:00+07:00")),
        ];
        let mut normalized = normalize_submissions(records, &Jakarta);
        sort_newest_first(&mut normalized);

        let ids: Vec<i64> = normalized.iter().map(|entry| entry.record.id).collect();
        assert_eq!(ids, vec![6, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn undated_records_sort_last() {
        let records = vec![
            submission(2, Some("not-a-date")),
            submission(1, Some("2025-01-06T05:00:00Z")),
            submission(3, Some("2025-02-01 04:30:00")),
        ];
        let mut normalized = normalize_submissions(records, &Jakarta);
        assert!(normalized[1].original_created_at.is_some());
        assert!(normalized[0].original_created_at.is_none());

        sort_newest_first(&mut normalized);
        let ids: Vec<i64> = normalized.iter().map(|entry| entry.record.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
