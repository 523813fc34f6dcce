//! Raw row normalization
//!
//! Every step here is permissive: malformed numerics become `0.0`, an
//! unparseable timestamp becomes the processing time, and a row is only
//! dropped when it is filtered out or carries nothing usable at all.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use super::canonical::{CanonicalRecord, MachineState, PredictionWindow, RecordTime};
use super::config::NormalizeConfig;
use super::raw::RawRecord;

/// Timestamp layouts tried before the ISO-8601 fallback, in order
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// ISO-8601 layouts with a UTC offset; date and time split by `T` or a space
const ISO_OFFSET_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// ISO-8601 layouts without an offset
const ISO_LOCAL_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Converts raw rows into canonical records
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Normalize one row
    ///
    /// Returns `None` when the row is excluded by a filter or cannot be
    /// minimally interpreted (blank row, prediction window out of range).
    pub fn normalize(&self, raw: &RawRecord) -> Option<CanonicalRecord> {
        self.normalize_at(raw, Utc::now().naive_utc())
    }

    /// Normalize with an explicit processing time for the timestamp fallback
    pub fn normalize_at(&self, raw: &RawRecord, now: NaiveDateTime) -> Option<CanonicalRecord> {
        let columns = &self.config.columns;

        if columns
            .names()
            .iter()
            .all(|name| clean_field(raw.get(name).unwrap_or_default()).is_empty())
        {
            return None;
        }

        let field = |name: &str| clean_field(raw.get(name).unwrap_or_default());

        let line = field(columns.line.as_str());
        let tool = field(columns.tool.as_str());

        if let Some(wanted) = self.config.line_filter.as_deref() {
            if line != wanted {
                return None;
            }
        }
        if let Some(wanted) = self.config.tool_filter.as_deref() {
            if tool != wanted {
                return None;
            }
        }

        // Numerics get their single quote pair stripped inside parse_number
        let number = |name: &str| parse_number(raw.get(name).unwrap_or_default());
        let rpm = number(columns.rpm.as_str());
        let feed_rate = number(columns.feed_rate.as_str());
        let torque = number(columns.torque.as_str());

        let timestamp = parse_timestamp(field(columns.timestamp.as_str()))
            .unwrap_or_else(|| RecordTime::naive(now));
        let prediction_window = PredictionWindow {
            start: offset_hours(timestamp, self.config.prediction_start_hours)?,
            end: offset_hours(timestamp, self.config.prediction_end_hours)?,
        };

        let line_id = if line.is_empty() {
            self.config.default_line.clone()
        } else {
            line.to_string()
        };

        Some(CanonicalRecord {
            timestamp,
            line_id,
            tool_id: parse_tool_id(tool),
            rpm,
            feed_rate,
            torque,
            state: MachineState::from_measurements(rpm, feed_rate, torque),
            prediction_window,
        })
    }
}

/// Trim whitespace, then one pair of enclosing quotes
pub fn clean_field(value: &str) -> &str {
    let value = value.trim();
    let bytes = value.as_bytes();

    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return &value[1..value.len() - 1];
        }
    }

    value
}

/// Parse a raw measurement field, ignoring thousands separators
///
/// The field is cleaned here, so pass it uncleaned. `0.0` on failure.
pub fn parse_number(value: &str) -> f64 {
    let digits: String = clean_field(value).chars().filter(|&c| c != ',').collect();

    match digits.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Parse a source timestamp
///
/// Tries the fixed layouts first, then ISO-8601 with stray quotes removed.
/// An offset in the ISO form is kept on the result.
pub fn parse_timestamp(value: &str) -> Option<RecordTime> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts.into());
        }
    }

    let unquoted = value.replace('\'', "");
    let iso = unquoted.trim();

    for format in ISO_OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(iso, format) {
            return Some(ts.into());
        }
    }
    for format in ISO_LOCAL_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(iso, format) {
            return Some(ts.into());
        }
    }

    // `Z` suffix
    if let Ok(ts) = DateTime::parse_from_rfc3339(iso) {
        return Some(ts.into());
    }

    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(RecordTime::naive)
}

/// Parse a tool number, accepting float spellings such as `"4242.0"`
pub fn parse_tool_id(value: &str) -> Option<i64> {
    if value.is_empty() {
        return None;
    }

    let n = value.parse::<f64>().ok()?.trunc();
    if n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

fn offset_hours(ts: RecordTime, hours: f64) -> Option<RecordTime> {
    let millis = hours * MILLIS_PER_HOUR;
    if !millis.is_finite() {
        return None;
    }
    ts.checked_add(TimeDelta::try_milliseconds(millis.round() as i64)?)
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::record::config::ColumnMap;

    fn naive(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn ts(s: &str) -> RecordTime {
        RecordTime::naive(naive(s))
    }

    fn kst(s: &str) -> RecordTime {
        RecordTime::with_offset(naive(s), FixedOffset::east_opt(9 * 3600).unwrap())
    }

    fn row(time: &str, line: &str, tool: &str, rpm: &str, feed: &str, troq: &str) -> RawRecord {
        RawRecord::new()
            .with("TimeLine", time)
            .with("ProductionLine", line)
            .with("Tool_Num", tool)
            .with("RPM", rpm)
            .with("Feed", feed)
            .with("Troq", troq)
    }

    #[test]
    fn test_clean_field() {
        assert_eq!(clean_field("  plain  "), "plain");
        assert_eq!(clean_field(" '2025-01-01 00:00:00' "), "2025-01-01 00:00:00");
        assert_eq!(clean_field("\"4242\""), "4242");
        // Only one pair is removed
        assert_eq!(clean_field("''x''"), "'x'");
        // Mismatched quotes are kept
        assert_eq!(clean_field("'x\""), "'x\"");
        assert_eq!(clean_field("'"), "'");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,200.5"), 1200.5);
        assert_eq!(parse_number(" '3.25' "), 3.25);
        assert_eq!(parse_number(" 3.25 "), 3.25);
        // Only one pair of quotes is removed
        assert_eq!(parse_number("'\"5\"'"), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("nan"), 0.0);
        assert_eq!(parse_number("-4"), -4.0);
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        assert_eq!(
            parse_timestamp("2025-01-01 08:00:00"),
            Some(ts("2025-01-01 08:00:00"))
        );

        let fractional = parse_timestamp("2025-01-01 08:00:00.250").unwrap();
        assert_eq!(fractional.wall.and_utc().timestamp_subsec_millis(), 250);
        assert_eq!(fractional.offset, None);

        assert_eq!(
            parse_timestamp("'2025-01-01T08:00:00'"),
            Some(ts("2025-01-01 08:00:00"))
        );
        assert_eq!(
            parse_timestamp("2025-01-01T08:00"),
            Some(ts("2025-01-01 08:00:00"))
        );
        assert_eq!(
            parse_timestamp("2025-01-01 08:00"),
            Some(ts("2025-01-01 08:00:00"))
        );
        assert_eq!(
            parse_timestamp("'2025-01-01 08:00'"),
            Some(ts("2025-01-01 08:00:00"))
        );
        assert_eq!(
            parse_timestamp("2025-01-01T08:00:00.5").unwrap().wall,
            naive("2025-01-01 08:00:00") + TimeDelta::milliseconds(500)
        );
        assert_eq!(
            parse_timestamp("2025-01-01"),
            Some(ts("2025-01-01 00:00:00"))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_timestamp_keeps_offset() {
        assert_eq!(
            parse_timestamp("2025-01-01T08:00:00+09:00"),
            Some(kst("2025-01-01 08:00:00"))
        );
        assert_eq!(
            parse_timestamp("2025-01-01 08:00+09:00"),
            Some(kst("2025-01-01 08:00:00"))
        );

        let utc = parse_timestamp("2025-01-01T08:00:00Z").unwrap();
        assert_eq!(utc.wall, naive("2025-01-01 08:00:00"));
        assert_eq!(utc.offset, FixedOffset::east_opt(0));
    }

    #[test]
    fn test_normalize_keeps_offset_in_window() {
        let normalizer = Normalizer::default();
        let raw = row("2025-01-01T08:00:00+09:00", "", "", "1", "1", "1");

        let record = normalizer.normalize(&raw).unwrap();

        assert_eq!(record.timestamp, kst("2025-01-01 08:00:00"));
        assert_eq!(record.prediction_window.start, kst("2025-01-02 08:00:00"));
        assert_eq!(record.prediction_window.end, kst("2025-01-02 20:00:00"));
        assert_eq!(record.timestamp.to_string(), "2025-01-01T08:00:00+09:00");
    }

    #[test]
    fn test_numeric_fields_lose_one_quote_pair() {
        let normalizer = Normalizer::default();
        let single = row("2025-01-01 00:00:00", "", "", "'5'", "\"0.5\"", "");
        let double = row("2025-01-01 00:00:00", "", "", "'\"5\"'", "", "");

        let record = normalizer.normalize(&single).unwrap();
        assert_eq!(record.rpm, 5.0);
        assert_eq!(record.feed_rate, 0.5);

        assert_eq!(normalizer.normalize(&double).unwrap().rpm, 0.0);
    }

    #[test]
    fn test_parse_tool_id() {
        assert_eq!(parse_tool_id("4242.0"), Some(4242));
        assert_eq!(parse_tool_id("17"), Some(17));
        assert_eq!(parse_tool_id("3.9"), Some(3));
        assert_eq!(parse_tool_id(""), None);
        assert_eq!(parse_tool_id("T-12"), None);
        assert_eq!(parse_tool_id("inf"), None);
    }

    #[test]
    fn test_normalize_full_row() {
        let normalizer = Normalizer::default();
        let raw = row("'2025-01-01 00:00:00'", "2호기", "4242.0", "1,200", "0.5", "0");

        let record = normalizer.normalize(&raw).unwrap();

        assert_eq!(record.timestamp, ts("2025-01-01 00:00:00"));
        assert_eq!(record.line_id, "2호기");
        assert_eq!(record.tool_id, Some(4242));
        assert_eq!(record.rpm, 1200.0);
        assert_eq!(record.feed_rate, 0.5);
        assert_eq!(record.torque, 0.0);
        assert_eq!(record.state, MachineState::Cutting);
        assert_eq!(record.prediction_window.start, ts("2025-01-02 00:00:00"));
        assert_eq!(record.prediction_window.end, ts("2025-01-02 12:00:00"));
    }

    #[test]
    fn test_normalize_idle_without_spindle() {
        let normalizer = Normalizer::default();
        let raw = row("2025-01-01 00:00:00", "", "", "0", "5", "0");

        let record = normalizer.normalize(&raw).unwrap();

        assert_eq!(record.state, MachineState::Idle);
        assert_eq!(record.line_id, "1호기");
        assert_eq!(record.tool_id, None);
    }

    #[test]
    fn test_malformed_numeric_defaults() {
        let normalizer = Normalizer::default();
        let raw = row("2025-01-01 00:00:00", "1호기", "1", "abc", "2", "2");

        let record = normalizer.normalize(&raw).unwrap();

        assert_eq!(record.rpm, 0.0);
        assert_eq!(record.state, MachineState::Idle);
    }

    #[test]
    fn test_unparseable_timestamp_uses_processing_time() {
        let normalizer = Normalizer::default();
        let now = naive("2030-06-01 12:00:00");
        let raw = row("not a time", "1호기", "", "1", "1", "1");

        let record = normalizer.normalize_at(&raw, now).unwrap();

        assert_eq!(record.timestamp, RecordTime::naive(now));
        assert_eq!(record.prediction_window.start, ts("2030-06-02 12:00:00"));
    }

    #[test]
    fn test_line_filter() {
        let normalizer = Normalizer::new(NormalizeConfig::default().line_filter("1호기"));

        let other = row("2025-01-01 00:00:00", "2호기", "", "1", "1", "1");
        assert!(normalizer.normalize(&other).is_none());

        let same = row("2025-01-01 00:00:00", "'1호기'", "", "1", "1", "1");
        assert!(normalizer.normalize(&same).is_some());

        // The filter compares the source value, before the fallback applies
        let blank = row("2025-01-01 00:00:00", "", "", "1", "1", "1");
        assert!(normalizer.normalize(&blank).is_none());
    }

    #[test]
    fn test_tool_filter_exact_text() {
        let normalizer = Normalizer::new(NormalizeConfig::default().tool_filter("4242"));

        let exact = row("2025-01-01 00:00:00", "", " 4242 ", "1", "1", "1");
        assert_eq!(normalizer.normalize(&exact).unwrap().tool_id, Some(4242));

        let float_form = row("2025-01-01 00:00:00", "", "4242.0", "1", "1", "1");
        assert!(normalizer.normalize(&float_form).is_none());
    }

    #[test]
    fn test_blank_row_dropped() {
        let normalizer = Normalizer::default();

        assert!(normalizer.normalize(&RawRecord::new()).is_none());
        assert!(normalizer
            .normalize(&row(" ", "", "''", "", "", ""))
            .is_none());
    }

    #[test]
    fn test_missing_columns_default() {
        let normalizer = Normalizer::default();
        let raw = RawRecord::new().with("TimeLine", "2025-01-01 00:00:00");

        let record = normalizer.normalize(&raw).unwrap();

        assert_eq!(record.rpm, 0.0);
        assert_eq!(record.feed_rate, 0.0);
        assert_eq!(record.torque, 0.0);
        assert_eq!(record.state, MachineState::Idle);
    }

    #[test]
    fn test_out_of_range_window_dropped() {
        let config = NormalizeConfig::default().prediction_offsets(0.0, f64::INFINITY);
        let normalizer = Normalizer::new(config);
        let raw = row("2025-01-01 00:00:00", "", "", "1", "1", "1");

        assert!(normalizer.normalize(&raw).is_none());
    }

    #[test]
    fn test_custom_columns() {
        let columns = ColumnMap {
            rpm: "spindle".into(),
            ..ColumnMap::default()
        };
        let normalizer = Normalizer::new(NormalizeConfig::default().columns(columns));
        let raw = RawRecord::new()
            .with("TimeLine", "2025-01-01 00:00:00")
            .with("spindle", "800")
            .with("Feed", "1");

        let record = normalizer.normalize(&raw).unwrap();

        assert_eq!(record.rpm, 800.0);
        assert_eq!(record.state, MachineState::Cutting);
    }
}
