//! Timestamps, frequencies, and horizon extension
//!
//! This module provides:
//! - A timestamp value that is either a calendar datetime or a plain number
//! - A step frequency (duration or numeric increment)
//! - Helpers to continue a series past its last observation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::data::frame::{Cell, TimeSeriesFrame};
use crate::error::{Error, Result};

/// Datetime formats accepted when parsing timestamp strings
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A single point on the time axis
///
/// Series indexed by calendar time use `DateTime`; series indexed by an
/// integer counter (epoch milliseconds, tick numbers) use `Number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timestamp {
    /// Calendar datetime without a timezone
    DateTime(NaiveDateTime),
    /// Plain numeric index
    Number(i64),
}

impl Timestamp {
    /// Parse a timestamp from a string
    ///
    /// Tries RFC 3339 first, then the common date/datetime layouts, then a
    /// plain integer.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Timestamp::DateTime(dt.naive_utc()));
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Timestamp::DateTime(dt));
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Timestamp::DateTime(d.and_time(NaiveTime::MIN)));
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Timestamp::Number(n));
        }
        Err(Error::TimestampParse(s.to_string()))
    }

    /// Advance this timestamp by one frequency step
    pub fn step(&self, freq: &Freq) -> Result<Timestamp> {
        match (self, freq) {
            (Timestamp::DateTime(dt), Freq::Duration(d)) => dt
                .checked_add_signed(*d)
                .map(Timestamp::DateTime)
                .ok_or_else(|| {
                    Error::InvalidFrequency(format!("advancing {dt} by {d} overflows"))
                }),
            (Timestamp::Number(n), Freq::Step(s)) => n
                .checked_add(*s)
                .map(Timestamp::Number)
                .ok_or_else(|| Error::InvalidFrequency(format!("advancing {n} by {s} overflows"))),
            (Timestamp::DateTime(_), Freq::Step(_)) => Err(Error::InvalidFrequency(
                "numeric frequency cannot advance a datetime timestamp".to_string(),
            )),
            (Timestamp::Number(_), Freq::Duration(_)) => Err(Error::InvalidFrequency(
                "duration frequency cannot advance a numeric timestamp".to_string(),
            )),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::DateTime(dt) => {
                if dt.and_utc().timestamp_subsec_nanos() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f"))
                }
            }
            Timestamp::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Spacing between consecutive observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freq {
    /// Calendar duration (for datetime-indexed series)
    Duration(Duration),
    /// Numeric increment (for integer-indexed series)
    Step(i64),
}

impl Freq {
    /// Parse a frequency from strings like `"30s"`, `"15min"`, `"1h"`,
    /// `"1d"`, `"1w"`, or a bare integer step
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidFrequency("empty frequency".to_string()));
        }
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        if unit.is_empty() {
            let step: i64 = digits
                .parse()
                .map_err(|_| Error::InvalidFrequency(s.to_string()))?;
            return Self::positive(Freq::Step(step), s);
        }
        let count: i64 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| Error::InvalidFrequency(s.to_string()))?
        };
        let duration = match unit.trim().to_ascii_lowercase().as_str() {
            "ms" => Duration::try_milliseconds(count),
            "s" | "sec" | "secs" | "second" | "seconds" => Duration::try_seconds(count),
            "m" | "min" | "mins" | "minute" | "minutes" => Duration::try_minutes(count),
            "h" | "hour" | "hours" => Duration::try_hours(count),
            "d" | "day" | "days" => Duration::try_days(count),
            "w" | "week" | "weeks" => Duration::try_weeks(count),
            _ => return Err(Error::InvalidFrequency(s.to_string())),
        }
        .ok_or_else(|| Error::InvalidFrequency(s.to_string()))?;
        Self::positive(Freq::Duration(duration), s)
    }

    /// Whether the frequency advances time forward
    pub fn is_positive(&self) -> bool {
        match self {
            Freq::Duration(d) => *d > Duration::zero(),
            Freq::Step(s) => *s > 0,
        }
    }

    fn positive(freq: Freq, original: &str) -> Result<Self> {
        if freq.is_positive() {
            Ok(freq)
        } else {
            Err(Error::InvalidFrequency(format!(
                "frequency must be positive: {original}"
            )))
        }
    }
}

impl FromStr for Freq {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Freq::parse(s)
    }
}

impl fmt::Display for Freq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freq::Duration(d) => write!(f, "{d}"),
            Freq::Step(s) => write!(f, "{s}"),
        }
    }
}

/// Infer the frequency from the spacing of the last two observations
pub fn infer_freq(recent: &[Timestamp]) -> Result<Freq> {
    if recent.len() < 2 {
        return Err(Error::InvalidFrequency(
            "at least two observations are required to infer a frequency".to_string(),
        ));
    }
    let a = recent[recent.len() - 2];
    let b = recent[recent.len() - 1];
    let freq = match (a, b) {
        (Timestamp::DateTime(a), Timestamp::DateTime(b)) => Freq::Duration(b - a),
        (Timestamp::Number(a), Timestamp::Number(b)) => Freq::Step(b - a),
        _ => {
            return Err(Error::InvalidFrequency(
                "mixed datetime and numeric timestamps".to_string(),
            ))
        }
    };
    if !freq.is_positive() {
        return Err(Error::InvalidFrequency(
            "timestamps are not strictly increasing".to_string(),
        ));
    }
    Ok(freq)
}

/// Generate `periods` timestamps strictly after `last`
///
/// Uses `freq` when given, otherwise infers it from `recent`. The returned
/// sequence starts at `last + freq`; `last` itself is never included.
pub fn create_timestamps(
    last: Timestamp,
    freq: Option<&Freq>,
    recent: Option<&[Timestamp]>,
    periods: usize,
) -> Result<Vec<Timestamp>> {
    let freq = match (freq, recent) {
        (Some(f), _) => *f,
        (None, Some(seq)) => infer_freq(seq)?,
        (None, None) => {
            return Err(Error::InvalidFrequency(
                "neither a frequency nor a recent time sequence was provided".to_string(),
            ))
        }
    };
    if !freq.is_positive() {
        return Err(Error::InvalidFrequency(format!(
            "frequency must be positive: {freq}"
        )));
    }
    let mut out = Vec::with_capacity(periods);
    let mut current = last;
    for _ in 0..periods {
        current = current.step(&freq)?;
        out.push(current);
    }
    Ok(out)
}

/// Extend a frame past its end with empty rows covering the forecast horizon
///
/// For each identifier group, appends `periods` rows whose timestamp
/// continues the group at `freq` (inferred from the group's last two
/// observations when not given), whose grouping columns repeat the group key,
/// and whose remaining columns are left empty. Rows within each group are
/// emitted sorted by timestamp; groups keep their first-appearance order.
pub fn extend_time_series(
    frame: &TimeSeriesFrame,
    timestamp_column: &str,
    grouping_columns: &[String],
    periods: usize,
    freq: Option<&Freq>,
) -> Result<TimeSeriesFrame> {
    let stamps = frame.timestamps(timestamp_column)?;
    let groups = frame.sorted_group_indices(grouping_columns, Some(timestamp_column))?;
    let grouped: Vec<bool> = frame
        .column_names()
        .iter()
        .map(|name| name == timestamp_column || grouping_columns.contains(name))
        .collect();

    let mut out = frame.empty_like();
    for group in &groups {
        if group.rows.is_empty() {
            continue;
        }
        for &row in &group.rows {
            out.push_row(frame.row(row))?;
        }
        let recent: Vec<Timestamp> = group.rows.iter().map(|&row| stamps[row]).collect();
        let last = recent[recent.len() - 1];
        let generated = create_timestamps(last, freq, Some(&recent), periods)?;
        let proto = frame.row(group.rows[0]);
        for stamp in generated {
            let cells: Vec<Cell> = frame
                .column_names()
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    if name == timestamp_column {
                        Cell::Timestamp(stamp)
                    } else if grouped[i] {
                        proto[i].clone()
                    } else {
                        Cell::Null
                    }
                })
                .collect();
            out.push_row(cells)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::Column;

    fn dt(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(matches!(dt("2024-01-02 03:04:05"), Timestamp::DateTime(_)));
        assert!(matches!(dt("2024-01-02T03:04:05"), Timestamp::DateTime(_)));
        assert!(matches!(dt("2024-01-02"), Timestamp::DateTime(_)));
        assert_eq!(dt("1704067200000"), Timestamp::Number(1704067200000));
        assert!(Timestamp::parse("not a time").is_err());
    }

    #[test]
    fn test_parse_freq() {
        assert_eq!(
            Freq::parse("15min").unwrap(),
            Freq::Duration(Duration::minutes(15))
        );
        assert_eq!(
            Freq::parse("1h").unwrap(),
            Freq::Duration(Duration::hours(1))
        );
        assert_eq!(Freq::parse("3600").unwrap(), Freq::Step(3600));
        assert!(Freq::parse("1fortnight").is_err());
        assert!(Freq::parse("").is_err());
        assert!(Freq::parse("0h").is_err());
    }

    #[test]
    fn test_create_timestamps_datetime() {
        let base = dt("2024-01-01 00:00:00");
        let freq = Freq::Duration(Duration::hours(1));
        let stamps = create_timestamps(base, Some(&freq), None, 3).unwrap();
        assert_eq!(stamps.len(), 3);
        assert_eq!(stamps[0], dt("2024-01-01 01:00:00"));
        assert_eq!(stamps[2], dt("2024-01-01 03:00:00"));
    }

    #[test]
    fn test_create_timestamps_inferred() {
        let recent = vec![Timestamp::Number(10), Timestamp::Number(20)];
        let stamps = create_timestamps(Timestamp::Number(20), None, Some(&recent), 2).unwrap();
        assert_eq!(stamps, vec![Timestamp::Number(30), Timestamp::Number(40)]);
    }

    #[test]
    fn test_create_timestamps_requires_freq_or_sequence() {
        assert!(create_timestamps(Timestamp::Number(0), None, None, 2).is_err());
    }

    #[test]
    fn test_infer_freq_rejects_non_increasing() {
        let recent = vec![Timestamp::Number(5), Timestamp::Number(5)];
        assert!(infer_freq(&recent).is_err());
    }

    #[test]
    fn test_mixed_kinds_error() {
        let base = Timestamp::Number(0);
        let freq = Freq::Duration(Duration::hours(1));
        assert!(base.step(&freq).is_err());
    }

    fn two_series_frame() -> TimeSeriesFrame {
        TimeSeriesFrame::from_columns(vec![
            (
                "ts".to_string(),
                Column::Timestamp(vec![
                    dt("2024-01-01 00:00:00"),
                    dt("2024-01-01 01:00:00"),
                    dt("2024-01-01 00:00:00"),
                    dt("2024-01-01 01:00:00"),
                ]),
            ),
            (
                "asset".to_string(),
                Column::Str(vec![
                    Some("BTC".to_string()),
                    Some("BTC".to_string()),
                    Some("ETH".to_string()),
                    Some("ETH".to_string()),
                ]),
            ),
            (
                "close".to_string(),
                Column::Float(vec![100.0, 101.0, 10.0, 11.0]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_extend_time_series() {
        let frame = two_series_frame();
        let extended =
            extend_time_series(&frame, "ts", &["asset".to_string()], 2, None).unwrap();

        // 2 rows per group, plus 2 generated rows per group
        assert_eq!(extended.num_rows(), 8);

        let stamps = extended.timestamps("ts").unwrap();
        assert_eq!(stamps[2], dt("2024-01-01 02:00:00"));
        assert_eq!(stamps[3], dt("2024-01-01 03:00:00"));

        // generated rows copy the group key and leave values empty
        assert_eq!(
            extended.cell(3, "asset").unwrap(),
            Cell::Str("BTC".to_string())
        );
        assert!(matches!(extended.cell(3, "close").unwrap(), Cell::Float(v) if v.is_nan()));

        // second group follows in first-appearance order
        assert_eq!(
            extended.cell(4, "asset").unwrap(),
            Cell::Str("ETH".to_string())
        );
    }

    #[test]
    fn test_extend_with_explicit_freq() {
        let frame = two_series_frame();
        let freq = Freq::parse("30min").unwrap();
        let extended =
            extend_time_series(&frame, "ts", &["asset".to_string()], 1, Some(&freq)).unwrap();
        let stamps = extended.timestamps("ts").unwrap();
        assert_eq!(stamps[2], dt("2024-01-01 01:30:00"));
    }

    #[test]
    fn test_extend_empty_frame_stays_empty() {
        let frame = TimeSeriesFrame::from_columns(vec![
            ("ts".to_string(), Column::Timestamp(Vec::new())),
            ("close".to_string(), Column::Float(Vec::new())),
        ])
        .unwrap();
        // ungrouped frames form a single group covering every row
        let extended = extend_time_series(&frame, "ts", &[], 2, None).unwrap();
        assert_eq!(extended.num_rows(), 0);
    }
}
