use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

use crate::foundation::error::{ChartError, ChartResult};

/// A scalar cell value from an inline data record.
#[derive(Clone, Debug)]
pub enum Datum {
    /// Missing or `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Finite number.
    Number(f64),
    /// String (nested objects/arrays are stringified).
    Text(String),
}

impl Datum {
    /// Convert a JSON value into a datum.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => Self::Number(f),
                _ => Self::Null,
            },
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Numeric view; numeric strings are accepted, everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Bool(_) | Self::Null => None,
        }
    }

    /// Return `true` for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Human-readable label used for discrete ticks, legends and text marks.
    pub fn label(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(v) => format_plain_number(*v),
            Self::Text(s) => s.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Datum {}

impl PartialOrd for Datum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Datum {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// One inline data record.
pub type Record = BTreeMap<String, Datum>;

/// An ordered table of inline records.
#[derive(Clone, Debug, Default)]
pub struct Table {
    rows: Vec<Record>,
}

impl Table {
    /// Build a table from inline `data.values`.
    ///
    /// Non-object entries become a record with a single `data` field, matching how Vega-Lite
    /// treats primitive arrays.
    pub fn from_values(values: &[Value]) -> Self {
        let rows = values
            .iter()
            .map(|v| match v {
                Value::Object(obj) => obj
                    .iter()
                    .map(|(k, v)| (k.clone(), Datum::from_json(v)))
                    .collect(),
                other => {
                    let mut rec = Record::new();
                    rec.insert("data".to_string(), Datum::from_json(other));
                    rec
                }
            })
            .collect();
        Self { rows }
    }

    /// Build a table from already-materialized records.
    pub fn from_records(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    /// Borrow the records.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` when there are no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return `true` when at least one record carries `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.rows.iter().any(|r| r.contains_key(field))
    }

    /// Records for which `keep` returns `true`, in original order.
    pub fn filter(&self, keep: impl Fn(&Record) -> bool) -> Self {
        Self {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

/// Look up a field, treating absent fields as `Null`.
pub fn field_value<'a>(record: &'a Record, field: &str) -> &'a Datum {
    const NULL: &Datum = &Datum::Null;
    record.get(field).unwrap_or(NULL)
}

/// Interpret a datum as a timestamp in epoch milliseconds (UTC).
///
/// Numbers are taken as epoch milliseconds. Strings accept `YYYY`, `YYYY-MM`, `YYYY-MM-DD`,
/// optionally followed by `THH:MM[:SS[.fff]]` (or a space instead of `T`) and either `Z` or a
/// `+HH:MM` offset. Strings without an offset are read as UTC.
pub fn parse_temporal(d: &Datum) -> ChartResult<Option<f64>> {
    match d {
        Datum::Null => Ok(None),
        Datum::Number(v) => Ok(Some(*v)),
        Datum::Bool(_) => Err(ChartError::compilation(format!(
            "cannot interpret '{}' as a temporal value",
            d.label()
        ))),
        Datum::Text(s) => parse_iso_datetime(s).map(Some).ok_or_else(|| {
            ChartError::compilation(format!("cannot interpret '{s}' as a temporal value"))
        }),
    }
}

fn parse_iso_datetime(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    let s = s.strip_suffix('Z').unwrap_or(s);
    let (date, time) = match s.find(['T', ' ']) {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };

    let mut parts = date.split('-');
    let year: i32 = parse_digits(parts.next()?, 4)?;
    let month: u32 = match parts.next() {
        Some(p) => parse_digits(p, 2)?,
        None => 1,
    };
    let day: u32 = match parts.next() {
        Some(p) => parse_digits(p, 2)?,
        None => 1,
    };
    if parts.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let (time, offset) = match time {
        None => (NaiveTime::MIN, 0),
        Some(t) => {
            let t = t.strip_suffix('Z').unwrap_or(t);
            let (clock, offset) = match t.rfind(['+', '-']) {
                Some(idx) => (&t[..idx], parse_offset(&t[idx..])?),
                None => (t, 0),
            };
            let clock = NaiveTime::parse_from_str(clock, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M"))
                .ok()?;
            (clock, offset)
        }
    };

    let utc = NaiveDateTime::new(date, time).and_utc().timestamp_millis() - offset * 1000;
    Some(utc as f64)
}

/// Signed `+HH:MM`/`+HHMM`/`+HH` offset in seconds east of UTC.
fn parse_offset(s: &str) -> Option<i64> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    let (h, m) = match digits.len() {
        2 => (parse_digits::<i32>(&digits, 2)?, 0),
        4 => (parse_digits::<i32>(&digits[..2], 2)?, parse_digits::<i32>(&digits[2..], 2)?),
        _ => return None,
    };
    if m > 59 {
        return None;
    }
    let offset = FixedOffset::east_opt(sign * (h * 3600 + m * 60))?;
    Some(i64::from(offset.local_minus_utc()))
}

fn parse_digits<T: std::str::FromStr>(p: &str, len: usize) -> Option<T> {
    if p.len() != len || !p.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    p.parse().ok()
}

/// Milliseconds per day.
pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Epoch milliseconds of midnight UTC on a calendar date, or `None` for an impossible date.
pub fn date_ms(year: i32, month: u32, day: u32) -> Option<f64> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis() as f64)
}

/// UTC date-time for epoch milliseconds (sub-millisecond parts are floored).
pub fn utc_from_ms(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.floor() as i64)
}

fn format_plain_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/data.rs"]
mod tests;
