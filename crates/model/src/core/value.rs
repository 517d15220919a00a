use crate::core::data_type::DataType;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type of the value, `None` for null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int(_) => Some(DataType::Long),
            Value::Float(_) => Some(DataType::Double),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::String(_) => Some(DataType::String),
            Value::Date(_) => Some(DataType::Date),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => {
                let truncated = *v as i64;
                (truncated as f64 == *v).then_some(truncated)
            }
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Value::String(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Convert to a value of `target` when Postgres would accept the
    /// assignment: the widenings, plus DOUBLE into BIGINT rounded half to
    /// even. Returns `None` otherwise.
    pub fn cast_to(&self, target: &DataType) -> Option<Value> {
        let Some(source) = self.data_type() else {
            return Some(Value::Null);
        };
        if source == *target {
            return Some(self.clone());
        }
        match (target, self) {
            (DataType::Double, Value::Int(v)) => Some(Value::Float(*v as f64)),
            (DataType::Long, Value::Float(v)) => float_to_long(*v).map(Value::Int),
            (DataType::Timestamp, Value::Date(d)) => Some(Value::Timestamp(d.and_time(NaiveTime::MIN))),
            (DataType::String, v) => Some(Value::String(v.to_string())),
            _ => None,
        }
    }
}

/// Same rounding as the float8 to int8 cast; out-of-range and non-finite
/// values do not fit.
fn float_to_long(v: f64) -> Option<i64> {
    let rounded = v.round_ties_even();
    (rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64)
        .then_some(rounded as i64)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Null => Ok(()),
        }
    }
}

/// Parse the timestamp text forms found in trip files. Bare dates resolve
/// to midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_date(text).map(|d| d.and_time(NaiveTime::MIN)))
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn parses_supported_timestamp_forms() {
        let expected = ts("2020-01-01 00:28:15");
        assert_eq!(parse_timestamp("2020-01-01 00:28:15"), Some(expected));
        assert_eq!(parse_timestamp("2020-01-01T00:28:15"), Some(expected));
        assert_eq!(parse_timestamp("01/01/2020 12:28:15 AM"), Some(expected));
        assert_eq!(parse_timestamp("2020-01-01"), Some(ts("2020-01-01 00:00:00")));
    }

    #[test]
    fn fractional_seconds_are_kept() {
        let parsed = parse_timestamp("2020-01-01 00:28:15.250").unwrap();
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn garbage_is_not_a_timestamp() {
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("2020-13-45 00:00:00"), None);
    }

    #[test]
    fn numeric_accessors() {
        assert_eq!(Value::Int(4).as_f64(), Some(4.0));
        assert_eq!(Value::Float(4.0).as_i64(), Some(4));
        assert_eq!(Value::Float(4.5).as_i64(), None);
        assert_eq!(Value::String(" 17 ".into()).as_i64(), Some(17));
        assert_eq!(Value::String("NA".into()).as_i64(), None);
        assert_eq!(Value::Null.as_i64(), None);
    }

    #[test]
    fn casts_follow_widenings() {
        assert_eq!(Value::Int(3).cast_to(&DataType::Double), Some(Value::Float(3.0)));
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).cast_to(&DataType::Timestamp),
            Some(Value::Timestamp(ts("2020-01-01 00:00:00")))
        );
        assert_eq!(
            Value::Boolean(true).cast_to(&DataType::String),
            Some(Value::String("true".into()))
        );
        assert_eq!(Value::Null.cast_to(&DataType::Long), Some(Value::Null));
        assert_eq!(Value::Boolean(true).cast_to(&DataType::Long), None);
        assert_eq!(Value::String("7".into()).cast_to(&DataType::Long), None);
    }

    #[test]
    fn doubles_round_into_bigint_columns() {
        assert_eq!(Value::Float(0.0).cast_to(&DataType::Long), Some(Value::Int(0)));
        assert_eq!(Value::Float(0.5).cast_to(&DataType::Long), Some(Value::Int(0)));
        assert_eq!(Value::Float(1.5).cast_to(&DataType::Long), Some(Value::Int(2)));
        assert_eq!(Value::Float(-2.7).cast_to(&DataType::Long), Some(Value::Int(-3)));
        assert_eq!(Value::Float(f64::NAN).cast_to(&DataType::Long), None);
        assert_eq!(Value::Float(1e20).cast_to(&DataType::Long), None);
    }
}
