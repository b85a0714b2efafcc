//! Type casting
//!
//! `timestamp`, `time` and `duration` are conversions between Unix seconds
//! and their text forms, not value tags of their own.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};

use crate::value::Value;

use super::errors::{OpError, OpResult};

/// Cast targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastTarget {
    Int,
    Float,
    String,
    Bool,
    /// RFC 3339 text to Unix seconds
    Timestamp,
    /// Unix seconds to RFC 3339 text
    Time,
    /// Seconds to ISO-8601 duration text
    Duration,
}

impl CastTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            CastTarget::Int => "int",
            CastTarget::Float => "float",
            CastTarget::String => "string",
            CastTarget::Bool => "bool",
            CastTarget::Timestamp => "timestamp",
            CastTarget::Time => "time",
            CastTarget::Duration => "duration",
        }
    }
}

impl fmt::Display for CastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CastTarget {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" => Ok(CastTarget::Int),
            "float" => Ok(CastTarget::Float),
            "string" => Ok(CastTarget::String),
            "bool" => Ok(CastTarget::Bool),
            "timestamp" => Ok(CastTarget::Timestamp),
            "time" => Ok(CastTarget::Time),
            "duration" => Ok(CastTarget::Duration),
            other => Err(OpError::UnknownCastTarget(other.to_string())),
        }
    }
}

/// Converts `v` to `target`
pub fn cast(v: &Value, target: CastTarget) -> OpResult<Value> {
    let cannot = || OpError::CannotCast {
        from: v.value_type(),
        to: target.to_string(),
    };

    match target {
        CastTarget::Int => match v {
            Value::Int(_) => Ok(v.clone()),
            Value::Float(f) => Ok(Value::Int(f.floor() as i64)),
            Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| cannot()),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        },
        CastTarget::Float => match v {
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Float(_) => Ok(v.clone()),
            Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| cannot()),
            Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        },
        CastTarget::String => Ok(Value::String(v.to_string())),
        CastTarget::Bool => match v {
            Value::Int(i) => Ok(Value::Bool(*i != 0)),
            Value::Float(f) => Ok(Value::Bool(*f != 0.0)),
            Value::String(s) => Ok(Value::Bool(!s.is_empty())),
            Value::Bool(_) => Ok(v.clone()),
        },
        CastTarget::Timestamp => match v {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| Value::Int(t.timestamp()))
                .map_err(|_| cannot()),
            _ => Err(cannot()),
        },
        CastTarget::Time => {
            let secs = seconds(v).ok_or_else(cannot)?;
            Utc.timestamp_opt(secs, 0)
                .single()
                .map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::Secs, true)))
                .ok_or_else(cannot)
        }
        CastTarget::Duration => {
            let secs = seconds(v).ok_or_else(cannot)?;
            Duration::try_seconds(secs)
                .map(|d| Value::String(d.to_string()))
                .ok_or_else(cannot)
        }
    }
}

fn seconds(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.is_finite() => Some(f.floor() as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast_to(v: Value, target: &str) -> OpResult<Value> {
        cast(&v, target.parse()?)
    }

    #[test]
    fn test_numeric_casts() {
        assert_eq!(cast_to(Value::Float(2.7), "int").unwrap(), Value::Int(2));
        assert_eq!(cast_to(Value::Float(-2.5), "int").unwrap(), Value::Int(-3));
        assert_eq!(cast_to(Value::from("42"), "int").unwrap(), Value::Int(42));
        assert_eq!(cast_to(Value::Bool(true), "int").unwrap(), Value::Int(1));
        assert_eq!(cast_to(Value::Int(3), "float").unwrap(), Value::Float(3.0));
        assert_eq!(cast_to(Value::from("1.5"), "float").unwrap(), Value::Float(1.5));
        assert!(cast_to(Value::from("x"), "int").is_err());
    }

    #[test]
    fn test_string_and_bool_casts() {
        assert_eq!(cast_to(Value::Int(7), "string").unwrap(), Value::from("7"));
        assert_eq!(cast_to(Value::from(""), "bool").unwrap(), Value::Bool(false));
        assert_eq!(cast_to(Value::from("x"), "bool").unwrap(), Value::Bool(true));
        assert_eq!(cast_to(Value::Int(0), "bool").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_time_casts() {
        assert_eq!(
            cast_to(Value::from("1970-01-02T00:00:00Z"), "timestamp").unwrap(),
            Value::Int(86400)
        );
        assert_eq!(
            cast_to(Value::Int(86400), "time").unwrap(),
            Value::from("1970-01-02T00:00:00Z")
        );
        assert_eq!(
            cast_to(Value::Int(90), "duration").unwrap(),
            Value::from("PT90S")
        );
        assert!(cast_to(Value::Int(1), "timestamp").is_err());
    }

    #[test]
    fn test_unknown_target() {
        assert_eq!(
            "date".parse::<CastTarget>(),
            Err(OpError::UnknownCastTarget("date".into()))
        );
    }
}
