//! Attribute values.
//!
//! [`Value`] is what fields read from and write to an
//! [`Instance`](crate::model::Instance). Submitted data always arrives as
//! strings, so the two conversions that matter are into a control
//! ([`Value::to_input_string`], using the formats HTML inputs expect) and
//! back out of one ([`Value::parse_temporal`] and friends, used by typed
//! fields on validate and apply).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Format of `<input type="date">`.
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
/// Format of `<input type="datetime-local">`.
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Format of `<input type="time">`.
pub const TIME_INPUT_FORMAT: &str = "%H:%M:%S";

const DATETIME_FALLBACKS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// The temporal kinds an input can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    /// A calendar date.
    Date,
    /// A date with a wall-clock time.
    DateTime,
    /// A wall-clock time.
    Time,
}

impl TemporalKind {
    /// The matching HTML input type.
    pub const fn input_type(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "datetime-local",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Date => "date",
            Self::DateTime => "date and time",
            Self::Time => "time",
        })
    }
}

/// An attribute value.
///
/// # Examples
///
/// ```
/// use formbind_db::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
/// assert_eq!(v.to_input_string(), "42");
///
/// assert_eq!(Value::Null.to_input_string(), "");
/// assert!(Value::from("").is_blank());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unset.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Primary keys of stores that hand out UUIDs.
    Uuid(uuid::Uuid),
    /// Structured data kept verbatim.
    Json(serde_json::Value),
    /// Several values under one name (checkbox lists).
    List(Vec<Value>),
}

impl fmt::Display for Value {
    /// `Null` shows as `NULL`; lists as `[a, b]`; everything else as it
    /// would appear in a control.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::List(values) => {
                let items: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            other => f.write_str(&other.to_input_string()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => String,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    NaiveTime => Time,
    uuid::Uuid => Uuid,
    serde_json::Value => Json,
    Vec<Value> => List,
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `Null` or the empty string: what a required field rejects.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The value as an HTML control carries it. `Null` is empty and
    /// temporal values use the input formats.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use formbind_db::value::Value;
    ///
    /// let d = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    /// assert_eq!(Value::Date(d).to_input_string(), "2024-01-15");
    /// let dt = d.and_hms_opt(9, 30, 0).unwrap();
    /// assert_eq!(Value::DateTime(dt).to_input_string(), "2024-01-15T09:30:00");
    /// ```
    pub fn to_input_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(v) => v.to_string(),
            Self::String(s) => s.clone(),
            Self::Date(d) => d.format(DATE_INPUT_FORMAT).to_string(),
            Self::DateTime(dt) => dt.format(DATETIME_INPUT_FORMAT).to_string(),
            Self::Time(t) => t.format(TIME_INPUT_FORMAT).to_string(),
            Self::Uuid(u) => u.to_string(),
            Self::Json(j) => j.to_string(),
            Self::List(_) => self.to_string(),
        }
    }

    /// Parses submitted text into a temporal value. Datetimes also accept
    /// minutes-only and space-separated forms; times accept `HH:MM`.
    /// Returns `None` when the text does not parse.
    pub fn parse_temporal(kind: TemporalKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match kind {
            TemporalKind::Date => NaiveDate::parse_from_str(raw, DATE_INPUT_FORMAT)
                .ok()
                .map(Self::Date),
            TemporalKind::DateTime => std::iter::once(DATETIME_INPUT_FORMAT)
                .chain(DATETIME_FALLBACKS.iter().copied())
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(Self::DateTime),
            TemporalKind::Time => NaiveTime::parse_from_str(raw, TIME_INPUT_FORMAT)
                .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
                .ok()
                .map(Self::Time),
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Converts the value for JSON template contexts.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Json(j) => j.clone(),
            Self::List(values) => Json::Array(values.iter().map(Self::to_json).collect()),
            other => Json::String(other.to_input_string()),
        }
    }
}
