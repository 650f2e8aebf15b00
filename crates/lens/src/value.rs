//
// value.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::cmp::Ordering;
use std::fmt;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Timelike;
use chrono::Utc;
use relay::comm::data_explorer_comm::ColumnDisplayType;

/// A single cell of a table, detached from the engine it came from.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// An explicit null, e.g. an Arrow null slot.
    Null,

    /// A missing value in a typed column.
    NotAvailable,

    /// A missing value in a temporal column.
    NotATime,

    /// An absent value inside a dynamic (object) column.
    Missing,

    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
    DatetimeTz(DateTime<FixedOffset>),
    Time(NaiveTime),
    List(Vec<Value>),
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Null-like values, including floating point NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null | Value::NotAvailable | Value::NotATime | Value::Missing => true,
            Value::Float(x) => x.is_nan(),
            _ => false,
        }
    }

    pub fn display_type(&self) -> Option<ColumnDisplayType> {
        let display = match self {
            Value::Null | Value::NotAvailable | Value::NotATime | Value::Missing => return None,
            Value::Bool(_) => ColumnDisplayType::Boolean,
            Value::Int(_) | Value::Float(_) => ColumnDisplayType::Number,
            Value::Str(_) => ColumnDisplayType::String,
            Value::Date(_) => ColumnDisplayType::Date,
            Value::Datetime(_) | Value::DatetimeTz(_) => ColumnDisplayType::Datetime,
            Value::Time(_) => ColumnDisplayType::Time,
            Value::List(_) => ColumnDisplayType::Array,
            Value::Struct(_) => ColumnDisplayType::Struct,
        };
        Some(display)
    }

    /// Numeric projection used by statistics and histograms. Dates map to
    /// days since the epoch, datetimes to seconds since the epoch and times
    /// to seconds since midnight.
    pub fn to_numeric(&self) -> Option<f64> {
        match self {
            Value::Int(x) => Some(*x as f64),
            Value::Float(x) if !x.is_nan() => Some(*x),
            Value::Date(x) => Some((*x - epoch().date()).num_days() as f64),
            Value::Datetime(x) => Some(datetime_seconds(x)),
            Value::DatetimeTz(x) => Some(datetime_seconds(&x.naive_utc())),
            Value::Time(x) => {
                Some(x.num_seconds_from_midnight() as f64 + x.nanosecond() as f64 / 1e9)
            },
            _ => None,
        }
    }

    /// Compares two values for filtering. Returns `None` when either side
    /// is missing or when the values are of unrelated kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if self.is_missing() || other.is_missing() {
            return None;
        }

        match (self, other) {
            (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
            (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.to_numeric()?.partial_cmp(&other.to_numeric()?)
            },
            (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
            (Value::Time(x), Value::Time(y)) => Some(x.cmp(y)),
            (Value::DatetimeTz(x), Value::DatetimeTz(y)) => Some(x.cmp(y)),
            (Value::Date(_) | Value::Datetime(_) | Value::DatetimeTz(_), _) |
            (_, Value::Date(_) | Value::Datetime(_) | Value::DatetimeTz(_)) => {
                Some(self.as_naive_datetime()?.cmp(&other.as_naive_datetime()?))
            },
            _ => None,
        }
    }

    /// Total order used for sorting. Missing values are expected to be
    /// handled by the caller; values of different kinds order by kind.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
            (Value::Int(x), Value::Int(y)) => x.cmp(y),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let x = self.to_numeric().unwrap_or(f64::NAN);
                let y = other.to_numeric().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            },
            _ => match self.compare(other) {
                Some(ordering) => ordering,
                None => self
                    .kind_rank()
                    .cmp(&other.kind_rank())
                    .then_with(|| self.to_string().cmp(&other.to_string())),
            },
        }
    }

    /// Two datetimes with offsets compare as instants. Against a naive
    /// value, a datetime with an offset compares by its local wall clock
    /// time.
    fn as_naive_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(x) => x.and_hms_opt(0, 0, 0),
            Value::Datetime(x) => Some(*x),
            Value::DatetimeTz(x) => Some(x.naive_local()),
            _ => None,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null | Value::NotAvailable | Value::NotATime | Value::Missing => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::Date(_) | Value::Datetime(_) | Value::DatetimeTz(_) => 4,
            Value::Time(_) => 5,
            Value::List(_) => 6,
            Value::Struct(_) => 7,
        }
    }
}

pub(crate) fn epoch() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

fn datetime_seconds(x: &NaiveDateTime) -> f64 {
    let utc = x.and_utc();
    utc.timestamp() as f64 + utc.timestamp_subsec_micros() as f64 / 1e6
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::NotAvailable => write!(f, "NA"),
            Value::NotATime => write!(f, "NaT"),
            Value::Missing => write!(f, "None"),
            Value::Bool(x) => write!(f, "{x}"),
            Value::Int(x) => write!(f, "{x}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(x) => write!(f, "{x}"),
            Value::Date(x) => write!(f, "{}", x.format("%Y-%m-%d")),
            Value::Datetime(x) => write!(f, "{}", x.format("%Y-%m-%d %H:%M:%S")),
            Value::DatetimeTz(x) => write!(f, "{}", x.format("%Y-%m-%d %H:%M:%S%:z")),
            Value::Time(x) => write!(f, "{}", x.format("%H:%M:%S")),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            },
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {item}")?;
                }
                write!(f, "}}")
            },
        }
    }
}
