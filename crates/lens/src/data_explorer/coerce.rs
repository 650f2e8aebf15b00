//
// coerce.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use relay::comm::data_explorer_comm::ColumnDisplayType;

use crate::error::Error;
use crate::value::Value;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Converts a filter parameter to a value comparable with a column of the
/// given display type.
pub fn coerce_value(text: &str, display_type: ColumnDisplayType) -> crate::Result<Value> {
    let text = text.trim();
    match display_type {
        ColumnDisplayType::Number => parse_number(text),
        ColumnDisplayType::Boolean => parse_bool(text),
        ColumnDisplayType::Date => parse_datetime(text).map(|dt| Value::Date(dt.date())),
        ColumnDisplayType::Datetime => parse_datetime(text).map(Value::Datetime),
        ColumnDisplayType::Time => parse_time(text).map(Value::Time),
        _ => Ok(Value::Str(text.to_string())),
    }
}

// Integers first so that integer columns compare exactly; anything else
// numeric falls back to a float.
fn parse_number(text: &str) -> crate::Result<Value> {
    if let Ok(x) = text.parse::<i64>() {
        return Ok(Value::Int(x));
    }
    match text.parse::<f64>() {
        Ok(x) => Ok(Value::Float(x)),
        Err(_) => Err(coercion_error(text, "number")),
    }
}

fn parse_bool(text: &str) -> crate::Result<Value> {
    match text.to_lowercase().as_str() {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => Err(coercion_error(text, "boolean")),
    }
}

fn parse_datetime(text: &str) -> crate::Result<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| coercion_error(text, "datetime"))
}

fn parse_time(text: &str) -> crate::Result<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        .ok_or_else(|| coercion_error(text, "time"))
}

fn coercion_error(text: &str, target: &str) -> Error {
    Error::Coercion {
        value: text.to_string(),
        target: target.to_string(),
    }
}
