//
// frame.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;

use crate::error::Error;
use crate::value::Value;

/// The typed storage of one frame column. Missing entries of typed columns
/// read back as `NotAvailable`, or `NotATime` for temporal columns.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Bool(Vec<Option<bool>>),
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
    Datetime {
        values: Vec<Option<NaiveDateTime>>,
        timezone: Option<String>,
    },
    DatetimeTz(Vec<Option<DateTime<FixedOffset>>>),
    Time(Vec<Option<NaiveTime>>),
    Object(Vec<Value>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(x) => x.len(),
            ColumnData::Int(x) => x.len(),
            ColumnData::Float(x) => x.len(),
            ColumnData::Str(x) => x.len(),
            ColumnData::Date(x) => x.len(),
            ColumnData::Datetime { values, .. } => values.len(),
            ColumnData::DatetimeTz(x) => x.len(),
            ColumnData::Time(x) => x.len(),
            ColumnData::Object(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> String {
        match self {
            ColumnData::Bool(_) => String::from("bool"),
            ColumnData::Int(_) => String::from("int64"),
            ColumnData::Float(_) => String::from("float64"),
            ColumnData::Str(_) => String::from("string"),
            ColumnData::Date(_) => String::from("date"),
            ColumnData::Datetime { timezone, .. } => match timezone {
                Some(tz) => format!("datetime[{tz}]"),
                None => String::from("datetime"),
            },
            ColumnData::DatetimeTz(_) => String::from("datetime[offset]"),
            ColumnData::Time(_) => String::from("time"),
            ColumnData::Object(_) => String::from("object"),
        }
    }

    /// The value at `row`. Callers guarantee `row < self.len()`; out of
    /// range rows read as missing.
    pub fn value(&self, row: usize) -> Value {
        fn typed<T: Clone>(x: &[Option<T>], row: usize, missing: Value, f: fn(T) -> Value) -> Value {
            match x.get(row).cloned().flatten() {
                Some(v) => f(v),
                None => missing,
            }
        }

        match self {
            ColumnData::Bool(x) => typed(x, row, Value::NotAvailable, Value::Bool),
            ColumnData::Int(x) => typed(x, row, Value::NotAvailable, Value::Int),
            ColumnData::Float(x) => typed(x, row, Value::NotAvailable, Value::Float),
            ColumnData::Str(x) => typed(x, row, Value::NotAvailable, Value::Str),
            ColumnData::Date(x) => typed(x, row, Value::NotATime, Value::Date),
            ColumnData::Datetime { values, .. } => {
                typed(values, row, Value::NotATime, Value::Datetime)
            },
            ColumnData::DatetimeTz(x) => typed(x, row, Value::NotATime, Value::DatetimeTz),
            ColumnData::Time(x) => typed(x, row, Value::NotATime, Value::Time),
            ColumnData::Object(x) => x.get(row).cloned().unwrap_or(Value::Missing),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// A column-oriented in-memory data frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    row_labels: Option<Vec<String>>,
    num_rows: usize,
}

impl Frame {
    /// Creates a frame; all columns must have the same length.
    pub fn new(columns: Vec<Column>) -> crate::Result<Self> {
        let num_rows = columns.first().map(|col| col.data.len()).unwrap_or(0);

        if let Some(col) = columns.iter().find(|col| col.data.len() != num_rows) {
            return Err(crate::anyhow!(
                "Column '{}' has {} rows, expected {}",
                col.name,
                col.data.len(),
                num_rows
            ));
        }

        Ok(Self {
            columns,
            row_labels: None,
            num_rows,
        })
    }

    pub fn with_row_labels(mut self, labels: Vec<String>) -> crate::Result<Self> {
        if labels.len() != self.num_rows {
            return Err(Error::IndexOutOfBounds {
                index: labels.len() as i64,
                len: self.num_rows,
            });
        }
        self.row_labels = Some(labels);
        Ok(self)
    }

    /// Reads a frame from JSON of the form
    /// `{"columns": {"name": [values...]}, "row_labels": [...]}`.
    /// Column types are inferred from the values; columns mixing kinds
    /// become object columns.
    pub fn from_json(json: &serde_json::Value) -> crate::Result<Self> {
        let columns = json
            .get("columns")
            .and_then(|columns| columns.as_object())
            .ok_or_else(|| crate::anyhow!("Expected a `columns` object"))?;

        let mut out = Vec::with_capacity(columns.len());
        for (name, values) in columns.iter() {
            let values = values
                .as_array()
                .ok_or_else(|| crate::anyhow!("Column '{name}' must be an array"))?;
            out.push(Column::new(name.clone(), column_from_json(values)));
        }

        let frame = Frame::new(out)?;

        match json.get("row_labels").and_then(|labels| labels.as_array()) {
            Some(labels) => {
                let labels = labels
                    .iter()
                    .map(|label| match label {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                frame.with_row_labels(labels)
            },
            None => Ok(frame),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_labels(&self) -> Option<&[String]> {
        self.row_labels.as_deref()
    }
}

fn column_from_json(values: &[serde_json::Value]) -> ColumnData {
    use serde_json::Value as Json;

    let present = || values.iter().filter(|v| !v.is_null());

    if present().all(|v| v.is_i64()) {
        return ColumnData::Int(values.iter().map(|v| v.as_i64()).collect());
    }
    if present().all(|v| v.is_number()) {
        return ColumnData::Float(values.iter().map(|v| v.as_f64()).collect());
    }
    if present().all(|v| v.is_boolean()) {
        return ColumnData::Bool(values.iter().map(|v| v.as_bool()).collect());
    }
    if present().all(|v| v.is_string()) {
        return ColumnData::Str(
            values
                .iter()
                .map(|v| v.as_str().map(String::from))
                .collect(),
        );
    }

    fn convert(v: &Json) -> Value {
        match v {
            Json::Null => Value::Missing,
            Json::Bool(x) => Value::Bool(*x),
            Json::Number(x) => match x.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(x.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(x) => Value::Str(x.clone()),
            Json::Array(items) => Value::List(items.iter().map(convert).collect()),
            Json::Object(fields) => Value::Struct(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), convert(v)))
                    .collect(),
            ),
        }
    }

    ColumnData::Object(values.iter().map(convert).collect())
}
