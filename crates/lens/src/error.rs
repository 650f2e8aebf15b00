//
// error.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::fmt;

use arrow::error::ArrowError;

pub type Result<T> = std::result::Result<T, Error>;

pub enum Error {
    InvalidColumnIndex {
        index: i64,
        num_columns: usize,
    },
    IndexOutOfBounds {
        index: i64,
        len: usize,
    },
    InvalidPath {
        path: Vec<String>,
        message: String,
    },
    UnsupportedFeature(String),
    Coercion {
        value: String,
        target: String,
    },
    InvalidRegex {
        pattern: String,
        message: String,
    },
    ViewNotFound(String),
    Arrow(ArrowError),
    Csv(csv::Error),
    Anyhow(anyhow::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Arrow(source) => Some(source),
            Error::Csv(source) => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidColumnIndex { index, num_columns } => write!(
                f,
                "Column index {index} is out of range (table has {num_columns} columns)"
            ),

            Error::IndexOutOfBounds { index, len } => {
                write!(f, "Index {index} is out of bounds for length {len}")
            },

            Error::InvalidPath { path, message } => {
                write!(f, "Invalid path '{}': {message}", path.join(" / "))
            },

            Error::UnsupportedFeature(feature) => {
                write!(f, "Unsupported feature: {feature}")
            },

            Error::Coercion { value, target } => {
                write!(f, "Can't convert '{value}' to {target}")
            },

            Error::InvalidRegex { pattern, message } => {
                write!(f, "Invalid regular expression '{pattern}': {message}")
            },

            Error::ViewNotFound(id) => write!(f, "No data explorer view with id '{id}'"),

            Error::Arrow(err) => write!(f, "Arrow error: {err}"),

            Error::Csv(err) => write!(f, "CSV error: {err}"),

            Error::Anyhow(err) => write!(f, "{err:#}"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<ArrowError> for Error {
    fn from(error: ArrowError) -> Self {
        Self::Arrow(error)
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::Csv(error)
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Self::Anyhow(error)
    }
}

#[macro_export]
macro_rules! anyhow {
    ($($rest: expr),*) => {{
        let message = anyhow::anyhow!($($rest, )*);
        $crate::error::Error::Anyhow(message)
    }}
}
