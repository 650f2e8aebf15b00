//
// format.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use relay::comm::data_explorer_comm::ColumnValue;
use relay::comm::data_explorer_comm::FormatOptions;

use crate::value::Value;

pub fn format_column(values: &[Value], options: &FormatOptions) -> Vec<ColumnValue> {
    values
        .iter()
        .map(|value| format_value(value, options))
        .collect()
}

/// Formats values as plain strings, spelling out special values. Used for
/// summary statistics and histogram edges, which have no room for codes.
pub fn format_string(values: &[Value], options: &FormatOptions) -> Vec<String> {
    values
        .iter()
        .map(|value| match format_value(value, options) {
            ColumnValue::FormattedValue(x) => x,
            ColumnValue::SpecialValueCode(code) => SpecialValueTypes::label(code).to_string(),
        })
        .collect()
}

pub fn format_value(value: &Value, options: &FormatOptions) -> ColumnValue {
    let formatted = match value {
        Value::Null => return SpecialValueTypes::NULL.into(),
        Value::NotAvailable => return SpecialValueTypes::NA.into(),
        Value::NotATime => return SpecialValueTypes::NaT.into(),
        Value::Missing => return SpecialValueTypes::None.into(),
        Value::Float(x) => {
            if x.is_nan() {
                return SpecialValueTypes::NaN.into();
            } else if x.is_infinite() {
                return match x.is_sign_positive() {
                    true => SpecialValueTypes::Inf.into(),
                    false => SpecialValueTypes::NegInf.into(),
                };
            }
            format_number(*x, options)
        },
        Value::Int(x) => apply_thousands_sep(x.to_string(), options.thousands_sep.as_deref()),
        other => other.to_string(),
    };

    ColumnValue::FormattedValue(truncate(formatted, options.max_value_length))
}

fn truncate(x: String, max_length: i64) -> String {
    if max_length < 0 {
        return x;
    }
    let max_length = max_length as usize;
    match x.char_indices().nth(max_length) {
        Some((pos, _)) => x[..pos].to_string(),
        None => x,
    }
}

/// Formats a finite number, switching to scientific notation outside of
/// `[10^-small_num_digits, 10^max_integral_digits)`.
pub fn format_number(x: f64, options: &FormatOptions) -> String {
    let upper_threshold = f64::powf(10.0, options.max_integral_digits as f64);
    let lower_threshold = f64::powf(10.0, -(options.small_num_digits as f64));

    let large_num_digits = options.large_num_digits.max(0) as usize;
    let small_num_digits = options.small_num_digits.max(0) as usize;
    let sep = options.thousands_sep.as_deref();

    let abs_x = x.abs();

    if abs_x >= upper_threshold {
        // Rust writes `1e7`, we want `1e+07`
        let v = format!("{:.large_num_digits$e}", x).replace('e', "e+");
        pad_exponent(v)
    } else if abs_x >= 1.0 {
        apply_thousands_sep(format!("{:.large_num_digits$}", x), sep)
    } else if abs_x >= lower_threshold {
        apply_thousands_sep(format!("{:.small_num_digits$}", x), sep)
    } else if abs_x == 0.0 {
        format!("{:.large_num_digits$}", x)
    } else {
        let v = format!("{:.large_num_digits$e}", x);
        pad_exponent(v)
    }
}

fn apply_thousands_sep(x: String, sep: Option<&str>) -> String {
    let Some(sep) = sep else {
        return x;
    };

    let (sign, unsigned) = match x.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", x.as_str()),
    };
    let decimal_point = unsigned.find('.').unwrap_or(unsigned.len());
    let (integral, fraction) = unsigned.split_at(decimal_point);

    let mut grouped = String::with_capacity(x.len() + integral.len() / 3 * sep.len());
    for (i, c) in integral.chars().enumerate() {
        if i > 0 && (integral.len() - i) % 3 == 0 {
            grouped.push_str(sep);
        }
        grouped.push(c);
    }

    format!("{sign}{grouped}{fraction}")
}

// Exponents have at least two digits. Expects `e+` for positive exponents.
fn pad_exponent(x: String) -> String {
    let Some(e_pos) = x.find('e') else {
        return x;
    };
    if (e_pos + 1 + 2) < x.len() {
        return x;
    }

    let mut formatted = x;
    formatted.insert(e_pos + 2, '0');
    formatted
}

#[derive(Clone, Copy)]
enum SpecialValueTypes {
    NULL,
    NA,
    NaN,
    NaT,
    None,
    Inf,
    NegInf,
}

impl SpecialValueTypes {
    fn code(self) -> i64 {
        match self {
            SpecialValueTypes::NULL => 0,
            SpecialValueTypes::NA => 1,
            SpecialValueTypes::NaN => 2,
            SpecialValueTypes::NaT => 3,
            SpecialValueTypes::None => 4,
            SpecialValueTypes::Inf => 10,
            SpecialValueTypes::NegInf => 11,
        }
    }

    fn label(code: i64) -> &'static str {
        match code {
            0 => "NULL",
            1 => "NA",
            2 => "NaN",
            3 => "NaT",
            4 => "None",
            10 => "Inf",
            11 => "-Inf",
            _ => "????",
        }
    }
}

impl From<SpecialValueTypes> for ColumnValue {
    fn from(value: SpecialValueTypes) -> Self {
        ColumnValue::SpecialValueCode(value.code())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn options(large: i64, small: i64, sep: Option<&str>) -> FormatOptions {
        FormatOptions {
            large_num_digits: large,
            small_num_digits: small,
            max_integral_digits: 7,
            max_value_length: 100,
            thousands_sep: sep.map(String::from),
        }
    }

    fn formatted(values: Vec<&str>) -> Vec<ColumnValue> {
        values
            .into_iter()
            .map(|x| ColumnValue::FormattedValue(x.to_string()))
            .collect()
    }

    #[test]
    fn test_pad_exponents() {
        assert_eq!(pad_exponent("1.00e+111".to_string()), "1.00e+111");
        assert_eq!(pad_exponent("1.00e+11".to_string()), "1.00e+11");
        assert_eq!(pad_exponent("1.00e+1".to_string()), "1.00e+01");
        assert_eq!(pad_exponent("1.00e-1".to_string()), "1.00e-01");
        assert_eq!(pad_exponent("1.00e-00".to_string()), "1.00e-00");
    }

    #[test]
    fn test_thousands_sep() {
        assert_eq!(apply_thousands_sep("1000000".to_string(), Some(",")), "1,000,000");
        assert_eq!(
            apply_thousands_sep("1000000.000".to_string(), Some(",")),
            "1,000,000.000"
        );
        assert_eq!(apply_thousands_sep("1.00".to_string(), Some(",")), "1.00");
        assert_eq!(apply_thousands_sep("100.00".to_string(), Some(",")), "100.00");
        assert_eq!(apply_thousands_sep("-100".to_string(), Some(",")), "-100");
        assert_eq!(apply_thousands_sep("-1234.5".to_string(), Some(",")), "-1,234.5");
        assert_eq!(apply_thousands_sep("1000000.00".to_string(), None), "1000000.00");
    }

    #[test]
    fn test_real_formatting() {
        let values: Vec<Value> = vec![
            0.0, 1.0, 1.01, 1.012, 0.0123, 0.01234, 0.0001, 0.00001, 9999.123, 9999.999,
            9999999.0, 10000000.0,
        ]
        .into_iter()
        .map(Value::Float)
        .collect();

        assert_eq!(
            format_column(&values, &options(2, 4, None)),
            formatted(vec![
                "0.00",
                "1.00",
                "1.01",
                "1.01",
                "0.0123",
                "0.0123",
                "0.0001",
                "1.00e-05",
                "9999.12",
                "10000.00",
                "9999999.00",
                "1.00e+07",
            ])
        );

        assert_eq!(
            format_column(&values, &options(3, 4, Some("_"))),
            formatted(vec![
                "0.000",
                "1.000",
                "1.010",
                "1.012",
                "0.0123",
                "0.0123",
                "0.0001",
                "1.000e-05",
                "9_999.123",
                "9_999.999",
                "9_999_999.000",
                "1.000e+07",
            ])
        );
    }

    #[test]
    fn test_special_values() {
        let values = vec![
            Value::Null,
            Value::NotAvailable,
            Value::Float(f64::NAN),
            Value::NotATime,
            Value::Missing,
            Value::Float(f64::INFINITY),
            Value::Float(f64::NEG_INFINITY),
        ];
        let codes: Vec<ColumnValue> = vec![0, 1, 2, 3, 4, 10, 11]
            .into_iter()
            .map(ColumnValue::SpecialValueCode)
            .collect();
        assert_eq!(format_column(&values, &options(2, 4, None)), codes);

        assert_eq!(format_string(&values[..3], &options(2, 4, None)), vec![
            "NULL", "NA", "NaN"
        ]);
    }

    #[test]
    fn test_other_values() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let values = vec![
            Value::Bool(true),
            Value::Int(1234567),
            Value::Date(date),
            Value::Datetime(date.and_hms_opt(13, 5, 0).unwrap()),
            Value::List(vec![Value::Int(1), Value::Str(String::from("b"))]),
        ];
        assert_eq!(
            format_column(&values, &options(2, 4, Some(","))),
            formatted(vec![
                "true",
                "1,234,567",
                "2024-02-29",
                "2024-02-29 13:05:00",
                "[1, b]"
            ])
        );
    }

    #[test]
    fn test_truncation() {
        let mut opts = options(2, 4, None);
        opts.max_value_length = 3;
        assert_eq!(
            format_value(&Value::Str(String::from("abcdef")), &opts),
            ColumnValue::FormattedValue(String::from("abc"))
        );
        assert_eq!(
            format_value(&Value::Str(String::from("ab")), &opts),
            ColumnValue::FormattedValue(String::from("ab"))
        );
    }
}
