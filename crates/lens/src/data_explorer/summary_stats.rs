//
// summary_stats.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::collections::HashSet;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::TimeDelta;
use relay::comm::data_explorer_comm::ColumnDisplayType;
use relay::comm::data_explorer_comm::ColumnSummaryStats;
use relay::comm::data_explorer_comm::FormatOptions;
use relay::comm::data_explorer_comm::SummaryStatsBoolean;
use relay::comm::data_explorer_comm::SummaryStatsDate;
use relay::comm::data_explorer_comm::SummaryStatsDatetime;
use relay::comm::data_explorer_comm::SummaryStatsNumber;
use relay::comm::data_explorer_comm::SummaryStatsString;

use crate::data_explorer::format::format_string;
use crate::data_explorer::histogram::quantile;
use crate::data_explorer::histogram::sample_stdev;
use crate::value::epoch;
use crate::value::Value;

pub fn summary_stats(
    values: &[Value],
    display_type: ColumnDisplayType,
    timezone: Option<&str>,
    format_options: &FormatOptions,
) -> anyhow::Result<ColumnSummaryStats> {
    let mut stats = empty_column_summary_stats(display_type);

    match display_type {
        ColumnDisplayType::Number => {
            stats.number_stats = Some(summary_stats_number(values, format_options));
        },
        ColumnDisplayType::String => {
            stats.string_stats = Some(summary_stats_string(values));
        },
        ColumnDisplayType::Boolean => {
            stats.boolean_stats = Some(summary_stats_boolean(values));
        },
        ColumnDisplayType::Date => stats.date_stats = Some(summary_stats_date(values)),
        ColumnDisplayType::Datetime => {
            stats.datetime_stats = Some(summary_stats_datetime(values, timezone))
        },
        _ => {
            return Err(anyhow::anyhow!(
                "Summary stats are not supported for columns of type '{display_type}'"
            ));
        },
    };

    Ok(stats)
}

fn empty_column_summary_stats(type_display: ColumnDisplayType) -> ColumnSummaryStats {
    ColumnSummaryStats {
        type_display,
        number_stats: None,
        string_stats: None,
        boolean_stats: None,
        date_stats: None,
        datetime_stats: None,
    }
}

fn summary_stats_number(values: &[Value], format_options: &FormatOptions) -> SummaryStatsNumber {
    let empty = SummaryStatsNumber {
        min_value: None,
        max_value: None,
        mean: None,
        median: None,
        stdev: None,
    };

    let mut x: Vec<f64> = values.iter().filter_map(|v| v.to_numeric()).collect();
    x.sort_by(f64::total_cmp);

    let (Some(&min), Some(&max)) = (x.first(), x.last()) else {
        return empty;
    };
    if min.is_infinite() || max.is_infinite() {
        return empty;
    }

    let format = |x: f64| format_string(&[Value::Float(x)], format_options).pop();

    let mean = x.iter().sum::<f64>() / x.len() as f64;

    SummaryStatsNumber {
        min_value: format(min),
        max_value: format(max),
        mean: format(mean),
        median: quantile(&x, 0.5).and_then(format),
        stdev: sample_stdev(&x).and_then(format),
    }
}

fn summary_stats_string(values: &[Value]) -> SummaryStatsString {
    let mut num_empty = 0;
    let mut unique: HashSet<Option<&str>> = HashSet::new();

    for value in values {
        match value {
            Value::Str(x) => {
                if x.is_empty() {
                    num_empty += 1;
                }
                unique.insert(Some(x.as_str()));
            },
            // Missing values count as one distinct value
            _ => {
                unique.insert(None);
            },
        }
    }

    SummaryStatsString {
        num_empty,
        num_unique: unique.len() as i64,
    }
}

fn summary_stats_boolean(values: &[Value]) -> SummaryStatsBoolean {
    let mut true_count = 0;
    let mut false_count = 0;
    for value in values {
        match value {
            Value::Bool(true) => true_count += 1,
            Value::Bool(false) => false_count += 1,
            _ => {},
        }
    }
    SummaryStatsBoolean {
        true_count,
        false_count,
    }
}

/// Shared by dates and datetimes: sorted numeric projections and the
/// number of distinct values, a missing value counting as one.
fn temporal_summary(values: &[Value]) -> (Vec<f64>, i64) {
    let mut x: Vec<f64> = values.iter().filter_map(|v| v.to_numeric()).collect();
    x.sort_by(f64::total_cmp);

    let mut num_unique = x.windows(2).filter(|w| w[0] != w[1]).count() as i64;
    if !x.is_empty() {
        num_unique += 1;
    }
    if x.len() < values.len() {
        num_unique += 1;
    }

    (x, num_unique)
}

fn summary_stats_date(values: &[Value]) -> SummaryStatsDate {
    let (days, num_unique) = temporal_summary(values);

    let format = |x: f64| {
        let date: NaiveDate = epoch().date() + TimeDelta::days(x.floor() as i64);
        date.format("%Y-%m-%d").to_string()
    };
    let mean = (!days.is_empty()).then(|| days.iter().sum::<f64>() / days.len() as f64);

    SummaryStatsDate {
        num_unique: Some(num_unique),
        min_date: days.first().copied().map(format),
        mean_date: mean.map(format),
        median_date: quantile(&days, 0.5).map(format),
        max_date: days.last().copied().map(format),
    }
}

/// Datetimes with offsets are summarised in UTC. When all of them share
/// one offset the results are shown in that offset.
fn summary_stats_datetime(values: &[Value], timezone: Option<&str>) -> SummaryStatsDatetime {
    let (seconds, num_unique) = temporal_summary(values);

    let offsets: HashSet<FixedOffset> = values
        .iter()
        .filter_map(|value| match value {
            Value::DatetimeTz(x) => Some(*x.offset()),
            _ => None,
        })
        .collect();

    let offset = match offsets.len() {
        1 => offsets.iter().next().copied(),
        _ => None,
    };

    let timezone = match (timezone, offsets.len()) {
        (Some(tz), _) => Some(tz.to_string()),
        (None, 0) => None,
        (None, 1) => offset.map(|offset| offset.to_string()),
        (None, n) => Some(format!("{n} timezones")),
    };

    let format = |x: f64| format_datetime(x, offset);
    let mean = (!seconds.is_empty()).then(|| seconds.iter().sum::<f64>() / seconds.len() as f64);

    SummaryStatsDatetime {
        num_unique: Some(num_unique),
        min_date: seconds.first().copied().and_then(format),
        mean_date: mean.and_then(format),
        median_date: quantile(&seconds, 0.5).and_then(format),
        max_date: seconds.last().copied().and_then(format),
        timezone,
    }
}

fn format_datetime(x: f64, offset: Option<FixedOffset>) -> Option<String> {
    let seconds = x.floor();
    let nanos = ((x - seconds) * 1e9) as u32;
    let utc = DateTime::from_timestamp(seconds as i64, nanos)?;

    Some(match offset {
        Some(offset) => utc
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S%:z")
            .to_string(),
        None => utc.format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::config::default_format_options;

    fn compute(values: &[Value], display_type: ColumnDisplayType) -> ColumnSummaryStats {
        summary_stats(values, display_type, None, &default_format_options()).unwrap()
    }

    #[test]
    fn test_number_stats() {
        let mut values: Vec<Value> = (1..=5).map(Value::Int).collect();
        values.push(Value::NotAvailable);

        let stats = compute(&values, ColumnDisplayType::Number).number_stats.unwrap();
        assert_eq!(stats.min_value.as_deref(), Some("1.00"));
        assert_eq!(stats.max_value.as_deref(), Some("5.00"));
        assert_eq!(stats.mean.as_deref(), Some("3.00"));
        assert_eq!(stats.median.as_deref(), Some("3.00"));
        assert_eq!(stats.stdev.as_deref(), Some("1.58"));
    }

    #[test]
    fn test_number_stats_are_skipped() {
        let values = vec![Value::NotAvailable, Value::Float(f64::NAN)];
        let stats = compute(&values, ColumnDisplayType::Number).number_stats.unwrap();
        assert_eq!(stats.min_value, None);
        assert_eq!(stats.mean, None);

        let values = vec![Value::Float(1.0), Value::Float(f64::INFINITY)];
        let stats = compute(&values, ColumnDisplayType::Number).number_stats.unwrap();
        assert_eq!(stats.max_value, None);
        assert_eq!(stats.stdev, None);
    }

    #[test]
    fn test_string_and_boolean_stats() {
        let values = vec![
            Value::Str(String::from("a")),
            Value::Str(String::new()),
            Value::Str(String::from("a")),
            Value::NotAvailable,
        ];
        let stats = compute(&values, ColumnDisplayType::String).string_stats.unwrap();
        assert_eq!(stats.num_empty, 1);
        assert_eq!(stats.num_unique, 3);

        let values = vec![Value::Bool(true), Value::Bool(false), Value::Bool(true)];
        let stats = compute(&values, ColumnDisplayType::Boolean)
            .boolean_stats
            .unwrap();
        assert_eq!(stats.true_count, 2);
        assert_eq!(stats.false_count, 1);
    }

    #[test]
    fn test_date_stats() {
        let day = |d| Value::Date(NaiveDate::from_ymd_opt(2024, 1, d).unwrap());
        let values = vec![day(1), day(2), day(2), Value::NotATime, day(10)];

        let stats = compute(&values, ColumnDisplayType::Date).date_stats.unwrap();
        assert_eq!(stats.num_unique, Some(4));
        assert_eq!(stats.min_date.as_deref(), Some("2024-01-01"));
        assert_eq!(stats.mean_date.as_deref(), Some("2024-01-03"));
        assert_eq!(stats.median_date.as_deref(), Some("2024-01-02"));
        assert_eq!(stats.max_date.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn test_datetime_timezones() {
        let at = |hour, offset_hours| {
            let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
            Value::DatetimeTz(
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(hour, 0, 0)
                    .unwrap()
                    .and_local_timezone(offset)
                    .unwrap(),
            )
        };

        let stats = compute(&[at(10, 1), at(12, 1)], ColumnDisplayType::Datetime)
            .datetime_stats
            .unwrap();
        assert_eq!(stats.timezone.as_deref(), Some("+01:00"));
        assert_eq!(stats.min_date.as_deref(), Some("2024-01-01 10:00:00+01:00"));
        assert_eq!(stats.max_date.as_deref(), Some("2024-01-01 12:00:00+01:00"));

        let stats = compute(&[at(10, 1), at(10, 2)], ColumnDisplayType::Datetime)
            .datetime_stats
            .unwrap();
        assert_eq!(stats.timezone.as_deref(), Some("2 timezones"));
        assert_eq!(stats.min_date.as_deref(), Some("2024-01-01 08:00:00"));

        let naive = Value::Datetime(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(6, 30, 0)
                .unwrap(),
        );
        let stats = summary_stats(
            &[naive],
            ColumnDisplayType::Datetime,
            Some("America/New_York"),
            &default_format_options(),
        )
        .unwrap()
        .datetime_stats
        .unwrap();
        assert_eq!(stats.timezone.as_deref(), Some("America/New_York"));
        assert_eq!(stats.median_date.as_deref(), Some("2024-01-01 06:30:00"));
    }

    #[test]
    fn test_unsupported_types() {
        let values = vec![Value::List(vec![])];
        assert!(summary_stats(
            &values,
            ColumnDisplayType::Array,
            None,
            &default_format_options()
        )
        .is_err());
    }
}
