//
// histogram.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::DateTime;
use relay::comm::data_explorer_comm::ColumnDisplayType;
use relay::comm::data_explorer_comm::ColumnFrequencyTable;
use relay::comm::data_explorer_comm::ColumnFrequencyTableParams;
use relay::comm::data_explorer_comm::ColumnHistogram;
use relay::comm::data_explorer_comm::ColumnHistogramParams;
use relay::comm::data_explorer_comm::ColumnHistogramParamsMethod;
use relay::comm::data_explorer_comm::ColumnQuantileValue;
use relay::comm::data_explorer_comm::FormatOptions;

use crate::data_explorer::format::format_number;
use crate::data_explorer::format::format_value;
use crate::value::Value;

const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn profile_histogram(
    values: &[Value],
    display_type: ColumnDisplayType,
    params: &ColumnHistogramParams,
    format_options: &FormatOptions,
) -> anyhow::Result<ColumnHistogram> {
    // Dates are binned in seconds so that edges can fall within a day
    let scale = match display_type {
        ColumnDisplayType::Number | ColumnDisplayType::Datetime => 1.0,
        ColumnDisplayType::Date => SECONDS_PER_DAY,
        _ => {
            return Err(anyhow::anyhow!(
                "Histograms are not supported for columns of type '{display_type}'"
            ))
        },
    };

    let mut x: Vec<f64> = values
        .iter()
        .filter_map(|value| value.to_numeric())
        .filter(|x| x.is_finite())
        .map(|x| x * scale)
        .collect();
    x.sort_by(f64::total_cmp);

    let integral = values.iter().all(|value| match value {
        Value::Int(_) => true,
        value => value.is_missing(),
    });

    let format = |x: f64| match display_type {
        ColumnDisplayType::Number => format_number(x, format_options),
        _ => format_seconds(x),
    };

    let (edges, counts) = bin(&x, params, integral);

    let quantiles = params
        .quantiles
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|q| {
            quantile(&x, q).map(|value| ColumnQuantileValue {
                q,
                value: format(value),
                exact: true,
            })
        })
        .collect();

    Ok(ColumnHistogram {
        bin_edges: edges.into_iter().map(format).collect(),
        bin_counts: counts,
        quantiles,
    })
}

/// Bins sorted finite values into right-closed bins, the first bin also
/// including its lower edge.
fn bin(x: &[f64], params: &ColumnHistogramParams, integral: bool) -> (Vec<f64>, Vec<i64>) {
    let (Some(&min), Some(&max)) = (x.first(), x.last()) else {
        return (vec![], vec![]);
    };

    if min == max {
        return (vec![min, max], vec![x.len() as i64]);
    }

    let num_bins = num_bins(x, params, integral, min, max);
    let width = (max - min) / num_bins as f64;

    let mut edges: Vec<f64> = (0..num_bins).map(|i| min + i as f64 * width).collect();
    edges.push(max);

    let mut counts = vec![0; num_bins];
    for value in x {
        let mut index = ((value - min) / width).ceil() as i64 - 1;
        index = index.clamp(0, num_bins as i64 - 1);
        let mut index = index as usize;

        // Guard against rounding at the edges
        if index > 0 && *value <= edges[index] {
            index -= 1;
        } else if index + 1 < num_bins && *value > edges[index + 1] {
            index += 1;
        }
        counts[index] += 1;
    }

    (edges, counts)
}

fn num_bins(x: &[f64], params: &ColumnHistogramParams, integral: bool, min: f64, max: f64) -> usize {
    let requested = params.num_bins.max(1) as usize;
    let n = x.len() as f64;

    let sturges = || n.log2().ceil() as usize + 1;
    let from_width = |width: f64| match width > 0.0 {
        true => ((max - min) / width).ceil() as usize,
        false => sturges(),
    };

    let heuristic = match params.method {
        ColumnHistogramParamsMethod::Fixed => return requested,
        ColumnHistogramParamsMethod::Sturges => sturges(),
        ColumnHistogramParamsMethod::FreedmanDiaconis => {
            let iqr = quantile(x, 0.75).unwrap_or(max) - quantile(x, 0.25).unwrap_or(min);
            from_width(2.0 * iqr / n.cbrt())
        },
        ColumnHistogramParamsMethod::Scott => {
            from_width(3.49 * sample_stdev(x).unwrap_or(0.0) / n.cbrt())
        },
    };

    let mut bins = heuristic.clamp(1, requested);
    if integral {
        bins = bins.min((max - min) as usize + 1);
    }
    bins
}

/// Type 7 quantile (linear interpolation between order statistics) of
/// sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;

    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

pub fn sample_stdev(x: &[f64]) -> Option<f64> {
    if x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (n - 1.0)).sqrt())
}

fn format_seconds(x: f64) -> String {
    let seconds = x.floor();
    let nanos = ((x - seconds) * 1e9) as u32;
    match DateTime::from_timestamp(seconds as i64, nanos) {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => x.to_string(),
    }
}

pub fn profile_frequency_table(
    values: &[Value],
    display_type: ColumnDisplayType,
    params: &ColumnFrequencyTableParams,
    format_options: &FormatOptions,
) -> anyhow::Result<ColumnFrequencyTable> {
    if !matches!(
        display_type,
        ColumnDisplayType::String | ColumnDisplayType::Boolean | ColumnDisplayType::Number
    ) {
        return Err(anyhow::anyhow!(
            "Frequency tables are not supported for columns of type '{display_type}'"
        ));
    }

    // Values are counted by identity, in order of first appearance, and
    // only the returned ones are formatted
    let mut positions: HashMap<FrequencyKey, usize> = HashMap::new();
    let mut entries: Vec<(&Value, i64)> = vec![];
    let mut total = 0;

    for value in values.iter().filter(|value| !value.is_missing()) {
        match positions.entry(FrequencyKey::from(value)) {
            Entry::Occupied(position) => entries[*position.get()].1 += 1,
            Entry::Vacant(slot) => {
                slot.insert(entries.len());
                entries.push((value, 1));
            },
        }
        total += 1;
    }

    entries.sort_by_key(|(_, count)| Reverse(*count));
    entries.truncate(params.limit.max(0) as usize);

    let other_count = total - entries.iter().map(|(_, count)| count).sum::<i64>();
    let (values, counts) = entries
        .into_iter()
        .map(|(value, count)| (format_value(value, format_options), count))
        .unzip();

    Ok(ColumnFrequencyTable {
        values,
        counts,
        other_count: (other_count > 0).then_some(other_count),
    })
}

/// Identity of a value in a frequency table. Integral floats count with
/// the integers they equal.
#[derive(PartialEq, Eq, Hash)]
enum FrequencyKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
    Other(String),
}

impl From<&Value> for FrequencyKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(x) => FrequencyKey::Bool(*x),
            Value::Int(x) => FrequencyKey::Int(*x),
            Value::Float(x) if x.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(x) => {
                FrequencyKey::Int(*x as i64)
            },
            Value::Float(x) => FrequencyKey::Float(x.to_bits()),
            Value::Str(x) => FrequencyKey::Str(x.clone()),
            other => FrequencyKey::Other(other.to_string()),
        }
    }
}
