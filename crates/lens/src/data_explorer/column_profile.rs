//
// column_profile.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use once_cell::unsync::OnceCell;
use relay::comm::data_explorer_comm::ColumnFrequencyTableParams;
use relay::comm::data_explorer_comm::ColumnHistogramParams;
use relay::comm::data_explorer_comm::ColumnHistogramParamsMethod;
use relay::comm::data_explorer_comm::ColumnProfileParams;
use relay::comm::data_explorer_comm::ColumnProfileRequest;
use relay::comm::data_explorer_comm::ColumnProfileResult;
use relay::comm::data_explorer_comm::ColumnProfileSpec;
use relay::comm::data_explorer_comm::ColumnProfileType;
use relay::comm::data_explorer_comm::ColumnSchema;
use relay::comm::data_explorer_comm::FormatOptions;
use stdext::unwrap;

use crate::data_explorer::backend::TableAdapter;
use crate::data_explorer::histogram::profile_frequency_table;
use crate::data_explorer::histogram::profile_histogram;
use crate::data_explorer::summary_stats::summary_stats;
use crate::data_explorer::utils::checked_column;
use crate::data_explorer::utils::TypeCache;
use crate::value::Value;

const SMALL_HISTOGRAM_NUM_BINS: i64 = 20;
const LARGE_HISTOGRAM_NUM_BINS: i64 = 200;
const SMALL_FREQUENCY_TABLE_LIMIT: i64 = 8;
const LARGE_FREQUENCY_TABLE_LIMIT: i64 = 50;

// This function does not return a Result because the other profile types
// must still be computed when one of them fails. Failures are logged and
// leave the corresponding field empty.
pub fn profile_column<A: TableAdapter + ?Sized>(
    adapter: &A,
    request: &ColumnProfileRequest,
    rows: Option<&[usize]>,
    format_options: &FormatOptions,
    cache: &mut TypeCache,
) -> ColumnProfileResult {
    let mut output = ColumnProfileResult::default();

    let schema: ColumnSchema = unwrap!(
        checked_column(request.column_index, adapter.num_columns())
            .and_then(|index| adapter.schema_of(index, cache)),
        Err(err) => {
            log::error!("Can't profile column {}: {err}", request.column_index);
            return output;
        }
    );
    let index = schema.column_index as usize;

    // The filtered values are only materialised once, and only if some
    // profile needs them
    let values: OnceCell<Vec<Value>> = OnceCell::new();
    let values = || values.get_or_try_init(|| adapter.column_values(index, rows));

    for spec in request.profiles.iter() {
        let result: anyhow::Result<()> = match spec.profile_type {
            ColumnProfileType::NullCount => adapter
                .null_count(index, rows)
                .map(|count| output.null_count = Some(count))
                .map_err(anyhow::Error::from),

            ColumnProfileType::SummaryStats => values()
                .map_err(anyhow::Error::from)
                .and_then(|values| {
                    summary_stats(
                        values,
                        schema.type_display,
                        schema.timezone.as_deref(),
                        format_options,
                    )
                })
                .map(|stats| output.summary_stats = Some(stats)),

            ColumnProfileType::SmallHistogram | ColumnProfileType::LargeHistogram => values()
                .map_err(anyhow::Error::from)
                .and_then(|values| {
                    profile_histogram(
                        values,
                        schema.type_display,
                        &histogram_params(spec),
                        format_options,
                    )
                })
                .map(|histogram| match spec.profile_type {
                    ColumnProfileType::SmallHistogram => output.small_histogram = Some(histogram),
                    _ => output.large_histogram = Some(histogram),
                }),

            ColumnProfileType::SmallFrequencyTable | ColumnProfileType::LargeFrequencyTable => {
                values()
                    .map_err(anyhow::Error::from)
                    .and_then(|values| {
                        profile_frequency_table(
                            values,
                            schema.type_display,
                            &frequency_table_params(spec),
                            format_options,
                        )
                    })
                    .map(|table| match spec.profile_type {
                        ColumnProfileType::SmallFrequencyTable => {
                            output.small_frequency_table = Some(table)
                        },
                        _ => output.large_frequency_table = Some(table),
                    })
            },
        };

        if let Err(err) = result {
            log::error!(
                "Error computing {} for column '{}': {err}",
                spec.profile_type,
                schema.column_name
            );
        }
    }

    output
}

// Histogram and frequency table parameters are structurally identical in
// their small and large flavours, so either variant is accepted for either
// profile type.
fn histogram_params(spec: &ColumnProfileSpec) -> ColumnHistogramParams {
    match &spec.params {
        Some(ColumnProfileParams::SmallHistogram(params)) |
        Some(ColumnProfileParams::LargeHistogram(params)) => params.clone(),
        _ => ColumnHistogramParams {
            method: ColumnHistogramParamsMethod::FreedmanDiaconis,
            num_bins: match spec.profile_type {
                ColumnProfileType::LargeHistogram => LARGE_HISTOGRAM_NUM_BINS,
                _ => SMALL_HISTOGRAM_NUM_BINS,
            },
            quantiles: None,
        },
    }
}

fn frequency_table_params(spec: &ColumnProfileSpec) -> ColumnFrequencyTableParams {
    match &spec.params {
        Some(ColumnProfileParams::SmallFrequencyTable(params)) |
        Some(ColumnProfileParams::LargeFrequencyTable(params)) => params.clone(),
        _ => ColumnFrequencyTableParams {
            limit: match spec.profile_type {
                ColumnProfileType::LargeFrequencyTable => LARGE_FREQUENCY_TABLE_LIMIT,
                _ => SMALL_FREQUENCY_TABLE_LIMIT,
            },
        },
    }
}
