//
// filter.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::cmp::Ordering;

use regex::Regex;
use regex::RegexBuilder;
use relay::comm::data_explorer_comm::ColumnDisplayType;
use relay::comm::data_explorer_comm::FilterBetween;
use relay::comm::data_explorer_comm::FilterComparison;
use relay::comm::data_explorer_comm::FilterComparisonOp;
use relay::comm::data_explorer_comm::FilterSetMembership;
use relay::comm::data_explorer_comm::FilterTextSearch;
use relay::comm::data_explorer_comm::RowFilter;
use relay::comm::data_explorer_comm::RowFilterCondition;
use relay::comm::data_explorer_comm::RowFilterParams;
use relay::comm::data_explorer_comm::RowFilterType;
use relay::comm::data_explorer_comm::TextSearchType;
use stdext::unwrap;

use crate::data_explorer::backend::Mask;
use crate::data_explorer::backend::TableAdapter;
use crate::data_explorer::coerce::coerce_value;
use crate::data_explorer::utils::TypeCache;
use crate::error::Error;
use crate::value::Value;

/// Whether a filter can be applied to a column of the given display type.
pub fn filter_is_supported(filter: &RowFilter, display_type: ColumnDisplayType) -> bool {
    use ColumnDisplayType::*;

    let ordered = matches!(display_type, Number | Date | Datetime | Time);

    match filter.filter_type {
        RowFilterType::IsNull | RowFilterType::NotNull => true,
        RowFilterType::IsEmpty | RowFilterType::NotEmpty | RowFilterType::Search => {
            display_type == String
        },
        RowFilterType::IsTrue | RowFilterType::IsFalse => display_type == Boolean,
        RowFilterType::Between | RowFilterType::NotBetween => ordered,
        RowFilterType::SetMembership => matches!(display_type, String | Number | Boolean),
        RowFilterType::Compare => match &filter.params {
            Some(RowFilterParams::Comparison(FilterComparison { op, .. })) => match op {
                FilterComparisonOp::Eq | FilterComparisonOp::NotEq => true,
                _ => ordered,
            },
            _ => true,
        },
    }
}

pub fn unsupported_message(filter: &RowFilter, display_type: ColumnDisplayType) -> String {
    format!(
        "Filter type '{}' is not supported for column '{}' of type {}",
        filter.filter_type, filter.column_schema.column_name, display_type
    )
}

/// Sets `is_valid` from the support matrix and updates the error message
/// to match.
pub fn validate_filter(filter: &mut RowFilter) {
    let display_type = filter.column_schema.type_display;
    let supported = filter_is_supported(filter, display_type);
    filter.is_valid = Some(supported);
    filter.error_message = match supported {
        true => None,
        false => Some(unsupported_message(filter, display_type)),
    };
}

/// Evaluates a filter set and returns the selected rows in table order,
/// or `None` when no filter is active. The second element tells whether
/// any filter failed to evaluate.
///
/// Filters are updated in place: their column schemas are refreshed, their
/// validity is computed when unset, and filters that fail are invalidated.
pub fn apply_row_filters<A: TableAdapter + ?Sized>(
    adapter: &A,
    filters: &mut [RowFilter],
    cache: &mut TypeCache,
) -> (Option<Vec<usize>>, bool) {
    let mut had_errors = false;
    let mut combined: Option<Vec<bool>> = None;

    for filter in filters.iter_mut() {
        // Invalid filters keep the schema and message they were invalidated with
        if filter.is_valid == Some(false) {
            continue;
        }

        let index = filter.column_schema.column_index;
        let schema = unwrap!(
            usize::try_from(index).map_err(|_| Error::InvalidColumnIndex {
                index,
                num_columns: adapter.num_columns(),
            }).and_then(|i| adapter.schema_of(i, cache)),
            Err(err) => {
                log::warn!("Can't find the column of filter {}: {err}", filter.filter_id);
                filter.is_valid = Some(false);
                filter.error_message = Some(err.to_string());
                had_errors = true;
                continue;
            }
        );
        filter.column_schema = schema;

        if filter.is_valid.is_none() {
            validate_filter(filter);
        }
        if filter.is_valid == Some(false) {
            continue;
        }

        let mask = unwrap!(adapter.evaluate_filter(filter), Err(err) => {
            log::warn!("Error evaluating filter {}: {err}", filter.filter_id);
            filter.is_valid = Some(false);
            filter.error_message = Some(err.to_string());
            had_errors = true;
            continue;
        });

        // Nulls never select a row
        let mask = mask.into_iter().map(|x| x.unwrap_or(false));

        combined = Some(match combined {
            None => mask.collect(),
            Some(acc) => match filter.condition {
                RowFilterCondition::And => acc.into_iter().zip(mask).map(|(a, b)| a && b).collect(),
                RowFilterCondition::Or => acc.into_iter().zip(mask).map(|(a, b)| a || b).collect(),
            },
        });
    }

    let indices = combined.map(|mask| {
        mask.into_iter()
            .enumerate()
            .filter_map(|(i, selected)| selected.then_some(i))
            .collect()
    });

    (indices, had_errors)
}

/// Row-at-a-time evaluation of a filter over the values of its column.
pub fn evaluate_values(values: &[Value], filter: &RowFilter) -> crate::Result<Mask> {
    let display_type = filter.column_schema.type_display;

    let mask = match filter.filter_type {
        RowFilterType::IsNull => values.iter().map(|v| Some(v.is_missing())).collect(),
        RowFilterType::NotNull => values.iter().map(|v| Some(!v.is_missing())).collect(),
        RowFilterType::IsEmpty => map_strings(values, |s| s.is_empty()),
        RowFilterType::NotEmpty => map_strings(values, |s| !s.is_empty()),
        RowFilterType::IsTrue => map_bools(values, |b| b),
        RowFilterType::IsFalse => map_bools(values, |b| !b),
        RowFilterType::Compare => {
            let FilterComparison { op, value } = comparison_params(filter)?;
            if matches!(op, FilterComparisonOp::Eq | FilterComparisonOp::NotEq) &&
                !is_scalar_type(display_type)
            {
                // Nested and dynamic values compare by their display form
                values
                    .iter()
                    .map(|v| match v.is_missing() {
                        true => None,
                        false => Some((v.to_string() == *value) == (*op == FilterComparisonOp::Eq)),
                    })
                    .collect()
            } else {
                let target = coerce_value(value, display_type)?;
                values
                    .iter()
                    .map(|v| v.compare(&target).map(|ordering| op_matches(*op, ordering)))
                    .collect()
            }
        },
        RowFilterType::Between | RowFilterType::NotBetween => {
            let FilterBetween {
                left_value,
                right_value,
            } = between_params(filter)?;
            let left = coerce_value(left_value, display_type)?;
            let right = coerce_value(right_value, display_type)?;
            let inside = filter.filter_type == RowFilterType::Between;

            values
                .iter()
                .map(|v| {
                    let lower = v.compare(&left)?;
                    let upper = v.compare(&right)?;
                    let between = lower != Ordering::Less && upper != Ordering::Greater;
                    Some(between == inside)
                })
                .collect()
        },
        RowFilterType::Search => {
            let matcher = TextMatcher::new(search_params(filter)?)?;
            map_strings(values, |s| matcher.matches(s))
        },
        RowFilterType::SetMembership => {
            let FilterSetMembership { values: set, inclusive } = set_membership_params(filter)?;
            let set = set
                .iter()
                .map(|x| coerce_value(x, display_type))
                .collect::<crate::Result<Vec<Value>>>()?;

            values
                .iter()
                .map(|v| {
                    if v.is_missing() {
                        return None;
                    }
                    let found = set
                        .iter()
                        .any(|x| v.compare(x) == Some(Ordering::Equal));
                    Some(found == *inclusive)
                })
                .collect()
        },
    };

    Ok(mask)
}

fn is_scalar_type(display_type: ColumnDisplayType) -> bool {
    use ColumnDisplayType::*;
    matches!(
        display_type,
        Number | Boolean | String | Date | Datetime | Time
    )
}

pub fn op_matches(op: FilterComparisonOp, ordering: Ordering) -> bool {
    match op {
        FilterComparisonOp::Eq => ordering == Ordering::Equal,
        FilterComparisonOp::NotEq => ordering != Ordering::Equal,
        FilterComparisonOp::Lt => ordering == Ordering::Less,
        FilterComparisonOp::LtEq => ordering != Ordering::Greater,
        FilterComparisonOp::Gt => ordering == Ordering::Greater,
        FilterComparisonOp::GtEq => ordering != Ordering::Less,
    }
}

fn map_strings(values: &[Value], f: impl Fn(&str) -> bool) -> Mask {
    values
        .iter()
        .map(|v| match v {
            Value::Str(s) => Some(f(s)),
            _ => None,
        })
        .collect()
}

fn map_bools(values: &[Value], f: impl Fn(bool) -> bool) -> Mask {
    values
        .iter()
        .map(|v| match v {
            Value::Bool(b) => Some(f(*b)),
            _ => None,
        })
        .collect()
}

fn missing_params(filter: &RowFilter) -> Error {
    crate::anyhow!(
        "Missing or mismatched parameters for '{}' filter",
        filter.filter_type
    )
}

pub fn comparison_params(filter: &RowFilter) -> crate::Result<&FilterComparison> {
    match &filter.params {
        Some(RowFilterParams::Comparison(params)) => Ok(params),
        _ => Err(missing_params(filter)),
    }
}

pub fn between_params(filter: &RowFilter) -> crate::Result<&FilterBetween> {
    match &filter.params {
        Some(RowFilterParams::Between(params)) => Ok(params),
        _ => Err(missing_params(filter)),
    }
}

fn search_params(filter: &RowFilter) -> crate::Result<&FilterTextSearch> {
    match &filter.params {
        Some(RowFilterParams::TextSearch(params)) => Ok(params),
        _ => Err(missing_params(filter)),
    }
}

fn set_membership_params(filter: &RowFilter) -> crate::Result<&FilterSetMembership> {
    match &filter.params {
        Some(RowFilterParams::SetMembership(params)) => Ok(params),
        _ => Err(missing_params(filter)),
    }
}

/// Text search shared by row filters and schema search.
pub struct TextMatcher {
    search_type: TextSearchType,
    term: String,
    case_sensitive: bool,
    regex: Option<Regex>,
}

impl TextMatcher {
    pub fn new(params: &FilterTextSearch) -> crate::Result<Self> {
        let regex = match params.search_type {
            TextSearchType::RegexMatch => Some(
                RegexBuilder::new(&params.term)
                    .case_insensitive(!params.case_sensitive)
                    .build()
                    .map_err(|err| Error::InvalidRegex {
                        pattern: params.term.clone(),
                        message: err.to_string(),
                    })?,
            ),
            _ => None,
        };

        let term = match params.case_sensitive {
            true => params.term.clone(),
            false => params.term.to_lowercase(),
        };

        Ok(Self {
            search_type: params.search_type,
            term,
            case_sensitive: params.case_sensitive,
            regex,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        if let Some(regex) = &self.regex {
            return regex.is_match(text);
        }

        let lowered;
        let text = match self.case_sensitive {
            true => text,
            false => {
                lowered = text.to_lowercase();
                lowered.as_str()
            },
        };

        match self.search_type {
            TextSearchType::Contains => text.contains(&self.term),
            TextSearchType::NotContains => !text.contains(&self.term),
            TextSearchType::StartsWith => text.starts_with(&self.term),
            TextSearchType::EndsWith => text.ends_with(&self.term),
            TextSearchType::RegexMatch => false,
        }
    }
}
