//
// search_schema.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use itertools::Itertools;
use relay::comm::data_explorer_comm::ColumnDisplayType;
use relay::comm::data_explorer_comm::ColumnFilter;
use relay::comm::data_explorer_comm::ColumnFilterParams;
use relay::comm::data_explorer_comm::ColumnSchema;
use relay::comm::data_explorer_comm::SearchSchemaParams;
use relay::comm::data_explorer_comm::SearchSchemaResult;
use relay::comm::data_explorer_comm::SearchSchemaSortOrder;

use crate::data_explorer::backend::TableAdapter;
use crate::data_explorer::filter::TextMatcher;
use crate::data_explorer::utils::TypeCache;

enum ColumnMatcher {
    Name(TextMatcher),
    DisplayTypes(Vec<ColumnDisplayType>),
}

impl ColumnMatcher {
    fn new(filter: &ColumnFilter) -> crate::Result<Self> {
        match &filter.params {
            ColumnFilterParams::TextSearch(params) => Ok(Self::Name(TextMatcher::new(params)?)),
            ColumnFilterParams::MatchDataTypes(params) => {
                Ok(Self::DisplayTypes(params.display_types.clone()))
            },
        }
    }

    fn matches(&self, schema: &ColumnSchema) -> bool {
        match self {
            Self::Name(matcher) => matcher.matches(&schema.column_name),
            Self::DisplayTypes(types) => types.contains(&schema.type_display),
        }
    }
}

/// Finds the columns matching all of the filters and returns a page of
/// their indices in the requested order.
pub fn search_schema<A: TableAdapter + ?Sized>(
    adapter: &A,
    params: &SearchSchemaParams,
    cache: &mut TypeCache,
) -> crate::Result<SearchSchemaResult> {
    let matchers = params
        .filters
        .iter()
        .map(ColumnMatcher::new)
        .collect::<crate::Result<Vec<ColumnMatcher>>>()?;

    let mut matches = Vec::new();
    for index in 0..adapter.num_columns() {
        let schema = adapter.schema_of(index, cache)?;
        if matchers.iter().all(|matcher| matcher.matches(&schema)) {
            matches.push(schema);
        }
    }

    // Sorts are stable so ties keep the original column order
    match params.sort_order {
        SearchSchemaSortOrder::Original => {},
        SearchSchemaSortOrder::AscendingName => {
            matches.sort_by(|a, b| a.column_name.cmp(&b.column_name))
        },
        SearchSchemaSortOrder::DescendingName => {
            matches.sort_by(|a, b| b.column_name.cmp(&a.column_name))
        },
        SearchSchemaSortOrder::AscendingType => {
            matches.sort_by_cached_key(|schema| schema.type_name.to_lowercase())
        },
        SearchSchemaSortOrder::DescendingType => {
            matches.sort_by(|a, b| b.type_name.to_lowercase().cmp(&a.type_name.to_lowercase()))
        },
    }

    let total_num_matches = matches.len() as i64;
    let start = params.start_index.unwrap_or(0).max(0) as usize;
    let max_results = match params.max_results {
        Some(n) => n.max(0) as usize,
        None => matches.len(),
    };

    let matches = matches
        .into_iter()
        .skip(start)
        .take(max_results)
        .map(|schema| schema.column_index)
        .collect_vec();

    Ok(SearchSchemaResult {
        matches,
        total_num_matches,
    })
}
