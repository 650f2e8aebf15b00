//
// reconcile.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::collections::HashMap;

use relay::comm::data_explorer_comm::ColumnDisplayType;
use relay::comm::data_explorer_comm::ColumnSortKey;
use relay::comm::data_explorer_comm::RowFilter;
use stdext::unwrap;

use crate::data_explorer::backend::TableAdapter;
use crate::data_explorer::filter::validate_filter;
use crate::data_explorer::utils::TypeCache;

/// What a column looked like to the front end. The display type of an
/// object column comes from the memoised inference pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSnapshot {
    pub name: String,
    pub type_name: String,
    pub type_display: Option<ColumnDisplayType>,
}

/// The columns of a table as they were when the view last looked at it.
/// Wide tables only record their width.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaSnapshot {
    num_columns: usize,
    columns: Option<Vec<ColumnSnapshot>>,
}

impl SchemaSnapshot {
    pub fn take<A: TableAdapter + ?Sized>(
        adapter: &A,
        cache: &mut TypeCache,
        threshold: usize,
    ) -> Self {
        let num_columns = adapter.num_columns();
        let columns = (num_columns <= threshold).then(|| {
            (0..num_columns)
                .map(|index| ColumnSnapshot {
                    name: adapter.column_name(index).unwrap_or_default(),
                    type_name: adapter.type_name(index).unwrap_or_default(),
                    type_display: adapter
                        .schema_of(index, cache)
                        .ok()
                        .map(|schema| schema.type_display),
                })
                .collect()
        });
        Self {
            num_columns,
            columns,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn is_detailed(&self) -> bool {
        self.columns.is_some()
    }
}

#[derive(Debug)]
pub struct Reconciliation {
    pub snapshot: SchemaSnapshot,
    pub schema_changed: bool,
    pub filters: Vec<RowFilter>,
    pub sort_keys: Vec<ColumnSortKey>,
}

/// Migrates filters and sort keys from the table described by `old` to
/// the table behind `new`.
///
/// Columns are matched by name. Filters and sort keys on deleted columns
/// are invalidated or dropped, those on shifted columns follow their
/// column, and filters on retyped columns are validated again. Tables
/// wider than `threshold` skip the diff: the schema is reported as changed
/// and filters and sort keys are only kept when their position still
/// holds a column of the same name.
///
/// `cache` must be empty, or hold types of the new table only.
pub fn reconcile<A: TableAdapter + ?Sized>(
    old: &SchemaSnapshot,
    new: &A,
    filters: &[RowFilter],
    sort_keys: &[ColumnSortKey],
    cache: &mut TypeCache,
    threshold: usize,
) -> Reconciliation {
    let snapshot = SchemaSnapshot::take(new, cache, threshold);

    let (Some(old_columns), Some(new_columns)) = (&old.columns, &snapshot.columns) else {
        log::trace!(
            "Skipping schema diff for table with {} columns",
            new.num_columns().max(old.num_columns)
        );
        return reconcile_by_position(new, filters, sort_keys, cache, snapshot);
    };

    let mut schema_changed = old_columns != new_columns;

    // First occurrence wins when names are duplicated
    let mut new_positions: HashMap<&str, usize> = HashMap::new();
    for (index, column) in new_columns.iter().enumerate().rev() {
        new_positions.insert(column.name.as_str(), index);
    }

    let mut migrated_filters = Vec::with_capacity(filters.len());
    for filter in filters {
        let mut filter = filter.clone();
        let name = filter.column_schema.column_name.clone();

        let index = unwrap!(new_positions.get(name.as_str()), None => {
            invalidate_deleted(&mut filter);
            migrated_filters.push(filter);
            continue;
        });

        schema_changed |= refresh_filter(new, &mut filter, *index, cache);
        migrated_filters.push(filter);
    }

    let migrated_keys = sort_keys
        .iter()
        .filter_map(|key| {
            let column = old_columns.get(usize::try_from(key.column_index).ok()?)?;
            let index = new_positions.get(column.name.as_str())?;
            Some(ColumnSortKey {
                column_index: *index as i64,
                ascending: key.ascending,
            })
        })
        .collect();

    Reconciliation {
        snapshot,
        schema_changed,
        filters: migrated_filters,
        sort_keys: migrated_keys,
    }
}

fn reconcile_by_position<A: TableAdapter + ?Sized>(
    new: &A,
    filters: &[RowFilter],
    sort_keys: &[ColumnSortKey],
    cache: &mut TypeCache,
    snapshot: SchemaSnapshot,
) -> Reconciliation {
    let num_columns = new.num_columns() as i64;

    let filters = filters
        .iter()
        .map(|filter| {
            let mut filter = filter.clone();
            let index = filter.column_schema.column_index;
            let same_name = (0..num_columns).contains(&index) &&
                new.column_name(index as usize).as_deref() ==
                    Some(filter.column_schema.column_name.as_str());

            match same_name {
                true => {
                    refresh_filter(new, &mut filter, index as usize, cache);
                },
                false => invalidate_deleted(&mut filter),
            }
            filter
        })
        .collect();

    let sort_keys = sort_keys
        .iter()
        .filter(|key| (0..num_columns).contains(&key.column_index))
        .cloned()
        .collect();

    Reconciliation {
        snapshot,
        schema_changed: true,
        filters,
        sort_keys,
    }
}

/// Points a filter at its column in the new table. Filters whose column
/// changed display type are validated again. Returns whether the column
/// was retyped.
fn refresh_filter<A: TableAdapter + ?Sized>(
    new: &A,
    filter: &mut RowFilter,
    index: usize,
    cache: &mut TypeCache,
) -> bool {
    let schema = unwrap!(new.schema_of(index, cache), Err(err) => {
        filter.is_valid = Some(false);
        filter.error_message = Some(err.to_string());
        return true;
    });

    let retyped = schema.type_display != filter.column_schema.type_display;
    filter.column_schema = schema;
    if retyped {
        validate_filter(filter);
    }
    retyped
}

fn invalidate_deleted(filter: &mut RowFilter) {
    filter.is_valid = Some(false);
    filter.error_message = Some(format!(
        "Column '{}' was deleted",
        filter.column_schema.column_name
    ));
}
