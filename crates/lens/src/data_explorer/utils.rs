//
// utils.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use relay::comm::data_explorer_comm::ArraySelection;
use relay::comm::data_explorer_comm::ColumnDisplayType;
use relay::comm::data_explorer_comm::DataSelectionIndices;
use relay::comm::data_explorer_comm::DataSelectionRange;

use crate::error::Error;
use crate::value::Value;

/// Per-view memo of inferred display types for dynamically typed columns,
/// one slot per column. The whole arena is reset when the schema of the
/// underlying table is reconciled.
#[derive(Clone, Debug, Default)]
pub struct TypeCache {
    entries: Vec<Option<ColumnDisplayType>>,
}

impl TypeCache {
    pub fn new(num_columns: usize) -> Self {
        Self {
            entries: vec![None; num_columns],
        }
    }

    pub fn get(&self, index: usize) -> Option<ColumnDisplayType> {
        self.entries.get(index).copied().flatten()
    }

    pub fn get_or_insert_with(
        &mut self,
        index: usize,
        infer: impl FnOnce() -> ColumnDisplayType,
    ) -> ColumnDisplayType {
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        *self.entries[index].get_or_insert_with(infer)
    }

    pub fn reset(&mut self, num_columns: usize) {
        self.entries.clear();
        self.entries.resize(num_columns, None);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One pass over the values of a dynamic column. Missing values are
/// ignored; a column with nothing but missing values is `Unknown` and a
/// column mixing kinds is `Object`.
pub fn infer_display_type<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnDisplayType {
    let mut inferred: Option<ColumnDisplayType> = None;

    for value in values {
        let Some(display) = value.display_type() else {
            continue;
        };
        match inferred {
            None => inferred = Some(display),
            Some(current) if current == display => {},
            Some(_) => return ColumnDisplayType::Object,
        }
    }

    inferred.unwrap_or(ColumnDisplayType::Unknown)
}

/// Resolves an array selection against a sequence of `len` items. Ranges
/// are clipped to the available items; explicit indices must all exist.
pub fn selection_positions(selection: &ArraySelection, len: usize) -> crate::Result<Vec<usize>> {
    match selection {
        ArraySelection::SelectRange(DataSelectionRange {
            first_index,
            last_index,
        }) => {
            let first = (*first_index).max(0) as usize;
            let last = (*last_index).min(len as i64 - 1);
            if last < 0 || first as i64 > last {
                return Ok(vec![]);
            }
            Ok((first..=last as usize).collect())
        },
        ArraySelection::SelectIndices(DataSelectionIndices { indices }) => indices
            .iter()
            .map(|index| checked_index(*index, len))
            .collect(),
    }
}

pub fn checked_index(index: i64, len: usize) -> crate::Result<usize> {
    if index < 0 || index as usize >= len {
        return Err(Error::IndexOutOfBounds { index, len });
    }
    Ok(index as usize)
}

pub fn checked_column(index: i64, num_columns: usize) -> crate::Result<usize> {
    if index < 0 || index as usize >= num_columns {
        return Err(Error::InvalidColumnIndex { index, num_columns });
    }
    Ok(index as usize)
}

/// Maps positions in the view to rows of the underlying table.
pub fn view_rows(view_indices: Option<&[usize]>, positions: &[usize]) -> Vec<usize> {
    match view_indices {
        Some(indices) => positions.iter().map(|pos| indices[*pos]).collect(),
        None => positions.to_vec(),
    }
}
