//
// unsupported.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use relay::comm::data_explorer_comm::ColumnSchema;
use relay::comm::data_explorer_comm::ExportFormat;

use crate::data_explorer::backend::TableAdapter;
use crate::data_explorer::utils::TypeCache;
use crate::error::Error;
use crate::value::Value;

/// Stands in for values that aren't tables: no rows, no columns, nothing
/// supported.
pub struct UnsupportedAdapter;

impl TableAdapter for UnsupportedAdapter {
    fn num_rows(&self) -> usize {
        0
    }

    fn num_columns(&self) -> usize {
        0
    }

    fn column_name(&self, _index: usize) -> Option<String> {
        None
    }

    fn type_name(&self, _index: usize) -> Option<String> {
        None
    }

    fn schema_of(&self, index: usize, _cache: &mut TypeCache) -> crate::Result<ColumnSchema> {
        Err(Error::InvalidColumnIndex {
            index: index as i64,
            num_columns: 0,
        })
    }

    fn column_values(&self, index: usize, _rows: Option<&[usize]>) -> crate::Result<Vec<Value>> {
        Err(Error::InvalidColumnIndex {
            index: index as i64,
            num_columns: 0,
        })
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn export_formats(&self) -> Vec<ExportFormat> {
        vec![]
    }
}
