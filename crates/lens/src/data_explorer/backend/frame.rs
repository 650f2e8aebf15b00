//
// frame.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::sync::Arc;

use relay::comm::data_explorer_comm::ColumnDisplayType;
use relay::comm::data_explorer_comm::ColumnSchema;

use crate::data_explorer::backend::TableAdapter;
use crate::data_explorer::utils::infer_display_type;
use crate::data_explorer::utils::TypeCache;
use crate::error::Error;
use crate::frame::Column;
use crate::frame::ColumnData;
use crate::frame::Frame;
use crate::value::Value;

/// Row-at-a-time adapter over a `Frame`.
pub struct FrameAdapter {
    frame: Arc<Frame>,
}

impl FrameAdapter {
    pub fn new(frame: Arc<Frame>) -> Self {
        Self { frame }
    }

    fn column(&self, index: usize) -> crate::Result<&Column> {
        self.frame
            .column(index)
            .ok_or_else(|| Error::InvalidColumnIndex {
                index: index as i64,
                num_columns: self.frame.num_columns(),
            })
    }
}

impl TableAdapter for FrameAdapter {
    fn num_rows(&self) -> usize {
        self.frame.num_rows()
    }

    fn num_columns(&self) -> usize {
        self.frame.num_columns()
    }

    fn column_name(&self, index: usize) -> Option<String> {
        self.frame.column(index).map(|column| column.name.clone())
    }

    fn type_name(&self, index: usize) -> Option<String> {
        self.frame.column(index).map(|column| column.data.type_name())
    }

    fn schema_of(&self, index: usize, cache: &mut TypeCache) -> crate::Result<ColumnSchema> {
        let column = self.column(index)?;

        let type_display = match &column.data {
            ColumnData::Bool(_) => ColumnDisplayType::Boolean,
            ColumnData::Int(_) | ColumnData::Float(_) => ColumnDisplayType::Number,
            ColumnData::Str(_) => ColumnDisplayType::String,
            ColumnData::Date(_) => ColumnDisplayType::Date,
            ColumnData::Datetime { .. } | ColumnData::DatetimeTz(_) => ColumnDisplayType::Datetime,
            ColumnData::Time(_) => ColumnDisplayType::Time,
            ColumnData::Object(values) => {
                cache.get_or_insert_with(index, || infer_display_type(values.iter()))
            },
        };

        let timezone = match &column.data {
            ColumnData::Datetime { timezone, .. } => timezone.clone(),
            _ => None,
        };

        Ok(ColumnSchema {
            column_name: column.name.clone(),
            column_index: index as i64,
            type_name: column.data.type_name(),
            type_display,
            description: None,
            timezone,
        })
    }

    fn column_values(&self, index: usize, rows: Option<&[usize]>) -> crate::Result<Vec<Value>> {
        let data = &self.column(index)?.data;
        let values = match rows {
            Some(rows) => rows.iter().map(|row| data.value(*row)).collect(),
            None => (0..data.len()).map(|row| data.value(row)).collect(),
        };
        Ok(values)
    }

    fn row_labels(&self) -> Option<&[String]> {
        self.frame.row_labels()
    }
}
