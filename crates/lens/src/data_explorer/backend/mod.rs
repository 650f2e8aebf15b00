//
// mod.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use relay::comm::data_explorer_comm::ColumnProfileRequest;
use relay::comm::data_explorer_comm::ColumnProfileResult;
use relay::comm::data_explorer_comm::ColumnProfileType;
use relay::comm::data_explorer_comm::ColumnProfileTypeSupportStatus;
use relay::comm::data_explorer_comm::ColumnSchema;
use relay::comm::data_explorer_comm::ColumnSortKey;
use relay::comm::data_explorer_comm::ColumnValue;
use relay::comm::data_explorer_comm::ExportDataSelectionFeatures;
use relay::comm::data_explorer_comm::ExportFormat;
use relay::comm::data_explorer_comm::FormatOptions;
use relay::comm::data_explorer_comm::GetColumnProfilesFeatures;
use relay::comm::data_explorer_comm::RowFilter;
use relay::comm::data_explorer_comm::RowFilterType;
use relay::comm::data_explorer_comm::RowFilterTypeSupportStatus;
use relay::comm::data_explorer_comm::SearchSchemaFeatures;
use relay::comm::data_explorer_comm::SetRowFiltersFeatures;
use relay::comm::data_explorer_comm::SetSortColumnsFeatures;
use relay::comm::data_explorer_comm::SupportStatus;
use relay::comm::data_explorer_comm::SupportedFeatures;
use strum::IntoEnumIterator;

use crate::data_explorer::column_profile::profile_column;
use crate::data_explorer::export_selection::export_values;
use crate::data_explorer::filter::evaluate_values;
use crate::data_explorer::format::format_column;
use crate::data_explorer::sort::sort_rows_by_values;
use crate::data_explorer::utils::checked_column;
use crate::data_explorer::utils::TypeCache;
use crate::error::Error;
use crate::handle::TableHandle;
use crate::value::Value;

pub mod batch;
pub mod frame;
pub mod unsupported;

pub use self::batch::ArrowAdapter;
pub use self::frame::FrameAdapter;
pub use self::unsupported::UnsupportedAdapter;

/// One entry per row of the unfiltered table. `None` means the predicate
/// could not be decided for that row, typically because the value is
/// missing.
pub type Mask = Vec<Option<bool>>;

/// The uniform view of a table engine. Adapters never mutate the table
/// they wrap.
///
/// Only the accessors are engine specific. Filtering, sorting, profiling
/// and export have row-at-a-time implementations over `Value`s that an
/// engine may override with something faster.
pub trait TableAdapter {
    fn num_rows(&self) -> usize;

    fn num_columns(&self) -> usize;

    fn column_name(&self, index: usize) -> Option<String>;

    /// The engine's own name for the type of a column. Cheap; never looks
    /// at the values.
    fn type_name(&self, index: usize) -> Option<String>;

    fn schema_of(&self, index: usize, cache: &mut TypeCache) -> crate::Result<ColumnSchema>;

    /// The values of a column at `rows`, in that order, or the whole
    /// column when `rows` is `None`.
    fn column_values(&self, index: usize, rows: Option<&[usize]>) -> crate::Result<Vec<Value>>;

    fn is_supported(&self) -> bool {
        true
    }

    fn row_labels(&self) -> Option<&[String]> {
        None
    }

    fn has_row_labels(&self) -> bool {
        self.row_labels().is_some()
    }

    fn export_formats(&self) -> Vec<ExportFormat> {
        vec![ExportFormat::Csv, ExportFormat::Tsv, ExportFormat::Html]
    }

    fn evaluate_filter(&self, filter: &RowFilter) -> crate::Result<Mask> {
        let index = checked_column(filter.column_schema.column_index, self.num_columns())?;
        let values = self.column_values(index, None)?;
        evaluate_values(&values, filter)
    }

    /// Stable sort of `rows` by the keys, primary key first. Missing
    /// values sort last in both directions.
    fn sort_rows(&self, rows: &mut [usize], keys: &[ColumnSortKey]) -> crate::Result<()> {
        let mut columns = Vec::with_capacity(keys.len());
        for key in keys {
            let index = checked_column(key.column_index, self.num_columns())?;
            columns.push((self.column_values(index, None)?, key.ascending));
        }
        sort_rows_by_values(rows, &columns);
        Ok(())
    }

    fn null_count(&self, index: usize, rows: Option<&[usize]>) -> crate::Result<i64> {
        let values = self.column_values(index, rows)?;
        Ok(values.iter().filter(|value| value.is_missing()).count() as i64)
    }

    fn format_values(
        &self,
        index: usize,
        rows: &[usize],
        format_options: &FormatOptions,
    ) -> crate::Result<Vec<ColumnValue>> {
        let values = self.column_values(index, Some(rows))?;
        Ok(format_column(&values, format_options))
    }

    fn profile(
        &self,
        request: &ColumnProfileRequest,
        rows: Option<&[usize]>,
        format_options: &FormatOptions,
        cache: &mut TypeCache,
    ) -> ColumnProfileResult {
        profile_column(self, request, rows, format_options, cache)
    }

    fn export(
        &self,
        rows: &[usize],
        columns: &[usize],
        format: ExportFormat,
        include_header: bool,
    ) -> crate::Result<String> {
        if !self.export_formats().contains(&format) {
            return Err(Error::UnsupportedFeature(format!("{format} export")));
        }
        export_values(self, rows, columns, format, include_header)
    }
}

/// The closed set of engines a view can be backed by.
pub enum Backend {
    Frame(FrameAdapter),
    Arrow(ArrowAdapter),
    Unsupported(UnsupportedAdapter),
}

impl Backend {
    /// Probes the handle for a known engine. Anything else gets the
    /// degenerate adapter so that a view can still be opened and closed.
    pub fn from_handle(handle: &TableHandle) -> Self {
        if let Some(frame) = handle.downcast::<crate::frame::Frame>() {
            return Backend::Frame(FrameAdapter::new(frame));
        }
        if let Some(batch) = handle.downcast::<arrow::record_batch::RecordBatch>() {
            return Backend::Arrow(ArrowAdapter::new(&batch));
        }
        log::warn!("Can't view value of unsupported type {handle:?}");
        Backend::Unsupported(UnsupportedAdapter)
    }

    pub fn adapter(&self) -> &dyn TableAdapter {
        match self {
            Backend::Frame(adapter) => adapter,
            Backend::Arrow(adapter) => adapter,
            Backend::Unsupported(adapter) => adapter,
        }
    }
}

pub fn supported_features(adapter: &dyn TableAdapter) -> SupportedFeatures {
    let status = match adapter.is_supported() {
        true => SupportStatus::Supported,
        false => SupportStatus::Unsupported,
    };

    SupportedFeatures {
        search_schema: SearchSchemaFeatures {
            support_status: status,
        },
        set_row_filters: SetRowFiltersFeatures {
            support_status: status,
            supports_conditions: status,
            supported_types: RowFilterType::iter()
                .map(|row_filter_type| RowFilterTypeSupportStatus {
                    row_filter_type,
                    support_status: status,
                })
                .collect(),
        },
        get_column_profiles: GetColumnProfilesFeatures {
            support_status: status,
            supported_types: ColumnProfileType::iter()
                .map(|profile_type| ColumnProfileTypeSupportStatus {
                    profile_type,
                    support_status: status,
                })
                .collect(),
        },
        set_sort_columns: SetSortColumnsFeatures {
            support_status: status,
        },
        export_data_selection: ExportDataSelectionFeatures {
            support_status: status,
            supported_formats: adapter.export_formats(),
        },
    }
}
