//
// table_view.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use relay::comm::data_explorer_comm::BackendState;
use relay::comm::data_explorer_comm::ColumnProfileResult;
use relay::comm::data_explorer_comm::ColumnSortKey;
use relay::comm::data_explorer_comm::DataExplorerBackendReply;
use relay::comm::data_explorer_comm::DataExplorerBackendRequest;
use relay::comm::data_explorer_comm::DataExplorerFrontendEvent;
use relay::comm::data_explorer_comm::ExportDataSelectionParams;
use relay::comm::data_explorer_comm::ExportedData;
use relay::comm::data_explorer_comm::FilterResult;
use relay::comm::data_explorer_comm::GetColumnProfilesParams;
use relay::comm::data_explorer_comm::GetDataValuesParams;
use relay::comm::data_explorer_comm::GetRowLabelsParams;
use relay::comm::data_explorer_comm::GetSchemaParams;
use relay::comm::data_explorer_comm::RowFilter;
use relay::comm::data_explorer_comm::SearchSchemaParams;
use relay::comm::data_explorer_comm::SearchSchemaResult;
use relay::comm::data_explorer_comm::SetRowFiltersParams;
use relay::comm::data_explorer_comm::SetSortColumnsParams;
use relay::comm::data_explorer_comm::TableData;
use relay::comm::data_explorer_comm::TableRowLabels;
use relay::comm::data_explorer_comm::TableSchema;
use relay::comm::data_explorer_comm::TableShape;

use crate::data_explorer::backend::supported_features;
use crate::data_explorer::backend::Backend;
use crate::data_explorer::export_selection::export_selection;
use crate::data_explorer::filter::apply_row_filters;
use crate::data_explorer::format::format_string;
use crate::data_explorer::reconcile::reconcile;
use crate::data_explorer::reconcile::SchemaSnapshot;
use crate::data_explorer::search_schema::search_schema;
use crate::data_explorer::utils::checked_column;
use crate::data_explorer::utils::selection_positions;
use crate::data_explorer::utils::view_rows;
use crate::data_explorer::utils::TypeCache;
use crate::handle::TableHandle;
use crate::value::Value;

/// How much of the cached row order is out of date. Ordered from least to
/// most stale: changes only ever move a view towards `FiltersDirty`, and
/// only a successful recomputation brings it back to `Clean`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViewState {
    Clean,
    SortDirty,
    FiltersDirty,
}

/// A live, filtered and sorted view of one table.
pub struct TableView {
    /// The human-readable title of the view.
    title: String,

    /// The table being viewed. The view never mutates it.
    handle: TableHandle,

    backend: Backend,

    /// The columns of the table as of the last reconciliation.
    snapshot: SchemaSnapshot,

    /// Display types inferred for dynamically typed columns.
    cache: TypeCache,

    row_filters: Vec<RowFilter>,

    sort_keys: Vec<ColumnSortKey>,

    /// The rows selected by the filters, in table order. `None` when no
    /// filter is active.
    filtered_indices: Option<Vec<usize>>,

    /// The filtered rows in sorted order. `None` when the view shows the
    /// table as is.
    view_indices: Option<Vec<usize>>,

    state: ViewState,

    reconcile_threshold: usize,
}

impl TableView {
    pub fn new(title: String, handle: TableHandle, reconcile_threshold: usize) -> Self {
        let backend = Backend::from_handle(&handle);
        let adapter = backend.adapter();
        let mut cache = TypeCache::new(adapter.num_columns());
        let snapshot = SchemaSnapshot::take(adapter, &mut cache, reconcile_threshold);

        Self {
            title,
            handle,
            backend,
            snapshot,
            cache,
            row_filters: vec![],
            sort_keys: vec![],
            filtered_indices: None,
            view_indices: None,
            state: ViewState::Clean,
            reconcile_threshold,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn handle(&self) -> &TableHandle {
        &self.handle
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn row_filters(&self) -> &[RowFilter] {
        &self.row_filters
    }

    pub fn sort_keys(&self) -> &[ColumnSortKey] {
        &self.sort_keys
    }

    pub fn handle_rpc(
        &mut self,
        req: DataExplorerBackendRequest,
    ) -> anyhow::Result<DataExplorerBackendReply> {
        log::trace!("Data explorer '{}': {req:?}", self.title);

        let reply = match req {
            DataExplorerBackendRequest::GetSchema(params) => {
                DataExplorerBackendReply::GetSchemaReply(self.get_schema(params))
            },
            DataExplorerBackendRequest::SearchSchema(params) => {
                DataExplorerBackendReply::SearchSchemaReply(self.search_schema(params)?)
            },
            DataExplorerBackendRequest::GetDataValues(params) => {
                DataExplorerBackendReply::GetDataValuesReply(self.get_data_values(params)?)
            },
            DataExplorerBackendRequest::GetRowLabels(params) => {
                DataExplorerBackendReply::GetRowLabelsReply(self.get_row_labels(params)?)
            },
            DataExplorerBackendRequest::ExportDataSelection(params) => {
                DataExplorerBackendReply::ExportDataSelectionReply(
                    self.export_data_selection(params)?,
                )
            },
            DataExplorerBackendRequest::SetRowFilters(params) => {
                DataExplorerBackendReply::SetRowFiltersReply(self.set_row_filters(params)?)
            },
            DataExplorerBackendRequest::SetSortColumns(params) => {
                self.set_sort_columns(params)?;
                DataExplorerBackendReply::SetSortColumnsReply()
            },
            DataExplorerBackendRequest::GetColumnProfiles(params) => {
                DataExplorerBackendReply::GetColumnProfilesReply(self.get_column_profiles(params)?)
            },
            DataExplorerBackendRequest::GetState => {
                DataExplorerBackendReply::GetStateReply(self.get_state()?)
            },
        };

        Ok(reply)
    }

    /// Out of range indices are skipped.
    pub fn get_schema(&mut self, params: GetSchemaParams) -> TableSchema {
        let adapter = self.backend.adapter();
        let columns = params
            .column_indices
            .into_iter()
            .filter_map(|index| {
                let index = checked_column(index, adapter.num_columns()).ok()?;
                adapter.schema_of(index, &mut self.cache).ok()
            })
            .collect();
        TableSchema { columns }
    }

    pub fn search_schema(&mut self, params: SearchSchemaParams) -> crate::Result<SearchSchemaResult> {
        search_schema(self.backend.adapter(), &params, &mut self.cache)
    }

    pub fn get_data_values(&mut self, params: GetDataValuesParams) -> crate::Result<TableData> {
        self.recompute()?;

        let adapter = self.backend.adapter();
        let num_rows = self.num_view_rows();

        let mut columns = Vec::with_capacity(params.columns.len());
        for selection in params.columns.iter() {
            let index = checked_column(selection.column_index, adapter.num_columns())?;
            let positions = selection_positions(&selection.spec, num_rows)?;
            let rows = view_rows(self.view_indices.as_deref(), &positions);
            columns.push(adapter.format_values(index, &rows, &params.format_options)?);
        }

        Ok(TableData { columns })
    }

    /// Tables without row labels reply with an empty list.
    pub fn get_row_labels(&mut self, params: GetRowLabelsParams) -> crate::Result<TableRowLabels> {
        self.recompute()?;

        let Some(labels) = self.backend.adapter().row_labels() else {
            return Ok(TableRowLabels { row_labels: vec![] });
        };

        let positions = selection_positions(&params.selection, self.num_view_rows())?;
        let values: Vec<Value> = view_rows(self.view_indices.as_deref(), &positions)
            .into_iter()
            .map(|row| Value::Str(labels[row].clone()))
            .collect();

        Ok(TableRowLabels {
            row_labels: vec![format_string(&values, &params.format_options)],
        })
    }

    pub fn export_data_selection(
        &mut self,
        params: ExportDataSelectionParams,
    ) -> crate::Result<ExportedData> {
        self.recompute()?;

        let data = export_selection(
            self.backend.adapter(),
            self.view_indices.as_deref(),
            &params.selection,
            params.format,
        )?;

        Ok(ExportedData {
            data,
            format: params.format,
        })
    }

    /// Replaces the filters and applies them right away. Sorting follows
    /// in the same pass.
    pub fn set_row_filters(&mut self, params: SetRowFiltersParams) -> crate::Result<FilterResult> {
        self.row_filters = params.filters;
        self.invalidate(ViewState::FiltersDirty);

        let had_errors = self.apply_filters();
        self.apply_sort()?;

        let selected_num_rows = match &self.filtered_indices {
            Some(indices) => indices.len(),
            None => self.backend.adapter().num_rows(),
        };

        Ok(FilterResult {
            selected_num_rows: selected_num_rows as i64,
            had_errors: Some(had_errors),
        })
    }

    /// Replaces the sort keys. Sorting is deferred until the view is read.
    pub fn set_sort_columns(&mut self, params: SetSortColumnsParams) -> crate::Result<()> {
        let num_columns = self.backend.adapter().num_columns();
        for key in params.sort_keys.iter() {
            checked_column(key.column_index, num_columns)?;
        }

        self.sort_keys = params.sort_keys;
        self.invalidate(ViewState::SortDirty);
        Ok(())
    }

    pub fn get_column_profiles(
        &mut self,
        params: GetColumnProfilesParams,
    ) -> crate::Result<Vec<ColumnProfileResult>> {
        self.recompute()?;

        let adapter = self.backend.adapter();
        let rows = self.filtered_indices.as_deref();

        Ok(params
            .profiles
            .iter()
            .map(|request| adapter.profile(request, rows, &params.format_options, &mut self.cache))
            .collect())
    }

    pub fn get_state(&mut self) -> crate::Result<BackendState> {
        self.recompute()?;

        let adapter = self.backend.adapter();
        let num_columns = adapter.num_columns() as i64;

        Ok(BackendState {
            display_name: self.title.clone(),
            table_shape: TableShape {
                num_rows: self.num_view_rows() as i64,
                num_columns,
            },
            table_unfiltered_shape: TableShape {
                num_rows: adapter.num_rows() as i64,
                num_columns,
            },
            has_row_labels: adapter.has_row_labels(),
            row_filters: self.row_filters.clone(),
            sort_keys: self.sort_keys.clone(),
            supported_features: supported_features(adapter),
        })
    }

    /// Points the view at a new value of its table and migrates filters and
    /// sort keys to it. Returns the event the front end should receive, or
    /// `None` when the handle didn't change.
    ///
    /// Rows are recomputed lazily, before the next query.
    pub fn update(&mut self, handle: TableHandle) -> Option<DataExplorerFrontendEvent> {
        if handle.ptr_eq(&self.handle) {
            return None;
        }

        let backend = Backend::from_handle(&handle);
        let adapter = backend.adapter();
        self.cache.reset(adapter.num_columns());

        let reconciled = reconcile(
            &self.snapshot,
            adapter,
            &self.row_filters,
            &self.sort_keys,
            &mut self.cache,
            self.reconcile_threshold,
        );

        log::info!(
            "Data explorer '{}' updated (schema changed: {})",
            self.title,
            reconciled.schema_changed
        );

        self.snapshot = reconciled.snapshot;
        self.row_filters = reconciled.filters;
        self.sort_keys = reconciled.sort_keys;
        self.handle = handle;
        self.backend = backend;
        self.filtered_indices = None;
        self.view_indices = None;
        self.invalidate(ViewState::FiltersDirty);

        Some(match reconciled.schema_changed {
            true => DataExplorerFrontendEvent::SchemaUpdate,
            false => DataExplorerFrontendEvent::DataUpdate,
        })
    }

    fn invalidate(&mut self, state: ViewState) {
        self.state = self.state.max(state);
    }

    fn num_view_rows(&self) -> usize {
        match &self.view_indices {
            Some(indices) => indices.len(),
            None => match &self.filtered_indices {
                Some(indices) => indices.len(),
                None => self.backend.adapter().num_rows(),
            },
        }
    }

    /// Brings the cached row order up to date.
    fn recompute(&mut self) -> crate::Result<()> {
        if self.state == ViewState::FiltersDirty {
            self.apply_filters();
        }
        if self.state == ViewState::SortDirty {
            self.apply_sort()?;
        }
        Ok(())
    }

    fn apply_filters(&mut self) -> bool {
        let (indices, had_errors) = apply_row_filters(
            self.backend.adapter(),
            &mut self.row_filters,
            &mut self.cache,
        );
        self.filtered_indices = indices;
        self.state = ViewState::SortDirty;
        had_errors
    }

    fn apply_sort(&mut self) -> crate::Result<()> {
        let adapter = self.backend.adapter();

        self.view_indices = match self.sort_keys.is_empty() {
            true => self.filtered_indices.clone(),
            false => {
                let mut rows = match &self.filtered_indices {
                    Some(indices) => indices.clone(),
                    None => (0..adapter.num_rows()).collect(),
                };
                adapter.sort_rows(&mut rows, &self.sort_keys)?;
                Some(rows)
            },
        };

        self.state = ViewState::Clean;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use relay::comm::data_explorer_comm::ArraySelection;
    use relay::comm::data_explorer_comm::ColumnProfileRequest;
    use relay::comm::data_explorer_comm::ColumnProfileSpec;
    use relay::comm::data_explorer_comm::ColumnProfileType;
    use relay::comm::data_explorer_comm::ColumnSelection;
    use relay::comm::data_explorer_comm::ColumnValue;
    use relay::comm::data_explorer_comm::DataSelectionIndices;
    use relay::comm::data_explorer_comm::DataSelectionRange;
    use relay::comm::data_explorer_comm::FilterComparison;
    use relay::comm::data_explorer_comm::FilterComparisonOp;
    use relay::comm::data_explorer_comm::RowFilterCondition;
    use relay::comm::data_explorer_comm::RowFilterParams;
    use relay::comm::data_explorer_comm::RowFilterType;

    use super::*;
    use crate::config::default_format_options;
    use crate::fixtures::sample_frame;
    use crate::frame::Column;
    use crate::frame::ColumnData;
    use crate::frame::Frame;

    fn view(frame: Frame) -> TableView {
        TableView::new(String::from("df"), TableHandle::new(frame), 100)
    }

    fn compare(view: &mut TableView, index: i64, op: FilterComparisonOp, value: &str) -> RowFilter {
        let column_schema = view
            .get_schema(GetSchemaParams {
                column_indices: vec![index],
            })
            .columns
            .remove(0);
        RowFilter {
            filter_id: format!("compare-{index}"),
            filter_type: RowFilterType::Compare,
            column_schema,
            condition: RowFilterCondition::And,
            is_valid: None,
            error_message: None,
            params: Some(RowFilterParams::Comparison(FilterComparison {
                op,
                value: String::from(value),
            })),
        }
    }

    fn column(view: &mut TableView, index: i64) -> Vec<ColumnValue> {
        let mut data = view
            .get_data_values(GetDataValuesParams {
                columns: vec![ColumnSelection {
                    column_index: index,
                    spec: ArraySelection::SelectRange(DataSelectionRange {
                        first_index: 0,
                        last_index: 100,
                    }),
                }],
                format_options: default_format_options(),
            })
            .unwrap();
        data.columns.remove(0)
    }

    fn strings(values: &[&str]) -> Vec<ColumnValue> {
        values
            .iter()
            .map(|x| ColumnValue::FormattedValue(String::from(*x)))
            .collect()
    }

    fn sort(view: &mut TableView, keys: &[(i64, bool)]) {
        view.set_sort_columns(SetSortColumnsParams {
            sort_keys: keys
                .iter()
                .map(|(column_index, ascending)| ColumnSortKey {
                    column_index: *column_index,
                    ascending: *ascending,
                })
                .collect(),
        })
        .unwrap();
    }

    fn filter(view: &mut TableView, filters: Vec<RowFilter>) -> FilterResult {
        view.set_row_filters(SetRowFiltersParams { filters }).unwrap()
    }

    #[test]
    fn test_filter_then_sort() {
        let mut view = view(sample_frame());
        assert_eq!(view.state(), ViewState::Clean);

        let gt = compare(&mut view, 0, FilterComparisonOp::Gt, "2");
        let result = filter(&mut view, vec![gt]);
        assert_eq!(result.selected_num_rows, 3);
        assert_eq!(result.had_errors, Some(false));

        sort(&mut view, &[(0, false)]);
        assert_eq!(view.state(), ViewState::SortDirty);
        assert_eq!(column(&mut view, 0), strings(&["5", "4", "3"]));
        assert_eq!(view.state(), ViewState::Clean);

        // The sort survives a filter reset
        let result = filter(&mut view, vec![]);
        assert_eq!(result.selected_num_rows, 5);
        assert_eq!(column(&mut view, 0), strings(&["5", "4", "3", "2", "1"]));
    }

    #[test]
    fn test_filters_are_idempotent_and_reset() {
        let mut view = view(sample_frame());
        let before = column(&mut view, 0);

        let lt = compare(&mut view, 0, FilterComparisonOp::Lt, "4");
        let first = filter(&mut view, vec![lt.clone()]);
        let rows = column(&mut view, 0);
        let second = filter(&mut view, vec![lt]);
        assert_eq!(first, second);
        assert_eq!(column(&mut view, 0), rows);

        filter(&mut view, vec![]);
        assert_eq!(column(&mut view, 0), before);
    }

    #[test]
    fn test_sort_is_stable() {
        let frame = Frame::new(vec![
            Column::new("g", ColumnData::Int(vec![Some(2), Some(1), Some(2), Some(1)])),
            Column::new(
                "id",
                ColumnData::Str(["a", "b", "c", "d"].iter().map(|x| Some(x.to_string())).collect()),
            ),
        ])
        .unwrap();
        let mut view = view(frame);

        sort(&mut view, &[(0, true)]);
        assert_eq!(column(&mut view, 1), strings(&["b", "d", "a", "c"]));

        sort(&mut view, &[(0, false)]);
        assert_eq!(column(&mut view, 1), strings(&["a", "c", "b", "d"]));

        sort(&mut view, &[(0, true), (1, false)]);
        assert_eq!(column(&mut view, 1), strings(&["d", "b", "c", "a"]));
    }

    #[test]
    fn test_invalid_requests_leave_the_view_unchanged() {
        let mut view = view(sample_frame());
        sort(&mut view, &[(0, false)]);

        let err = view.set_sort_columns(SetSortColumnsParams {
            sort_keys: vec![ColumnSortKey {
                column_index: 7,
                ascending: true,
            }],
        });
        assert!(err.is_err());
        assert_eq!(view.sort_keys().len(), 1);

        let err = view.get_data_values(GetDataValuesParams {
            columns: vec![ColumnSelection {
                column_index: 0,
                spec: ArraySelection::SelectIndices(DataSelectionIndices { indices: vec![9] }),
            }],
            format_options: default_format_options(),
        });
        assert!(err.is_err());
        assert_eq!(column(&mut view, 0), strings(&["5", "4", "3", "2", "1"]));
    }

    #[test]
    fn test_get_schema_skips_invalid_indices() {
        let mut view = view(sample_frame());
        let schema = view.get_schema(GetSchemaParams {
            column_indices: vec![1, 5, -1, 0],
        });
        let names: Vec<&str> = schema
            .columns
            .iter()
            .map(|column| column.column_name.as_str())
            .collect();
        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn test_row_labels_follow_the_view() {
        let mut view = view(sample_frame());
        sort(&mut view, &[(0, false)]);

        let labels = view
            .get_row_labels(GetRowLabelsParams {
                selection: ArraySelection::SelectRange(DataSelectionRange {
                    first_index: 0,
                    last_index: 1,
                }),
                format_options: default_format_options(),
            })
            .unwrap();
        assert_eq!(labels.row_labels, vec![vec![
            String::from("r5"),
            String::from("r4")
        ]]);
    }

    #[test]
    fn test_profiles_use_the_filtered_rows() {
        let mut view = view(sample_frame());
        let gt = compare(&mut view, 0, FilterComparisonOp::Gt, "3");
        filter(&mut view, vec![gt]);

        let profiles = view
            .get_column_profiles(GetColumnProfilesParams {
                profiles: vec![ColumnProfileRequest {
                    column_index: 0,
                    profiles: vec![ColumnProfileSpec {
                        profile_type: ColumnProfileType::SummaryStats,
                        params: None,
                    }],
                }],
                format_options: default_format_options(),
            })
            .unwrap();
        let stats = profiles[0]
            .summary_stats
            .as_ref()
            .unwrap()
            .number_stats
            .as_ref()
            .unwrap();
        assert_eq!(stats.min_value.as_deref(), Some("4.00"));
    }

    #[test]
    fn test_state() {
        let mut view = view(sample_frame());
        let gt = compare(&mut view, 0, FilterComparisonOp::Gt, "4");
        filter(&mut view, vec![gt]);

        let state = view.get_state().unwrap();
        assert_eq!(state.display_name, "df");
        assert_eq!(state.table_shape.num_rows, 1);
        assert_eq!(state.table_unfiltered_shape.num_rows, 5);
        assert_eq!(state.table_shape.num_columns, 2);
        assert!(state.has_row_labels);
        assert_eq!(state.row_filters[0].is_valid, Some(true));
    }

    #[test]
    fn test_update() {
        let frame = sample_frame();
        let handle = TableHandle::new(frame.clone());
        let mut view = TableView::new(String::from("df"), handle.clone(), 100);

        let gt = compare(&mut view, 0, FilterComparisonOp::Gt, "2");
        filter(&mut view, vec![gt]);
        sort(&mut view, &[(0, false)]);

        // Same value: nothing to do
        assert_eq!(view.update(handle), None);

        // Same schema, new data
        assert_eq!(
            view.update(TableHandle::new(frame)),
            Some(DataExplorerFrontendEvent::DataUpdate)
        );
        assert_eq!(view.state(), ViewState::FiltersDirty);
        assert_eq!(column(&mut view, 0), strings(&["5", "4", "3"]));

        // Column `x` moves to the end
        let shifted = Frame::new(vec![
            Column::new("w", ColumnData::Bool(vec![Some(true); 5])),
            Column::new("x", ColumnData::Int((1..=5).map(Some).collect())),
        ])
        .unwrap();
        assert_eq!(
            view.update(TableHandle::new(shifted)),
            Some(DataExplorerFrontendEvent::SchemaUpdate)
        );
        assert_eq!(view.row_filters()[0].column_schema.column_index, 1);
        assert_eq!(view.sort_keys()[0].column_index, 1);
        assert_eq!(column(&mut view, 1), strings(&["5", "4", "3"]));

        // Not a table anymore: the view degrades to an empty one
        assert_eq!(
            view.update(TableHandle::new(String::from("oops"))),
            Some(DataExplorerFrontendEvent::SchemaUpdate)
        );
        let state = view.get_state().unwrap();
        assert_eq!(state.table_shape.num_rows, 0);
        assert_eq!(state.row_filters[0].is_valid, Some(false));
        assert!(state.sort_keys.is_empty());
    }

    #[test]
    fn test_update_with_retyped_object_column() {
        let objects = |values: Vec<Value>| {
            let frame = Frame::new(vec![Column::new("a", ColumnData::Object(values))]).unwrap();
            TableHandle::new(frame)
        };

        let mut view = TableView::new(
            String::from("df"),
            objects(vec![Value::Int(1), Value::Int(2)]),
            100,
        );
        assert_eq!(
            view.update(objects(vec![Value::Int(3), Value::Int(4)])),
            Some(DataExplorerFrontendEvent::DataUpdate)
        );
        assert_eq!(
            view.update(objects(vec![
                Value::Str(String::from("a")),
                Value::Str(String::from("b")),
            ])),
            Some(DataExplorerFrontendEvent::SchemaUpdate)
        );
    }
}
