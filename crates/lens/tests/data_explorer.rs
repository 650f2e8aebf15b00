//
// data_explorer.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use crossbeam::channel::unbounded;
use crossbeam::channel::Receiver;
use crossbeam::channel::Sender;
use lens::config::default_format_options;
use lens::config::ExplorerConfig;
use lens::fixtures::sample_batch;
use lens::fixtures::sample_frame;
use lens::fixtures::socket_rpc_request;
use lens::frame::Column;
use lens::frame::ColumnData;
use lens::frame::Frame;
use lens::handle::TableHandle;
use lens::registry::VariablePath;
use lens::service::DataExplorerService;
use lens::service::ExplorerEvent;
use relay::comm::base_comm::json_rpc_error_message;
use relay::comm::comm_channel::CommMsg;
use relay::comm::data_explorer_comm::ArraySelection;
use relay::comm::data_explorer_comm::ColumnFrequencyTableParams;
use relay::comm::data_explorer_comm::ColumnProfileParams;
use relay::comm::data_explorer_comm::ColumnProfileRequest;
use relay::comm::data_explorer_comm::ColumnProfileResult;
use relay::comm::data_explorer_comm::ColumnProfileSpec;
use relay::comm::data_explorer_comm::ColumnProfileType;
use relay::comm::data_explorer_comm::ColumnSchema;
use relay::comm::data_explorer_comm::ColumnSelection;
use relay::comm::data_explorer_comm::ColumnSortKey;
use relay::comm::data_explorer_comm::ColumnValue;
use relay::comm::data_explorer_comm::DataExplorerBackendReply;
use relay::comm::data_explorer_comm::DataExplorerBackendRequest;
use relay::comm::data_explorer_comm::DataSelectionRange;
use relay::comm::data_explorer_comm::DataSelectionSingleCell;
use relay::comm::data_explorer_comm::ExportDataSelectionParams;
use relay::comm::data_explorer_comm::ExportFormat;
use relay::comm::data_explorer_comm::FilterComparison;
use relay::comm::data_explorer_comm::FilterComparisonOp;
use relay::comm::data_explorer_comm::FilterResult;
use relay::comm::data_explorer_comm::GetColumnProfilesParams;
use relay::comm::data_explorer_comm::GetDataValuesParams;
use relay::comm::data_explorer_comm::GetSchemaParams;
use relay::comm::data_explorer_comm::RowFilter;
use relay::comm::data_explorer_comm::RowFilterCondition;
use relay::comm::data_explorer_comm::RowFilterParams;
use relay::comm::data_explorer_comm::RowFilterType;
use relay::comm::data_explorer_comm::Selection;
use relay::comm::data_explorer_comm::SetRowFiltersParams;
use relay::comm::data_explorer_comm::SetSortColumnsParams;
use relay::comm::data_explorer_comm::SupportStatus;
use relay::comm::data_explorer_comm::TableSelection;
use relay::comm::data_explorer_comm::TableSelectionKind;
use relay::comm::event::CommManagerEvent;
use relay::socket::comm::CommSocket;
use stdext::assert_match;

// We don't care about events coming back quickly, we just don't want to deadlock
// in case something has gone wrong, so we pick a pretty long timeout to use throughout
// the tests.
static RECV_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// A running service with one open view.
struct TestSetup {
    events_tx: Sender<ExplorerEvent>,
    _comm_manager_rx: Receiver<CommManagerEvent>,
    socket: CommSocket,
}

impl TestSetup {
    fn new(handle: TableHandle, binding: Option<&str>) -> Self {
        let (comm_manager_tx, comm_manager_rx) = unbounded::<CommManagerEvent>();
        let (events_tx, _thread) =
            DataExplorerService::start(&ExplorerConfig::default(), comm_manager_tx);

        let socket = open(&events_tx, &comm_manager_rx, handle, binding);
        Self {
            events_tx,
            _comm_manager_rx: comm_manager_rx,
            socket,
        }
    }

    fn socket(&self) -> &CommSocket {
        &self.socket
    }

    fn send(&self, event: ExplorerEvent) {
        self.events_tx.send(event).unwrap();
    }
}

impl Drop for TestSetup {
    fn drop(&mut self) {
        let _ = self.events_tx.send(ExplorerEvent::Shutdown);
    }
}

/// Opens a view and waits for the service to announce its comm.
fn open(
    events_tx: &Sender<ExplorerEvent>,
    comm_manager_rx: &Receiver<CommManagerEvent>,
    handle: TableHandle,
    binding: Option<&str>,
) -> CommSocket {
    events_tx
        .send(ExplorerEvent::Open {
            title: String::from("obj"),
            handle,
            binding: binding.map(path),
        })
        .unwrap();

    let msg = comm_manager_rx.recv_timeout(RECV_TIMEOUT).unwrap();
    match msg {
        CommManagerEvent::Opened(socket, _value) => {
            assert_eq!(socket.comm_name, "positron.dataExplorer");
            socket
        },
        _ => panic!("Unexpected Comm Manager Event"),
    }
}

fn path(name: &str) -> VariablePath {
    VariablePath::new(vec![String::from(name)]).unwrap()
}

/// Helper method for sending a request to the data explorer and receiving a reply.
fn socket_rpc(socket: &CommSocket, req: DataExplorerBackendRequest) -> DataExplorerBackendReply {
    socket_rpc_request::<DataExplorerBackendRequest, DataExplorerBackendReply>(socket, req)
}

/// Sends a request that is expected to fail and returns the error message.
fn socket_rpc_error(socket: &CommSocket, req: DataExplorerBackendRequest) -> String {
    let json = serde_json::to_value(req).unwrap();
    socket
        .incoming_tx
        .send(CommMsg::Rpc(String::from("err"), json))
        .unwrap();

    let msg = socket.outgoing_rx.recv_timeout(RECV_TIMEOUT).unwrap();
    match msg {
        CommMsg::Rpc(_id, value) => json_rpc_error_message(&value)
            .unwrap_or_else(|| panic!("Expected an error reply, got {value}"))
            .to_string(),
        _ => panic!("Unexpected Comm Message"),
    }
}

fn get_schema(socket: &CommSocket, column_indices: Vec<i64>) -> Vec<ColumnSchema> {
    let req = DataExplorerBackendRequest::GetSchema(GetSchemaParams { column_indices });
    assert_match!(socket_rpc(socket, req),
        DataExplorerBackendReply::GetSchemaReply(schema) => {
            schema.columns
        }
    )
}

fn compare_filter(schema: ColumnSchema, op: FilterComparisonOp, value: &str) -> RowFilter {
    RowFilter {
        filter_id: format!("{}-{}", schema.column_name, value),
        filter_type: RowFilterType::Compare,
        column_schema: schema,
        condition: RowFilterCondition::And,
        is_valid: None,
        error_message: None,
        params: Some(RowFilterParams::Comparison(FilterComparison {
            op,
            value: String::from(value),
        })),
    }
}

fn set_row_filters(socket: &CommSocket, filters: Vec<RowFilter>) -> FilterResult {
    let req = DataExplorerBackendRequest::SetRowFilters(SetRowFiltersParams { filters });
    assert_match!(socket_rpc(socket, req),
        DataExplorerBackendReply::SetRowFiltersReply(result) => {
            result
        }
    )
}

fn set_sort_columns(socket: &CommSocket, sort_keys: Vec<ColumnSortKey>) {
    let req = DataExplorerBackendRequest::SetSortColumns(SetSortColumnsParams { sort_keys });
    assert_match!(socket_rpc(socket, req), DataExplorerBackendReply::SetSortColumnsReply());
}

fn get_column(socket: &CommSocket, column_index: i64) -> Vec<ColumnValue> {
    let req = DataExplorerBackendRequest::GetDataValues(GetDataValuesParams {
        columns: vec![ColumnSelection {
            column_index,
            spec: ArraySelection::SelectRange(DataSelectionRange {
                first_index: 0,
                last_index: 100,
            }),
        }],
        format_options: default_format_options(),
    });
    assert_match!(socket_rpc(socket, req),
        DataExplorerBackendReply::GetDataValuesReply(data) => {
            assert_eq!(data.columns.len(), 1);
            data.columns.into_iter().next().unwrap()
        }
    )
}

fn num_rows(socket: &CommSocket) -> i64 {
    assert_match!(socket_rpc(socket, DataExplorerBackendRequest::GetState),
        DataExplorerBackendReply::GetStateReply(state) => {
            state.table_shape.num_rows
        }
    )
}

fn formatted(values: &[&str]) -> Vec<ColumnValue> {
    values
        .iter()
        .map(|value| ColumnValue::FormattedValue(value.to_string()))
        .collect()
}

fn descending(column_index: i64) -> ColumnSortKey {
    ColumnSortKey {
        column_index,
        ascending: false,
    }
}

/// Filter, then sort, then reset the filter.
fn check_filter_sort_reset(socket: &CommSocket) {
    let schema = get_schema(socket, vec![0]).remove(0);
    assert_eq!(schema.column_name, "x");

    let result = set_row_filters(socket, vec![compare_filter(
        schema,
        FilterComparisonOp::Gt,
        "2",
    )]);
    assert_eq!(result.selected_num_rows, 3);
    assert_eq!(result.had_errors, Some(false));

    set_sort_columns(socket, vec![descending(0)]);
    assert_eq!(get_column(socket, 0), formatted(&["5", "4", "3"]));

    let result = set_row_filters(socket, vec![]);
    assert_eq!(result.selected_num_rows, 5);
    assert_eq!(num_rows(socket), 5);
    assert_eq!(get_column(socket, 0), formatted(&["5", "4", "3", "2", "1"]));
}

#[test]
fn test_filter_sort_reset_frame() {
    let setup = TestSetup::new(TableHandle::new(sample_frame()), None);
    check_filter_sort_reset(setup.socket());
}

#[test]
fn test_filter_sort_reset_arrow() {
    let setup = TestSetup::new(TableHandle::new(sample_batch()), None);
    check_filter_sort_reset(setup.socket());
}

#[test]
fn test_filter_errors_are_local() {
    let setup = TestSetup::new(TableHandle::new(sample_frame()), None);
    let socket = setup.socket();
    let x = get_schema(socket, vec![0]).remove(0);

    let result = set_row_filters(socket, vec![
        compare_filter(x.clone(), FilterComparisonOp::Gt, "not a number"),
        compare_filter(x, FilterComparisonOp::Lt, "3"),
    ]);
    assert_eq!(result.had_errors, Some(true));
    assert_eq!(result.selected_num_rows, 2);

    assert_match!(socket_rpc(socket, DataExplorerBackendRequest::GetState),
        DataExplorerBackendReply::GetStateReply(state) => {
            assert_eq!(state.row_filters[0].is_valid, Some(false));
            assert!(state.row_filters[0].error_message.is_some());
            assert_eq!(state.row_filters[1].is_valid, Some(true));
        }
    );
}

#[test]
fn test_profiles() {
    let frame = Frame::new(vec![
        Column::new(
            "n",
            ColumnData::Int(vec![Some(1), Some(2), Some(3), Some(4), Some(5), None]),
        ),
        Column::new(
            "s",
            ColumnData::Str(
                ["a", "a", "a", "b", "b", "c"]
                    .into_iter()
                    .map(|x| Some(x.to_string()))
                    .collect(),
            ),
        ),
    ])
    .unwrap();
    let setup = TestSetup::new(TableHandle::new(frame), None);

    let req = DataExplorerBackendRequest::GetColumnProfiles(GetColumnProfilesParams {
        profiles: vec![
            ColumnProfileRequest {
                column_index: 0,
                profiles: vec![
                    ColumnProfileSpec {
                        profile_type: ColumnProfileType::NullCount,
                        params: None,
                    },
                    ColumnProfileSpec {
                        profile_type: ColumnProfileType::SummaryStats,
                        params: None,
                    },
                ],
            },
            ColumnProfileRequest {
                column_index: 1,
                profiles: vec![ColumnProfileSpec {
                    profile_type: ColumnProfileType::SmallFrequencyTable,
                    params: Some(ColumnProfileParams::SmallFrequencyTable(
                        ColumnFrequencyTableParams { limit: 2 },
                    )),
                }],
            },
        ],
        format_options: default_format_options(),
    });

    let profiles: Vec<ColumnProfileResult> = assert_match!(socket_rpc(setup.socket(), req),
        DataExplorerBackendReply::GetColumnProfilesReply(profiles) => {
            profiles
        }
    );
    assert_eq!(profiles.len(), 2);

    assert_eq!(profiles[0].null_count, Some(1));
    let stats = profiles[0]
        .summary_stats
        .as_ref()
        .and_then(|stats| stats.number_stats.as_ref())
        .unwrap();
    assert_eq!(stats.min_value.as_deref(), Some("1.00"));
    assert_eq!(stats.max_value.as_deref(), Some("5.00"));
    assert_eq!(stats.mean.as_deref(), Some("3.00"));
    assert_eq!(stats.median.as_deref(), Some("3.00"));

    let table = profiles[1].small_frequency_table.as_ref().unwrap();
    assert_eq!(table.values, formatted(&["a", "b"]));
    assert_eq!(table.counts, vec![3, 2]);
    assert_eq!(table.other_count, Some(1));
}

#[test]
fn test_export_follows_the_view() {
    let setup = TestSetup::new(TableHandle::new(sample_frame()), None);
    let socket = setup.socket();
    set_sort_columns(socket, vec![descending(0)]);

    let export = |kind, selection| {
        let req = DataExplorerBackendRequest::ExportDataSelection(ExportDataSelectionParams {
            selection: TableSelection { kind, selection },
            format: ExportFormat::Csv,
        });
        socket_rpc(socket, req)
    };

    let reply = export(
        TableSelectionKind::SingleCell,
        Selection::SingleCell(DataSelectionSingleCell {
            row_index: 0,
            column_index: 0,
        }),
    );
    assert_match!(reply, DataExplorerBackendReply::ExportDataSelectionReply(exported) => {
        assert_eq!(exported.data, "5");
        assert_eq!(exported.format, ExportFormat::Csv);
    });

    let reply = export(
        TableSelectionKind::RowRange,
        Selection::IndexRange(DataSelectionRange {
            first_index: 0,
            last_index: 1,
        }),
    );
    assert_match!(reply, DataExplorerBackendReply::ExportDataSelectionReply(exported) => {
        assert_eq!(exported.data, "x,y\n5,e\n4,d");
    });

    // Selections outside the view are request errors
    let req = DataExplorerBackendRequest::ExportDataSelection(ExportDataSelectionParams {
        selection: TableSelection {
            kind: TableSelectionKind::SingleCell,
            selection: Selection::SingleCell(DataSelectionSingleCell {
                row_index: 10,
                column_index: 0,
            }),
        },
        format: ExportFormat::Csv,
    });
    let message = socket_rpc_error(socket, req);
    assert!(message.contains("out of bounds"), "{message}");

    // And they leave the view alone
    assert_eq!(get_column(socket, 0), formatted(&["5", "4", "3", "2", "1"]));
}

#[test]
fn test_unsupported_export_format() {
    let setup = TestSetup::new(TableHandle::new(sample_batch()), None);

    let req = DataExplorerBackendRequest::ExportDataSelection(ExportDataSelectionParams {
        selection: TableSelection {
            kind: TableSelectionKind::RowRange,
            selection: Selection::IndexRange(DataSelectionRange {
                first_index: 0,
                last_index: 0,
            }),
        },
        format: ExportFormat::Html,
    });
    let message = socket_rpc_error(setup.socket(), req);
    assert!(message.contains("Unsupported feature"), "{message}");
}

#[test]
fn test_unsupported_values_open_empty() {
    let setup = TestSetup::new(TableHandle::new(vec![1, 2, 3]), None);

    assert_match!(socket_rpc(setup.socket(), DataExplorerBackendRequest::GetState),
        DataExplorerBackendReply::GetStateReply(state) => {
            assert_eq!(state.table_shape.num_rows, 0);
            assert_eq!(state.table_shape.num_columns, 0);
            assert_eq!(
                state.supported_features.set_row_filters.support_status,
                SupportStatus::Unsupported
            );
        }
    );
    assert!(get_schema(setup.socket(), vec![0]).is_empty());

    // The view can still be closed from the front end
    setup.socket().incoming_tx.send(CommMsg::Close).unwrap();
}

#[test]
fn test_variable_updates_reconcile_the_view() {
    let setup = TestSetup::new(TableHandle::new(sample_frame()), Some("df"));
    let socket = setup.socket();

    let x = get_schema(socket, vec![0]).remove(0);
    set_row_filters(socket, vec![compare_filter(x, FilterComparisonOp::Gt, "2")]);
    set_sort_columns(socket, vec![descending(0)]);

    // Same schema, new values
    let frame = Frame::new(vec![
        Column::new("x", ColumnData::Int((11..=15).map(Some).collect())),
        Column::new("y", ColumnData::Str(vec![None; 5])),
    ])
    .unwrap();
    setup.send(ExplorerEvent::VariableUpdated {
        path: path("df"),
        handle: TableHandle::new(frame),
    });
    assert_match!(socket.outgoing_rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        CommMsg::Data(value) => {
            assert_eq!(value, serde_json::json!({ "method": "data_update" }));
        }
    );
    assert_eq!(get_column(socket, 0), formatted(&["15", "14", "13", "12", "11"]));

    // Column `x` moves and `y` goes away
    let frame = Frame::new(vec![
        Column::new("w", ColumnData::Bool(vec![Some(true); 3])),
        Column::new("x", ColumnData::Int(vec![Some(1), Some(3), Some(2)])),
    ])
    .unwrap();
    setup.send(ExplorerEvent::VariableUpdated {
        path: path("df"),
        handle: TableHandle::new(frame),
    });
    assert_match!(socket.outgoing_rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        CommMsg::Data(value) => {
            assert_eq!(value, serde_json::json!({ "method": "schema_update" }));
        }
    );

    assert_match!(socket_rpc(socket, DataExplorerBackendRequest::GetState),
        DataExplorerBackendReply::GetStateReply(state) => {
            assert_eq!(state.row_filters[0].column_schema.column_index, 1);
            assert_eq!(state.row_filters[0].is_valid, Some(true));
            assert_eq!(state.sort_keys, vec![descending(1)]);
            assert_eq!(state.table_shape.num_rows, 1);
            assert_eq!(state.table_unfiltered_shape.num_rows, 3);
        }
    );
    assert_eq!(get_column(socket, 1), formatted(&["3"]));

    // Deleting the variable closes the view
    setup.send(ExplorerEvent::VariableDeleted { path: path("df") });
    assert_match!(
        socket.outgoing_rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        CommMsg::Close
    );
}

#[test]
fn test_deleted_columns_invalidate_filters() {
    let setup = TestSetup::new(TableHandle::new(sample_frame()), Some("df"));
    let socket = setup.socket();

    let schema = get_schema(socket, vec![0, 1]);
    set_row_filters(socket, vec![
        compare_filter(schema[0].clone(), FilterComparisonOp::Gt, "1"),
        RowFilter {
            filter_id: String::from("y-not-null"),
            filter_type: RowFilterType::NotNull,
            column_schema: schema[1].clone(),
            condition: RowFilterCondition::And,
            is_valid: None,
            error_message: None,
            params: None,
        },
    ]);
    set_sort_columns(socket, vec![descending(1), descending(0)]);

    let frame = Frame::new(vec![Column::new(
        "x",
        ColumnData::Int((1..=5).map(Some).collect()),
    )])
    .unwrap();
    setup.send(ExplorerEvent::VariableUpdated {
        path: path("df"),
        handle: TableHandle::new(frame),
    });
    assert_match!(
        socket.outgoing_rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        CommMsg::Data(_)
    );

    assert_match!(socket_rpc(socket, DataExplorerBackendRequest::GetState),
        DataExplorerBackendReply::GetStateReply(state) => {
            assert_eq!(state.row_filters[0].is_valid, Some(true));
            assert_eq!(state.row_filters[1].is_valid, Some(false));
            assert_eq!(
                state.row_filters[1].error_message.as_deref(),
                Some("Column 'y' was deleted")
            );
            assert_eq!(state.sort_keys, vec![descending(0)]);
            assert_eq!(state.table_shape.num_rows, 4);
        }
    );
}

#[test]
fn test_views_are_independent() {
    let (comm_manager_tx, comm_manager_rx) = unbounded::<CommManagerEvent>();
    let (events_tx, thread) =
        DataExplorerService::start(&ExplorerConfig::default(), comm_manager_tx);

    let first = open(
        &events_tx,
        &comm_manager_rx,
        TableHandle::new(sample_frame()),
        Some("df"),
    );
    let second = open(
        &events_tx,
        &comm_manager_rx,
        TableHandle::new(sample_frame()),
        Some("df"),
    );

    set_sort_columns(&first, vec![descending(0)]);
    assert_eq!(get_column(&first, 0), formatted(&["5", "4", "3", "2", "1"]));
    assert_eq!(get_column(&second, 0), formatted(&["1", "2", "3", "4", "5"]));

    // Both views follow the variable
    events_tx
        .send(ExplorerEvent::VariableUpdated {
            path: path("df"),
            handle: TableHandle::new(sample_batch()),
        })
        .unwrap();
    for socket in [&first, &second] {
        assert_match!(
            socket.outgoing_rx.recv_timeout(RECV_TIMEOUT).unwrap(),
            CommMsg::Data(_)
        );
        assert_eq!(num_rows(socket), 5);
    }

    events_tx.send(ExplorerEvent::Shutdown).unwrap();
    thread.join().unwrap();
    for socket in [&first, &second] {
        assert_match!(
            socket.outgoing_rx.recv_timeout(RECV_TIMEOUT).unwrap(),
            CommMsg::Close
        );
    }
    drop(comm_manager_rx);
}
