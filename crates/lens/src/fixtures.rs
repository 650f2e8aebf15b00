//
// fixtures.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

//! Sample tables and comm helpers shared by unit and integration tests.

use std::sync::Arc;

use arrow::array::Float64Array;
use arrow::array::Int32Array;
use arrow::array::StringArray;
use arrow::datatypes::DataType;
use arrow::datatypes::Field;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use relay::comm::comm_channel::CommMsg;
use relay::socket::comm::CommSocket;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::frame::Column;
use crate::frame::ColumnData;
use crate::frame::Frame;

/// Two columns and five labelled rows: `x` holds the integers 1 to 5 and
/// `y` holds short strings with one missing value.
pub fn sample_frame() -> Frame {
    let y = vec![Some("a"), Some("b"), None, Some("d"), Some("e")];

    Frame::new(vec![
        Column::new("x", ColumnData::Int((1..=5).map(Some).collect())),
        Column::new(
            "y",
            ColumnData::Str(y.into_iter().map(|x| x.map(String::from)).collect()),
        ),
    ])
    .unwrap()
    .with_row_labels((1..=5).map(|i| format!("r{i}")).collect())
    .unwrap()
}

/// Five rows over three Arrow columns. `y` has an empty string and a null,
/// `z` has a NaN and a null.
pub fn sample_batch() -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("x", DataType::Int32, true),
        Field::new("y", DataType::Utf8, true),
        Field::new("z", DataType::Float64, true),
    ]);

    RecordBatch::try_new(Arc::new(schema), vec![
        Arc::new(Int32Array::from(vec![1, 2, 3, 4, 5])),
        Arc::new(StringArray::from(vec![
            Some("a"),
            Some(""),
            None,
            Some("d"),
            Some("e"),
        ])),
        Arc::new(Float64Array::from(vec![
            Some(1.5),
            Some(f64::NAN),
            None,
            Some(4.0),
            Some(-2.0),
        ])),
    ])
    .unwrap()
}

/// Sends a request over the socket as the front end would and waits for
/// the reply.
pub fn socket_rpc_request<RequestType, ReplyType>(
    socket: &CommSocket,
    req: RequestType,
) -> ReplyType
where
    RequestType: Serialize,
    ReplyType: DeserializeOwned,
{
    let id = uuid::Uuid::new_v4().to_string();

    let json = serde_json::to_value(req).unwrap();
    log::trace!("--> {json:?}");

    socket.incoming_tx.send(CommMsg::Rpc(id.clone(), json)).unwrap();
    let msg = socket
        .outgoing_rx
        .recv_timeout(std::time::Duration::from_secs(10))
        .unwrap();

    match msg {
        CommMsg::Rpc(reply_id, value) => {
            assert_eq!(reply_id, id);
            log::trace!("<-- {value:?}");
            serde_json::from_value(value).unwrap()
        },
        other => panic!("Unexpected comm message: {other:?}"),
    }
}
