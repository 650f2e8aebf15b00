/*
 * comm_channel.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde_json::Value;
use strum_macros::EnumString;

#[derive(EnumString, PartialEq, Debug)]
#[strum(serialize_all = "camelCase")]
pub enum Comm {
    /// A data explorer view over a tabular value.
    #[strum(serialize = "positron.dataExplorer")]
    DataExplorer,

    /// Some other comm with a custom name.
    #[strum(default)]
    Other(String),
}

#[derive(Clone, Debug)]
pub enum CommMsg {
    /// A message that is part of a Remote Procedure Call (RPC). The first value
    /// is the unique ID of the RPC invocation, and the second value is the
    /// data associated with the RPC (the request or response).
    Rpc(String, Value),

    /// A message representing any other data sent on the comm channel; usually
    /// used for events.
    Data(Value),

    // A message indicating that the comm channel should be closed.
    Close,
}
