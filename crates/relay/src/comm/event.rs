/*
 * event.rs
 *
 * Copyright (C) 2023 Posit Software, PBC. All rights reserved.
 *
 */

use serde_json::Value;

use crate::comm::comm_channel::CommMsg;
use crate::socket::comm::CommSocket;

/**
 * Enumeration of events that can be received by the comm manager.
 */
pub enum CommManagerEvent {
    /// A new Comm was opened
    Opened(CommSocket, Value),

    /// A message was received on a Comm; the first value is the comm ID, and the
    /// second value is the message.
    Message(String, CommMsg),

    /// A Comm was closed
    Closed(String),
}

impl std::fmt::Debug for CommManagerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommManagerEvent::Opened(comm, value) => {
                write!(f, "Opened({}, {})", comm.comm_id, value)
            },
            CommManagerEvent::Message(id, msg) => write!(f, "Message({id}, {msg:?})"),
            CommManagerEvent::Closed(id) => write!(f, "Closed({id})"),
        }
    }
}
