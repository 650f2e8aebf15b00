//
// bridge.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

//! A line-delimited JSON front end for the data explorer service.
//!
//! Each input line is one `Command`. Everything the views send back,
//! including the announcement of newly opened views, is written as one
//! `Output` per line.

use std::io::Write;
use std::str::FromStr;

use crossbeam::channel::unbounded;
use crossbeam::channel::Receiver;
use crossbeam::channel::Select;
use crossbeam::channel::Sender;
use relay::comm::comm_channel::Comm;
use relay::comm::comm_channel::CommMsg;
use relay::comm::data_explorer_comm::FormatOptions;
use relay::comm::event::CommManagerEvent;
use relay::socket::comm::CommSocket;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use stdext::result::ResultOrLog;
use stdext::spawn;
use stdext::unwrap;

use crate::config::ExplorerConfig;
use crate::frame::Frame;
use crate::handle::TableHandle;
use crate::registry::VariablePath;
use crate::service::DataExplorerService;
use crate::service::ExplorerEvent;

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Open a view of a frame given as `{"columns": {...}, "row_labels": [...]}`.
    Open {
        title: String,
        table: Value,
        #[serde(default)]
        binding: Option<Vec<String>>,
    },
    Update {
        path: Vec<String>,
        table: Value,
    },
    Delete {
        path: Vec<String>,
    },
    Rpc {
        comm_id: String,
        id: String,
        request: Value,
    },
    Close {
        comm_id: String,
    },
    Shutdown,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    CommOpen {
        comm_id: String,
        comm_name: String,
        data: Value,
    },
    RpcReply {
        comm_id: String,
        id: String,
        result: Value,
    },
    Data {
        comm_id: String,
        data: Value,
    },
    CommClose {
        comm_id: String,
    },
}

/// Runs the service until the input ends or a `shutdown` command is read.
/// Views still open at that point are closed, and their closes written out,
/// before this returns.
pub fn run<I, W>(config: &ExplorerConfig, input: I, output: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = std::io::Result<String>>,
    W: Write + Send + 'static,
{
    let (comm_manager_tx, comm_manager_rx) = unbounded::<CommManagerEvent>();
    let (events_tx, service) = DataExplorerService::start(config, comm_manager_tx.clone());

    let writer = spawn!("lens-output", move || {
        let mut router = OutputRouter::new(comm_manager_rx, output);
        while router.execution_thread() {}
        router.flush_closed_comms();
    });

    let dispatcher = Dispatcher {
        events_tx: events_tx.clone(),
        comm_manager_tx,
        default_format_options: config.default_format_options.clone(),
    };

    for line in input {
        let line = unwrap!(line, Err(err) => {
            log::error!("Can't read input: {err}");
            break;
        });
        if line.trim().is_empty() {
            continue;
        }

        let command = unwrap!(serde_json::from_str::<Command>(&line), Err(err) => {
            log::error!("Ignoring malformed command: {err} ({line})");
            continue;
        });

        if let Command::Shutdown = command {
            break;
        }

        if let Err(err) = dispatcher.dispatch(command) {
            log::error!("Can't process command: {err}");
        }
    }

    events_tx
        .send(ExplorerEvent::Shutdown)
        .or_log_warning("Data explorer service already stopped");

    service
        .join()
        .map_err(|_| anyhow::anyhow!("Data explorer service panicked"))?;

    // Closes the last sender, so the router stops once it is done
    drop(dispatcher);

    writer
        .join()
        .map_err(|_| anyhow::anyhow!("Output thread panicked"))?;

    Ok(())
}

struct Dispatcher {
    events_tx: Sender<ExplorerEvent>,
    comm_manager_tx: Sender<CommManagerEvent>,
    default_format_options: FormatOptions,
}

impl Dispatcher {
    fn dispatch(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Open {
                title,
                table,
                binding,
            } => {
                let handle = TableHandle::new(Frame::from_json(&table)?);
                let binding = binding.map(VariablePath::new).transpose()?;
                self.events_tx.send(ExplorerEvent::Open {
                    title,
                    handle,
                    binding,
                })?;
            },

            Command::Update { path, table } => {
                let handle = TableHandle::new(Frame::from_json(&table)?);
                let path = VariablePath::new(path)?;
                self.events_tx
                    .send(ExplorerEvent::VariableUpdated { path, handle })?;
            },

            Command::Delete { path } => {
                let path = VariablePath::new(path)?;
                self.events_tx.send(ExplorerEvent::VariableDeleted { path })?;
            },

            Command::Rpc {
                comm_id,
                id,
                request,
            } => {
                let request = with_format_options(request, &self.default_format_options);
                let msg = CommMsg::Rpc(id, request);
                self.comm_manager_tx
                    .send(CommManagerEvent::Message(comm_id, msg))?;
            },

            Command::Close { comm_id } => {
                self.comm_manager_tx
                    .send(CommManagerEvent::Closed(comm_id))?;
            },

            Command::Shutdown => {},
        }

        Ok(())
    }
}

/// Fills in `format_options` for the requests that need them, when the
/// caller left them out.
fn with_format_options(mut request: Value, defaults: &FormatOptions) -> Value {
    let method = request.get("method").and_then(Value::as_str);
    if !matches!(
        method,
        Some("get_data_values" | "get_row_labels" | "get_column_profiles")
    ) {
        return request;
    }

    let Some(params) = request.get_mut("params").and_then(Value::as_object_mut) else {
        return request;
    };
    if !params.contains_key("format_options") {
        match serde_json::to_value(defaults) {
            Ok(options) => {
                params.insert(String::from("format_options"), options);
            },
            Err(err) => log::error!("Can't serialize default format options: {err}"),
        }
    }

    request
}

/// Routes messages between the bridge and the open comms: front end
/// messages go to the comm they name, and whatever a comm sends is written
/// out.
struct OutputRouter<W: Write> {
    comms: Vec<CommSocket>,
    comm_manager_rx: Receiver<CommManagerEvent>,
    output: W,
}

impl<W: Write> OutputRouter<W> {
    fn new(comm_manager_rx: Receiver<CommManagerEvent>, output: W) -> Self {
        Self {
            comms: Vec::new(),
            comm_manager_rx,
            output,
        }
    }

    /// Handles one message. Returns `false` once every sender of comm
    /// manager events is gone.
    fn execution_thread(&mut self) -> bool {
        let mut sel = Select::new();

        for comm in &self.comms {
            sel.recv(&comm.outgoing_rx);
        }
        sel.recv(&self.comm_manager_rx);

        let oper = sel.select();
        let index = oper.index();

        if index >= self.comms.len() {
            let event = unwrap!(oper.recv(&self.comm_manager_rx), Err(_err) => {
                return false;
            });
            self.handle_event(event);
            return true;
        }

        let received = oper.recv(&self.comms[index].outgoing_rx);
        let msg = unwrap!(received, Err(err) => {
            log::warn!("Error receiving comm message: {err}");
            self.comms.remove(index);
            return true;
        });

        let comm_id = self.comms[index].comm_id.clone();
        if let CommMsg::Close = msg {
            self.comms.remove(index);
        }
        self.write(&comm_id, msg);
        true
    }

    fn handle_event(&mut self, event: CommManagerEvent) {
        match event {
            CommManagerEvent::Opened(comm, data) => {
                if let Ok(Comm::Other(name)) = Comm::from_str(&comm.comm_name) {
                    log::warn!("Opening comm {} with unrecognized name '{name}'", comm.comm_id);
                }
                self.write_output(Output::CommOpen {
                    comm_id: comm.comm_id.clone(),
                    comm_name: comm.comm_name.clone(),
                    data,
                });
                self.comms.push(comm);
                log::info!("Comm opened; there are now {} open comms", self.comms.len());
            },

            CommManagerEvent::Message(comm_id, msg) => match self.position(&comm_id) {
                Some(index) => {
                    self.comms[index]
                        .incoming_tx
                        .send(msg)
                        .or_log_error("Failed to send message to comm");
                },
                None => log::warn!("Received message for unknown comm {comm_id}: {msg:?}"),
            },

            CommManagerEvent::Closed(comm_id) => match self.position(&comm_id) {
                Some(index) => {
                    let comm = self.comms.remove(index);
                    comm.incoming_tx
                        .send(CommMsg::Close)
                        .or_log_error("Failed to send close to comm");
                    log::info!("Comm closed; there are now {} open comms", self.comms.len());
                },
                None => log::warn!("Received close for unknown comm {comm_id}"),
            },
        }
    }

    /// Writes out whatever the comms sent before the service stopped,
    /// including their final closes.
    fn flush_closed_comms(&mut self) {
        let comms = std::mem::take(&mut self.comms);
        for comm in comms {
            while let Ok(msg) = comm.outgoing_rx.try_recv() {
                self.write(&comm.comm_id, msg);
            }
        }
    }

    fn position(&self, comm_id: &str) -> Option<usize> {
        self.comms.iter().position(|comm| comm.comm_id == comm_id)
    }

    fn write(&mut self, comm_id: &str, msg: CommMsg) {
        let comm_id = comm_id.to_string();
        let output = match msg {
            CommMsg::Rpc(id, result) => Output::RpcReply {
                comm_id,
                id,
                result,
            },
            CommMsg::Data(data) => Output::Data { comm_id, data },
            CommMsg::Close => Output::CommClose { comm_id },
        };
        self.write_output(output);
    }

    fn write_output(&mut self, output: Output) {
        let line = unwrap!(serde_json::to_string(&output), Err(err) => {
            log::error!("Can't serialize output {output:?}: {err}");
            return;
        });
        let written = self
            .output
            .write_all(format!("{line}\n").as_bytes())
            .and_then(|_| self.output.flush());
        written.or_log_error("Failed to write output");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    static RECV_TIMEOUT: Duration = Duration::from_secs(10);

    /// Sends every write as one line.
    struct ChannelWriter(Sender<String>);

    impl Write for ChannelWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let line = String::from_utf8_lossy(buf).trim_end().to_string();
            self.0
                .send(line)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::BrokenPipe, err))?;
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Session {
        input_tx: Sender<std::io::Result<String>>,
        output_rx: Receiver<String>,
        thread: std::thread::JoinHandle<anyhow::Result<()>>,
    }

    impl Session {
        fn start() -> Self {
            let (input_tx, input_rx) = unbounded::<std::io::Result<String>>();
            let (output_tx, output_rx) = unbounded::<String>();
            let thread = std::thread::spawn(move || {
                run(
                    &ExplorerConfig::default(),
                    input_rx.into_iter(),
                    ChannelWriter(output_tx),
                )
            });
            Self {
                input_tx,
                output_rx,
                thread,
            }
        }

        fn send(&self, command: Value) {
            self.input_tx.send(Ok(command.to_string())).unwrap();
        }

        fn recv(&self) -> Output {
            let line = self.output_rx.recv_timeout(RECV_TIMEOUT).unwrap();
            serde_json::from_str(&line).unwrap()
        }

        fn open(&self, binding: Option<Vec<&str>>) -> String {
            self.send(json!({
                "type": "open",
                "title": "df",
                "table": { "columns": { "x": [3, 1, 2] } },
                "binding": binding,
            }));
            match self.recv() {
                Output::CommOpen {
                    comm_id,
                    comm_name,
                    data,
                } => {
                    assert_eq!(comm_name, "positron.dataExplorer");
                    assert_eq!(data, json!({ "title": "df" }));
                    comm_id
                },
                other => panic!("Unexpected output: {other:?}"),
            }
        }
    }

    #[test]
    fn test_format_options_are_filled_in() {
        let defaults = crate::config::default_format_options();

        let request = json!({
            "method": "get_data_values",
            "params": { "columns": [] }
        });
        let request = with_format_options(request, &defaults);
        assert_eq!(request["params"]["format_options"]["large_num_digits"], json!(2));

        // Caller's options win
        let request = json!({
            "method": "get_row_labels",
            "params": { "format_options": { "large_num_digits": 9 } }
        });
        let request = with_format_options(request, &defaults);
        assert_eq!(request["params"]["format_options"], json!({ "large_num_digits": 9 }));

        let request = json!({ "method": "get_state" });
        assert_eq!(with_format_options(request.clone(), &defaults), request);
    }

    #[test]
    fn test_session() {
        let session = Session::start();
        let comm_id = session.open(Some(vec!["df"]));

        session.send(json!({
            "type": "rpc",
            "comm_id": comm_id,
            "id": "1",
            "request": {
                "method": "set_sort_columns",
                "params": { "sort_keys": [{ "column_index": 0, "ascending": true }] }
            }
        }));
        assert_matches!(session.recv(), Output::RpcReply { id, result, .. } => {
            assert_eq!(id, "1");
            assert_eq!(result["method"], json!("SetSortColumnsReply"));
        });

        session.send(json!({
            "type": "rpc",
            "comm_id": comm_id,
            "id": "2",
            "request": {
                "method": "get_data_values",
                "params": {
                    "columns": [{
                        "column_index": 0,
                        "spec": { "first_index": 0, "last_index": 2 }
                    }]
                }
            }
        }));
        assert_matches!(session.recv(), Output::RpcReply { id, result, .. } => {
            assert_eq!(id, "2");
            assert_eq!(result["result"], json!({ "columns": [["1", "2", "3"]] }));
        });

        session.send(json!({
            "type": "update",
            "path": ["df"],
            "table": { "columns": { "x": [3, 1, 2], "y": ["a", "b", "c"] } }
        }));
        assert_eq!(session.recv(), Output::Data {
            comm_id: comm_id.clone(),
            data: json!({ "method": "schema_update" }),
        });

        session.send(json!({ "type": "delete", "path": ["df"] }));
        assert_eq!(session.recv(), Output::CommClose {
            comm_id: comm_id.clone(),
        });

        session.send(json!({ "type": "shutdown" }));
        session.thread.join().unwrap().unwrap();
    }

    #[test]
    fn test_open_views_are_closed_at_the_end_of_input() {
        let session = Session::start();
        let comm_id = session.open(None);

        // Malformed lines are skipped
        session.input_tx.send(Ok(String::from("{ nope"))).unwrap();
        session.input_tx.send(Ok(String::new())).unwrap();

        drop(session.input_tx);
        assert_eq!(
            serde_json::from_str::<Output>(&session.output_rx.recv_timeout(RECV_TIMEOUT).unwrap())
                .unwrap(),
            Output::CommClose { comm_id }
        );
        session.thread.join().unwrap().unwrap();
    }

    #[test]
    fn test_front_end_close() {
        let session = Session::start();
        let comm_id = session.open(None);
        let other_id = session.open(None);

        session.send(json!({ "type": "close", "comm_id": comm_id }));

        // Requests to the closed view go nowhere; the other view still answers
        session.send(json!({
            "type": "rpc",
            "comm_id": other_id,
            "id": "1",
            "request": { "method": "get_state" }
        }));
        assert_matches!(session.recv(), Output::RpcReply { comm_id, result, .. } => {
            assert_eq!(comm_id, other_id);
            assert_eq!(result["result"]["display_name"], json!("df"));
        });

        session.send(json!({ "type": "shutdown" }));
        assert_eq!(session.recv(), Output::CommClose { comm_id: other_id });
        session.thread.join().unwrap().unwrap();
        assert!(session.output_rx.try_recv().is_err());
    }
}
