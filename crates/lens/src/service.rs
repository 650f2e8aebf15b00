//
// service.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use crossbeam::channel::unbounded;
use crossbeam::channel::Receiver;
use crossbeam::channel::Select;
use crossbeam::channel::Sender;
use relay::comm::comm_channel::CommMsg;
use relay::comm::event::CommManagerEvent;
use relay::socket::comm::CommInitiator;
use relay::socket::comm::CommSocket;
use serde::Deserialize;
use serde::Serialize;
use stdext::local;
use stdext::result::ResultOrLog;
use stdext::spawn;
use stdext::unwrap;

use crate::config::ExplorerConfig;
use crate::handle::TableHandle;
use crate::registry::VariablePath;
use crate::registry::ViewRegistry;

/// Notifications from the host that drive the service.
pub enum ExplorerEvent {
    /// Open a new view of `handle`. When `binding` is set, the view follows
    /// updates to that variable and closes when it is deleted.
    Open {
        title: String,
        handle: TableHandle,
        binding: Option<VariablePath>,
    },

    /// The variable at `path` now holds `handle`.
    VariableUpdated {
        path: VariablePath,
        handle: TableHandle,
    },

    /// The variable at `path` was removed from the namespace.
    VariableDeleted { path: VariablePath },

    /// Close every view and stop the service.
    Shutdown,
}

impl std::fmt::Debug for ExplorerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorerEvent::Open { title, .. } => write!(f, "Open({title})"),
            ExplorerEvent::VariableUpdated { path, .. } => write!(f, "VariableUpdated({path})"),
            ExplorerEvent::VariableDeleted { path } => write!(f, "VariableDeleted({path})"),
            ExplorerEvent::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Sent along with the comm open so the front end can title the view.
#[derive(Deserialize, Serialize)]
struct Metadata {
    title: String,
}

/// Owns every open view and serializes all work on them: host events and
/// front end requests are handled one at a time, on one thread.
pub struct DataExplorerService {
    registry: ViewRegistry,

    /// One socket per open view. A socket's `comm_id` is its view id.
    comms: Vec<CommSocket>,

    events_rx: Receiver<ExplorerEvent>,

    /// Announces newly opened views.
    comm_manager_tx: Sender<CommManagerEvent>,

    comm_name: String,
}

impl DataExplorerService {
    pub fn new(
        config: &ExplorerConfig,
        events_rx: Receiver<ExplorerEvent>,
        comm_manager_tx: Sender<CommManagerEvent>,
    ) -> Self {
        Self {
            registry: ViewRegistry::new(config.reconcile_column_threshold),
            comms: Vec::new(),
            events_rx,
            comm_manager_tx,
            comm_name: config.comm_name.clone(),
        }
    }

    /// Starts the service on its own thread. Returns the channel the host
    /// sends events on, and the thread's handle. The thread exits after
    /// `ExplorerEvent::Shutdown` or once every event sender is dropped.
    pub fn start(
        config: &ExplorerConfig,
        comm_manager_tx: Sender<CommManagerEvent>,
    ) -> (Sender<ExplorerEvent>, std::thread::JoinHandle<()>) {
        let (events_tx, events_rx) = unbounded::<ExplorerEvent>();
        let mut service = Self::new(config, events_rx, comm_manager_tx);

        let handle = spawn!("lens-data-explorer", move || {
            while service.execution_thread() {}
            service.close_all();
            log::info!("Data explorer service stopped");
        });

        (events_tx, handle)
    }

    /// Waits for and handles one message, either a host event or a message
    /// from one of the open views. Returns `false` when the service should
    /// stop.
    pub fn execution_thread(&mut self) -> bool {
        let mut sel = Select::new();

        for comm in self.comms.iter() {
            sel.recv(&comm.incoming_rx);
        }
        sel.recv(&self.events_rx);

        let oper = sel.select();
        let index = oper.index();

        if index >= self.comms.len() {
            let event = unwrap!(oper.recv(&self.events_rx), Err(_err) => {
                log::info!("Data explorer event channel disconnected");
                return false;
            });
            return self.handle_event(event);
        }

        let received = oper.recv(&self.comms[index].incoming_rx);
        let comm = self.comms[index].clone();
        let msg = unwrap!(received, Err(err) => {
            log::warn!("Comm {} disconnected: {err:?}", comm.comm_id);
            self.drop_view(&comm.comm_id);
            return true;
        });

        self.handle_comm_message(comm, msg);
        true
    }

    fn handle_event(&mut self, event: ExplorerEvent) -> bool {
        log::trace!("Data explorer event: {event:?}");

        match event {
            ExplorerEvent::Open {
                title,
                handle,
                binding,
            } => {
                self.open(title, handle, binding);
            },

            ExplorerEvent::VariableUpdated { path, handle } => {
                for (id, event) in self.registry.variable_updated(&path, &handle) {
                    let Some(comm) = self.comm(&id) else {
                        continue;
                    };
                    let json = unwrap!(serde_json::to_value(&event), Err(err) => {
                        log::error!("Can't serialize data explorer event {event:?}: {err}");
                        continue;
                    });
                    comm.outgoing_tx
                        .send(CommMsg::Data(json))
                        .or_log_error("Failed to send data explorer event");
                }
            },

            ExplorerEvent::VariableDeleted { path } => {
                for id in self.registry.variable_deleted(&path) {
                    log::info!("Variable '{path}' was deleted; closing view {id}");
                    if let Some(comm) = self.remove_comm(&id) {
                        comm.outgoing_tx
                            .send(CommMsg::Close)
                            .or_log_error("Failed to send comm close");
                    }
                }
            },

            ExplorerEvent::Shutdown => return false,
        }

        true
    }

    fn open(&mut self, title: String, handle: TableHandle, binding: Option<VariablePath>) {
        let id = self.registry.open(title.clone(), handle, binding);
        let comm = CommSocket::new(CommInitiator::BackEnd, id.clone(), self.comm_name.clone());

        let announce: anyhow::Result<()> = local! {
            let metadata = serde_json::to_value(Metadata { title: title.clone() })?;
            let event = CommManagerEvent::Opened(comm.clone(), metadata);
            self.comm_manager_tx.send(event)?;
            Ok(())
        };

        if let Err(err) = announce {
            log::error!("Can't open data explorer for '{title}': {err}");
            self.registry.close(&id).or_log_warning("Failed to close view");
            return;
        }

        self.comms.push(comm);
    }

    fn handle_comm_message(&mut self, comm: CommSocket, msg: CommMsg) {
        log::trace!("Data explorer {}: received {msg:?}", comm.comm_id);

        match msg {
            CommMsg::Close => {
                // Closed by the front end, so there's no close to echo back
                self.drop_view(&comm.comm_id);
            },

            CommMsg::Rpc(..) => {
                let view = unwrap!(self.registry.get_mut(&comm.comm_id), Err(err) => {
                    log::warn!("Dropping request for closed view: {err}");
                    return;
                });
                comm.handle_request(msg, |req| view.handle_rpc(req));
            },

            CommMsg::Data(_) => {
                log::trace!("Ignoring data message on data explorer comm {}", comm.comm_id);
            },
        }
    }

    fn drop_view(&mut self, id: &str) {
        self.registry.close(id).or_log_warning("Failed to close view");
        self.remove_comm(id);
    }

    fn comm(&self, id: &str) -> Option<&CommSocket> {
        self.comms.iter().find(|comm| comm.comm_id == id)
    }

    fn remove_comm(&mut self, id: &str) -> Option<CommSocket> {
        let index = self.comms.iter().position(|comm| comm.comm_id == id)?;
        Some(self.comms.remove(index))
    }

    /// Closes every remaining view, letting each front end know.
    fn close_all(&mut self) {
        for comm in self.comms.drain(..) {
            self.registry
                .close(&comm.comm_id)
                .or_log_warning("Failed to close view");
            comm.outgoing_tx
                .send(CommMsg::Close)
                .or_log_error("Failed to send comm close");
        }
    }

    pub fn num_views(&self) -> usize {
        self.registry.len()
    }
}
