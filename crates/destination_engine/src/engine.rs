use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use destination_core::{CloudSearchResult, FetchFailure, Msg, Request};
use futures_util::StreamExt;
use store_logging::{store_debug, store_error, store_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::collaborators::{CloudDirectory, Collaborators};

enum EngineCommand {
    Execute(Request),
    AttachCloud(Arc<dyn CloudDirectory>),
}

/// Executes store requests on a background tokio runtime and hands the
/// results back as [`Msg`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<Msg>,
}

impl EngineHandle {
    pub fn new(collaborators: Collaborators) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    store_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let mut worker = Worker {
                collaborators,
                cloud: None,
                timer: None,
                event_tx,
            };
            while let Ok(command) = cmd_rx.recv() {
                worker.handle(&runtime, command);
            }
            worker.cancel_timer();
        });

        Self { cmd_tx, event_rx }
    }

    pub fn execute(&self, request: Request) {
        let _ = self.cmd_tx.send(EngineCommand::Execute(request));
    }

    pub fn attach_cloud(&self, directory: Arc<dyn CloudDirectory>) {
        let _ = self.cmd_tx.send(EngineCommand::AttachCloud(directory));
    }

    pub fn try_recv(&self) -> Option<Msg> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Msg> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct Worker {
    collaborators: Collaborators,
    cloud: Option<Arc<dyn CloudDirectory>>,
    timer: Option<CancellationToken>,
    event_tx: mpsc::Sender<Msg>,
}

impl Worker {
    fn handle(&mut self, runtime: &Runtime, command: EngineCommand) {
        match command {
            EngineCommand::AttachCloud(directory) => self.cloud = Some(directory),
            EngineCommand::Execute(request) => self.execute(runtime, request),
        }
    }

    fn execute(&mut self, runtime: &Runtime, request: Request) {
        let event_tx = self.event_tx.clone();
        match request {
            Request::StartSearch(printer_type) => {
                let discovery = self.collaborators.discovery.clone();
                runtime.spawn(async move {
                    match discovery.start_search(printer_type).await {
                        Ok(printers) => {
                            if !printers.is_empty() {
                                let _ = event_tx.send(Msg::PrintersAdded {
                                    printer_type,
                                    printers,
                                });
                            }
                            let _ = event_tx.send(Msg::SearchDone(printer_type));
                        }
                        Err(err) => {
                            store_warn!("{} discovery failed: {}", printer_type, err);
                            let _ = event_tx.send(Msg::SearchFailed(printer_type));
                        }
                    }
                });
            }
            Request::FetchCapabilities { id, origin } => {
                let provider = self.collaborators.capabilities.clone();
                runtime.spawn(async move {
                    let result = provider
                        .fetch_capabilities(&id, origin)
                        .await
                        .map_err(FetchFailure::from);
                    let _ = event_tx.send(Msg::CapabilitiesFetched { id, origin, result });
                });
            }
            Request::FetchCloudPrinter {
                id,
                origin,
                account,
            } => {
                let Some(cloud) = self.cloud.clone() else {
                    let _ = event_tx.send(Msg::CloudPrinterFailed {
                        id,
                        origin,
                        failure: FetchFailure::new("no cloud directory attached"),
                    });
                    return;
                };
                runtime.spawn(async move {
                    let msg = match cloud.fetch_printer(&id, origin, &account).await {
                        Ok(printer) => Msg::CloudPrinterDone(printer),
                        Err(err) => Msg::CloudPrinterFailed {
                            id,
                            origin,
                            failure: err.into(),
                        },
                    };
                    let _ = event_tx.send(msg);
                });
            }
            Request::SearchCloud { account, origin } => {
                let Some(cloud) = self.cloud.clone() else {
                    store_debug!("Cloud search requested without a cloud directory");
                    return;
                };
                runtime.spawn(async move {
                    let mut batches = cloud.search(&account, origin);
                    while let Some(batch) = batches.next().await {
                        let msg = Msg::CloudSearchDone(CloudSearchResult {
                            user: account.clone(),
                            origin: batch.origin,
                            printers: batch.printers,
                            search_done: batch.done,
                        });
                        if event_tx.send(msg).is_err() {
                            break;
                        }
                    }
                });
            }
            Request::GrantProvisionalAccess { id } => {
                let resolver = self.collaborators.provisional.clone();
                runtime.spawn(async move {
                    let result = resolver.grant_access(&id).await.map_err(FetchFailure::from);
                    let _ = event_tx.send(Msg::ProvisionalResolved {
                        provisional_id: id,
                        result,
                    });
                });
            }
            Request::ArmAutoSelectTimeout { generation, after } => {
                self.cancel_timer();
                let token = CancellationToken::new();
                self.timer = Some(token.clone());
                runtime.spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {
                            store_debug!("Auto-select timer {} cancelled", generation);
                        }
                        _ = tokio::time::sleep(after) => {
                            let _ = event_tx.send(Msg::AutoSelectTimeoutFired { generation });
                        }
                    }
                });
            }
            Request::CancelAutoSelectTimeout => self.cancel_timer(),
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
    }
}

