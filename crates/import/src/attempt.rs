//! One activation: dispatches transport events through the lifecycle and
//! delivers the completion exactly once.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use distro_config::{ConfigStore, ImportConfig};
use distro_protocol::EventKind;

use crate::handshake::{AuthHandshake, Phase};
use crate::listeners::ListenerRegistry;
use crate::status::StatusTracker;
use crate::sync::{ConfigSync, SyncMode};
use crate::transport::{TransportEvent, TransportHandle};
use crate::types::{Completion, CompletionFn, Disconnect, DisconnectReason, ImportStatus};

/// Whether the driver should keep reading events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Done,
}

/// Runtime state of a single activation. Never reused.
pub(crate) struct Attempt {
    id: Uuid,
    phase: Phase,
    status: StatusTracker,
    listeners: ListenerRegistry,
    sync: ConfigSync,
    handshake: AuthHandshake,
    handle: TransportHandle,
    /// Server URL as printed in log lines.
    label: String,
    on_complete: Option<CompletionFn>,
}

impl Attempt {
    /// Builds the attempt with every listener bound.
    pub(crate) fn new(
        config: &ImportConfig,
        store: Arc<dyn ConfigStore>,
        handle: TransportHandle,
        label: String,
        on_complete: CompletionFn,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: Phase::Idle,
            status: StatusTracker::new(),
            listeners: ListenerRegistry::for_attempt(config.listen),
            sync: ConfigSync::new(store, SyncMode::from_listen(config.listen)),
            handshake: AuthHandshake::new(config.auth_token.clone()),
            handle,
            label,
            on_complete: Some(on_complete),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Consumes transport events until the attempt completes.
    ///
    /// A stream that ends without a disconnect is treated as one, so the
    /// completion always fires.
    pub(crate) async fn drive(mut self, mut events: mpsc::Receiver<TransportEvent>) {
        loop {
            let event = match events.recv().await {
                Some(event) => event,
                None => {
                    debug!(attempt = %self.id, "event stream ended without disconnect");
                    TransportEvent::Disconnect {
                        reason: DisconnectReason::TransportDropped,
                    }
                }
            };
            if self.handle_event(event) == Flow::Done {
                break;
            }
        }
        // Dropping the receiver here detaches the transport from this attempt.
        trace!(attempt = %self.id, "attempt finished");
    }

    pub(crate) fn handle_event(&mut self, event: TransportEvent) -> Flow {
        let kind = event.kind();
        if !self.listeners.is_bound(kind) {
            trace!(attempt = %self.id, event = %kind, "no listener bound, dropping");
            return Flow::Continue;
        }

        self.phase = match self.phase.on_event(kind) {
            Ok(next) => next,
            Err(e) => {
                warn!(attempt = %self.id, "{e}");
                return Flow::Continue;
            }
        };

        match event {
            TransportEvent::Connect => {
                self.handshake.on_connect(&self.handle, &self.label);
                Flow::Continue
            }
            TransportEvent::Accept => {
                info!(attempt = %self.id, "import: connected to {}", self.label);
                Flow::Continue
            }
            TransportEvent::Reject => {
                info!(attempt = %self.id, "import: token rejected");
                self.handle.close();
                self.finish(ImportStatus::Reject)
            }
            TransportEvent::ConnectError { description } => {
                info!(attempt = %self.id, "import: {}: {description}", self.label);
                self.handle.close();
                self.finish(ImportStatus::ConnectError { description })
            }
            TransportEvent::Config(snapshot) => {
                let keys = self.sync.apply_snapshot(&self.handle, &snapshot);
                self.status.record(ImportStatus::Received);
                if self.sync.mode() == SyncMode::OneShot {
                    // Events already queued behind the snapshot must not run.
                    self.listeners.keep_only(EventKind::Disconnect);
                }
                info!(attempt = %self.id, keys, "import: config received from {}", self.label);
                Flow::Continue
            }
            TransportEvent::Change(change) => {
                match self.sync.apply_change(&change) {
                    Ok(()) => info!(attempt = %self.id, key = %change.key, "import: change received"),
                    Err(e) => warn!(attempt = %self.id, key = %change.key, error = %e, "failed to apply change"),
                }
                Flow::Continue
            }
            TransportEvent::Error { message } => {
                info!(attempt = %self.id, "import: {}: {message}", self.label);
                self.handle.close();
                self.finish(ImportStatus::Error { message })
            }
            TransportEvent::Disconnect { reason } => {
                self.listeners.detach_on_disconnect();
                info!(
                    attempt = %self.id,
                    reason = reason.as_str(),
                    "import: disconnected from {}",
                    self.label
                );
                let status = self.status.resolve();
                self.finish(status)
            }
        }
    }

    /// Delivers the completion if it has not been delivered yet.
    fn finish(&mut self, status: ImportStatus) -> Flow {
        self.phase = Phase::Completed;
        self.listeners.detach_all();
        self.handle.close();

        if let Some(on_complete) = self.on_complete.take() {
            info!(attempt = %self.id, status = %status, "import from {} finished", self.label);
            on_complete(Completion {
                status,
                disconnect: Disconnect::for_transport(self.handle.clone()),
            });
        }
        Flow::Done
    }
}
