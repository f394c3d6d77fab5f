//! Import manager: reads the import settings, dials the distribution server
//! and hands the connection to a per-activation lifecycle task.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info};

use distro_config::{ConfigStore, ImportConfig};
use distro_protocol::distribute_url;

use crate::attempt::Attempt;
use crate::colors::color_url;
use crate::transport::{Dialer, WsDialer};
use crate::types::{Completion, DialOptions, Disconnect, ImportStatus};

/// Imports configuration from the distribution server into a store.
pub struct Importer<D: Dialer = WsDialer> {
    store: Arc<dyn ConfigStore>,
    dialer: D,
}

impl Importer<WsDialer> {
    /// Creates an importer that connects over WebSocket.
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self::with_dialer(store, WsDialer)
    }
}

impl<D: Dialer> Importer<D> {
    pub fn with_dialer(store: Arc<dyn ConfigStore>, dialer: D) -> Self {
        Self { store, dialer }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// [`activate_with`](Self::activate_with) using default dial options.
    pub fn activate<F>(&self, on_complete: F) -> Disconnect
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        self.activate_with(DialOptions::default(), on_complete)
    }

    /// Starts one import attempt.
    ///
    /// `on_complete` is called exactly once. When import is disabled in the
    /// store it is called before this returns, with
    /// [`ImportStatus::Canceled`], and nothing is dialed. Otherwise the
    /// connection runs on a spawned task, which requires a Tokio runtime.
    ///
    /// The returned [`Disconnect`] closes the connection early.
    pub fn activate_with<F>(&self, options: DialOptions, on_complete: F) -> Disconnect
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        let config = ImportConfig::from_store(self.store.as_ref());
        if !config.enabled {
            info!("import: disabled, status {}", ImportStatus::Canceled);
            on_complete(Completion::canceled());
            return Disconnect::noop();
        }

        let url = distribute_url(
            &config.server_url,
            config.agent_name.as_deref(),
            config.agent_port,
        );
        let label = color_url(&config.server_url, config.agent_name.as_deref());
        let options = options.with_distribution_overrides();

        let transport = self.dialer.dial(&url, &options);
        let attempt = Attempt::new(
            &config,
            Arc::clone(&self.store),
            transport.handle.clone(),
            label,
            Box::new(on_complete),
        );
        debug!(attempt = %attempt.id(), url = %url, listen = config.listen, "import: activating");

        tokio::spawn(attempt.drive(transport.events));
        Disconnect::for_transport(transport.handle)
    }

    /// Runs one attempt to completion.
    pub async fn run(&self, options: DialOptions) -> Completion {
        let (tx, rx) = oneshot::channel();
        self.activate_with(options, move |completion| {
            let _ = tx.send(completion);
        });
        // The sender only drops unsent if the lifecycle task was torn down.
        rx.await.unwrap_or(Completion {
            status: ImportStatus::Disconnected,
            disconnect: Disconnect::noop(),
        })
    }
}
