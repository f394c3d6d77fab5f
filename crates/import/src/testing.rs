//! In-memory dialer for lifecycle tests.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;

use crate::transport::{Dialer, Transport, TransportEvent, TransportHandle};
use crate::types::{DialOptions, DisconnectReason};

/// The server side of a fake transport.
pub(crate) struct Peer {
    pub events: mpsc::Sender<TransportEvent>,
    pub outbound: mpsc::Receiver<tungstenite::Message>,
    pub cancel: CancellationToken,
    pub url: String,
    pub options: DialOptions,
}

/// Records every dial and hands the test a [`Peer`] to script events with.
#[derive(Clone, Default)]
pub(crate) struct FakeDialer {
    peers: Arc<Mutex<Vec<Peer>>>,
    dials: Arc<Mutex<usize>>,
    close_emits_disconnect: bool,
}

impl FakeDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaves like the real transport: closing the handle yields a
    /// `Disconnect { ClientClose }` event.
    pub fn closing() -> Self {
        Self {
            close_emits_disconnect: true,
            ..Self::default()
        }
    }

    pub fn dials(&self) -> usize {
        *self.dials.lock().unwrap()
    }

    pub fn take_peer(&self) -> Peer {
        self.peers.lock().unwrap().remove(0)
    }
}

impl Dialer for FakeDialer {
    fn dial(&self, url: &str, options: &DialOptions) -> Transport {
        let (write_tx, write_rx) = mpsc::channel(16);
        let (events_tx, events_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        if self.close_emits_disconnect {
            let tx = events_tx.clone();
            let cancelled = cancel.clone();
            tokio::spawn(async move {
                cancelled.cancelled().await;
                let _ = tx
                    .send(TransportEvent::Disconnect {
                        reason: DisconnectReason::ClientClose,
                    })
                    .await;
            });
        }

        *self.dials.lock().unwrap() += 1;
        self.peers.lock().unwrap().push(Peer {
            events: events_tx,
            outbound: write_rx,
            cancel: cancel.clone(),
            url: url.to_string(),
            options: options.clone(),
        });

        Transport {
            handle: TransportHandle::new(write_tx, cancel),
            events: events_rx,
        }
    }
}
