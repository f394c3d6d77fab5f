//! Event-emitting transport for the distribution channel.
//!
//! A [`Dialer`] hands back a [`Transport`] immediately; the connection is
//! established in the background and every outcome, including a failed
//! dial, is reported as a [`TransportEvent`].

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, tungstenite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use distro_protocol::envelope::{Frame, FrameError};
use distro_protocol::messages::{ConfigChange, ConfigSnapshot, ErrorPayload};
use distro_protocol::EventKind;

use crate::types::{DialOptions, DisconnectReason};

/// Errors from the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed")]
    Closed,
}

/// Everything the transport reports to the lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Session established; the client may authenticate.
    Connect,
    /// The session could not be established at all.
    ConnectError { description: String },
    /// The server accepted the auth token.
    Accept,
    /// The server refused the auth token.
    Reject,
    /// Full configuration snapshot.
    Config(ConfigSnapshot),
    /// Single key update (listen mode).
    Change(ConfigChange),
    /// Failure after the session was established.
    Error { message: String },
    /// The session is gone.
    Disconnect { reason: DisconnectReason },
}

impl TransportEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TransportEvent::Connect => EventKind::Connect,
            TransportEvent::ConnectError { .. } => EventKind::ConnectError,
            TransportEvent::Accept => EventKind::Accept,
            TransportEvent::Reject => EventKind::Reject,
            TransportEvent::Config(_) => EventKind::Config,
            TransportEvent::Change(_) => EventKind::Change,
            TransportEvent::Error { .. } => EventKind::Error,
            TransportEvent::Disconnect { .. } => EventKind::Disconnect,
        }
    }
}

/// Decodes a server frame into a transport event.
pub(crate) fn decode_frame(frame: &Frame) -> Result<TransportEvent, FrameError> {
    match frame.kind()? {
        EventKind::Accept => Ok(TransportEvent::Accept),
        EventKind::Reject => Ok(TransportEvent::Reject),
        EventKind::Config => Ok(TransportEvent::Config(frame.require_data()?)),
        EventKind::Change => Ok(TransportEvent::Change(frame.require_data()?)),
        EventKind::Error => {
            if let Ok(Some(ErrorPayload { message })) = frame.parse_data::<ErrorPayload>() {
                return Ok(TransportEvent::Error { message });
            }
            // Some servers send a bare string, or an object without `message`.
            let message = match frame.parse_data::<serde_json::Value>()? {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::new(),
            };
            Ok(TransportEvent::Error { message })
        }
        other => Err(FrameError::UnexpectedEvent(other)),
    }
}

/// Write side of a transport: emits frames and closes the session.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
}

impl TransportHandle {
    pub fn new(write_tx: mpsc::Sender<tungstenite::Message>, cancel: CancellationToken) -> Self {
        Self { write_tx, cancel }
    }

    /// Queues an event for the server.
    ///
    /// Frames queued before the session is up are flushed once it is.
    pub fn emit<T: serde::Serialize>(
        &self,
        kind: EventKind,
        data: Option<&T>,
    ) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let text = Frame::new(kind, data)?.to_text()?;
        self.write_tx
            .try_send(tungstenite::Message::Text(text.into()))
            .map_err(|_| TransportError::Closed)
    }

    /// Closes the session. Idempotent.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            debug!("closing transport");
            self.cancel.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A dialed transport: the write handle plus the inbound event stream.
pub struct Transport {
    pub handle: TransportHandle,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Opens transports. Implemented by [`WsDialer`]; tests supply their own.
pub trait Dialer: Send + Sync + 'static {
    /// Starts connecting to `url`. Must be called inside a Tokio runtime.
    fn dial(&self, url: &str, options: &DialOptions) -> Transport;
}

/// WebSocket dialer over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsDialer;

impl Dialer for WsDialer {
    fn dial(&self, url: &str, options: &DialOptions) -> Transport {
        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(64);
        let cancel = CancellationToken::new();

        tokio::spawn(run_connection(
            websocket_url(url),
            options.clone(),
            write_tx.clone(),
            write_rx,
            events_tx,
            cancel.clone(),
        ));

        Transport {
            handle: TransportHandle::new(write_tx, cancel),
            events: events_rx,
        }
    }
}

/// Maps `http(s)://` to `ws(s)://`; other URLs pass through.
pub fn websocket_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        url.to_string()
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Performs the WebSocket handshake.
async fn open(url: &str, options: &DialOptions) -> Result<WsStream, TransportError> {
    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(options.max_message_size);
    ws_config.max_frame_size = Some(options.max_message_size);

    let connector = if options.accept_invalid_certs {
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()?;
        Some(Connector::NativeTls(tls))
    } else {
        None
    };

    let (stream, _) =
        tokio_tungstenite::connect_async_tls_with_config(url, Some(ws_config), false, connector)
            .await?;
    Ok(stream)
}

/// Owns one connection from dial to disconnect.
async fn run_connection(
    url: String,
    options: DialOptions,
    write_tx: mpsc::Sender<tungstenite::Message>,
    write_rx: mpsc::Receiver<tungstenite::Message>,
    events_tx: mpsc::Sender<TransportEvent>,
    cancel: CancellationToken,
) {
    let timeout = options.connect_timeout();
    let stream = tokio::select! {
        _ = cancel.cancelled() => {
            debug!(url = %url, "closed before the handshake finished");
            let _ = events_tx
                .send(TransportEvent::Disconnect { reason: DisconnectReason::ClientClose })
                .await;
            return;
        }
        result = tokio::time::timeout(timeout, open(&url, &options)) => {
            let outcome = match result {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(TransportError::Timeout(timeout)),
            };
            match outcome {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(url = %url, error = %e, "connection failed");
                    let _ = events_tx
                        .send(TransportEvent::ConnectError { description: e.to_string() })
                        .await;
                    return;
                }
            }
        }
    };

    debug!(url = %url, "transport connected");
    if events_tx.send(TransportEvent::Connect).await.is_err() {
        return;
    }

    let (write, read) = stream.split();

    let write_handle = {
        let cancel = cancel.clone();
        tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
    };

    let ping_handle = {
        let write_tx = write_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(crate::pumps::ping::ping_pump(
            write_tx,
            options.ping_period(),
            cancel,
        ))
    };

    let reason = crate::pumps::read::read_pump(
        read,
        &events_tx,
        &write_tx,
        options.pong_wait(),
        options.max_message_size,
        &cancel,
    )
    .await;

    // Stop the other pumps; the write pump sends the close frame on its way out.
    cancel.cancel();
    let _ = write_handle.await;
    let _ = ping_handle.await;

    debug!(url = %url, reason = reason.as_str(), "transport disconnected");
    let _ = events_tx
        .send(TransportEvent::Disconnect { reason })
        .await;
}
