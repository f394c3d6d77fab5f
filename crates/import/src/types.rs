//! Public types for the import client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use distro_protocol::constants::{CONNECT_TIMEOUT, MAX_MESSAGE_SIZE, PING_PERIOD, PONG_WAIT};

use crate::transport::TransportHandle;

/// Terminal outcome of one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    /// Import is disabled in the store; nothing was dialed.
    Canceled,
    /// A configuration snapshot was merged before the connection closed.
    Received,
    /// The connection failed after it was established.
    Error { message: String },
    /// The transport never reached a session.
    ConnectError { description: String },
    /// The server refused the auth token.
    Reject,
    /// The connection closed before any snapshot arrived.
    Disconnected,
}

impl ImportStatus {
    /// Short status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Canceled => "canceled",
            ImportStatus::Received => "received",
            ImportStatus::Error { .. } => "error",
            ImportStatus::ConnectError { .. } => "connect_error",
            ImportStatus::Reject => "reject",
            ImportStatus::Disconnected => "disconnected",
        }
    }

    /// Returns `true` for outcomes a caller would want to retry or report.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ImportStatus::Error { .. } | ImportStatus::ConnectError { .. } | ImportStatus::Reject
        )
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportStatus::Error { message } => write!(f, "error: {message}"),
            ImportStatus::ConnectError { description } => write!(f, "connect_error: {description}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Closes the activation's transport on demand.
///
/// Calling [`disconnect`](Self::disconnect) more than once, or after the
/// transport already closed, does nothing.
#[derive(Debug, Clone, Default)]
pub struct Disconnect {
    handle: Option<TransportHandle>,
}

impl Disconnect {
    /// A disconnect that has nothing to close.
    pub fn noop() -> Self {
        Self::default()
    }

    pub(crate) fn for_transport(handle: TransportHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Closes the transport if it is still open.
    pub fn disconnect(&self) {
        if let Some(handle) = &self.handle {
            handle.close();
        }
    }

    /// Returns `true` if there is no open transport behind this handle.
    pub fn is_closed(&self) -> bool {
        self.handle.as_ref().is_none_or(TransportHandle::is_closed)
    }
}

/// Result delivered to the completion callback, exactly once per activation.
#[derive(Debug, Clone)]
pub struct Completion {
    pub status: ImportStatus,
    pub disconnect: Disconnect,
}

impl Completion {
    pub(crate) fn canceled() -> Self {
        Self {
            status: ImportStatus::Canceled,
            disconnect: Disconnect::noop(),
        }
    }
}

/// Callback receiving the terminal [`Completion`].
pub type CompletionFn = Box<dyn FnOnce(Completion) + Send>;

/// Why the transport went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Closed locally via [`TransportHandle::close`].
    ClientClose,
    /// The server sent a close frame or ended the stream.
    ServerClose,
    /// Nothing arrived within the pong deadline.
    PingTimeout,
    /// A read or write on the socket failed.
    TransportError,
    /// The event stream ended without a disconnect event.
    TransportDropped,
}

impl DisconnectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DisconnectReason::ClientClose => "client close",
            DisconnectReason::ServerClose => "server close",
            DisconnectReason::PingTimeout => "ping timeout",
            DisconnectReason::TransportError => "transport error",
            DisconnectReason::TransportDropped => "transport dropped",
        }
    }
}

/// Transport options supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialOptions {
    /// Handshake deadline in seconds.
    pub connect_timeout_secs: u64,
    /// Keepalive ping interval in seconds.
    pub ping_period_secs: u64,
    /// Read deadline in seconds; reset by any inbound message.
    pub pong_wait_secs: u64,
    /// Largest accepted inbound message, in bytes.
    pub max_message_size: usize,
    /// Skip TLS certificate and hostname validation.
    pub accept_invalid_certs: bool,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT.as_secs(),
            ping_period_secs: PING_PERIOD.as_secs(),
            pong_wait_secs: PONG_WAIT.as_secs(),
            max_message_size: MAX_MESSAGE_SIZE,
            accept_invalid_certs: false,
        }
    }
}

impl DialOptions {
    /// Applies the fixed overrides of the distribution channel.
    ///
    /// Certificates are not validated: distribution servers inside a fleet
    /// commonly run with self-signed certificates and there is no pinning.
    pub fn with_distribution_overrides(self) -> Self {
        Self {
            accept_invalid_certs: true,
            ..self
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn ping_period(&self) -> Duration {
        Duration::from_secs(self.ping_period_secs.max(1))
    }

    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_secs.max(1))
    }
}
