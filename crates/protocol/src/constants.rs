use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Path of the distribution endpoint, appended to the server URL.
pub const DISTRIBUTE_PATH: &str = "/distribute";

/// Time allowed for the transport handshake (TCP + TLS + upgrade).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Time to wait for a pong response (or any incoming message).
///
/// Acts as a read deadline: if *nothing* arrives within this window the
/// connection is considered dead. Listen-mode connections can sit idle for
/// long stretches, so this must stay well above [`PING_PERIOD`].
pub const PONG_WAIT: Duration = Duration::from_secs(60);

/// How often to send keepalive pings.
pub const PING_PERIOD: Duration = Duration::from_secs(25);

/// Maximum inbound message size in bytes (16 MB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Event identifier carried in every frame.
///
/// `Connect`, `ConnectError` and `Disconnect` never travel on the wire; the
/// transport raises them locally so every lifecycle step is named the same
/// way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    // Transport-local
    #[serde(rename = "connect")]
    Connect,
    #[serde(rename = "connect_error")]
    ConnectError,
    #[serde(rename = "disconnect")]
    Disconnect,

    // Client to server
    #[serde(rename = "auth")]
    Auth,

    // Server to client
    #[serde(rename = "accept")]
    Accept,
    #[serde(rename = "reject")]
    Reject,
    #[serde(rename = "config")]
    Config,
    #[serde(rename = "change")]
    Change,
    #[serde(rename = "error")]
    Error,
}

impl EventKind {
    /// All kinds, in lifecycle order.
    pub const ALL: [EventKind; 9] = [
        EventKind::Connect,
        EventKind::ConnectError,
        EventKind::Auth,
        EventKind::Accept,
        EventKind::Reject,
        EventKind::Config,
        EventKind::Change,
        EventKind::Error,
        EventKind::Disconnect,
    ];

    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Connect => "connect",
            EventKind::ConnectError => "connect_error",
            EventKind::Disconnect => "disconnect",
            EventKind::Auth => "auth",
            EventKind::Accept => "accept",
            EventKind::Reject => "reject",
            EventKind::Config => "config",
            EventKind::Change => "change",
            EventKind::Error => "error",
        }
    }

    /// Looks up a kind by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
