//! Authentication phases and the `auth` request.

use serde_json::Value;
use tracing::{info, warn};

use distro_protocol::EventKind;

use crate::transport::TransportHandle;

/// Where an attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Dialing; no session yet.
    Idle,
    /// Session up, `auth` sent, waiting for the verdict.
    Authenticating,
    /// Token accepted; config pushes are expected.
    Authenticated,
    /// Token refused. Completion is reported right away.
    Rejected,
    /// Connect or transport failure. Completion is reported right away.
    Failed,
    /// Completion delivered. Nothing may leave this phase.
    Completed,
}

/// Illegal lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("attempt already completed, ignoring {0}")]
    AlreadyCompleted(EventKind),

    #[error("{event} not expected while {phase:?}")]
    Unexpected { phase: Phase, event: EventKind },
}

impl Phase {
    /// The transition function of the attempt.
    pub fn on_event(self, event: EventKind) -> Result<Phase, LifecycleError> {
        use EventKind as E;
        use Phase as P;

        match (self, event) {
            (P::Completed, e) => Err(LifecycleError::AlreadyCompleted(e)),
            (_, E::Disconnect) => Ok(P::Completed),
            (P::Idle, E::Connect) => Ok(P::Authenticating),
            (P::Idle | P::Authenticating, E::ConnectError) => Ok(P::Failed),
            (P::Authenticating, E::Accept) => Ok(P::Authenticated),
            // The server may revoke the token after accepting it.
            (P::Authenticating | P::Authenticated, E::Reject) => Ok(P::Rejected),
            // A snapshot implies the token was accepted.
            (P::Authenticating | P::Authenticated, E::Config) => Ok(P::Authenticated),
            (P::Authenticated, E::Change) => Ok(P::Authenticated),
            (P::Idle | P::Authenticating | P::Authenticated, E::Error) => Ok(P::Failed),
            (phase, event) => Err(LifecycleError::Unexpected { phase, event }),
        }
    }
}

/// Sends the configured token once the session is up.
#[derive(Debug, Clone)]
pub struct AuthHandshake {
    token: Value,
}

impl AuthHandshake {
    pub fn new(token: Value) -> Self {
        Self { token }
    }

    /// Emits `auth` with the token, verbatim. No response deadline is set
    /// here; a silent server is caught by the transport's read deadline.
    pub fn on_connect(&self, handle: &TransportHandle, server: &str) {
        info!("import: try to auth to {server}");
        if let Err(e) = handle.emit(EventKind::Auth, Some(&self.token)) {
            // The disconnect that follows completes the attempt.
            warn!(error = %e, "failed to send auth");
        }
    }
}
