//! Tracks which transport events currently have a handler bound.

use std::collections::HashSet;

use tracing::trace;

use distro_protocol::EventKind;

/// Handlers unbound when the connection drops, before completion is reported.
const DETACH_ON_DISCONNECT: [EventKind; 4] = [
    EventKind::Connect,
    EventKind::Config,
    EventKind::Error,
    EventKind::ConnectError,
];

/// Set of bound event handlers for one attempt.
///
/// Events whose kind is not bound are dropped by the attempt, so a handler
/// that has been detached can never run again.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    bound: HashSet<EventKind>,
}

impl ListenerRegistry {
    /// Binds the handlers an attempt needs. `change` is only bound in listen
    /// mode.
    pub fn for_attempt(listen: bool) -> Self {
        let mut registry = Self::default();
        for kind in [
            EventKind::Connect,
            EventKind::Accept,
            EventKind::Disconnect,
            EventKind::Config,
            EventKind::Error,
            EventKind::ConnectError,
            EventKind::Reject,
        ] {
            registry.bind(kind);
        }
        if listen {
            registry.bind(EventKind::Change);
        }
        registry
    }

    /// Returns `true` if the handler was not bound before.
    pub fn bind(&mut self, kind: EventKind) -> bool {
        self.bound.insert(kind)
    }

    /// Returns `true` if a handler was bound. Unbinding twice is a no-op.
    pub fn unbind(&mut self, kind: EventKind) -> bool {
        let removed = self.bound.remove(&kind);
        if removed {
            trace!(event = %kind, "listener detached");
        }
        removed
    }

    pub fn is_bound(&self, kind: EventKind) -> bool {
        self.bound.contains(&kind)
    }

    /// Unbinds the handlers that must not outlive the connection.
    pub fn detach_on_disconnect(&mut self) {
        for kind in DETACH_ON_DISCONNECT {
            self.unbind(kind);
        }
    }

    /// Unbinds everything except `kind`.
    pub fn keep_only(&mut self, kind: EventKind) {
        let detached: Vec<EventKind> = self.bound.iter().copied().filter(|k| *k != kind).collect();
        for kind in detached {
            self.unbind(kind);
        }
    }

    pub fn detach_all(&mut self) {
        self.bound.clear();
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_does_not_bind_change() {
        let registry = ListenerRegistry::for_attempt(false);
        assert_eq!(registry.len(), 7);
        assert!(registry.is_bound(EventKind::Config));
        assert!(!registry.is_bound(EventKind::Change));
        assert!(!registry.is_bound(EventKind::Auth));
    }

    #[test]
    fn listen_binds_change() {
        let registry = ListenerRegistry::for_attempt(true);
        assert_eq!(registry.len(), 8);
        assert!(registry.is_bound(EventKind::Change));
    }

    #[test]
    fn detach_on_disconnect_keeps_the_rest() {
        let mut registry = ListenerRegistry::for_attempt(true);
        registry.detach_on_disconnect();
        for kind in DETACH_ON_DISCONNECT {
            assert!(!registry.is_bound(kind), "{kind} still bound");
        }
        assert!(registry.is_bound(EventKind::Accept));
        assert!(registry.is_bound(EventKind::Reject));
        assert!(registry.is_bound(EventKind::Change));

        // Idempotent.
        registry.detach_on_disconnect();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn keep_only_leaves_a_single_handler() {
        let mut registry = ListenerRegistry::for_attempt(false);
        registry.keep_only(EventKind::Disconnect);
        assert_eq!(registry.len(), 1);
        assert!(registry.is_bound(EventKind::Disconnect));
        assert!(!registry.is_bound(EventKind::Error));
        assert!(!registry.is_bound(EventKind::Config));
    }

    #[test]
    fn unbind_twice_is_noop() {
        let mut registry = ListenerRegistry::for_attempt(false);
        assert!(registry.unbind(EventKind::Config));
        assert!(!registry.unbind(EventKind::Config));
        registry.detach_all();
        assert!(registry.is_empty());
    }
}
