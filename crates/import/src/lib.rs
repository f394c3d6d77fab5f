//! Import client for the configuration distribution channel.
//!
//! An [`Importer`] connects to the distribution server, authenticates with
//! the token from the config store and merges the pushed configuration back
//! into the store. Each activation reports exactly one [`Completion`].

mod attempt;
pub mod colors;
pub mod handshake;
pub mod listeners;
pub mod manager;
pub(crate) mod pumps;
pub mod status;
pub mod sync;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use handshake::{LifecycleError, Phase};
pub use manager::Importer;
pub use transport::{Dialer, Transport, TransportError, TransportEvent, TransportHandle, WsDialer};
pub use types::{Completion, CompletionFn, DialOptions, Disconnect, DisconnectReason, ImportStatus};
