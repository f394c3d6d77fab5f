pub mod constants;
pub mod envelope;
pub mod messages;
pub mod query;

// Re-export primary types for convenience.
pub use constants::EventKind;
pub use envelope::{Frame, FrameError};
pub use messages::{ConfigChange, ConfigSnapshot, ErrorPayload};
pub use query::{distribute_url, to_query};
