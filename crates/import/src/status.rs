//! Single-slot record of how the current attempt went.

use crate::types::ImportStatus;

/// Holds the outcome recorded during an attempt, read once when the
/// connection goes away.
#[derive(Debug, Default)]
pub struct StatusTracker {
    recorded: Option<ImportStatus>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `status`. Returns `true` the first time anything is recorded.
    pub fn record(&mut self, status: ImportStatus) -> bool {
        let first = self.recorded.is_none();
        self.recorded = Some(status);
        first
    }

    /// The recorded status, or [`ImportStatus::Disconnected`] when the
    /// connection closed before anything was recorded.
    pub fn resolve(&self) -> ImportStatus {
        self.recorded.clone().unwrap_or(ImportStatus::Disconnected)
    }
}
