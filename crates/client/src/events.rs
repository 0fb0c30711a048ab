//! Command-monitoring events and the recorder the verifier reads back
//!
//! The harness verifies behavior through command-started events alone;
//! succeeded/failed lifecycle events carry no expectations in the CRUD
//! suite and are not recorded.

use parking_lot::Mutex;
use specdrive_core::Document;

/// A command-started notification emitted by the client
#[derive(Debug, Clone, PartialEq)]
pub struct CommandStartedEvent {
    /// Wire-level command name (`insert`, `find`, `update`, ...)
    pub command_name: String,
    /// Database the command targets
    pub database_name: String,
    /// The command body as sent
    pub command: Document,
}

/// Captures command-started events during one test case
///
/// Cleared deterministically at the start of each case and read back only
/// after that case's operations finish; the mutex exists because the
/// client contract requires `Sync`, not because the harness runs
/// concurrently.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<CommandStartedEvent>>,
}

impl EventRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn record(&self, event: CommandStartedEvent) {
        self.events.lock().push(event);
    }

    /// Drop all captured events
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Copy out the events captured so far, in emission order
    pub fn snapshot(&self) -> Vec<CommandStartedEvent> {
        self.events.lock().clone()
    }

    /// Number of events captured so far
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events have been captured
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
