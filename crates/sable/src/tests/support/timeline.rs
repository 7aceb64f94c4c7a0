//! Ordered record of collaborator calls shared by every test double.

use std::sync::{Arc, Mutex};

/// Shared, append-only event log.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Arc<Mutex<Vec<String>>>,
}

impl Timeline {
    /// Appends an event.
    pub fn record(&self, event: impl Into<String>) {
        self.events
            .lock()
            .expect("timeline mutex poisoned")
            .push(event.into());
    }

    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("timeline mutex poisoned").clone()
    }

    /// Position of the first event equal to `event`.
    #[must_use]
    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|recorded| recorded == event)
    }

    /// Number of events equal to `event`.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        self.events()
            .iter()
            .filter(|recorded| recorded.as_str() == event)
            .count()
    }
}
