use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::LIFECYCLE_TARGET;
use crate::collaborators::PresenceIntegration;
use crate::telemetry::LogSink;

struct Sequence {
    presence: OnceCell<Arc<dyn PresenceIntegration>>,
    logs: OnceCell<Arc<dyn LogSink>>,
    completed: AtomicBool,
}

/// One-shot teardown of the dependent subsystems.
///
/// The handle exists before the subsystems it tears down, so boot attaches
/// each one as it comes up. Running the sequence signals presence first and
/// then flushes and closes the logs; subsystems never attached are skipped.
#[derive(Clone)]
pub struct ShutdownHandle {
    sequence: Arc<Sequence>,
}

impl std::fmt::Debug for ShutdownHandle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ShutdownHandle")
            .field("presence", &self.sequence.presence.get().is_some())
            .field("logs", &self.sequence.logs.get().is_some())
            .field("completed", &self.has_run())
            .finish()
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    /// Creates a sequence with nothing attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sequence: Arc::new(Sequence {
                presence: OnceCell::new(),
                logs: OnceCell::new(),
                completed: AtomicBool::new(false),
            }),
        }
    }

    /// Registers the presence integration; later registrations are ignored.
    pub fn attach_presence(&self, presence: Arc<dyn PresenceIntegration>) {
        if self.sequence.presence.set(presence).is_err() {
            debug!(target: LIFECYCLE_TARGET, "presence already attached to shutdown");
        }
    }

    /// Registers the logging subsystem; later registrations are ignored.
    pub fn attach_logs(&self, logs: Arc<dyn LogSink>) {
        if self.sequence.logs.set(logs).is_err() {
            debug!(target: LIFECYCLE_TARGET, "logs already attached to shutdown");
        }
    }

    /// Logging subsystem, once attached.
    #[must_use]
    pub fn logs(&self) -> Option<&Arc<dyn LogSink>> {
        self.sequence.logs.get()
    }

    /// Returns true once the sequence has run.
    #[must_use]
    pub fn has_run(&self) -> bool {
        self.sequence.completed.load(Ordering::Acquire)
    }

    /// Runs the sequence, returning false if it had already run.
    pub fn run(&self) -> bool {
        if self.sequence.completed.swap(true, Ordering::AcqRel) {
            debug!(target: LIFECYCLE_TARGET, "shutdown already performed");
            return false;
        }

        info!(target: LIFECYCLE_TARGET, event = "shutdown_starting", "shutting down");
        if let Some(presence) = self.sequence.presence.get() {
            presence.shutdown();
        }
        info!(target: LIFECYCLE_TARGET, event = "shutdown_complete", "shutdown complete");
        if let Some(logs) = self.sequence.logs.get() {
            logs.flush_and_close();
        }
        true
    }
}
