//! Interfaces of the subsystems the orchestrator drives but does not own.

use std::path::PathBuf;
use std::thread;

use thiserror::Error;

use crate::dispatch::DispatchHandle;

/// Failure reported by an external subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{component} failed: {message}")]
pub struct CollaboratorError {
    /// Subsystem that failed.
    pub component: &'static str,
    /// Failure description.
    pub message: String,
}

impl CollaboratorError {
    /// Builds an error for `component`.
    pub fn new(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            component,
            message: message.into(),
        }
    }
}

/// Presence and rich-status integration.
pub trait PresenceIntegration: Send + Sync {
    /// Connects the integration.
    fn initialise(&self) -> Result<(), CollaboratorError>;

    /// Disconnects and releases the integration.
    fn shutdown(&self);
}

/// Platform input and hardware driver layer.
pub trait DriverLayer: Send + Sync {
    /// Hands over the callback used to marshal driver events onto the UI context.
    fn attach_dispatcher(&self, dispatch: DispatchHandle);

    /// Forces the driver's threaded optimisation toggle.
    fn set_threaded_optimisations(&self, enabled: bool) -> Result<(), CollaboratorError>;
}

/// Title requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Title path.
    pub path: PathBuf,
    /// Whether the title starts in fullscreen.
    pub fullscreen: bool,
}

/// Window and session layer.
pub trait WindowLayer: Send + Sync {
    /// Starts a deferred load of the requested title.
    fn begin_deferred_load(&self, request: LoadRequest);
}

/// Operating system facts gathered for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// Operating system identifier.
    pub os: String,
    /// Operating system family.
    pub family: String,
    /// CPU architecture.
    pub arch: String,
    /// Logical CPUs available to the process.
    pub logical_cpus: usize,
}

impl SystemInfo {
    /// Reads the facts of the running host.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_owned(),
            family: std::env::consts::FAMILY.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
            logical_cpus: thread::available_parallelism().map_or(1, usize::from),
        }
    }
}

/// Platform queries that do not depend on configuration.
pub trait Platform: Send + Sync {
    /// Display scale factor of the primary window.
    fn scale_factor(&self) -> f64;

    /// Host facts for diagnostics.
    fn system_info(&self) -> SystemInfo;
}
