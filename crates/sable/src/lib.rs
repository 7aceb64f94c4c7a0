//! Start-up orchestration for the Sable front-end.
//!
//! [`boot`] runs a fixed sequence: parse the launch arguments, start the
//! stale update sweep, install the fatal-error and exit hooks, prepare the
//! data root, bring up logging and presence, wire the UI dispatcher into the
//! driver layer, resolve the configuration, report diagnostics, apply the
//! driver threading toggle, look for key material, and hand any requested
//! title to the window layer. Only argument errors and an unusable data root
//! abandon start-up; everything else is reported as a degraded step.
//!
//! The resulting [`App`] owns the configuration handle and the shutdown
//! sequence. Shutdown runs once, whether it is requested explicitly, triggered
//! by a fatal failure on the primary thread, or reached by dropping the
//! handle.

mod bootstrap;
mod cleanup;
mod cli;
mod collaborators;
mod data_root;
mod diagnostics;
mod dispatch;
mod headless;
mod keys;
mod lifecycle;
mod reporter;
mod telemetry;

pub use bootstrap::{App, BootError, BootPlan, Collaborators, boot, boot_with};
pub use cleanup::{CleanupScheduler, DetachedCleanup, StaleArtifacts, SweepSummary};
pub use cli::LaunchArguments;
pub use collaborators::{
    CollaboratorError, DriverLayer, LoadRequest, Platform, PresenceIntegration, SystemInfo,
    WindowLayer,
};
pub use data_root::{DataRoot, DataRootError, HostLocations, LaunchMode};
pub use diagnostics::{DiagnosticsReport, DiagnosticsReporter, StructuredDiagnosticsReporter};
pub use dispatch::{DispatchError, DispatchHandle, UiDispatcher, Work};
pub use headless::{HeadlessDriver, HeadlessPresence, HeadlessWindow, HostPlatform};
pub use keys::{KeyLocations, KeyStatus};
pub use lifecycle::{
    ExitRequest, FatalError, FatalErrorHandler, HookError, HookInstaller, ShutdownHandle,
    SystemHooks,
};
pub use reporter::{BootReporter, BootStep, StructuredBootReporter};
pub use telemetry::{
    LevelMask, LogSink, NOTICE_TARGET, SystemTelemetry, Telemetry, TelemetryError,
    TelemetryHandle,
};

pub(crate) const BOOT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::boot");

#[cfg(test)]
mod tests;
