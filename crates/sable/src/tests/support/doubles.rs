//! Recording doubles for every collaborator the boot sequence drives.
//!
//! Each double appends to a shared [`Timeline`] so scenarios can assert the
//! relative order of calls across subsystems.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sable_config::{LogFormat, LogLevel, LoggingSettings, Settings};

use crate::bootstrap::BootError;
use crate::cleanup::{CleanupScheduler, StaleArtifacts};
use crate::collaborators::{
    CollaboratorError, DriverLayer, LoadRequest, Platform, PresenceIntegration, SystemInfo,
    WindowLayer,
};
use crate::diagnostics::{DiagnosticsReport, DiagnosticsReporter};
use crate::dispatch::DispatchHandle;
use crate::lifecycle::{ExitRequest, FatalErrorHandler, HookError, HookInstaller};
use crate::reporter::{BootReporter, BootStep};
use crate::telemetry::{LevelMask, LogSink, Telemetry, TelemetryError};

use super::timeline::Timeline;

/// Boot reporter recording progress events.
#[derive(Debug)]
pub struct RecordingReporter {
    timeline: Timeline,
    degraded: Mutex<Vec<(BootStep, String)>>,
}

impl RecordingReporter {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            degraded: Mutex::new(Vec::new()),
        }
    }

    /// Steps reported as degraded, with their reasons.
    pub fn degraded(&self) -> Vec<(BootStep, String)> {
        self.degraded.lock().expect("reporter mutex poisoned").clone()
    }

    /// Returns true when `step` was reported degraded.
    pub fn was_degraded(&self, step: BootStep) -> bool {
        self.degraded().iter().any(|(degraded, _)| *degraded == step)
    }
}

impl BootReporter for RecordingReporter {
    fn boot_starting(&self) {
        self.timeline.record("boot:starting");
    }

    fn step_completed(&self, step: BootStep) {
        self.timeline.record(format!("step:{step}"));
    }

    fn step_degraded(&self, step: BootStep, reason: &str) {
        self.timeline.record(format!("step:{step}"));
        self.degraded
            .lock()
            .expect("reporter mutex poisoned")
            .push((step, reason.to_owned()));
    }

    fn step_skipped(&self, step: BootStep) {
        self.timeline.record(format!("step:{step}"));
    }

    fn boot_succeeded(&self, _settings: &Settings) {
        self.timeline.record("boot:succeeded");
    }

    fn boot_failed(&self, _error: &BootError) {
        self.timeline.record("boot:failed");
    }
}

/// Log sink recording level changes and closure.
#[derive(Debug)]
pub struct RecordingSink {
    timeline: Timeline,
    mask: LevelMask,
}

impl LogSink for RecordingSink {
    fn apply_levels(&self, logging: &LoggingSettings) {
        self.mask.set(&logging.enabled_levels);
        self.timeline.record("logs:apply");
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.mask.is_enabled(level)
    }

    fn enabled_levels(&self) -> BTreeSet<LogLevel> {
        self.mask.levels()
    }

    fn flush_and_close(&self) {
        self.timeline.record("logs:close");
    }
}

/// Telemetry installer handing out a [`RecordingSink`].
#[derive(Debug)]
pub struct RecordingTelemetry {
    timeline: Timeline,
    sink: Arc<RecordingSink>,
    format: Mutex<Option<LogFormat>>,
}

impl RecordingTelemetry {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            sink: Arc::new(RecordingSink {
                timeline: timeline.clone(),
                mask: LevelMask::default(),
            }),
            timeline,
            format: Mutex::new(None),
        }
    }

    /// Sink returned to the boot sequence.
    pub fn sink(&self) -> Arc<RecordingSink> {
        Arc::clone(&self.sink)
    }

    /// Format requested during boot.
    pub fn format(&self) -> Option<LogFormat> {
        *self.format.lock().expect("telemetry mutex poisoned")
    }
}

impl Telemetry for RecordingTelemetry {
    fn initialise(&self, format: LogFormat) -> Result<Arc<dyn LogSink>, TelemetryError> {
        *self.format.lock().expect("telemetry mutex poisoned") = Some(format);
        self.timeline.record("logs:initialise");
        Ok(self.sink())
    }
}

/// Hook installer keeping the handler and exit flag for later use.
#[derive(Debug)]
pub struct RecordingHooks {
    timeline: Timeline,
    handler: Mutex<Option<FatalErrorHandler>>,
    exit: Mutex<Option<ExitRequest>>,
}

impl RecordingHooks {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            handler: Mutex::new(None),
            exit: Mutex::new(None),
        }
    }

    /// Fatal-error handler installed during boot.
    pub fn handler(&self) -> Option<FatalErrorHandler> {
        self.handler.lock().expect("hooks mutex poisoned").clone()
    }

    /// Exit flag registered during boot.
    pub fn exit(&self) -> Option<ExitRequest> {
        self.exit.lock().expect("hooks mutex poisoned").clone()
    }
}

impl HookInstaller for RecordingHooks {
    fn install_fatal_error_hook(&self, handler: FatalErrorHandler) {
        self.timeline.record("hooks:fatal");
        *self.handler.lock().expect("hooks mutex poisoned") = Some(handler);
    }

    fn install_exit_hook(&self, exit: &ExitRequest) -> Result<(), HookError> {
        self.timeline.record("hooks:exit");
        *self.exit.lock().expect("hooks mutex poisoned") = Some(exit.clone());
        Ok(())
    }
}

/// Cleanup scheduler that records the request without sweeping.
#[derive(Debug)]
pub struct RecordingCleanup {
    timeline: Timeline,
}

impl RecordingCleanup {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
}

impl CleanupScheduler for RecordingCleanup {
    fn schedule(&self, _artifacts: StaleArtifacts) {
        self.timeline.record("cleanup:scheduled");
    }
}

/// Presence integration that can be told to fail.
#[derive(Debug)]
pub struct RecordingPresence {
    timeline: Timeline,
    fail: AtomicBool,
}

impl RecordingPresence {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            fail: AtomicBool::new(false),
        }
    }

    /// Makes the next initialisation fail.
    pub fn fail_on_initialise(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl PresenceIntegration for RecordingPresence {
    fn initialise(&self) -> Result<(), CollaboratorError> {
        self.timeline.record("presence:initialise");
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("presence", "no status client running"));
        }
        Ok(())
    }

    fn shutdown(&self) {
        self.timeline.record("presence:shutdown");
    }
}

/// Driver layer recording the dispatcher and threading toggle.
#[derive(Debug)]
pub struct RecordingDriver {
    timeline: Timeline,
    dispatch: Mutex<Option<DispatchHandle>>,
    threading: Mutex<Option<bool>>,
}

impl RecordingDriver {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            dispatch: Mutex::new(None),
            threading: Mutex::new(None),
        }
    }

    /// Dispatcher attached during boot.
    pub fn dispatch(&self) -> Option<DispatchHandle> {
        self.dispatch.lock().expect("driver mutex poisoned").clone()
    }

    /// Forced threading state, if any.
    pub fn threading(&self) -> Option<bool> {
        *self.threading.lock().expect("driver mutex poisoned")
    }
}

impl DriverLayer for RecordingDriver {
    fn attach_dispatcher(&self, dispatch: DispatchHandle) {
        self.timeline.record("driver:dispatcher");
        *self.dispatch.lock().expect("driver mutex poisoned") = Some(dispatch);
    }

    fn set_threaded_optimisations(&self, enabled: bool) -> Result<(), CollaboratorError> {
        self.timeline.record(format!("driver:threading:{enabled}"));
        *self.threading.lock().expect("driver mutex poisoned") = Some(enabled);
        Ok(())
    }
}

/// Window layer recording load requests.
#[derive(Debug)]
pub struct RecordingWindow {
    timeline: Timeline,
    requests: Mutex<Vec<LoadRequest>>,
}

impl RecordingWindow {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Loads requested during boot.
    pub fn requests(&self) -> Vec<LoadRequest> {
        self.requests.lock().expect("window mutex poisoned").clone()
    }
}

impl WindowLayer for RecordingWindow {
    fn begin_deferred_load(&self, request: LoadRequest) {
        self.timeline.record("window:load");
        self.requests
            .lock()
            .expect("window mutex poisoned")
            .push(request);
    }
}

/// Platform answering fixed facts.
#[derive(Debug)]
pub struct FixedPlatform {
    timeline: Timeline,
}

impl FixedPlatform {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
}

impl Platform for FixedPlatform {
    fn scale_factor(&self) -> f64 {
        self.timeline.record("platform:scale");
        2.0
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            os: "linux".to_owned(),
            family: "unix".to_owned(),
            arch: "aarch64".to_owned(),
            logical_cpus: 4,
        }
    }
}

/// Diagnostics reporter keeping the emitted report.
#[derive(Debug)]
pub struct RecordingDiagnostics {
    timeline: Timeline,
    report: Mutex<Option<DiagnosticsReport>>,
}

impl RecordingDiagnostics {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            report: Mutex::new(None),
        }
    }

    /// Report emitted during boot.
    pub fn last_report(&self) -> Option<DiagnosticsReport> {
        self.report.lock().expect("diagnostics mutex poisoned").clone()
    }
}

impl DiagnosticsReporter for RecordingDiagnostics {
    fn report(&self, report: &DiagnosticsReport) {
        self.timeline.record("diagnostics:report");
        *self.report.lock().expect("diagnostics mutex poisoned") = Some(report.clone());
    }
}
