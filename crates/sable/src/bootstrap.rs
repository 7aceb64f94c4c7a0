//! The start-up sequence and the application handle it produces.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sable_config::{
    ConfigHandle, ConfigPaths, ConfigResolver, DocumentError, Resolution, Settings,
};
use thiserror::Error;
use tracing::info;

use crate::BOOT_TARGET;
use crate::cleanup::{CleanupScheduler, DetachedCleanup, StaleArtifacts};
use crate::cli::LaunchArguments;
use crate::collaborators::{DriverLayer, LoadRequest, Platform, PresenceIntegration, WindowLayer};
use crate::data_root::{DataRoot, DataRootError, HostLocations, LaunchMode};
use crate::diagnostics::{DiagnosticsReport, DiagnosticsReporter, StructuredDiagnosticsReporter};
use crate::dispatch::{DispatchError, DispatchHandle, UiDispatcher};
use crate::headless::{HeadlessDriver, HeadlessPresence, HeadlessWindow, HostPlatform};
use crate::keys::{KeyLocations, KeyStatus};
use crate::lifecycle::{
    ExitRequest, FatalErrorHandler, HookInstaller, ShutdownHandle, SystemHooks,
};
use crate::reporter::{BootReporter, BootStep, StructuredBootReporter};
use crate::telemetry::{LogSink, SystemTelemetry, Telemetry, TelemetryHandle};

/// Interval at which the run loop checks for an exit request.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors that abandon start-up.
#[derive(Debug, Error)]
pub enum BootError {
    /// The process arguments were rejected, or help or version was requested.
    #[error(transparent)]
    Arguments(#[from] clap::Error),
    /// The data root could not be located or created.
    #[error("failed to prepare data root: {source}")]
    DataRoot {
        /// Underlying data root error.
        #[source]
        source: DataRootError,
    },
}

impl From<DataRootError> for BootError {
    fn from(source: DataRootError) -> Self {
        Self::DataRoot { source }
    }
}

/// Subsystems the boot sequence drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Presence integration.
    pub presence: Arc<dyn PresenceIntegration>,
    /// Input and driver layer.
    pub driver: Arc<dyn DriverLayer>,
    /// Window and session layer.
    pub window: Arc<dyn WindowLayer>,
    /// Platform queries.
    pub platform: Arc<dyn Platform>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            presence: Arc::new(HeadlessPresence),
            driver: Arc::new(HeadlessDriver::default()),
            window: Arc::new(HeadlessWindow::default()),
            platform: Arc::new(HostPlatform::default()),
        }
    }
}

/// Everything the boot sequence needs besides the process arguments.
#[derive(Clone)]
pub struct BootPlan {
    host: HostLocations,
    collaborators: Collaborators,
    reporter: Arc<dyn BootReporter>,
    diagnostics: Arc<dyn DiagnosticsReporter>,
    telemetry: Arc<dyn Telemetry>,
    hooks: Arc<dyn HookInstaller>,
    cleanup: Arc<dyn CleanupScheduler>,
}

impl BootPlan {
    /// Builds the production plan for `host`.
    #[must_use]
    pub fn new(host: HostLocations) -> Self {
        Self {
            host,
            collaborators: Collaborators::default(),
            reporter: Arc::new(StructuredBootReporter),
            diagnostics: Arc::new(StructuredDiagnosticsReporter),
            telemetry: Arc::new(SystemTelemetry),
            hooks: Arc::new(SystemHooks),
            cleanup: Arc::new(DetachedCleanup),
        }
    }

    /// Replaces the external subsystems.
    #[must_use]
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Replaces the boot progress reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn BootReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replaces the diagnostics reporter.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsReporter>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Replaces the logging installer.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Replaces the process hook installer.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn HookInstaller>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the stale artefact cleanup scheduler.
    #[must_use]
    pub fn with_cleanup(mut self, cleanup: Arc<dyn CleanupScheduler>) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Boots the front-end on the running host.
pub fn boot<I, T>(args: I) -> Result<App, BootError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let host = HostLocations::detect()
        .map_err(BootError::from)
        .inspect_err(|error| StructuredBootReporter.boot_failed(error))?;
    boot_with(BootPlan::new(host), args)
}

/// Runs the boot sequence described by `plan`.
///
/// Only argument errors and data root failures abandon boot. Every other
/// problem is reported as a degraded step and boot carries on.
pub fn boot_with<I, T>(plan: BootPlan, args: I) -> Result<App, BootError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let reporter = Arc::clone(&plan.reporter);
    reporter.boot_starting();
    run_sequence(plan, args)
        .inspect(|app| reporter.boot_succeeded(&app.settings()))
        .inspect_err(|error| reporter.boot_failed(error))
}

fn run_sequence<I, T>(plan: BootPlan, args: I) -> Result<App, BootError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let BootPlan {
        host,
        collaborators,
        reporter,
        diagnostics,
        telemetry,
        hooks,
        cleanup,
    } = plan;

    let arguments = LaunchArguments::try_parse_args(args)?;
    reporter.step_completed(BootStep::ParseArguments);

    cleanup.schedule(StaleArtifacts::new(&host));
    reporter.step_completed(BootStep::ScheduleCleanup);

    let shutdown = ShutdownHandle::new();
    let exit = ExitRequest::new();
    hooks.install_fatal_error_hook(FatalErrorHandler::new(
        shutdown.clone(),
        thread::current().id(),
    ));
    report_step(
        reporter.as_ref(),
        BootStep::InstallHooks,
        hooks.install_exit_hook(&exit),
    );

    let data_root = DataRoot::initialise(arguments.root_data_dir.as_deref(), &host)?;
    reporter.step_completed(BootStep::InitialiseDataRoot);

    let config = ConfigHandle::new(ConfigResolver::new(
        ConfigPaths::new(host.executable_dir(), data_root.path()),
        arguments.overrides(),
    ));
    let logs = telemetry
        .initialise(arguments.log_format)
        .inspect(|_| reporter.step_completed(BootStep::InitialiseLogging))
        .unwrap_or_else(|error| {
            reporter.step_degraded(BootStep::InitialiseLogging, &error.to_string());
            Arc::new(TelemetryHandle::default())
        });
    shutdown.attach_logs(Arc::clone(&logs));

    let Collaborators {
        presence,
        driver,
        window,
        platform,
    } = collaborators;
    shutdown.attach_presence(Arc::clone(&presence));
    report_step(
        reporter.as_ref(),
        BootStep::InitialisePresence,
        presence.initialise(),
    );

    let dispatcher = UiDispatcher::new();
    driver.attach_dispatcher(dispatcher.handle());
    reporter.step_completed(BootStep::WireDispatcher);

    let resolution = config.reload();
    logs.apply_levels(&resolution.settings().logging);
    report_resolution(reporter.as_ref(), &resolution);
    let settings = resolution.into_settings();

    let scale_factor = platform.scale_factor();
    reporter.step_completed(BootStep::ReadScaleFactor);

    diagnostics.report(&DiagnosticsReport::gather(
        &settings,
        data_root.mode(),
        platform.as_ref(),
        scale_factor,
    ));
    reporter.step_completed(BootStep::ReportDiagnostics);

    apply_driver_threading(reporter.as_ref(), driver.as_ref(), &settings);

    let keys = KeyLocations::new(&data_root, host.home_dir()).check();
    if keys.is_missing() {
        reporter.step_degraded(BootStep::CheckKeys, "key material not found");
    } else {
        reporter.step_completed(BootStep::CheckKeys);
    }

    defer_launch(reporter.as_ref(), window.as_ref(), &arguments, &settings);

    Ok(App {
        config,
        data_root,
        logs,
        dispatcher,
        shutdown,
        exit,
        keys,
        scale_factor,
        arguments,
    })
}

fn report_step<E: std::fmt::Display>(
    reporter: &dyn BootReporter,
    step: BootStep,
    outcome: Result<(), E>,
) {
    if let Err(error) = outcome {
        reporter.step_degraded(step, &error.to_string());
        return;
    }
    reporter.step_completed(step);
}

fn apply_driver_threading(
    reporter: &dyn BootReporter,
    driver: &dyn DriverLayer,
    settings: &Settings,
) {
    let Some(enabled) = settings.backend_threading.forced() else {
        reporter.step_skipped(BootStep::ApplyDriverThreading);
        return;
    };
    report_step(
        reporter,
        BootStep::ApplyDriverThreading,
        driver.set_threaded_optimisations(enabled),
    );
}

fn defer_launch(
    reporter: &dyn BootReporter,
    window: &dyn WindowLayer,
    arguments: &LaunchArguments,
    settings: &Settings,
) {
    let Some(path) = arguments.launch_path.clone() else {
        reporter.step_skipped(BootStep::DeferLaunch);
        return;
    };
    window.begin_deferred_load(LoadRequest {
        path,
        fullscreen: arguments.fullscreen || settings.start_fullscreen,
    });
    reporter.step_completed(BootStep::DeferLaunch);
}

fn report_resolution(reporter: &dyn BootReporter, resolution: &Resolution) {
    if resolution.warnings().is_empty() {
        reporter.step_completed(BootStep::ResolveConfiguration);
        return;
    }
    for warning in resolution.warnings() {
        reporter.step_degraded(BootStep::ResolveConfiguration, &warning.to_string());
    }
}

/// The booted front-end.
///
/// Dropping the handle runs the shutdown sequence if it has not run yet.
pub struct App {
    config: ConfigHandle,
    data_root: DataRoot,
    logs: Arc<dyn LogSink>,
    dispatcher: UiDispatcher,
    shutdown: ShutdownHandle,
    exit: ExitRequest,
    keys: KeyStatus,
    scale_factor: f64,
    arguments: LaunchArguments,
}

impl std::fmt::Debug for App {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("App")
            .field("config", &self.config)
            .field("data_root", &self.data_root)
            .field("keys", &self.keys)
            .field("scale_factor", &self.scale_factor)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Shared configuration handle.
    #[must_use]
    pub const fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Copy of the settings currently in effect.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.config.settings()
    }

    /// Configuration path in effect, for display and explicit re-save.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.config_path()
    }

    /// Data root chosen during boot.
    #[must_use]
    pub const fn data_root(&self) -> &DataRoot {
        &self.data_root
    }

    /// Data root strategy in effect.
    #[must_use]
    pub const fn launch_mode(&self) -> &LaunchMode {
        self.data_root.mode()
    }

    /// Returns true when no key material was found during boot.
    #[must_use]
    pub const fn missing_keys(&self) -> bool {
        self.keys.is_missing()
    }

    /// Key file found during boot, if any.
    #[must_use]
    pub fn keys_path(&self) -> Option<&Path> {
        match &self.keys {
            KeyStatus::Found(path) => Some(path),
            KeyStatus::Missing => None,
        }
    }

    /// Display scale factor read during boot.
    #[must_use]
    pub const fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Arguments the process was started with.
    #[must_use]
    pub const fn arguments(&self) -> &LaunchArguments {
        &self.arguments
    }

    /// Handle for enqueuing work on the UI context.
    #[must_use]
    pub fn dispatch_handle(&self) -> DispatchHandle {
        self.dispatcher.handle()
    }

    /// Runs queued UI work without waiting.
    pub fn pump(&self) -> Result<usize, DispatchError> {
        self.dispatcher.pump()
    }

    /// Flag that ends [`App::run`] when raised.
    #[must_use]
    pub fn exit_request(&self) -> ExitRequest {
        self.exit.clone()
    }

    /// Handle onto the shutdown sequence.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Re-runs configuration resolution and re-applies the log levels.
    pub fn reload(&self) -> Resolution {
        let resolution = self.config.reload();
        self.logs.apply_levels(&resolution.settings().logging);
        info!(
            target: BOOT_TARGET,
            outcome = %resolution.outcome(),
            path = %resolution.path().display(),
            "configuration reloaded"
        );
        resolution
    }

    /// Writes the document settings, without overrides, to the configuration path.
    pub fn save_config(&self) -> Result<PathBuf, DocumentError> {
        self.config.save()
    }

    /// Pumps the UI queue until an exit is requested.
    pub fn run(&self) -> Result<(), DispatchError> {
        info!(target: BOOT_TARGET, "entering run loop");
        while !self.exit.is_requested() {
            self.dispatcher.pump_for(POLL_INTERVAL)?;
        }
        info!(target: BOOT_TARGET, "exit requested");
        Ok(())
    }

    /// Runs the shutdown sequence, returning false if it had already run.
    pub fn shutdown(&self) -> bool {
        self.shutdown.run()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown.run();
    }
}
