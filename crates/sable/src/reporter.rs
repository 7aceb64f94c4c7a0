//! Structured reporting of boot progress.

use std::sync::Arc;

use sable_config::Settings;
use strum::Display;

use crate::BOOT_TARGET;
use crate::bootstrap::BootError;

/// Steps of the boot sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BootStep {
    /// Process arguments parsed.
    ParseArguments,
    /// Stale update artefact sweep started.
    ScheduleCleanup,
    /// Fatal-error and exit hooks installed.
    InstallHooks,
    /// Data root chosen and created.
    InitialiseDataRoot,
    /// Placeholder configuration and logging installed.
    InitialiseLogging,
    /// Presence integration connected.
    InitialisePresence,
    /// UI dispatcher handed to the driver layer.
    WireDispatcher,
    /// First configuration resolution pass.
    ResolveConfiguration,
    /// Display scale factor read.
    ReadScaleFactor,
    /// Diagnostics report emitted.
    ReportDiagnostics,
    /// Driver threading toggle applied.
    ApplyDriverThreading,
    /// Key material looked up.
    CheckKeys,
    /// Command-line title handed to the window layer.
    DeferLaunch,
}

/// Observer of boot progress.
pub trait BootReporter: Send + Sync {
    /// Invoked before the first step.
    fn boot_starting(&self);

    /// Invoked after a step completes.
    fn step_completed(&self, step: BootStep);

    /// Invoked when a step completes in a degraded state.
    fn step_degraded(&self, step: BootStep, reason: &str);

    /// Invoked when a step has nothing to do.
    fn step_skipped(&self, step: BootStep);

    /// Invoked after every step has run.
    fn boot_succeeded(&self, settings: &Settings);

    /// Invoked when boot is abandoned.
    fn boot_failed(&self, error: &BootError);
}

impl<T> BootReporter for Arc<T>
where
    T: BootReporter + ?Sized,
{
    fn boot_starting(&self) {
        (**self).boot_starting();
    }

    fn step_completed(&self, step: BootStep) {
        (**self).step_completed(step);
    }

    fn step_degraded(&self, step: BootStep, reason: &str) {
        (**self).step_degraded(step, reason);
    }

    fn step_skipped(&self, step: BootStep) {
        (**self).step_skipped(step);
    }

    fn boot_succeeded(&self, settings: &Settings) {
        (**self).boot_succeeded(settings);
    }

    fn boot_failed(&self, error: &BootError) {
        (**self).boot_failed(error);
    }
}

/// Default reporter that records boot progress using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredBootReporter;

impl BootReporter for StructuredBootReporter {
    fn boot_starting(&self) {
        tracing::info!(target: BOOT_TARGET, event = "boot_starting", "starting up");
    }

    fn step_completed(&self, step: BootStep) {
        tracing::debug!(
            target: BOOT_TARGET,
            event = "step_completed",
            step = %step,
            "boot step completed"
        );
    }

    fn step_degraded(&self, step: BootStep, reason: &str) {
        tracing::warn!(
            target: BOOT_TARGET,
            event = "step_degraded",
            step = %step,
            reason,
            "boot step degraded"
        );
    }

    fn step_skipped(&self, step: BootStep) {
        tracing::debug!(
            target: BOOT_TARGET,
            event = "step_skipped",
            step = %step,
            "boot step skipped"
        );
    }

    fn boot_succeeded(&self, settings: &Settings) {
        tracing::info!(
            target: BOOT_TARGET,
            event = "boot_succeeded",
            graphics_backend = %settings.graphics_backend,
            docked_mode = settings.docked_mode,
            hide_cursor = %settings.hide_cursor,
            backend_threading = %settings.backend_threading,
            "start-up complete"
        );
    }

    fn boot_failed(&self, error: &BootError) {
        tracing::error!(
            target: BOOT_TARGET,
            event = "boot_failed",
            error = %error,
            "start-up failed"
        );
    }
}
