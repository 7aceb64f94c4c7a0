//! One-shot environment report emitted after configuration resolution.

use std::collections::BTreeSet;

use sable_config::{LogLevel, Settings};

use crate::collaborators::{Platform, SystemInfo};
use crate::data_root::LaunchMode;

const DIAGNOSTICS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::diagnostics");

/// Marker emitted when no log level is enabled.
pub const NO_LEVELS: &str = "none";

/// Facts gathered for the diagnostics report.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsReport {
    /// Front-end version.
    pub version: &'static str,
    /// Host facts.
    pub system: SystemInfo,
    /// Display scale factor.
    pub scale_factor: f64,
    /// Enabled log levels.
    pub enabled_levels: BTreeSet<LogLevel>,
    /// Data root strategy in effect.
    pub launch_mode: LaunchMode,
}

impl DiagnosticsReport {
    /// Gathers the report from resolved settings and platform facts.
    #[must_use]
    pub fn gather(
        settings: &Settings,
        launch_mode: &LaunchMode,
        platform: &dyn Platform,
        scale_factor: f64,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            system: platform.system_info(),
            scale_factor,
            enabled_levels: settings.logging.enabled_levels.clone(),
            launch_mode: launch_mode.clone(),
        }
    }

    /// Enabled levels as a comma-separated list, or [`NO_LEVELS`].
    #[must_use]
    pub fn levels_line(&self) -> String {
        if self.enabled_levels.is_empty() {
            return NO_LEVELS.to_owned();
        }
        self.enabled_levels
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Emits the diagnostics report.
pub trait DiagnosticsReporter: Send + Sync {
    /// Emits `report`.
    fn report(&self, report: &DiagnosticsReport);
}

/// Reporter writing the report as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredDiagnosticsReporter;

impl DiagnosticsReporter for StructuredDiagnosticsReporter {
    fn report(&self, report: &DiagnosticsReport) {
        tracing::info!(
            target: DIAGNOSTICS_TARGET,
            event = "version",
            version = report.version,
            "sable {}",
            report.version
        );
        tracing::info!(
            target: DIAGNOSTICS_TARGET,
            event = "system",
            os = %report.system.os,
            family = %report.system.family,
            arch = %report.system.arch,
            logical_cpus = report.system.logical_cpus,
            scale_factor = report.scale_factor,
            "host system"
        );
        tracing::info!(
            target: DIAGNOSTICS_TARGET,
            event = "log_levels",
            levels = %report.levels_line(),
            "enabled log levels"
        );
        tracing::info!(
            target: DIAGNOSTICS_TARGET,
            event = "launch_mode",
            mode = %report.launch_mode,
            "launch mode: {}",
            report.launch_mode
        );
    }
}
