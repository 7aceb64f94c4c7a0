//! Launch argument surface.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use sable_config::{LogFormat, OverrideSet};

/// Arguments accepted by the `sable` binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    name = "sable",
    version,
    about = "Start the Sable front-end",
    long_about = None
)]
pub struct LaunchArguments {
    /// Use this directory as the data root instead of the platform default.
    #[arg(short = 'r', long = "root-data-dir", value_name = "PATH")]
    pub root_data_dir: Option<PathBuf>,
    /// Start the launched title in fullscreen.
    #[arg(short = 'f', long)]
    pub fullscreen: bool,
    /// Override the graphics backend (`opengl` or `vulkan`).
    #[arg(short = 'g', long = "graphics-backend", value_name = "NAME")]
    pub graphics_backend: Option<String>,
    /// Force docked mode.
    #[arg(long = "docked-mode", conflicts_with = "handheld_mode")]
    pub docked_mode: bool,
    /// Force handheld mode.
    #[arg(long = "handheld-mode")]
    pub handheld_mode: bool,
    /// Override the cursor hiding policy (`never`, `onidle` or `always`).
    #[arg(long = "hide-cursor", value_name = "MODE")]
    pub hide_cursor: Option<String>,
    /// Log output format.
    #[arg(long = "log-format", value_name = "FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
    /// Title to load once start-up completes.
    #[arg(value_name = "LAUNCH_PATH")]
    pub launch_path: Option<PathBuf>,
}

impl LaunchArguments {
    /// Parses the arguments, including the program name in first position.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Overrides to reapply on every resolution pass.
    #[must_use]
    pub fn overrides(&self) -> OverrideSet {
        OverrideSet {
            graphics_backend: self.graphics_backend.clone(),
            docked_mode: self.docked_override(),
            hide_cursor: self.hide_cursor.clone(),
        }
    }

    const fn docked_override(&self) -> Option<bool> {
        match (self.docked_mode, self.handheld_mode) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}
