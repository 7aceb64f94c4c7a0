//! Configuration document model and resolution for the Sable front-end.
//!
//! A single JSON document (`Config.json`) carries the persisted settings. The
//! [`ConfigResolver`] chooses which copy of that document is authoritative,
//! falls back to built-in defaults when the document is missing or unreadable,
//! and layers command-line overrides on top of whatever the file produced.
//!
//! Resolution never fails: every problem degrades to a documented fallback
//! and is reported as a [`ResolutionWarning`]. The [`ConfigHandle`] publishes
//! the resolved settings to the rest of the process as immutable snapshots,
//! serialising resolution passes so a reload can be triggered from any thread.

mod document;
mod logging;
mod options;
mod overrides;
mod paths;
mod resolver;
mod shared;

pub use document::{CURRENT_VERSION, DocumentError, LoggingSettings, Settings};
pub use logging::{LogFormat, LogFormatParseError, LogLevel};
pub use options::{BackendThreadingMode, GraphicsBackend, HideCursorMode, OptionParseError};
pub use overrides::{OverrideField, OverrideSet};
pub use paths::{CONFIG_FILE_NAME, ConfigPaths};
pub use resolver::{
    ConfigResolver, ConfigSource, Resolution, ResolutionOutcome, ResolutionWarning,
};
pub use shared::{ActiveDocument, ConfigHandle, ConfigSnapshot};

/// Tracing target used for configuration resolution events.
pub(crate) const CONFIG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::resolver");
