//! The persisted configuration document.
//!
//! The document is JSON. Known keys map onto typed fields; every other key is
//! kept in an `extra` map so a read-modify-write cycle never drops settings
//! this build does not understand.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::logging::LogLevel;
use crate::options::{BackendThreadingMode, GraphicsBackend, HideCursorMode};

/// Schema version written by this build.
pub const CURRENT_VERSION: u32 = 2;

/// Version assumed for documents that predate the `version` key.
const LEGACY_VERSION: u32 = 1;

const fn legacy_version() -> u32 {
    LEGACY_VERSION
}

/// In-memory mirror of the configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Schema version of the document.
    #[serde(default = "legacy_version")]
    pub version: u32,
    /// Rendering backend.
    pub graphics_backend: GraphicsBackend,
    /// Whether the emulated console runs docked.
    pub docked_mode: bool,
    /// Cursor hiding policy.
    pub hide_cursor: HideCursorMode,
    /// Host driver threading policy.
    pub backend_threading: BackendThreadingMode,
    /// Whether games start in fullscreen.
    pub start_fullscreen: bool,
    /// Logging verbosity.
    pub logging: LoggingSettings,
    /// Keys this build does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            graphics_backend: GraphicsBackend::default(),
            docked_mode: true,
            hide_cursor: HideCursorMode::default(),
            backend_threading: BackendThreadingMode::default(),
            start_fullscreen: false,
            logging: LoggingSettings::default(),
            extra: Map::new(),
        }
    }
}

/// Logging section of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Severities that reach the log sinks.
    pub enabled_levels: BTreeSet<LogLevel>,
    /// Unrecognised logging keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled_levels: BTreeSet::from([LogLevel::Info, LogLevel::Warning, LogLevel::Error]),
            extra: Map::new(),
        }
    }
}

impl LoggingSettings {
    /// Returns true when the level is enabled.
    #[must_use]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.enabled_levels.contains(&level)
    }
}

/// Errors raised while reading or writing the document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The document is not a valid configuration.
    #[error("failed to parse configuration '{path}': {source}")]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// Encoding the settings failed.
    #[error("failed to serialise configuration: {source}")]
    Serialise {
        /// Underlying encode error.
        #[source]
        source: serde_json::Error,
    },
    /// The directory holding the document could not be created.
    #[error("failed to create configuration directory '{path}': {source}")]
    CreateDirectory {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the document failed.
    #[error("failed to write configuration '{path}': {source}")]
    Write {
        /// Document path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Settings {
    /// Reads and decodes the document at `path`.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let contents = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| DocumentError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Encodes the settings and replaces the document at `path`.
    ///
    /// The document is written to a sibling file first and renamed into place
    /// so readers never observe a truncated document.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| DocumentError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut encoded = serde_json::to_vec_pretty(self)
            .map_err(|source| DocumentError::Serialise { source })?;
        encoded.push(b'\n');

        let staging = staging_path(path);
        let write_error = |source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut file = fs::File::create(&staging).map_err(write_error)?;
        file.write_all(&encoded).map_err(write_error)?;
        file.sync_all().map_err(write_error)?;
        drop(file);
        fs::rename(&staging, path).map_err(write_error)
    }

    /// Returns true when the document predates the current schema.
    #[must_use]
    pub const fn is_outdated(&self) -> bool {
        self.version < CURRENT_VERSION
    }

    /// Returns true when the document was written by a newer build.
    #[must_use]
    pub const fn is_from_newer_build(&self) -> bool {
        self.version > CURRENT_VERSION
    }

    /// Upgrades an outdated document in place, returning whether anything changed.
    ///
    /// Fields introduced since the document's version already carry their
    /// defaults after decoding, so migration only has to stamp the version.
    pub const fn migrate(&mut self) -> bool {
        if !self.is_outdated() {
            return false;
        }
        self.version = CURRENT_VERSION;
        true
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
