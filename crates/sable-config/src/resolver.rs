//! Chooses the authoritative configuration document and layers overrides on it.

use std::path::{Path, PathBuf};

use strum::Display;
use thiserror::Error;
use tracing::{info, warn};

use crate::CONFIG_TARGET;
use crate::document::{CURRENT_VERSION, DocumentError, Settings};
use crate::overrides::{OverrideField, OverrideSet};
use crate::paths::ConfigPaths;

/// Which document a resolution pass settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConfigSource {
    /// The document next to the executable.
    LocalFile,
    /// The document under the user data root.
    UserDataFile,
    /// No document existed; defaults were written to the user data root.
    DefaultsWithPersist,
}

/// How a resolution pass concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionOutcome {
    /// The document decoded successfully.
    Loaded,
    /// The document was unreadable; built-in defaults are in effect.
    LoadFailedFallback,
    /// No document existed; built-in defaults were persisted.
    DefaultsWithPersist,
}

/// Non-fatal problems recorded during a resolution pass.
#[derive(Debug, Error)]
pub enum ResolutionWarning {
    /// The document could not be read or decoded and was left on disk as-is.
    #[error("configuration could not be loaded, using defaults: {source}")]
    Corrupt {
        /// Underlying document error.
        #[source]
        source: DocumentError,
    },
    /// Writing the default document failed; defaults remain in memory.
    #[error("failed to persist default configuration: {source}")]
    PersistDefaults {
        /// Underlying document error.
        #[source]
        source: DocumentError,
    },
    /// Writing a migrated document back failed; the migration stays in memory.
    #[error("failed to write migrated configuration: {source}")]
    PersistMigration {
        /// Underlying document error.
        #[source]
        source: DocumentError,
    },
    /// The document declares a schema version newer than this build.
    #[error("configuration '{path}' has schema version {found}, newer than supported {supported}")]
    NewerVersion {
        /// Document path.
        path: PathBuf,
        /// Version recorded in the document.
        found: u32,
        /// Newest version this build understands.
        supported: u32,
    },
    /// An override value matched no known option.
    #[error("ignoring unrecognised {field} override '{value}'")]
    UnrecognisedOverride {
        /// Overridden setting.
        field: OverrideField,
        /// Raw override text.
        value: String,
    },
}

/// Result of a single resolution pass.
#[derive(Debug)]
pub struct Resolution {
    settings: Settings,
    document: Settings,
    source: ConfigSource,
    outcome: ResolutionOutcome,
    path: PathBuf,
    warnings: Vec<ResolutionWarning>,
}

impl Resolution {
    /// Resolved settings with overrides applied.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Settings as read from the document, before overrides were applied.
    #[must_use]
    pub const fn document(&self) -> &Settings {
        &self.document
    }

    /// Document the pass settled on.
    #[must_use]
    pub const fn source(&self) -> ConfigSource {
        self.source
    }

    /// How the pass concluded.
    #[must_use]
    pub const fn outcome(&self) -> ResolutionOutcome {
        self.outcome
    }

    /// Configuration path in effect after the pass.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Non-fatal problems recorded during the pass.
    #[must_use]
    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }

    /// Consumes the resolution, returning the settings.
    #[must_use]
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

/// Resolves the configuration from fixed candidate paths and overrides.
///
/// Resolution is repeatable: every call searches the same paths and reapplies
/// the same overrides, so overrides always win over the file contents.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    paths: ConfigPaths,
    overrides: OverrideSet,
}

impl ConfigResolver {
    /// Builds a resolver over the supplied candidates and overrides.
    #[must_use]
    pub const fn new(paths: ConfigPaths, overrides: OverrideSet) -> Self {
        Self { paths, overrides }
    }

    /// Candidate document paths.
    #[must_use]
    pub const fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Overrides reapplied on every pass.
    #[must_use]
    pub const fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    /// Runs one resolution pass.
    ///
    /// Missing and corrupt documents degrade to built-in defaults; nothing in
    /// this pass is fatal.
    pub fn resolve(&self) -> Resolution {
        let mut warnings = Vec::new();
        let (document, source, outcome, path) = self.read_candidates(&mut warnings);

        let mut settings = document.clone();
        warnings.extend(self.overrides.apply(&mut settings));

        for warning in &warnings {
            warn!(
                target: CONFIG_TARGET,
                warning = %warning,
                "configuration resolution degraded"
            );
        }
        info!(
            target: CONFIG_TARGET,
            source = %source,
            outcome = %outcome,
            path = %path.display(),
            graphics_backend = %settings.graphics_backend,
            docked_mode = settings.docked_mode,
            hide_cursor = %settings.hide_cursor,
            "configuration resolved"
        );

        Resolution {
            settings,
            document,
            source,
            outcome,
            path,
            warnings,
        }
    }
}

impl ConfigResolver {
    fn read_candidates(
        &self,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> (Settings, ConfigSource, ResolutionOutcome, PathBuf) {
        let Some((source, found)) = self.paths.existing() else {
            let user = self.paths.user().to_path_buf();
            return (
                persist_defaults(&user, warnings),
                ConfigSource::DefaultsWithPersist,
                ResolutionOutcome::DefaultsWithPersist,
                user,
            );
        };
        let (settings, outcome) = load_document(found, warnings);
        (settings, source, outcome, found.to_path_buf())
    }
}

fn load_document(
    path: &Path,
    warnings: &mut Vec<ResolutionWarning>,
) -> (Settings, ResolutionOutcome) {
    let mut settings = match Settings::load(path) {
        Ok(settings) => settings,
        Err(source) => {
            warnings.push(ResolutionWarning::Corrupt { source });
            return (Settings::default(), ResolutionOutcome::LoadFailedFallback);
        }
    };

    if settings.is_from_newer_build() {
        warnings.push(ResolutionWarning::NewerVersion {
            path: path.to_path_buf(),
            found: settings.version,
            supported: CURRENT_VERSION,
        });
    } else if settings.migrate() {
        info!(
            target: CONFIG_TARGET,
            path = %path.display(),
            version = settings.version,
            "migrated configuration to current schema"
        );
        if let Err(source) = settings.save(path) {
            warnings.push(ResolutionWarning::PersistMigration { source });
        }
    }

    (settings, ResolutionOutcome::Loaded)
}

fn persist_defaults(path: &Path, warnings: &mut Vec<ResolutionWarning>) -> Settings {
    let settings = Settings::default();
    if let Err(source) = settings.save(path) {
        warnings.push(ResolutionWarning::PersistDefaults { source });
        return settings;
    }
    info!(
        target: CONFIG_TARGET,
        path = %path.display(),
        "no configuration found; wrote defaults"
    );
    settings
}
