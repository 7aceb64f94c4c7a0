//! Process-wide access to the resolved configuration.
//!
//! Writers are resolution passes and explicit saves; both take the resolution
//! lock so two passes never interleave. Readers load the current snapshot
//! through an atomic pointer and never block on a writer.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use tracing::info;

use crate::CONFIG_TARGET;
use crate::document::{DocumentError, Settings};
use crate::resolver::{ConfigResolver, ConfigSource, Resolution, ResolutionOutcome};

/// Document that produced the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    /// Configuration path in effect.
    pub path: PathBuf,
    /// Which candidate the pass settled on.
    pub source: ConfigSource,
    /// How the pass concluded.
    pub outcome: ResolutionOutcome,
}

/// Immutable view of the configuration at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    settings: Settings,
    document: Settings,
    active: Option<ActiveDocument>,
}

impl ConfigSnapshot {
    /// Settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Settings as read from the document, without command-line overrides.
    #[must_use]
    pub const fn document(&self) -> &Settings {
        &self.document
    }

    /// Document behind the settings, or `None` before the first pass.
    #[must_use]
    pub const fn active(&self) -> Option<&ActiveDocument> {
        self.active.as_ref()
    }

    /// Configuration path in effect, if resolution has run.
    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|active| active.path.as_path())
    }
}

struct Inner {
    resolver: ConfigResolver,
    current: ArcSwap<ConfigSnapshot>,
    resolving: Mutex<()>,
}

/// Cloneable handle to the shared configuration state.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ConfigHandle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ConfigHandle")
            .field("resolver", &self.inner.resolver)
            .field("current", &self.inner.current.load())
            .finish()
    }
}

impl ConfigHandle {
    /// Creates the handle holding default settings until the first pass runs.
    #[must_use]
    pub fn new(resolver: ConfigResolver) -> Self {
        let placeholder = ConfigSnapshot {
            settings: Settings::default(),
            document: Settings::default(),
            active: None,
        };
        Self {
            inner: Arc::new(Inner {
                resolver,
                current: ArcSwap::from_pointee(placeholder),
                resolving: Mutex::new(()),
            }),
        }
    }

    /// Resolver driving every pass.
    #[must_use]
    pub fn resolver(&self) -> &ConfigResolver {
        &self.inner.resolver
    }

    /// Loads the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.inner.current.load_full()
    }

    /// Returns a copy of the current settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.inner.current.load().settings.clone()
    }

    /// Configuration path in effect, if resolution has run.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> {
        self.inner.current.load().config_path().map(Path::to_path_buf)
    }

    /// Returns true once a resolution pass has published its result.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.current.load().active.is_some()
    }

    /// Runs a resolution pass and publishes its result.
    ///
    /// Concurrent callers are serialised; each publishes a complete snapshot.
    pub fn reload(&self) -> Resolution {
        let _guard = self.lock();
        let resolution = self.inner.resolver.resolve();
        self.inner.current.store(Arc::new(ConfigSnapshot {
            settings: resolution.settings().clone(),
            document: resolution.document().clone(),
            active: Some(ActiveDocument {
                path: resolution.path().to_path_buf(),
                source: resolution.source(),
                outcome: resolution.outcome(),
            }),
        }));
        resolution
    }

    /// Writes the document settings to the path in effect.
    ///
    /// Command-line overrides only last for the session and are never
    /// persisted. Before the first pass the user data path is used. Unknown
    /// keys read from the document are written back unchanged.
    pub fn save(&self) -> Result<PathBuf, DocumentError> {
        let _guard = self.lock();
        let snapshot = self.inner.current.load_full();
        let path = snapshot
            .config_path()
            .unwrap_or_else(|| self.inner.resolver.paths().user())
            .to_path_buf();
        snapshot.document.save(&path)?;
        info!(
            target: CONFIG_TARGET,
            path = %path.display(),
            "configuration saved"
        );
        Ok(path)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.inner
            .resolving
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
