//! Removal of artefacts left behind by a previous self-update.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, info, warn};

use crate::data_root::HostLocations;

/// Extension carried by binaries replaced during an update.
pub const STALE_EXTENSION: &str = "sableold";

/// Staging directory an update unpacks into under the temporary directory.
pub const UPDATE_STAGING_DIR: &str = "sable-update";

const CLEANUP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cleanup");
const CLEANUP_THREAD_NAME: &str = "sable-cleanup";

/// Counts reported by a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Artefacts removed.
    pub removed: usize,
    /// Artefacts that could not be removed.
    pub failed: usize,
}

/// Locations searched for stale update artefacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleArtifacts {
    executable_dir: PathBuf,
    staging_dir: PathBuf,
}

impl StaleArtifacts {
    /// Derives the locations from the host directories.
    #[must_use]
    pub fn new(host: &HostLocations) -> Self {
        Self {
            executable_dir: host.executable_dir().to_path_buf(),
            staging_dir: host.temp_dir().join(UPDATE_STAGING_DIR),
        }
    }

    /// Removes every stale artefact, logging each failure.
    #[must_use]
    pub fn sweep(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        self.sweep_executable_dir(&mut summary);

        if self.staging_dir.exists() {
            record(
                &mut summary,
                &self.staging_dir,
                fs::remove_dir_all(&self.staging_dir),
            );
        }

        info!(
            target: CLEANUP_TARGET,
            removed = summary.removed,
            failed = summary.failed,
            "stale update artefact sweep finished"
        );
        summary
    }
}

impl StaleArtifacts {
    fn sweep_executable_dir(&self, summary: &mut SweepSummary) {
        let entries = match fs::read_dir(&self.executable_dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(
                    target: CLEANUP_TARGET,
                    dir = %self.executable_dir.display(),
                    error = %error,
                    "failed to scan for stale update artefacts"
                );
                summary.failed += 1;
                return;
            }
        };
        for path in entries.filter_map(Result::ok).map(|entry| entry.path()) {
            if is_stale(&path) {
                record(summary, &path, fs::remove_file(&path));
            }
        }
    }
}

fn is_stale(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|extension| extension == STALE_EXTENSION)
}

fn record(summary: &mut SweepSummary, path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => {
            debug!(target: CLEANUP_TARGET, path = %path.display(), "removed stale artefact");
            summary.removed += 1;
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            warn!(
                target: CLEANUP_TARGET,
                path = %path.display(),
                error = %error,
                "failed to remove stale artefact"
            );
            summary.failed += 1;
        }
    }
}

/// Runs the stale artefact sweep somewhere other than the boot path.
pub trait CleanupScheduler: Send + Sync {
    /// Starts the sweep without waiting for it.
    fn schedule(&self, artifacts: StaleArtifacts);
}

/// Sweeps on a detached background thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedCleanup;

impl CleanupScheduler for DetachedCleanup {
    fn schedule(&self, artifacts: StaleArtifacts) {
        let spawned = thread::Builder::new()
            .name(CLEANUP_THREAD_NAME.to_owned())
            .spawn(move || {
                let summary = artifacts.sweep();
                if summary.failed > 0 {
                    warn!(
                        target: CLEANUP_TARGET,
                        failed = summary.failed,
                        "stale update artefacts left in place"
                    );
                }
                summary
            });
        if let Err(error) = spawned {
            warn!(
                target: CLEANUP_TARGET,
                error = %error,
                "failed to start stale artefact cleanup"
            );
        }
    }
}
