//! Candidate locations for the configuration document.

use std::path::{Path, PathBuf};

use crate::resolver::ConfigSource;

/// File name of the configuration document.
pub const CONFIG_FILE_NAME: &str = "Config.json";

/// The two places a configuration document may live, in search order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    local: PathBuf,
    user: PathBuf,
}

impl ConfigPaths {
    /// Derives the candidates from the executable directory and the data root.
    #[must_use]
    pub fn new(executable_dir: &Path, data_root: &Path) -> Self {
        Self {
            local: executable_dir.join(CONFIG_FILE_NAME),
            user: data_root.join(CONFIG_FILE_NAME),
        }
    }

    /// Document colocated with the running executable.
    #[must_use]
    pub fn local(&self) -> &Path {
        self.local.as_path()
    }

    /// Document under the user application-data root.
    #[must_use]
    pub fn user(&self) -> &Path {
        self.user.as_path()
    }

    /// Returns the first candidate that exists; the local document wins.
    pub(crate) fn existing(&self) -> Option<(ConfigSource, &Path)> {
        if self.local.exists() {
            Some((ConfigSource::LocalFile, self.local()))
        } else if self.user.exists() {
            Some((ConfigSource::UserDataFile, self.user()))
        } else {
            None
        }
    }
}
