//! Key material lookup.

use std::path::{Path, PathBuf};

use crate::data_root::DataRoot;

/// File holding the production keys.
pub const KEYS_FILE_NAME: &str = "prod.keys";

/// Directory under the home directory searched in user mode.
pub const USER_KEYS_DIR_NAME: &str = ".sable";

/// Result of a key lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    /// Keys were found at the path.
    Found(PathBuf),
    /// Keys were found at neither location.
    Missing,
}

impl KeyStatus {
    /// Returns true when no key file was found.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// The two places key material may live, in search order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLocations {
    local: PathBuf,
    user: Option<PathBuf>,
}

impl KeyLocations {
    /// Derives the candidates from the data root and home directory.
    #[must_use]
    pub fn new(data_root: &DataRoot, home_dir: Option<&Path>) -> Self {
        Self {
            local: data_root.system_dir().join(KEYS_FILE_NAME),
            user: home_dir.map(|home| home.join(USER_KEYS_DIR_NAME).join(KEYS_FILE_NAME)),
        }
    }

    /// Candidate under the data root.
    #[must_use]
    pub fn local(&self) -> &Path {
        &self.local
    }

    /// Candidate under the home directory, if there is one.
    #[must_use]
    pub fn user(&self) -> Option<&Path> {
        self.user.as_deref()
    }

    /// Looks for key material, local candidate first.
    #[must_use]
    pub fn check(&self) -> KeyStatus {
        std::iter::once(self.local.as_path())
            .chain(self.user.as_deref())
            .find(|path| path.is_file())
            .map_or(KeyStatus::Missing, |path| KeyStatus::Found(path.to_path_buf()))
    }
}
