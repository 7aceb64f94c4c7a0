//! Selection and creation of the data root directory.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::BOOT_TARGET;

/// Directory next to the executable that switches the front-end to portable mode.
pub const PORTABLE_DIR_NAME: &str = "portable";

/// Application directory created under the platform configuration directory.
pub const USER_PROFILE_DIR_NAME: &str = "sable";

/// Directory strategy in effect for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    /// Platform per-user configuration directory.
    UserProfile,
    /// `portable` directory beside the executable.
    Portable,
    /// Directory supplied on the command line.
    Custom(PathBuf),
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserProfile => formatter.write_str("user profile"),
            Self::Portable => formatter.write_str("portable"),
            Self::Custom(path) => write!(formatter, "custom path: {}", path.display()),
        }
    }
}

/// Errors raised while locating or creating the data root.
#[derive(Debug, Error)]
pub enum DataRootError {
    /// The running executable could not be located.
    #[error("failed to locate the running executable: {source}")]
    Executable {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The executable path has no parent directory.
    #[error("executable path '{path}' has no parent directory")]
    MissingExecutableParent {
        /// Executable path.
        path: PathBuf,
    },
    /// No platform configuration directory is available.
    #[error("no per-user configuration directory is available on this platform")]
    NoUserProfile,
    /// A relative custom root could not be made absolute.
    #[error("failed to resolve data root '{path}': {source}")]
    Resolve {
        /// Requested directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The data root directory could not be created.
    #[error("failed to create data root '{path}': {source}")]
    Create {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Host directories discovered at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLocations {
    executable_dir: PathBuf,
    config_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

impl HostLocations {
    /// Builds the locations from explicit directories.
    #[must_use]
    pub const fn new(
        executable_dir: PathBuf,
        config_dir: Option<PathBuf>,
        home_dir: Option<PathBuf>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            executable_dir,
            config_dir,
            home_dir,
            temp_dir,
        }
    }

    /// Discovers the locations of the running process.
    pub fn detect() -> Result<Self, DataRootError> {
        let executable = env::current_exe().map_err(|source| DataRootError::Executable { source })?;
        let executable_dir = executable
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| DataRootError::MissingExecutableParent {
                path: executable.clone(),
            })?;
        Ok(Self::new(
            executable_dir,
            dirs::config_dir(),
            dirs::home_dir(),
            env::temp_dir(),
        ))
    }

    /// Directory holding the running executable.
    #[must_use]
    pub fn executable_dir(&self) -> &Path {
        &self.executable_dir
    }

    /// Platform per-user configuration directory.
    #[must_use]
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// Home directory of the current user.
    #[must_use]
    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Platform temporary directory.
    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }
}

/// Base directory for persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRoot {
    path: PathBuf,
    mode: LaunchMode,
}

impl DataRoot {
    /// Chooses the data root and creates it.
    ///
    /// A custom directory wins over a portable directory, which wins over the
    /// platform profile directory.
    pub fn initialise(custom: Option<&Path>, host: &HostLocations) -> Result<Self, DataRootError> {
        let (path, mode) = locate(custom, host)?;

        fs::create_dir_all(&path).map_err(|source| DataRootError::Create {
            path: path.clone(),
            source,
        })?;
        info!(
            target: BOOT_TARGET,
            path = %path.display(),
            mode = %mode,
            "data root ready"
        );
        Ok(Self { path, mode })
    }

    /// Root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strategy that selected the root.
    #[must_use]
    pub const fn mode(&self) -> &LaunchMode {
        &self.mode
    }

    /// Directory for system files such as key material.
    #[must_use]
    pub fn system_dir(&self) -> PathBuf {
        self.path.join("system")
    }
}

fn locate(
    custom: Option<&Path>,
    host: &HostLocations,
) -> Result<(PathBuf, LaunchMode), DataRootError> {
    let Some(requested) = custom else {
        let portable = host.executable_dir().join(PORTABLE_DIR_NAME);
        if portable.is_dir() {
            return Ok((portable, LaunchMode::Portable));
        }
        let config_dir = host.config_dir().ok_or(DataRootError::NoUserProfile)?;
        return Ok((config_dir.join(USER_PROFILE_DIR_NAME), LaunchMode::UserProfile));
    };
    let path = std::path::absolute(requested).map_err(|source| DataRootError::Resolve {
        path: requested.to_path_buf(),
        source,
    })?;
    Ok((path.clone(), LaunchMode::Custom(path)))
}
