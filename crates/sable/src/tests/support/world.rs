//! BDD test world: isolated host directories, recording collaborators and the
//! outcome of the boot sequence.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use crate::bootstrap::{App, BootError, BootPlan, Collaborators, boot_with};
use crate::data_root::{HostLocations, USER_PROFILE_DIR_NAME};
use crate::keys::{KEYS_FILE_NAME, USER_KEYS_DIR_NAME};
use crate::lifecycle::FatalError;

use super::doubles::{
    FixedPlatform, RecordingCleanup, RecordingDiagnostics, RecordingDriver, RecordingHooks,
    RecordingPresence, RecordingReporter, RecordingTelemetry, RecordingWindow,
};
use super::timeline::Timeline;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    executable_dir: TempDir,
    config_dir: TempDir,
    home_dir: TempDir,
    temp_dir: TempDir,
    pub timeline: Timeline,
    pub reporter: Arc<RecordingReporter>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub hooks: Arc<RecordingHooks>,
    pub presence: Arc<RecordingPresence>,
    pub driver: Arc<RecordingDriver>,
    pub window: Arc<RecordingWindow>,
    pub diagnostics: Arc<RecordingDiagnostics>,
    pub fatal_outcome: Option<bool>,
    arguments: Vec<OsString>,
    app: Option<App>,
    error: Option<BootError>,
}

impl TestWorld {
    /// Builds a world with empty host directories and no arguments.
    #[must_use]
    pub fn new() -> Self {
        let timeline = Timeline::default();
        Self {
            executable_dir: TempDir::new().expect("create executable dir"),
            config_dir: TempDir::new().expect("create config dir"),
            home_dir: TempDir::new().expect("create home dir"),
            temp_dir: TempDir::new().expect("create temp dir"),
            reporter: Arc::new(RecordingReporter::new(timeline.clone())),
            telemetry: Arc::new(RecordingTelemetry::new(timeline.clone())),
            hooks: Arc::new(RecordingHooks::new(timeline.clone())),
            presence: Arc::new(RecordingPresence::new(timeline.clone())),
            driver: Arc::new(RecordingDriver::new(timeline.clone())),
            window: Arc::new(RecordingWindow::new(timeline.clone())),
            diagnostics: Arc::new(RecordingDiagnostics::new(timeline.clone())),
            timeline,
            fatal_outcome: None,
            arguments: vec![OsString::from("sable")],
            app: None,
            error: None,
        }
    }

    /// Host locations rooted in this world's temporary directories.
    #[must_use]
    pub fn host(&self) -> HostLocations {
        HostLocations::new(
            self.executable_dir.path().to_path_buf(),
            Some(self.config_dir.path().to_path_buf()),
            Some(self.home_dir.path().to_path_buf()),
            self.temp_dir.path().to_path_buf(),
        )
    }

    /// Boot plan wired to this world's host directories and doubles.
    #[must_use]
    pub fn plan(&self) -> BootPlan {
        BootPlan::new(self.host())
            .with_collaborators(Collaborators {
                presence: self.presence.clone(),
                driver: self.driver.clone(),
                window: self.window.clone(),
                platform: Arc::new(FixedPlatform::new(self.timeline.clone())),
            })
            .with_reporter(self.reporter.clone())
            .with_diagnostics(self.diagnostics.clone())
            .with_telemetry(self.telemetry.clone())
            .with_hooks(self.hooks.clone())
            .with_cleanup(Arc::new(RecordingCleanup::new(self.timeline.clone())))
    }

    /// Appends a process argument.
    pub fn push_argument(&mut self, argument: impl Into<OsString>) {
        self.arguments.push(argument.into());
    }

    /// Data root used in user profile mode.
    #[must_use]
    pub fn user_profile_root(&self) -> PathBuf {
        self.config_dir.path().join(USER_PROFILE_DIR_NAME)
    }

    /// Configuration document under the user profile root.
    #[must_use]
    pub fn user_config_path(&self) -> PathBuf {
        self.user_profile_root().join("Config.json")
    }

    /// Directory beside the executable.
    #[must_use]
    pub fn executable_dir(&self) -> &Path {
        self.executable_dir.path()
    }

    /// Scratch directory outside the data roots.
    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes the user profile configuration document.
    pub fn write_user_config(&self, contents: &str) {
        fs::create_dir_all(self.user_profile_root()).expect("create user profile root");
        fs::write(self.user_config_path(), contents).expect("write user configuration");
    }

    /// Places key material under the home directory.
    pub fn place_user_keys(&self) {
        let dir = self.home_dir.path().join(USER_KEYS_DIR_NAME);
        fs::create_dir_all(&dir).expect("create key dir");
        fs::write(dir.join(KEYS_FILE_NAME), "keys").expect("write keys");
    }

    /// Runs the boot sequence once.
    pub fn boot(&mut self) {
        if self.app.is_some() || self.error.is_some() {
            return;
        }
        match boot_with(self.plan(), self.arguments.clone()) {
            Ok(app) => self.app = Some(app),
            Err(error) => self.error = Some(error),
        }
    }

    /// Arguments collected so far.
    #[must_use]
    pub fn arguments(&self) -> Vec<OsString> {
        self.arguments.clone()
    }

    /// Booted application.
    #[must_use]
    pub fn app(&self) -> &App {
        match self.app.as_ref() {
            Some(app) => app,
            None => panic!("front-end did not boot: {:?}", self.error),
        }
    }

    /// Error that abandoned boot, if any.
    #[must_use]
    pub fn error(&self) -> Option<&BootError> {
        self.error.as_ref()
    }

    /// Drops the application handle.
    pub fn drop_app(&mut self) {
        self.app = None;
    }

    /// Feeds a failure from `thread` through the installed fatal-error hook.
    pub fn fatal_failure_on(&mut self, thread: thread::ThreadId) {
        let handler = self.hooks.handler().expect("fatal-error hook installed");
        self.fatal_outcome = Some(handler.handle(&FatalError {
            message: "simulated failure".to_owned(),
            location: None,
            thread,
            thread_name: None,
        }));
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture constructor used by behaviour suites.
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
