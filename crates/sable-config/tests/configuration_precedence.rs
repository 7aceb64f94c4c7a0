//! Behavioural coverage for configuration document precedence and fallback.

use std::cell::RefCell;
use std::fs;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use sable_config::{
    ConfigHandle, ConfigPaths, ConfigResolver, ConfigSource, GraphicsBackend, HideCursorMode,
    OverrideSet, ResolutionOutcome, ResolutionWarning, Settings,
};

struct Harness {
    executable_dir: TempDir,
    data_root: TempDir,
    overrides: RefCell<OverrideSet>,
    handle: RefCell<Option<ConfigHandle>>,
    outcome: RefCell<Option<ResolutionOutcome>>,
    warnings: RefCell<Vec<String>>,
}

impl Harness {
    fn new() -> Self {
        let executable_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create executable directory: {error}"),
        };
        let data_root = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create data root: {error}"),
        };
        Self {
            executable_dir,
            data_root,
            overrides: RefCell::new(OverrideSet::default()),
            handle: RefCell::new(None),
            outcome: RefCell::new(None),
            warnings: RefCell::new(Vec::new()),
        }
    }

    fn paths(&self) -> ConfigPaths {
        ConfigPaths::new(self.executable_dir.path(), self.data_root.path())
    }

    fn write_user_document(&self, contents: &str) {
        if let Err(error) = fs::write(self.paths().user(), contents) {
            panic!("failed to write configuration: {error}");
        }
    }

    fn write_local_document(&self, contents: &str) {
        if let Err(error) = fs::write(self.paths().local(), contents) {
            panic!("failed to write configuration: {error}");
        }
    }

    fn resolve(&self) {
        let handle = self.handle.borrow_mut().get_or_insert_with(|| {
            ConfigHandle::new(ConfigResolver::new(
                self.paths(),
                self.overrides.borrow().clone(),
            ))
        }).clone();
        let resolution = handle.reload();
        *self.outcome.borrow_mut() = Some(resolution.outcome());
        *self.warnings.borrow_mut() = resolution
            .warnings()
            .iter()
            .map(|warning: &ResolutionWarning| warning.to_string())
            .collect();
    }

    fn settings(&self) -> Settings {
        match self.handle.borrow().as_ref() {
            Some(handle) => handle.settings(),
            None => panic!("configuration was not resolved"),
        }
    }

    fn source(&self) -> Option<ConfigSource> {
        self.handle
            .borrow()
            .as_ref()
            .and_then(|handle| handle.snapshot().active().map(|active| active.source))
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("no configuration document exists")]
fn given_no_document(harness: &Harness) {
    assert!(!harness.paths().local().exists());
    assert!(!harness.paths().user().exists());
}

#[given("a user configuration selecting the \"{backend}\" graphics backend")]
fn given_user_backend(harness: &Harness, backend: String) {
    harness.write_user_document(&format!(
        r#"{{ "version": 2, "graphics_backend": "{backend}" }}"#
    ));
}

#[given("a local configuration selecting the \"{backend}\" graphics backend")]
fn given_local_backend(harness: &Harness, backend: String) {
    harness.write_local_document(&format!(
        r#"{{ "version": 2, "graphics_backend": "{backend}" }}"#
    ));
}

#[given("a corrupt user configuration")]
fn given_corrupt_document(harness: &Harness) {
    harness.write_user_document("{ \"docked_mode\": tru");
}

#[given("the command line requests the \"{backend}\" graphics backend")]
fn given_backend_override(harness: &Harness, backend: String) {
    harness.overrides.borrow_mut().graphics_backend = Some(backend);
}

#[given("the command line requests the \"{mode}\" cursor mode")]
fn given_cursor_override(harness: &Harness, mode: String) {
    harness.overrides.borrow_mut().hide_cursor = Some(mode);
}

#[when("the configuration is resolved")]
fn when_resolved(harness: &Harness) {
    harness.resolve();
}

#[when("the configuration is resolved again")]
fn when_resolved_again(harness: &Harness) {
    harness.resolve();
}

#[then("the built-in defaults are in effect")]
fn then_defaults(harness: &Harness) {
    assert_eq!(harness.settings(), Settings::default());
}

#[then("a default document is written to the user data root")]
fn then_default_document_written(harness: &Harness) {
    let written = match Settings::load(harness.paths().user()) {
        Ok(settings) => settings,
        Err(error) => panic!("default document missing: {error}"),
    };
    assert_eq!(written, Settings::default());
    assert_eq!(
        *harness.outcome.borrow(),
        Some(ResolutionOutcome::DefaultsWithPersist)
    );
}

#[then("the graphics backend is \"{backend}\"")]
fn then_backend(harness: &Harness, backend: String) {
    let expected = match backend.parse::<GraphicsBackend>() {
        Ok(expected) => expected,
        Err(error) => panic!("invalid expected backend '{backend}': {error}"),
    };
    assert_eq!(harness.settings().graphics_backend, expected);
}

#[then("the cursor mode is \"{mode}\"")]
fn then_cursor(harness: &Harness, mode: String) {
    let expected = match mode.parse::<HideCursorMode>() {
        Ok(expected) => expected,
        Err(error) => panic!("invalid expected cursor mode '{mode}': {error}"),
    };
    assert_eq!(harness.settings().hide_cursor, expected);
}

#[then("the local document is in effect")]
fn then_local_source(harness: &Harness) {
    assert_eq!(harness.source(), Some(ConfigSource::LocalFile));
}

#[then("the user document is in effect")]
fn then_user_source(harness: &Harness) {
    assert_eq!(harness.source(), Some(ConfigSource::UserDataFile));
}

#[then("the resolution fell back to defaults")]
fn then_fallback(harness: &Harness) {
    assert_eq!(
        *harness.outcome.borrow(),
        Some(ResolutionOutcome::LoadFailedFallback)
    );
}

#[then("a warning mentions \"{fragment}\"")]
fn then_warning(harness: &Harness, fragment: String) {
    let warnings = harness.warnings.borrow();
    assert!(
        warnings.iter().any(|warning| warning.contains(&fragment)),
        "expected a warning mentioning {fragment:?}, got {warnings:?}"
    );
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Missing documents produce persisted defaults"
)]
fn missing_documents_persist_defaults(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Command-line overrides win over the user document"
)]
fn command_line_overrides_win(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The local document shadows the user document"
)]
fn local_document_shadows_user_document(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Corrupt documents fall back to defaults"
)]
fn corrupt_documents_fall_back(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Unrecognised cursor overrides are ignored"
)]
fn unrecognised_cursor_override_is_ignored(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Overrides are reapplied on every pass"
)]
fn overrides_reapply_on_every_pass(#[from(harness)] harness: Harness) {
    drop(harness);
}
