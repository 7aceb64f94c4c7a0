//! Collaborators used when no windowing front-end is linked in.
//!
//! They keep the boot sequence whole on a bare host: every call is logged so
//! an operator can see what a full front-end would have been asked to do.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::collaborators::{
    CollaboratorError, DriverLayer, LoadRequest, Platform, PresenceIntegration, SystemInfo,
    WindowLayer,
};
use crate::dispatch::DispatchHandle;

const HEADLESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::headless");

/// Presence integration that never connects.
#[derive(Debug, Default)]
pub struct HeadlessPresence;

impl PresenceIntegration for HeadlessPresence {
    fn initialise(&self) -> Result<(), CollaboratorError> {
        warn!(
            target: HEADLESS_TARGET,
            "presence integration unavailable; status updates disabled"
        );
        Ok(())
    }

    fn shutdown(&self) {
        info!(target: HEADLESS_TARGET, "presence integration released");
    }
}

/// Driver layer that records the dispatcher and threading toggle.
#[derive(Debug, Default)]
pub struct HeadlessDriver {
    dispatch: OnceCell<DispatchHandle>,
    threading: AtomicU8,
}

impl HeadlessDriver {
    const FORCED_OFF: u8 = 1;
    const FORCED_ON: u8 = 2;

    /// Dispatcher attached during boot.
    #[must_use]
    pub fn dispatch_handle(&self) -> Option<&DispatchHandle> {
        self.dispatch.get()
    }

    /// Forced threading state, or `None` when the driver default applies.
    #[must_use]
    pub fn threaded_optimisations(&self) -> Option<bool> {
        match self.threading.load(Ordering::Acquire) {
            Self::FORCED_OFF => Some(false),
            Self::FORCED_ON => Some(true),
            _ => None,
        }
    }
}

impl DriverLayer for HeadlessDriver {
    fn attach_dispatcher(&self, dispatch: DispatchHandle) {
        if self.dispatch.set(dispatch).is_err() {
            warn!(target: HEADLESS_TARGET, "driver dispatcher already attached");
        }
    }

    fn set_threaded_optimisations(&self, enabled: bool) -> Result<(), CollaboratorError> {
        let state = if enabled { Self::FORCED_ON } else { Self::FORCED_OFF };
        self.threading.store(state, Ordering::Release);
        info!(
            target: HEADLESS_TARGET,
            enabled,
            "driver threaded optimisations forced"
        );
        Ok(())
    }
}

/// Window layer that records requested loads.
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    requests: Mutex<Vec<LoadRequest>>,
}

impl HeadlessWindow {
    /// Loads requested so far.
    #[must_use]
    pub fn requests(&self) -> Vec<LoadRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl WindowLayer for HeadlessWindow {
    fn begin_deferred_load(&self, request: LoadRequest) {
        info!(
            target: HEADLESS_TARGET,
            path = %request.path.display(),
            fullscreen = request.fullscreen,
            "deferred load requested; no window layer to run it"
        );
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }
}

/// Platform queries answered from the host process.
#[derive(Debug, Clone, Copy)]
pub struct HostPlatform {
    scale_factor: f64,
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self { scale_factor: 1.0 }
    }
}

impl Platform for HostPlatform {
    fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo::detect()
    }
}
