use std::io;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

use sable_config::LogLevel;
use thiserror::Error;
use tracing::{error, info};

use super::LIFECYCLE_TARGET;
use super::shutdown::ShutdownHandle;
use crate::telemetry::NOTICE_TARGET;

/// Errors raised while installing process hooks.
#[derive(Debug, Error)]
pub enum HookError {
    /// Registering a termination signal handler failed.
    #[error("failed to register handler for signal {signal}: {source}")]
    Signal {
        /// Signal number.
        signal: i32,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Flag raised when an orderly exit has been requested.
#[derive(Debug, Clone, Default)]
pub struct ExitRequest {
    flag: Arc<AtomicBool>,
}

impl ExitRequest {
    /// Creates a flag with no exit requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an exit.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns true once an exit has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// An unhandled failure captured by the fatal-error hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    /// Failure message.
    pub message: String,
    /// Source location, when known.
    pub location: Option<String>,
    /// Thread that failed.
    pub thread: ThreadId,
    /// Name of the failing thread, when it has one.
    pub thread_name: Option<String>,
}

impl FatalError {
    /// Captures the failure described by a panic.
    #[must_use]
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown failure".to_owned());
        let current = thread::current();
        Self {
            message,
            location: info.location().map(ToString::to_string),
            thread: current.id(),
            thread_name: current.name().map(ToOwned::to_owned),
        }
    }
}

/// Logs fatal errors and runs the shutdown sequence when the process is dying.
#[derive(Debug, Clone)]
pub struct FatalErrorHandler {
    shutdown: ShutdownHandle,
    primary: ThreadId,
    aborts: bool,
}

impl FatalErrorHandler {
    /// Builds a handler treating `primary` as the thread whose failure ends the process.
    #[must_use]
    pub fn new(shutdown: ShutdownHandle, primary: ThreadId) -> Self {
        Self {
            shutdown,
            primary,
            aborts: cfg!(panic = "abort"),
        }
    }

    /// Overrides whether every failure aborts the process.
    #[must_use]
    pub const fn with_abort_on_failure(mut self, aborts: bool) -> Self {
        self.aborts = aborts;
        self
    }

    /// Returns true when a failure on `thread` terminates the process.
    #[must_use]
    pub fn is_terminating(&self, thread: ThreadId) -> bool {
        self.aborts || thread == self.primary
    }

    /// Logs the failure and, if it terminates the process, shuts down.
    ///
    /// Returns whether the failure was treated as terminating.
    pub fn handle(&self, failure: &FatalError) -> bool {
        let terminating = self.is_terminating(failure.thread);
        let error_channel_open = self
            .shutdown
            .logs()
            .is_none_or(|logs| logs.is_enabled(LogLevel::Error));
        let location = failure.location.as_deref().unwrap_or("unknown");
        let thread = failure.thread_name.as_deref().unwrap_or("unnamed");

        if error_channel_open {
            error!(
                target: LIFECYCLE_TARGET,
                event = "fatal_error",
                location,
                thread,
                terminating,
                "unhandled failure: {}",
                failure.message
            );
        } else {
            info!(
                target: NOTICE_TARGET,
                event = "fatal_error",
                location,
                thread,
                terminating,
                "unhandled failure: {}",
                failure.message
            );
        }

        if terminating {
            self.shutdown.run();
        }
        terminating
    }
}

/// Registers process-wide hooks.
pub trait HookInstaller: Send + Sync {
    /// Routes unhandled failures through `handler` for the rest of the process.
    fn install_fatal_error_hook(&self, handler: FatalErrorHandler);

    /// Raises `exit` when the process is asked to terminate.
    fn install_exit_hook(&self, exit: &ExitRequest) -> Result<(), HookError>;
}

/// Installs the panic hook and termination signal handlers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHooks;

impl HookInstaller for SystemHooks {
    fn install_fatal_error_hook(&self, handler: FatalErrorHandler) {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            handler.handle(&FatalError::from_panic(info));
            previous(info);
        }));
    }

    fn install_exit_hook(&self, exit: &ExitRequest) -> Result<(), HookError> {
        for &signal in exit_signals() {
            signal_hook::flag::register(signal, exit.flag())
                .map_err(|source| HookError::Signal { signal, source })?;
        }
        info!(target: LIFECYCLE_TARGET, "exit signal handlers installed");
        Ok(())
    }
}

#[cfg(unix)]
const fn exit_signals() -> &'static [i32] {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
    &[SIGTERM, SIGINT, SIGQUIT, SIGHUP]
}

#[cfg(not(unix))]
const fn exit_signals() -> &'static [i32] {
    signal_hook::consts::TERM_SIGNALS
}
