//! Structured logging for the front-end.
//!
//! The subscriber is installed once, before configuration resolution, with the
//! built-in level set. The resolved levels are applied afterwards through a
//! shared [`LevelMask`] that the layer filter consults on every event, so a
//! reload changes verbosity without reinstalling anything.

use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use once_cell::sync::OnceCell;
use sable_config::{LogFormat, LogLevel, LoggingSettings};
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

/// Target for events that must be emitted whatever the enabled levels are.
pub const NOTICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::notice");

static TELEMETRY: OnceCell<TelemetryHandle> = OnceCell::new();

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Set of enabled severities, readable from any thread.
#[derive(Debug)]
pub struct LevelMask {
    bits: AtomicU8,
}

impl LevelMask {
    /// Builds a mask enabling exactly `levels`.
    #[must_use]
    pub fn new(levels: &BTreeSet<LogLevel>) -> Self {
        Self {
            bits: AtomicU8::new(Self::encode(levels)),
        }
    }

    /// Replaces the enabled set.
    pub fn set(&self, levels: &BTreeSet<LogLevel>) {
        self.bits.store(Self::encode(levels), Ordering::Release);
    }

    /// Returns true when `level` is enabled.
    #[must_use]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.bits.load(Ordering::Acquire) & Self::bit(level) != 0
    }

    /// Returns true when events at the `tracing` level should be emitted.
    #[must_use]
    pub fn enables(&self, level: &tracing::Level) -> bool {
        self.is_enabled(LogLevel::from_tracing(level))
    }

    /// Currently enabled levels.
    #[must_use]
    pub fn levels(&self) -> BTreeSet<LogLevel> {
        LogLevel::ALL
            .into_iter()
            .filter(|level| self.is_enabled(*level))
            .collect()
    }

    fn encode(levels: &BTreeSet<LogLevel>) -> u8 {
        levels.iter().fold(0, |bits, level| bits | Self::bit(*level))
    }

    const fn bit(level: LogLevel) -> u8 {
        match level {
            LogLevel::Trace => 1,
            LogLevel::Debug => 1 << 1,
            LogLevel::Info => 1 << 2,
            LogLevel::Warning => 1 << 3,
            LogLevel::Error => 1 << 4,
        }
    }
}

impl Default for LevelMask {
    fn default() -> Self {
        Self::new(&LoggingSettings::default().enabled_levels)
    }
}

/// Logging subsystem as seen by the rest of the process.
pub trait LogSink: Send + Sync {
    /// Applies the resolved severity set.
    fn apply_levels(&self, logging: &LoggingSettings);

    /// Returns true when events at `level` reach the sinks.
    fn is_enabled(&self, level: LogLevel) -> bool;

    /// Currently enabled severities.
    fn enabled_levels(&self) -> BTreeSet<LogLevel>;

    /// Flushes buffered output and stops emitting events.
    fn flush_and_close(&self);
}

/// Installs the logging subsystem.
pub trait Telemetry: Send + Sync {
    /// Installs the sinks using `format`, returning the subsystem handle.
    fn initialise(&self, format: LogFormat) -> Result<Arc<dyn LogSink>, TelemetryError>;
}

/// Handle onto the installed subscriber's filter state.
#[derive(Debug, Clone, Default)]
pub struct TelemetryHandle {
    mask: Arc<LevelMask>,
    closed: Arc<AtomicBool>,
}

impl TelemetryHandle {
    /// Returns true when the metadata passes the current filter.
    fn admits(&self, metadata: &tracing::Metadata<'_>) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        metadata.target() == NOTICE_TARGET || self.mask.enables(metadata.level())
    }
}

impl LogSink for TelemetryHandle {
    fn apply_levels(&self, logging: &LoggingSettings) {
        self.mask.set(&logging.enabled_levels);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.mask.is_enabled(level)
    }

    fn enabled_levels(&self) -> BTreeSet<LogLevel> {
        self.mask.levels()
    }

    fn flush_and_close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Nothing useful can be done if stderr refuses the flush at exit.
        io::stderr().flush().ok();
    }
}

/// Installs the process-wide `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTelemetry;

impl Telemetry for SystemTelemetry {
    fn initialise(&self, format: LogFormat) -> Result<Arc<dyn LogSink>, TelemetryError> {
        let handle = initialise(format)?;
        Ok(Arc::new(handle))
    }
}

/// Configures the global subscriber when invoked for the first time.
///
/// Later calls return the handle installed by the first call; the format
/// argument is ignored once a subscriber exists.
pub fn initialise(format: LogFormat) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY
        .get_or_try_init(|| install_subscriber(format))
        .cloned()
}

fn install_subscriber(format: LogFormat) -> Result<TelemetryHandle, TelemetryError> {
    let handle = TelemetryHandle::default();
    let filter_state = handle.clone();
    let filter = filter_fn(move |metadata| filter_state.admits(metadata));

    let base = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let output: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => base.json().flatten_event(true).boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(output.with_filter(filter));
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    Ok(handle)
}
