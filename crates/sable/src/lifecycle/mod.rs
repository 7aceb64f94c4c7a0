//! Process-wide hooks and the shutdown sequence.

mod hooks;
mod shutdown;

pub use hooks::{
    ExitRequest, FatalError, FatalErrorHandler, HookError, HookInstaller, SystemHooks,
};
pub use shutdown::ShutdownHandle;

pub(crate) const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");
