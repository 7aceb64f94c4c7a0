//! Entry point for the `sable` binary.

use std::io::{self, Write};
use std::process::ExitCode;

use sable::BootError;

fn main() -> ExitCode {
    let app = match sable::boot(std::env::args_os()) {
        Ok(app) => app,
        Err(BootError::Arguments(error)) => error.exit(),
        Err(error) => return report_failure(&error),
    };

    let outcome = app.run();
    app.shutdown();
    outcome.map_or_else(|error| report_failure(&error), |()| ExitCode::SUCCESS)
}

fn report_failure(error: &dyn std::error::Error) -> ExitCode {
    writeln!(io::stderr().lock(), "sable: {error}").ok();
    ExitCode::FAILURE
}
