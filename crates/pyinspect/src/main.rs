//! Binary entrypoint for the `pyinspect` helper.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match pyinspect::run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr().lock(), "pyinspect: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
