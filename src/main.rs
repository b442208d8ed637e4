//! taskdag - Local-first task dependency tracking

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = taskdag::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
