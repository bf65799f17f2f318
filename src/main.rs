//! bsb-plan - Bible reading plan generator

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = bsb_plan::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
