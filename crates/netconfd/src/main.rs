//! `netconfd` binary: serves NETCONF test sessions until told to stop.

use std::process::ExitCode;

use tracing::error;

const MAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

fn main() -> ExitCode {
    match netconfd::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(target: MAIN_TARGET, error = %error, "netconfd stopped with an error");
            ExitCode::FAILURE
        }
    }
}
