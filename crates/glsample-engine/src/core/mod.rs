//! Sample lifecycle contract and the entry point shared by every binary.

mod ctx;
mod host;
mod lifecycle;
mod sample;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::args::SampleArgs;
use crate::logging::init_logging;
use crate::window::Runtime;

pub use ctx::{InitCtx, UpdateCtx};
pub use host::SampleHost;
pub use lifecycle::{Hook, Lifecycle, LifecycleError, Phase};
pub use sample::Sample;

/// Parses the command line, runs `S` to completion and maps the outcome to an exit code.
///
/// Errors are printed to stderr with their full context chain. Usage errors
/// also exit with 1; `--help` and `--version` exit with 0.
pub fn run_sample<S: Sample>() -> ExitCode {
    let args = match SampleArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(args.logging_config());

    match run_with_args::<S>(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs `S` with already-parsed arguments. Logging must already be initialized.
pub fn run_with_args<S: Sample>(args: &SampleArgs) -> Result<()> {
    let config = args.runtime_config(S::title());
    let gpu_init = args.gpu_init(S::required_capabilities());
    Runtime::run::<S>(config, gpu_init, args.assets())
}
