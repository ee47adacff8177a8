use std::process::ExitCode;

use glsample_samples::triangle::Triangle;

fn main() -> ExitCode {
    glsample_engine::run_sample::<Triangle>()
}
