use std::process::ExitCode;

use glsample_samples::multipass::Multipass;

fn main() -> ExitCode {
    glsample_engine::run_sample::<Multipass>()
}
