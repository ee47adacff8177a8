use std::process::ExitCode;

use glsample_samples::startup_window::StartupWindow;

fn main() -> ExitCode {
    glsample_engine::run_sample::<StartupWindow>()
}
