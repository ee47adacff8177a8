use std::process::ExitCode;

use glsample_samples::font::FontSample;

fn main() -> ExitCode {
    glsample_engine::run_sample::<FontSample>()
}
