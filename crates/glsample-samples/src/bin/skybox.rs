use std::process::ExitCode;

use glsample_samples::skybox::Skybox;

fn main() -> ExitCode {
    glsample_engine::run_sample::<Skybox>()
}
