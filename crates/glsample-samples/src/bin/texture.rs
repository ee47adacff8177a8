use std::process::ExitCode;

use glsample_samples::texture::TexturedCube;

fn main() -> ExitCode {
    glsample_engine::run_sample::<TexturedCube>()
}
