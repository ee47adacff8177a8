use std::process::ExitCode;

use glsample_samples::shadow_volume::ShadowVolume;

fn main() -> ExitCode {
    glsample_engine::run_sample::<ShadowVolume>()
}
