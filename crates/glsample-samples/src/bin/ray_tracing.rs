use std::process::ExitCode;

use glsample_samples::ray_tracing::RayTracing;

fn main() -> ExitCode {
    glsample_engine::run_sample::<RayTracing>()
}
