use std::process::ExitCode;

use glsample_samples::mesh_shader::MeshShader;

fn main() -> ExitCode {
    glsample_engine::run_sample::<MeshShader>()
}
