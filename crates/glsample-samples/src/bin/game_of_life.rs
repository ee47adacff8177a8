use std::process::ExitCode;

use glsample_samples::game_of_life::GameOfLife;

fn main() -> ExitCode {
    glsample_engine::run_sample::<GameOfLife>()
}
