//! Sample programs built on `glsample-engine`.
//!
//! Each module holds one [`glsample_engine::Sample`]; the binaries in `src/bin`
//! only hand it to [`glsample_engine::run_sample`].

pub mod font;
pub mod game_of_life;
pub mod mesh_shader;
pub mod multipass;
pub mod ray_tracing;
pub mod shadow_volume;
pub mod skybox;
pub mod startup_window;
pub mod texture;
pub mod triangle;
