//! Launches real sample binaries. Rendering needs a GPU and a display, so those
//! tests are ignored by default.
//!
//! Run with `cargo test -p glsample-samples -- --ignored`.

use std::process::Command;

fn run_one_frame(exe: &str) {
    let status = Command::new(exe)
        .args(["--max-frames", "1"])
        .status()
        .unwrap_or_else(|e| panic!("failed to launch {exe}: {e}"));
    assert!(status.success(), "{exe} exited with {status}");
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn triangle_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_triangle"));
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn startup_window_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_startup-window"));
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn texture_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_texture"));
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn skybox_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_skybox"));
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn game_of_life_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_game-of-life"));
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn ray_tracing_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_ray-tracing"));
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn multipass_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_multipass"));
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn shadow_volume_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_shadow-volume"));
}

#[test]
#[ignore = "needs a GPU and a window system"]
fn font_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_font"));
}

#[test]
#[ignore = "needs a GPU with mesh shading and a window system"]
fn mesh_shader_renders_one_frame_and_exits_cleanly() {
    run_one_frame(env!("CARGO_BIN_EXE_mesh-shader"));
}

#[test]
fn help_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_triangle"))
        .arg("--help")
        .output()
        .expect("failed to launch triangle");
    assert!(output.status.success());
    let usage = String::from_utf8_lossy(&output.stdout);
    assert!(usage.contains("--max-frames"));
}

#[test]
fn out_of_range_time_exits_one() {
    let output = Command::new(env!("CARGO_BIN_EXE_triangle"))
        .arg("--time=1e30")
        .output()
        .expect("failed to launch triangle");
    assert_eq!(output.status.code(), Some(1));
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("--time"), "{err}");
}
