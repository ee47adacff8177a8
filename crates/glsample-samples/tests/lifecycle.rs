//! Every sample driven through its full lifecycle on wgpu's noop backend.

use std::path::PathBuf;

use glsample_engine::args::AssetPaths;
use glsample_engine::render::headless::Headless;
use glsample_engine::render::{Ledger, ResourceKind, TargetExtent};
use glsample_engine::Sample;

use glsample_samples::font::FontSample;
use glsample_samples::game_of_life::GameOfLife;
use glsample_samples::mesh_shader::MeshShader;
use glsample_samples::multipass::Multipass;
use glsample_samples::ray_tracing::RayTracing;
use glsample_samples::shadow_volume::ShadowVolume;
use glsample_samples::skybox::Skybox;
use glsample_samples::startup_window::StartupWindow;
use glsample_samples::texture::TexturedCube;
use glsample_samples::triangle::Triangle;

const FRAMES: u64 = 5;

fn extent(w: u32, h: u32) -> TargetExtent {
    TargetExtent::new(w, h).unwrap()
}

fn counts(ledger: &Ledger) -> Vec<(ResourceKind, usize)> {
    ResourceKind::ALL
        .into_iter()
        .map(|k| (k, ledger.count(k)))
        .collect()
}

/// Initialize, resize through zero and tiny sizes, draw a few frames, release.
fn run_lifecycle<S: Sample>() {
    let mut gpu = Headless::default();
    let mut host = gpu.host::<S>();
    gpu.initialize(&mut host, &AssetPaths::default(), extent(320, 240))
        .unwrap();
    let live = counts(&gpu.ledger);

    for (w, h) in [(100, 30), (0, 10), (1, 1), (300, 200)] {
        let applied = gpu.resize(&mut host, w, h).unwrap();
        assert_eq!(applied, w > 0 && h > 0, "{}: {w}x{h}", S::title());
        assert_eq!(
            counts(&gpu.ledger),
            live,
            "{}: ledger changed at {w}x{h}",
            S::title()
        );
    }

    for _ in 0..FRAMES {
        gpu.frame(&mut host, extent(300, 200)).unwrap();
    }
    assert_eq!(host.frames_drawn(), FRAMES);

    let leaks = host.release().unwrap();
    assert!(leaks.is_empty(), "{}: leaked {leaks:?}", S::title());
    assert_eq!(gpu.ledger.outstanding(), 0);
}

#[test]
fn startup_window_lifecycle() {
    run_lifecycle::<StartupWindow>();
}

#[test]
fn triangle_lifecycle() {
    run_lifecycle::<Triangle>();
}

#[test]
fn texture_lifecycle() {
    run_lifecycle::<TexturedCube>();
}

#[test]
fn skybox_lifecycle() {
    run_lifecycle::<Skybox>();
}

#[test]
fn game_of_life_lifecycle() {
    run_lifecycle::<GameOfLife>();
}

#[test]
fn ray_tracing_lifecycle() {
    run_lifecycle::<RayTracing>();
}

#[test]
fn multipass_lifecycle() {
    run_lifecycle::<Multipass>();
}

#[test]
fn shadow_volume_lifecycle() {
    run_lifecycle::<ShadowVolume>();
}

#[test]
fn font_lifecycle() {
    run_lifecycle::<FontSample>();
}

#[test]
fn mesh_shader_lifecycle() {
    run_lifecycle::<MeshShader>();
}

/// PNG one texel wider than the downlevel 2D texture limit.
fn wide_png(name: &str) -> PathBuf {
    let file = format!("glsample-{name}-{}.png", std::process::id());
    let path = std::env::temp_dir().join(file);
    image::RgbaImage::new(2049, 1).save(&path).unwrap();
    path
}

fn initialize_error<S: Sample>(assets: &AssetPaths) -> String {
    let gpu = Headless::with_limits(wgpu::Limits::downlevel_defaults());
    let mut host = gpu.host::<S>();
    let err = gpu.initialize(&mut host, assets, extent(64, 64)).unwrap_err();
    assert_eq!(gpu.ledger.outstanding(), 0);
    format!("{err:#}")
}

#[test]
fn oversized_texture_fails_initialize() {
    let path = wide_png("texture");
    let assets = AssetPaths {
        texture: Some(path.clone()),
        ..Default::default()
    };
    let msg = initialize_error::<TexturedCube>(&assets);
    let _ = std::fs::remove_file(&path);
    assert!(msg.contains("exceeds the device limit of 2048"), "{msg}");
}

#[test]
fn oversized_panorama_fails_ray_tracing_initialize() {
    let path = wide_png("sky");
    let assets = AssetPaths {
        skybox: Some(path.clone()),
        ..Default::default()
    };
    let msg = initialize_error::<RayTracing>(&assets);
    let _ = std::fs::remove_file(&path);
    assert!(msg.contains("exceeds the device limit of 2048"), "{msg}");
}
