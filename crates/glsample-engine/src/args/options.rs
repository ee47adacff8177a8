use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use winit::dpi::LogicalSize;

use crate::device::{Capability, GpuInit};
use crate::logging::LoggingConfig;
use crate::window::RuntimeConfig;

use super::AssetPaths;

/// Graphics API selection for the `--backend` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliBackend {
    /// Let wgpu pick the platform default.
    #[default]
    Auto,
    Vulkan,
    Metal,
    Dx12,
    /// OpenGL / OpenGL ES.
    Gl,
}

impl From<CliBackend> for wgpu::Backends {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Auto => wgpu::Backends::all(),
            CliBackend::Vulkan => wgpu::Backends::VULKAN,
            CliBackend::Metal => wgpu::Backends::METAL,
            CliBackend::Dx12 => wgpu::Backends::DX12,
            CliBackend::Gl => wgpu::Backends::GL,
        }
    }
}

/// `--time` value: non-negative seconds that fit a [`Duration`].
fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|e| format!("`{value}` is not a number: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("`{value}` seconds: {e}"))
}

/// Options understood by every sample.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "GPU rendering sample")]
pub struct SampleArgs {
    /// STL model to render instead of the built-in cube.
    #[arg(long, value_name = "STL")]
    pub model: Option<PathBuf>,

    /// Image used as the sample's color texture.
    #[arg(long, value_name = "IMAGE")]
    pub texture: Option<PathBuf>,

    /// Equirectangular panorama used as the environment.
    #[arg(long, value_name = "IMAGE")]
    pub skybox: Option<PathBuf>,

    /// TrueType/OpenType font for text samples.
    #[arg(long, value_name = "TTF")]
    pub font: Option<PathBuf>,

    /// Root directory relative asset paths are resolved against.
    #[arg(short = 'F', long, value_name = "DIR")]
    pub filesystem: Option<PathBuf>,

    /// Exit after this many seconds.
    #[arg(short = 't', long, value_name = "SECS", value_parser = parse_seconds)]
    pub time: Option<Duration>,

    /// Exit after rendering this many frames.
    #[arg(long, value_name = "N")]
    pub max_frames: Option<u64>,

    /// Start in borderless fullscreen.
    #[arg(short = 'f', long)]
    pub fullscreen: bool,

    /// Enable GPU validation and debug labels.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Wait for vertical blank when presenting.
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub vsync: bool,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Graphics API to run on.
    #[arg(long, value_enum, default_value_t = CliBackend::Auto)]
    pub backend: CliBackend,

    /// Log filter in env_logger syntax, e.g. `debug` or `glsample_engine=trace`.
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

impl SampleArgs {
    pub fn runtime_config(&self, title: &str) -> RuntimeConfig {
        RuntimeConfig {
            title: title.to_string(),
            initial_size: LogicalSize::new(
                f64::from(self.width.max(1)),
                f64::from(self.height.max(1)),
            ),
            fullscreen: self.fullscreen,
            time_limit: self.time,
            max_frames: self.max_frames,
        }
    }

    pub fn gpu_init(&self, required_capabilities: &[Capability]) -> GpuInit {
        GpuInit {
            backends: self.backend.into(),
            present_mode: if self.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::Immediate
            },
            required_capabilities: required_capabilities.to_vec(),
            debug: self.debug,
            ..GpuInit::default()
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.clone(),
            ..LoggingConfig::default()
        }
    }

    pub fn assets(&self) -> AssetPaths {
        AssetPaths {
            root: self.filesystem.clone(),
            model: self.model.clone(),
            texture: self.texture.clone(),
            skybox: self.skybox.clone(),
            font: self.font.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> SampleArgs {
        SampleArgs::try_parse_from(std::iter::once("sample").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let a = parse(&[]);
        assert!(a.vsync);
        assert!(!a.fullscreen);
        assert_eq!((a.width, a.height), (1280, 720));
        assert_eq!(a.backend, CliBackend::Auto);
        assert_eq!(a.assets(), AssetPaths::default());

        let gpu = a.gpu_init(&[]);
        assert_eq!(gpu.present_mode, wgpu::PresentMode::Fifo);
        assert_eq!(gpu.backends, wgpu::Backends::all());
        assert!(!gpu.debug);
    }

    #[test]
    fn asset_flags() {
        let a = parse(&[
            "--model", "bunny.stl",
            "--texture", "wood.png",
            "--skybox", "sky.hdr",
            "-F", "/assets",
        ]);
        let assets = a.assets();
        assert_eq!(assets.model(), Some(PathBuf::from("/assets/bunny.stl")));
        assert_eq!(assets.texture(), Some(PathBuf::from("/assets/wood.png")));
        assert_eq!(assets.skybox(), Some(PathBuf::from("/assets/sky.hdr")));
    }

    #[test]
    fn vsync_takes_a_value() {
        let a = parse(&["--vsync", "false"]);
        assert!(!a.vsync);
        assert_eq!(a.gpu_init(&[]).present_mode, wgpu::PresentMode::Immediate);
    }

    #[test]
    fn run_limits_reach_runtime_config() {
        let a = parse(&["-t", "2.5", "--max-frames", "1", "-f"]);
        let cfg = a.runtime_config("triangle");
        assert_eq!(cfg.title, "triangle");
        assert_eq!(cfg.time_limit, Some(Duration::from_millis(2500)));
        assert_eq!(cfg.max_frames, Some(1));
        assert!(cfg.fullscreen);
    }

    #[test]
    fn out_of_range_time_is_a_usage_error() {
        for bad in ["1e30", "-1", "NaN", "inf", "soon"] {
            let arg = format!("--time={bad}");
            let err = SampleArgs::try_parse_from(["sample", arg.as_str()]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{bad}");
        }
    }

    #[test]
    fn zero_time_is_accepted() {
        let a = parse(&["-t", "0"]);
        assert_eq!(a.runtime_config("x").time_limit, Some(Duration::ZERO));
    }

    #[test]
    fn debug_flag_reaches_gpu_init() {
        assert!(parse(&["-d"]).gpu_init(&[]).debug);
        assert!(parse(&["--debug"]).gpu_init(&[]).debug);
    }

    #[test]
    fn backend_selects_wgpu_backends() {
        let a = parse(&["--backend", "gl"]);
        assert_eq!(a.gpu_init(&[]).backends, wgpu::Backends::GL);
    }

    #[test]
    fn required_capabilities_are_forwarded() {
        let a = parse(&[]);
        let gpu = a.gpu_init(&[Capability::ComputeShaders]);
        assert_eq!(gpu.required_capabilities, vec![Capability::ComputeShaders]);
    }

    #[test]
    fn log_filter_is_forwarded() {
        let a = parse(&["--log", "debug"]);
        assert_eq!(a.logging_config().env_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(SampleArgs::try_parse_from(["sample", "--bogus"]).is_err());
    }
}
