use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::args::AssetPaths;
use crate::core::{InitCtx, Sample, SampleHost, UpdateCtx};
use crate::device::{GpuInit, SurfaceErrorAction};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputFrame, InputState, Key};
use crate::render::{Ledger, RenderCtx, RenderTarget, TargetExtent};
use crate::time::{FpsCounter, FrameClock};

use super::bootstrap::{create_window, delete_window, WindowHandle};

/// Window/runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub fullscreen: bool,
    /// Close after this much wall time.
    pub time_limit: Option<Duration>,
    /// Close after this many drawn frames.
    pub max_frames: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "glsample".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            fullscreen: false,
            time_limit: None,
            max_frames: None,
        }
    }
}

impl RuntimeConfig {
    pub fn limit_reached(&self, elapsed: Duration, frames_drawn: u64) -> bool {
        self.time_limit.is_some_and(|t| elapsed >= t)
            || self.max_frames.is_some_and(|n| frames_drawn >= n)
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `S` in a single window until it is closed or a limit is reached.
    ///
    /// Returns the first fatal error raised by the bootstrap or a lifecycle hook.
    pub fn run<S: Sample>(config: RuntimeConfig, gpu_init: GpuInit, assets: AssetPaths) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::<S>::new(config, gpu_init, assets);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct Running<S> {
    handle: WindowHandle,
    host: SampleHost<S>,
    ledger: Ledger,

    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,
    fps: FpsCounter,
    started: Instant,
}

struct AppState<S> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    assets: AssetPaths,

    running: Option<Running<S>>,
    error: Option<anyhow::Error>,
    finished: bool,
}

impl<S: Sample> AppState<S> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, assets: AssetPaths) -> Self {
        Self {
            config,
            gpu_init,
            assets,
            running: None,
            error: None,
            finished: false,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running<S>> {
        let handle = create_window(event_loop, &self.config, self.gpu_init.clone())?;
        let ledger = Ledger::new();
        let mut host = SampleHost::<S>::new(ledger.clone());

        {
            let gpu = handle.gpu();
            let size = gpu.size();
            let extent = TargetExtent::new(size.width, size.height)?;
            let ctx = InitCtx {
                gfx: RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format(), &ledger),
                assets: &self.assets,
                extent,
            };
            host.initialize(&ctx)?;
        }

        Ok(Running {
            handle,
            host,
            ledger,
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::new(),
            fps: FpsCounter::default(),
            started: Instant::now(),
        })
    }

    /// Releases the sample, deletes the window and stops the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut running) = self.running.take() {
            if let Err(e) = running.host.release() {
                self.record_error(e);
            }
            let Running { handle, host, .. } = running;
            drop(host);
            delete_window(handle);
        }
        self.finished = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.record_error(err);
        self.shutdown(event_loop);
    }

    fn record_error(&mut self, err: anyhow::Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) -> Result<()> {
        let Some(running) = self.running.as_mut() else {
            return Ok(());
        };
        running.handle.gpu_mut(|gpu| gpu.resize(new_size));

        let gpu = running.handle.gpu();
        let gfx = RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format(), &running.ledger);
        running.host.resize(&gfx, new_size.width, new_size.height)?;
        Ok(())
    }

    /// Runs one update/draw/present iteration. Returns `true` when the run should end.
    fn frame(&mut self) -> Result<bool> {
        let Some(running) = self.running.as_mut() else {
            return Ok(false);
        };

        let size = running.handle.gpu().size();
        let Ok(extent) = TargetExtent::new(size.width, size.height) else {
            // Minimized; nothing to draw into.
            return Ok(false);
        };

        let time = running.clock.tick();
        let mut exit_requested = false;

        let acquired = {
            let gpu = running.handle.gpu();
            let gfx = RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format(), &running.ledger);

            {
                let mut ctx = UpdateCtx::new(
                    gfx,
                    &running.input_state,
                    &running.input_frame,
                    time,
                    extent,
                    &mut exit_requested,
                );
                running.host.update(&mut ctx)?;
            }

            match gpu.begin_frame() {
                Ok(mut frame) => {
                    {
                        let mut target = RenderTarget::new(&mut frame.encoder, &frame.view, extent);
                        running.host.draw(&gfx, &mut target)?;
                    }
                    running.handle.window().pre_present_notify();
                    gpu.submit(frame);
                    Ok(())
                }
                Err(err) => Err(err),
            }
        };

        running.input_frame.clear();

        if let Err(err) = acquired {
            running.host.skip_draw()?;
            let msg = err.to_string();
            let action = running.handle.gpu_mut(|gpu| gpu.handle_surface_error(err));
            log::debug!("surface error ({msg}): {action:?}");
            if action == SurfaceErrorAction::Fatal {
                anyhow::bail!("surface error: {msg}");
            }
        }

        if running.fps.record(time.now) {
            let fps = running.fps.fps();
            log::debug!("{:.1} fps", fps);
            running
                .handle
                .window()
                .set_title(&format!("{} - {:.1} fps", self.config.title, fps));
        }

        let limit = self
            .config
            .limit_reached(running.started.elapsed(), running.host.frames_drawn());
        Ok(exit_requested || limit)
    }
}

impl<S: Sample> ApplicationHandler for AppState<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.finished {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                running.handle.window().request_redraw();
                self.running = Some(running);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.finished {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(running) = &self.running {
            running.handle.window().request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        if let Some(ev) = translate_window_event(running.handle.window(), &running.input_state, &event) {
            running.input_state.apply_event(&mut running.input_frame, ev);
        }
        let escape = running.input_frame.key_pressed(Key::Escape);

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::KeyboardInput { .. } if escape => self.shutdown(event_loop),

            WindowEvent::Resized(new_size) => {
                if let Err(e) = self.resize(new_size) {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = running.handle.window().inner_size();
                if let Err(e) = self.resize(new_size) {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::RedrawRequested => match self.frame() {
                Ok(true) => self.shutdown(event_loop),
                Ok(false) => {}
                Err(e) => self.fail(event_loop, e),
            },

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_limits_never_stop() {
        let cfg = RuntimeConfig::default();
        assert!(!cfg.limit_reached(Duration::from_secs(3600), u64::MAX));
    }

    #[test]
    fn frame_limit_counts_drawn_frames() {
        let cfg = RuntimeConfig {
            max_frames: Some(1),
            ..Default::default()
        };
        assert!(!cfg.limit_reached(Duration::ZERO, 0));
        assert!(cfg.limit_reached(Duration::ZERO, 1));
    }

    #[test]
    fn time_limit_is_inclusive() {
        let cfg = RuntimeConfig {
            time_limit: Some(Duration::from_secs(2)),
            ..Default::default()
        };
        assert!(!cfg.limit_reached(Duration::from_millis(1999), 0));
        assert!(cfg.limit_reached(Duration::from_secs(2), 0));
    }
}
