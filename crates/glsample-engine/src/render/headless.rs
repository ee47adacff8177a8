//! Window-free device on wgpu's noop backend.
//!
//! Drives a [`SampleHost`] through the same hooks the runtime uses, drawing
//! into an offscreen texture instead of a surface. wgpu validation still runs,
//! so invalid descriptors fail exactly as they would on a real device.

use anyhow::Result;

use crate::args::AssetPaths;
use crate::core::{InitCtx, Sample, SampleHost, UpdateCtx};
use crate::input::{InputFrame, InputState};
use crate::time::FrameClock;

use super::{Ledger, RenderCtx, RenderTarget, TargetExtent};

/// Color format of the offscreen target, standing in for the surface format.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

pub struct Headless {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub ledger: Ledger,
    clock: FrameClock,
    input: InputState,
    input_frame: InputFrame,
}

impl Default for Headless {
    fn default() -> Self {
        Self::with_limits(wgpu::Limits::defaults())
    }
}

impl Headless {
    pub fn with_limits(limits: wgpu::Limits) -> Self {
        let (device, queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor {
            label: Some("headless device"),
            required_limits: limits,
            ..Default::default()
        });
        Self {
            device,
            queue,
            ledger: Ledger::new(),
            clock: FrameClock::new(),
            input: InputState::default(),
            input_frame: InputFrame::default(),
        }
    }

    pub fn ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue, TARGET_FORMAT, &self.ledger)
    }

    pub fn host<S: Sample>(&self) -> SampleHost<S> {
        SampleHost::new(self.ledger.clone())
    }

    pub fn initialize<S: Sample>(
        &self,
        host: &mut SampleHost<S>,
        assets: &AssetPaths,
        extent: TargetExtent,
    ) -> Result<()> {
        let ctx = InitCtx {
            gfx: self.ctx(),
            assets,
            extent,
        };
        host.initialize(&ctx)
    }

    pub fn resize<S: Sample>(
        &self,
        host: &mut SampleHost<S>,
        width: u32,
        height: u32,
    ) -> Result<bool> {
        host.resize(&self.ctx(), width, height)
    }

    /// One update, draw and submit at `extent`.
    pub fn frame<S: Sample>(&mut self, host: &mut SampleHost<S>, extent: TargetExtent) -> Result<()> {
        let time = self.clock.tick();
        let mut exit_requested = false;
        let gfx = RenderCtx::new(&self.device, &self.queue, TARGET_FORMAT, &self.ledger);

        {
            let mut ctx = UpdateCtx::new(
                gfx,
                &self.input,
                &self.input_frame,
                time,
                extent,
                &mut exit_requested,
            );
            host.update(&mut ctx)?;
        }

        // Untracked: the target plays the surface texture, which no sample owns.
        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("headless target"),
            size: extent.to_extent3d(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("headless frame encoder"),
            });
        {
            let mut target = RenderTarget::new(&mut encoder, &view, extent);
            host.draw(&gfx, &mut target)?;
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
