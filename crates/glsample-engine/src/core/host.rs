use anyhow::{Context, Result};

use crate::render::{Ledger, RenderCtx, RenderTarget, ResourceKind, TargetExtent};

use super::ctx::{InitCtx, UpdateCtx};
use super::lifecycle::{Hook, Lifecycle, LifecycleError, Phase};
use super::sample::Sample;

/// Owns one sample and enforces its lifecycle.
pub struct SampleHost<S> {
    lifecycle: Lifecycle,
    sample: Option<S>,
    ledger: Ledger,
}

impl<S: Sample> SampleHost<S> {
    /// `ledger` must be the one handed to the sample through its [`RenderCtx`].
    pub fn new(ledger: Ledger) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            sample: None,
            ledger,
        }
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.lifecycle.frames_drawn()
    }

    /// Runs `initialize`, then `on_resize` with the initial extent.
    pub fn initialize(&mut self, ctx: &InitCtx<'_>) -> Result<()> {
        self.lifecycle.check(Hook::Initialize)?;

        let mut sample = S::initialize(ctx)
            .with_context(|| format!("{}: initialize failed", S::title()))?;
        sample
            .on_resize(&ctx.gfx, ctx.extent)
            .with_context(|| format!("{}: initial on_resize failed", S::title()))?;

        self.lifecycle.advance(Hook::Initialize)?;
        self.sample = Some(sample);

        log::info!(
            "{} initialized at {}x{} ({:?})",
            S::title(),
            ctx.extent.width(),
            ctx.extent.height(),
            self.ledger
        );
        Ok(())
    }

    /// Forwards a surface resize. Zero-sized surfaces are skipped and yield `false`.
    pub fn resize(&mut self, gfx: &RenderCtx<'_>, width: u32, height: u32) -> Result<bool> {
        let Ok(extent) = TargetExtent::new(width, height) else {
            log::debug!("skipping resize to {width}x{height}");
            return Ok(false);
        };

        self.lifecycle.check(Hook::Resize)?;
        self.live(Hook::Resize)?
            .on_resize(gfx, extent)
            .with_context(|| format!("{}: on_resize({width}x{height}) failed", S::title()))?;
        self.lifecycle.advance(Hook::Resize)?;
        Ok(true)
    }

    pub fn update(&mut self, ctx: &mut UpdateCtx<'_>) -> Result<()> {
        self.lifecycle.check(Hook::Update)?;
        self.live(Hook::Update)?
            .update(ctx)
            .with_context(|| format!("{}: update failed", S::title()))?;
        self.lifecycle.advance(Hook::Update)?;
        Ok(())
    }

    pub fn draw(&mut self, gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Result<()> {
        self.lifecycle.check(Hook::Draw)?;
        self.live(Hook::Draw)?.draw(gfx, target);
        self.lifecycle.advance(Hook::Draw)?;
        Ok(())
    }

    /// Closes an updated frame that could not be drawn (surface unavailable).
    pub fn skip_draw(&mut self) -> Result<()> {
        self.lifecycle.advance(Hook::SkipDraw)?;
        Ok(())
    }

    /// Runs `release` and audits the ledger.
    ///
    /// Returns the kinds still alive afterwards; each is also logged as an error.
    pub fn release(&mut self) -> Result<Vec<(ResourceKind, usize)>> {
        self.lifecycle.check(Hook::Release)?;
        if let Some(sample) = self.sample.take() {
            sample.release();
        }
        self.lifecycle.advance(Hook::Release)?;

        let leaks = self.ledger.leaks();
        if leaks.is_empty() {
            log::info!(
                "{} released after {} frames",
                S::title(),
                self.frames_drawn()
            );
        }
        for (kind, count) in &leaks {
            log::error!("{}: {count} {kind} handle(s) leaked past release", S::title());
        }
        Ok(leaks)
    }

    fn live(&mut self, hook: Hook) -> Result<&mut S, LifecycleError> {
        let phase = self.lifecycle.phase();
        self.sample.as_mut().ok_or(LifecycleError { hook, phase })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AssetPaths;
    use crate::render::common::{begin_pass, color_attachment};
    use crate::render::headless::{Headless, TARGET_FORMAT};
    use crate::render::{SizedTexture, Tracked};

    /// One buffer for its whole life plus one surface-sized texture.
    struct Scratch {
        _buffer: Tracked<wgpu::Buffer>,
        target: SizedTexture,
        resizes: Vec<(u32, u32)>,
    }

    impl Sample for Scratch {
        fn title() -> &'static str {
            "scratch"
        }

        fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
            let buffer = ctx.gfx.create_buffer(&wgpu::BufferDescriptor {
                label: Some("scratch buffer"),
                size: 256,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let target = SizedTexture::new(
                &ctx.gfx,
                "scratch target",
                ctx.extent,
                TARGET_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            );
            Ok(Self {
                _buffer: buffer,
                target,
                resizes: Vec::new(),
            })
        }

        fn on_resize(&mut self, gfx: &RenderCtx<'_>, extent: TargetExtent) -> Result<()> {
            self.target.resize(gfx, extent);
            self.resizes.push((extent.width(), extent.height()));
            Ok(())
        }

        fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
            let _pass = begin_pass(
                target.encoder,
                "scratch clear",
                &[Some(color_attachment(target.color_view, Some(wgpu::Color::BLACK)))],
                None,
            );
        }
    }

    /// Forgets its buffer instead of dropping it.
    struct Leaky(Tracked<wgpu::Buffer>);

    impl Sample for Leaky {
        fn title() -> &'static str {
            "leaky"
        }

        fn initialize(ctx: &InitCtx<'_>) -> Result<Self> {
            Ok(Self(ctx.gfx.create_buffer(&wgpu::BufferDescriptor {
                label: Some("leaked buffer"),
                size: 16,
                usage: wgpu::BufferUsages::UNIFORM,
                mapped_at_creation: false,
            })))
        }

        fn draw(&self, _gfx: &RenderCtx<'_>, _target: &mut RenderTarget<'_>) {}

        fn release(self) {
            std::mem::forget(self);
        }
    }

    struct NoAssets;

    impl Sample for NoAssets {
        fn title() -> &'static str {
            "no assets"
        }

        fn initialize(_ctx: &InitCtx<'_>) -> Result<Self> {
            anyhow::bail!("model not found")
        }

        fn draw(&self, _gfx: &RenderCtx<'_>, _target: &mut RenderTarget<'_>) {}
    }

    fn extent(w: u32, h: u32) -> TargetExtent {
        TargetExtent::new(w, h).unwrap()
    }

    fn counts(ledger: &Ledger) -> Vec<usize> {
        ResourceKind::ALL.iter().map(|k| ledger.count(*k)).collect()
    }

    #[test]
    fn initialize_runs_the_first_resize() {
        let gpu = Headless::default();
        let mut host = gpu.host::<Scratch>();
        gpu.initialize(&mut host, &AssetPaths::default(), extent(64, 32))
            .unwrap();

        assert_eq!(host.phase(), Phase::Ready);
        assert_eq!(host.sample.as_ref().unwrap().resizes, vec![(64, 32)]);
        assert_eq!(gpu.ledger.count(ResourceKind::Buffer), 1);
        assert_eq!(gpu.ledger.count(ResourceKind::Texture), 1);
    }

    #[test]
    fn resize_rebuilds_targets_without_growing_the_ledger() {
        let gpu = Headless::default();
        let mut host = gpu.host::<Scratch>();
        gpu.initialize(&mut host, &AssetPaths::default(), extent(64, 32))
            .unwrap();
        let before = counts(&gpu.ledger);

        for (w, h) in [(100, 30), (0, 10), (10, 0), (1, 1), (300, 200)] {
            let applied = gpu.resize(&mut host, w, h).unwrap();
            assert_eq!(applied, w > 0 && h > 0, "{w}x{h}");
            assert_eq!(counts(&gpu.ledger), before, "after {w}x{h}");
        }

        let sample = host.sample.as_ref().unwrap();
        assert_eq!(sample.target.extent(), extent(300, 200));
        assert_eq!(sample.target.texture().width(), 300);
        assert_eq!(sample.target.texture().height(), 200);
        // Zero sizes never reach the sample.
        assert_eq!(sample.resizes, vec![(64, 32), (100, 30), (1, 1), (300, 200)]);
    }

    #[test]
    fn release_leaves_nothing_outstanding() {
        let mut gpu = Headless::default();
        let mut host = gpu.host::<Scratch>();
        gpu.initialize(&mut host, &AssetPaths::default(), extent(64, 32))
            .unwrap();
        for _ in 0..3 {
            gpu.frame(&mut host, extent(64, 32)).unwrap();
        }
        assert_eq!(host.frames_drawn(), 3);

        let leaks = host.release().unwrap();
        assert!(leaks.is_empty(), "{leaks:?}");
        assert_eq!(gpu.ledger.outstanding(), 0);
        assert_eq!(host.phase(), Phase::Released);
    }

    #[test]
    fn leaked_handles_are_reported_by_kind() {
        let gpu = Headless::default();
        let mut host = gpu.host::<Leaky>();
        gpu.initialize(&mut host, &AssetPaths::default(), extent(8, 8))
            .unwrap();

        assert_eq!(host.release().unwrap(), vec![(ResourceKind::Buffer, 1)]);
    }

    #[test]
    fn hooks_out_of_order_are_rejected() {
        let mut gpu = Headless::default();
        let mut host = gpu.host::<Scratch>();
        let assets = AssetPaths::default();

        assert!(gpu.resize(&mut host, 32, 32).is_err());
        assert!(host.release().is_err());

        gpu.initialize(&mut host, &assets, extent(32, 32)).unwrap();
        assert!(gpu.initialize(&mut host, &assets, extent(32, 32)).is_err());
        assert!(host.skip_draw().is_err());

        gpu.frame(&mut host, extent(32, 32)).unwrap();
        host.release().unwrap();

        assert!(gpu.frame(&mut host, extent(32, 32)).is_err());
        assert!(host.release().is_err());
        assert_eq!(host.frames_drawn(), 1);
    }

    #[test]
    fn failed_initialize_keeps_the_sample_uninitialized() {
        let gpu = Headless::default();
        let mut host = gpu.host::<NoAssets>();
        let err = gpu
            .initialize(&mut host, &AssetPaths::default(), extent(8, 8))
            .unwrap_err();

        assert!(format!("{err:#}").contains("no assets: initialize failed: model not found"));
        assert_eq!(host.phase(), Phase::Uninitialized);
    }
}
