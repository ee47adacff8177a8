use anyhow::Result;

use crate::device::Capability;
use crate::render::{RenderCtx, RenderTarget, TargetExtent};

use super::ctx::{InitCtx, UpdateCtx};

/// Contract every sample program implements.
///
/// The host drives the hooks in a fixed order: `initialize`, `on_resize` with
/// the initial surface size, then `update` followed by `draw` once per frame,
/// and finally `release`. See [`super::Lifecycle`].
pub trait Sample: Sized + 'static {
    /// Window title.
    fn title() -> &'static str;

    /// Capabilities needed on top of the baseline list.
    fn required_capabilities() -> &'static [Capability] {
        &[]
    }

    /// Creates every GPU resource the sample owns.
    fn initialize(ctx: &InitCtx<'_>) -> Result<Self>;

    /// Replaces all size-dependent resources. `extent` is never zero-sized.
    fn on_resize(&mut self, gfx: &RenderCtx<'_>, extent: TargetExtent) -> Result<()> {
        let _ = (gfx, extent);
        Ok(())
    }

    /// Advances CPU state and writes this frame's uniform ring slot.
    fn update(&mut self, ctx: &mut UpdateCtx<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Records this frame's commands. Must not create persistent resources.
    fn draw(&self, gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>);

    /// Drops every handle created by `initialize` and `on_resize`.
    fn release(self) {
        drop(self);
    }
}
