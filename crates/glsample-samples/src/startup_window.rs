use anyhow::Result;
use glsample_engine::core::InitCtx;
use glsample_engine::device::BaselineState;
use glsample_engine::render::common::{begin_pass, color_attachment};
use glsample_engine::render::{RenderCtx, RenderTarget};
use glsample_engine::Sample;

/// Window and context only; clears to the baseline color every frame.
pub struct StartupWindow;

impl Sample for StartupWindow {
    fn title() -> &'static str {
        "startup-window"
    }

    fn initialize(_ctx: &InitCtx<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn draw(&self, _gfx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let _pass = begin_pass(
            target.encoder,
            "startup-window clear",
            &[Some(color_attachment(target.color_view, Some(BaselineState::CLEAR_COLOR)))],
            None,
        );
    }
}
