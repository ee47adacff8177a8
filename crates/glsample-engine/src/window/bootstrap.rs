use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window};

use crate::device::{Gpu, GpuInit};

use super::RuntimeConfig;

/// The window and the GPU context bound to it.
///
/// The GPU surface borrows the window, so both live in one self-referencing
/// value. Dropping it (or [`delete_window`]) releases the context first.
#[self_referencing]
pub struct WindowHandle {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl WindowHandle {
    pub fn window(&self) -> &Window {
        self.borrow_window()
    }

    pub fn gpu(&self) -> &Gpu<'_> {
        self.borrow_gpu()
    }

    pub fn gpu_mut<R>(&mut self, f: impl FnOnce(&mut Gpu<'_>) -> R) -> R {
        self.with_gpu_mut(|gpu| f(gpu))
    }
}

/// Opens the window described by `config` and creates its GPU context.
///
/// Fails if the window cannot be created, no adapter fits, or a required
/// capability is missing.
pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &RuntimeConfig,
    gpu_init: GpuInit,
) -> Result<WindowHandle> {
    let attrs = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(config.initial_size)
        .with_fullscreen(config.fullscreen.then_some(Fullscreen::Borderless(None)));

    let window = event_loop
        .create_window(attrs)
        .context("failed to create window")?;

    let handle = WindowHandle::try_new(window, |w| pollster::block_on(Gpu::new(w, gpu_init)))
        .context("GPU initialization failed")?;

    let info = handle.gpu().adapter_info();
    log::info!(
        "window '{}' ready on {} ({:?})",
        config.title,
        info.name,
        info.backend
    );
    Ok(handle)
}

/// Releases the GPU context, then the window.
pub fn delete_window(handle: WindowHandle) {
    let heads = handle.into_heads();
    drop(heads.window);
    log::debug!("window deleted");
}
